pub mod daily_log;
