use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use protocol::DailyLog;

use crate::api::ListRequest;

/// Derived per-row status: an entry is published once it carries a
/// LinkedIn publication link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    Published,
    Pending,
}

impl PublishStatus {
    pub fn of(log: &DailyLog) -> Self {
        match log
            .link_publicacion_linkedin
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
        {
            Some(_) => PublishStatus::Published,
            None => PublishStatus::Pending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PublishStatus::Published => "published",
            PublishStatus::Pending => "pending",
        }
    }
}

/// Opaque handle identifying one in-flight history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Pagination cursor and search string for the history table.
///
/// Fetches are keyed by a monotonically increasing ticket: a response is
/// applied only if its ticket is still the newest, so a slow page-1
/// response cannot overwrite a faster page-2 one.
#[derive(Debug, Default)]
pub struct HistoryState {
    page: u64,
    search: String,
    latest_request: AtomicU64,
}

impl HistoryState {
    pub fn new() -> Self {
        HistoryState {
            page: 1,
            search: String::new(),
            latest_request: AtomicU64::new(0),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn next_page(&mut self) {
        self.page = self.page().saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.page = self.page().saturating_sub(1).max(1);
    }

    /// Changing the search resets to the first page.
    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_string();
        self.page = 1;
    }

    /// When a fetch reports an empty page past the end, step back onto the
    /// last page that exists.
    pub fn clamp_to_last_page(&mut self, count: u64, page_size: u64) {
        let last = count.div_ceil(page_size.max(1)).max(1);
        if self.page() > last {
            self.page = last;
        }
    }

    pub fn to_request(&self, page_size: u64) -> ListRequest {
        ListRequest {
            page: self.page(),
            page_size: Some(page_size),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            project_type: None,
            ordering: None,
        }
    }

    /// Marks a new fetch as the latest and returns its ticket.
    pub fn begin_request(&self) -> RequestTicket {
        RequestTicket(self.latest_request.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    /// True if no newer fetch started since this ticket was issued; stale
    /// responses must be dropped by the caller.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest_request.load(AtomicOrdering::SeqCst) == ticket.0
    }
}
