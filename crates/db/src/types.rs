use protocol::ProjectType;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderField {
    #[default]
    FechaCreacion,
    Horas,
}

/// Sort specification in the `ordering=-fecha_creacion` query style: a
/// leading `-` means descending. Unknown fields fall back to the default
/// (newest first) rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Ordering {
            field: OrderField::FechaCreacion,
            descending: true,
        }
    }
}

impl Ordering {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (descending, field_name) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let field = match field_name {
            "fecha_creacion" => OrderField::FechaCreacion,
            "horas" => OrderField::Horas,
            _ => return Ordering::default(),
        };
        Ordering { field, descending }
    }
}

/// Filters and pagination for the list endpoint. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub project_type: Option<ProjectType>,
    pub ordering: Ordering,
}

impl Default for ListParams {
    fn default() -> Self {
        ListParams {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            project_type: None,
            ordering: Ordering::default(),
        }
    }
}

impl ListParams {
    /// Clamps out-of-range values instead of rejecting the request.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        self.search = self.search.filter(|s| !s.trim().is_empty());
        self
    }
}
