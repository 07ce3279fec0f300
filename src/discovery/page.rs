use crate::types::Movie;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// The engine's current result window.
///
/// `error` being set means `items`, `page` and `total_pages` may be stale:
/// a failed fetch only clears `loading`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Movie>,
    pub page: u32,
    pub total_pages: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub status: FetchStatus,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            total_pages: 1,
            loading: false,
            error: None,
            status: FetchStatus::Idle,
        }
    }
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.status = FetchStatus::Loading;
    }

    pub(crate) fn succeed(&mut self, items: Vec<Movie>, page: u32, total_pages: u32) {
        self.items = items;
        self.page = page.max(1);
        self.total_pages = total_pages.max(1);
        self.loading = false;
        self.error = None;
        self.status = FetchStatus::Loaded;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
        self.status = FetchStatus::Errored;
    }
}
