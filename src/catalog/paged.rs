use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Paging parameters as they arrive on the query string.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageParams {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }.normalized()
    }

    /// Clamps the size into `1..=MAX_PAGE_SIZE`; a zero size falls back to the default.
    pub fn normalized(self) -> Self {
        let size = match self.size {
            0 => DEFAULT_PAGE_SIZE,
            s => s.min(MAX_PAGE_SIZE),
        };
        Self { page: self.page, size }
    }

    pub fn page_of_total(&self, total: usize) -> Page {
        Page {
            page: self.page,
            size: self.size,
            total,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub size: usize,
    pub total: usize,
}
