use serde::{Deserialize, Serialize};

use crate::core::config::Settings;

/// `current` / `pageSize` query parameters shared by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    pub(crate) current: Option<u32>,
    #[serde(default)]
    #[serde(alias = "pageSize")]
    pub(crate) page_size: Option<u32>,
}

/// Resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub(crate) current: u32,
    pub(crate) page_size: u32,
}

impl PageQuery {
    pub(crate) fn resolve(&self, settings: &Settings) -> Page {
        let pagination = settings.pagination();
        let page_size =
            self.page_size.unwrap_or(pagination.page_size).clamp(1, pagination.max_page_size);
        Page { current: self.current.unwrap_or(1).max(1), page_size }
    }
}

impl Page {
    pub(crate) fn limit(self) -> i64 {
        i64::from(self.page_size)
    }

    pub(crate) fn offset(self) -> i64 {
        i64::from(self.current - 1) * i64::from(self.page_size)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageInfo {
    pub(crate) total: i64,
    pub(crate) current: u32,
    #[serde(rename = "pageSize")]
    pub(crate) page_size: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) pagination: PageInfo,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            pagination: PageInfo { total, current: page.current, page_size: page.page_size },
        }
    }
}
