// Pagination types shared by list endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters accepted by paginated endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema, IntoParams,
)]
#[into_params(parameter_in = Query)]
pub struct PageOptions {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageOptions {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub item_count: u64,
    pub page_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

impl PageMeta {
    /// Builds page metadata; `base_link` is the list URL without query string.
    pub fn new(options: PageOptions, item_count: u64, base_link: &str) -> Self {
        let limit = options.limit.max(1);
        let page_count = item_count.div_ceil(u64::from(limit));
        let has_previous_page = options.page > 1;
        let has_next_page = u64::from(options.page) < page_count;

        let link = |page: u32| format!("{}?page={}&limit={}", base_link, page, limit);

        Self {
            page: options.page,
            limit,
            item_count,
            page_count,
            has_previous_page,
            has_next_page,
            prev_link: has_previous_page.then(|| link(options.page - 1)),
            next_link: has_next_page.then(|| link(options.page + 1)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, options: PageOptions, item_count: u64, base_link: &str) -> Self {
        Self {
            data,
            meta: PageMeta::new(options, item_count, base_link),
        }
    }
}
