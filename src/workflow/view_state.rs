//! 可分享的列表视图状态
//!
//! 页码、每页数量和搜索词编码为查询字符串 `page`、`pageSize`、`search`，
//! 解析时对缺失或非法的值回退到默认值，不会报错。

use url::form_urlencoded;

use crate::models::{PageRequest, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
        }
    }
}

impl ViewState {
    /// 从查询字符串解析，允许带开头的 `?`
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    state.page = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|p| *p >= 1)
                        .unwrap_or(1);
                }
                "pageSize" => {
                    state.page_size = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|s| PAGE_SIZE_OPTIONS.contains(s))
                        .unwrap_or(DEFAULT_PAGE_SIZE);
                }
                "search" => state.search = value.into_owned(),
                _ => {}
            }
        }

        state
    }

    /// 编码为查询字符串，空搜索词不输出
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair("page", &self.page.to_string())
            .append_pair("pageSize", &self.page_size.to_string());
        if !self.search.is_empty() {
            serializer.append_pair("search", &self.search);
        }
        serializer.finish()
    }

    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page.max(1),
            page_size: self.page_size,
            search: self.search.trim().to_string(),
        }
    }
}
