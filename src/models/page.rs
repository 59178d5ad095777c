use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 每页数量的可选值
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];

/// 默认每页数量
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// 列表查询参数，同时也是列表缓存的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
}

impl PageRequest {
    /// 构造查询参数：页码必须 >= 1，搜索词会被 trim
    pub fn new(page: i64, page_size: u32, search: &str) -> AppResult<Self> {
        if page < 1 || page > u32::MAX as i64 {
            return Err(AppError::InvalidPage(page));
        }
        if page_size == 0 {
            return Err(AppError::InvalidPageSize(page_size));
        }
        Ok(Self {
            page: page as u32,
            page_size,
            search: search.trim().to_string(),
        })
    }

    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            search: String::new(),
        }
    }

    /// 转换为接口查询参数，空搜索词不发送
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs
    }
}

/// 一页查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PageResult<T> {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size,
            total_items: 0,
            total_pages: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// 列表接口的分页结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePayload<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub data: Vec<T>,
}

/// 接口外层的 `{ data: ... }` 包装
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> From<PagePayload<T>> for PageResult<T> {
    fn from(payload: PagePayload<T>) -> Self {
        Self {
            items: payload.data,
            page: payload.page,
            page_size: payload.page_size,
            total_items: payload.total_items,
            total_pages: payload.total_pages,
        }
    }
}
