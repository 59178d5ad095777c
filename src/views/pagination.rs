//! 分页条

/// 最多显示的页码数量，超过时折叠为省略号
pub const MAX_PAGE_NUMBERS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// 计算要显示的页码
///
/// 总页数不超过 `max` 时全部显示；否则显示首页、当前页前后各一页、末页，
/// 中间断开的地方用省略号。
pub fn page_numbers(pages: u32, current: u32, max: u32) -> Vec<PageItem> {
    if pages <= max {
        return (1..=pages).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(1)];
    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(pages - 1);

    if start > 2 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < pages - 1 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(pages));
    items
}

/// 渲染为一行文本，当前页用方括号标出
pub fn render_strip(pages: u32, current: u32) -> String {
    if pages == 0 {
        return String::new();
    }

    let mut parts = Vec::new();
    parts.push(if current > 1 { "«" } else { " " }.to_string());
    for item in page_numbers(pages, current, MAX_PAGE_NUMBERS) {
        parts.push(match item {
            PageItem::Page(page) if page == current => format!("[{}]", page),
            PageItem::Page(page) => page.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        });
    }
    parts.push(if current < pages { "»" } else { " " }.to_string());
    parts.join(" ").trim().to_string()
}
