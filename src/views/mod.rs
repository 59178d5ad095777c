pub mod pagination;
pub mod table;

pub use pagination::{page_numbers, render_strip, PageItem};
pub use table::{question_columns, render_question_page, render_table, Column, RowAction};
