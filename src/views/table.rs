//! 纯文本表格
//!
//! 列定义是带标签的枚举：数据列提供取值函数，操作列列出行上可执行的操作。

use crate::models::{PageResult, Question};
use crate::views::pagination::render_strip;

/// 表格中显示的答案数量
const MAX_ANSWERS_SHOWN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Edit => "Editar",
            RowAction::Delete => "Eliminar",
        }
    }
}

pub enum Column<T> {
    Data {
        label: &'static str,
        cell: fn(&T) -> String,
    },
    Actions {
        label: &'static str,
        actions: Vec<RowAction>,
    },
}

impl<T> Column<T> {
    pub fn label(&self) -> &'static str {
        match self {
            Column::Data { label, .. } | Column::Actions { label, .. } => label,
        }
    }

    pub fn render(&self, item: &T) -> String {
        match self {
            Column::Data { cell, .. } => cell(item),
            Column::Actions { actions, .. } => actions
                .iter()
                .map(|action| action.label())
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// 题目列表的列
pub fn question_columns() -> Vec<Column<Question>> {
    vec![
        Column::Data {
            label: "ID",
            cell: |q| q.id.to_string(),
        },
        Column::Data {
            label: "Pregunta",
            cell: question_cell,
        },
        Column::Data {
            label: "Respuestas",
            cell: answers_cell,
        },
        Column::Actions {
            label: "Acciones",
            actions: vec![RowAction::Edit, RowAction::Delete],
        },
    ]
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// 题干、反馈和状态
pub fn question_cell(question: &Question) -> String {
    let mut lines = vec![question.question.clone()];
    if let Some(feedback) = question.feedback.as_deref().filter(|f| !f.is_empty()) {
        lines.push(format!("💡 {}", feedback));
    }
    lines.push(format!("[{}]", question.effective_status().label()));
    lines.join("\n")
}

/// 前两个答案（带正确标记）、剩余数量和总数
pub fn answers_cell(question: &Question) -> String {
    let mut lines: Vec<String> = question
        .answers
        .iter()
        .take(MAX_ANSWERS_SHOWN)
        .map(|answer| {
            if answer.is_correct {
                format!("● {} (Correcta)", answer.answer)
            } else {
                format!("○ {}", answer.answer)
            }
        })
        .collect();

    let total = question.answers.len();
    if total > MAX_ANSWERS_SHOWN {
        let remaining = total - MAX_ANSWERS_SHOWN;
        lines.push(format!("+{} respuesta{} más", remaining, plural(remaining)));
    }
    lines.push(format!("Total: {} respuesta{}", total, plural(total)));
    lines.join("\n")
}

/// 渲染表格；单元格可以有多行
pub fn render_table<T>(columns: &[Column<T>], items: &[T], empty_message: &str) -> String {
    if items.is_empty() {
        return empty_message.to_string();
    }

    let rows: Vec<Vec<Vec<String>>> = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| column.render(item).lines().map(str::to_string).collect())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .flat_map(|row| row[i].iter())
                .map(|line| line.chars().count())
                .chain(std::iter::once(column.label().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut out = Vec::new();
    let header: Vec<String> = columns.iter().map(|c| c.label().to_string()).collect();
    out.push(format_line(&header, &widths));
    out.push(separator.clone());

    for row in &rows {
        let height = row.iter().map(Vec::len).max().unwrap_or(1).max(1);
        for line in 0..height {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.get(line).cloned().unwrap_or_default())
                .collect();
            out.push(format_line(&cells, &widths));
        }
        out.push(separator.clone());
    }

    out.join("\n")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("|")
        .trim_end()
        .to_string()
}

/// 渲染一页题目：表格、分页条和统计
pub fn render_question_page(page: &PageResult<Question>) -> String {
    let table = render_table(
        &question_columns(),
        &page.items,
        "No se encontraron preguntas",
    );
    let strip = render_strip(page.total_pages, page.page);
    format!(
        "{}\n\n{}\nPágina {} de {} · {} pregunta{} · {} por página",
        table,
        strip,
        page.page,
        page.total_pages.max(1),
        page.total_items,
        plural(page.total_items as usize),
        page.page_size
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, QuestionId, QuestionStatus};

    fn question(answers: usize) -> Question {
        Question {
            id: QuestionId(7),
            question: "¿Capital del Perú?".into(),
            feedback: Some("Está en la costa".into()),
            status: Some(QuestionStatus::Deleted),
            answers: (0..answers)
                .map(|i| Answer {
                    id: i as u64,
                    answer: format!("R{}", i),
                    is_correct: i == 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_answers_cell_shows_two_and_remaining() {
        let cell = answers_cell(&question(4));
        let lines: Vec<&str> = cell.lines().collect();
        assert_eq!(
            lines,
            vec![
                "○ R0",
                "● R1 (Correcta)",
                "+2 respuestas más",
                "Total: 4 respuestas"
            ]
        );
    }

    #[test]
    fn test_answers_cell_singular() {
        assert!(answers_cell(&question(3)).contains("+1 respuesta más"));
        assert!(answers_cell(&question(1)).ends_with("Total: 1 respuesta"));
        assert_eq!(answers_cell(&question(0)), "Total: 0 respuestas");
    }

    #[test]
    fn test_question_cell_includes_feedback_and_status() {
        let cell = question_cell(&question(1));
        assert!(cell.contains("💡 Está en la costa"));
        assert!(cell.ends_with("[No disponible]"));

        let plain = Question {
            feedback: None,
            status: None,
            ..question(1)
        };
        assert_eq!(question_cell(&plain), "¿Capital del Perú?\n[Disponible]");
    }

    #[test]
    fn test_action_column_lists_actions() {
        let columns = question_columns();
        assert_eq!(columns.last().map(Column::label), Some("Acciones"));
        assert_eq!(columns[3].render(&question(1)), "Editar | Eliminar");
    }

    #[test]
    fn test_render_table_pads_columns() {
        let columns: Vec<Column<(u32, &str)>> = vec![
            Column::Data {
                label: "N",
                cell: |row| row.0.to_string(),
            },
            Column::Data {
                label: "Nombre",
                cell: |row| row.1.to_string(),
            },
        ];
        let out = render_table(&columns, &[(1, "uno"), (20, "veinte\nextra")], "vacío");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], " N  | Nombre");
        assert_eq!(lines[2], " 1  | uno");
        assert_eq!(lines[4], " 20 | veinte");
        assert_eq!(lines[5], "    | extra");

        assert_eq!(render_table(&columns, &[], "vacío"), "vacío");
    }

    #[test]
    fn test_render_question_page_has_strip_and_totals() {
        let page = PageResult {
            items: vec![question(2)],
            page: 1,
            page_size: 10,
            total_items: 1,
            total_pages: 1,
        };
        let out = render_question_page(&page);
        assert!(out.contains("[1]"));
        assert!(out.contains("Página 1 de 1 · 1 pregunta · 10 por página"));
    }
}
