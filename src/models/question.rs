use std::fmt;

use serde::{Deserialize, Serialize};

/// 题目 ID（服务端分配，不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 题目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionStatus {
    #[default]
    Available,
    Deleted,
}

impl QuestionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionStatus::Available => "Disponible",
            QuestionStatus::Deleted => "No disponible",
        }
    }
}

impl std::str::FromStr for QuestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(QuestionStatus::Available),
            "DELETED" | "UNAVAILABLE" => Ok(QuestionStatus::Deleted),
            other => Err(format!("未知的题目状态: {}", other)),
        }
    }
}

/// 已保存的答案选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    pub answer: String,
    pub is_correct: bool,
}

/// 列表接口返回的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionStatus>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Question {
    /// 状态缺省时按可用处理
    pub fn effective_status(&self) -> QuestionStatus {
        self.status.unwrap_or_default()
    }

    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct)
    }
}

/// 编辑中的答案（新增的答案没有 id）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerDraft {
    pub id: Option<u64>,
    pub value: String,
    pub is_correct: bool,
}

impl AnswerDraft {
    pub fn new(value: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: None,
            value: value.into(),
            is_correct,
        }
    }
}

impl From<&Answer> for AnswerDraft {
    fn from(answer: &Answer) -> Self {
        Self {
            id: Some(answer.id),
            value: answer.answer.clone(),
            is_correct: answer.is_correct,
        }
    }
}

/// 创建/更新接口的答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub value: String,
    pub is_correct: bool,
}

/// 创建/更新接口的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionStatus>,
    pub answers: Vec<AnswerRequest>,
}
