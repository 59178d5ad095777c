//! 题目表单模型
//!
//! 与任何输入方式无关的独立校验函数：
//! 输入编辑中的草稿，输出规范化后的请求体或按规则顺序排列的字段错误。

use crate::error::{FormField, ValidationErrors};
use crate::models::{AnswerDraft, AnswerRequest, Question, QuestionRequest, QuestionStatus};

pub const QUESTION_REQUIRED: &str = "La pregunta es requerida";
pub const ANSWERS_REQUIRED: &str = "Se requiere al menos una respuesta";
pub const ANSWER_TEXT_REQUIRED: &str = "La respuesta es requerida";
pub const EXACTLY_ONE_CORRECT: &str = "Debe seleccionar exactamente una respuesta como correcta";

/// 编辑中的题目
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub question: String,
    pub feedback: String,
    pub status: Option<QuestionStatus>,
    pub answers: Vec<AnswerDraft>,
}

impl QuestionDraft {
    /// 新建表单：一个空答案，状态为可用
    pub fn blank() -> Self {
        Self {
            question: String::new(),
            feedback: String::new(),
            status: Some(QuestionStatus::Available),
            answers: vec![AnswerDraft::default()],
        }
    }

    /// 编辑表单：用已有题目填充，没有答案时补一个空答案
    pub fn from_question(question: &Question) -> Self {
        let answers = if question.answers.is_empty() {
            vec![AnswerDraft::default()]
        } else {
            question.answers.iter().map(AnswerDraft::from).collect()
        };
        Self {
            question: question.question.clone(),
            feedback: question.feedback.clone().unwrap_or_default(),
            status: Some(question.effective_status()),
            answers,
        }
    }
}

/// 校验并规范化草稿
pub fn validate(draft: &QuestionDraft) -> Result<QuestionRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    // 1. 题干
    let question = draft.question.trim();
    if question.is_empty() {
        errors.push(FormField::Question, QUESTION_REQUIRED);
    }

    // 2. 至少一个答案
    if draft.answers.is_empty() {
        errors.push(FormField::Answers, ANSWERS_REQUIRED);
    }

    // 3. 去掉空白答案；全部为空时逐个报错
    let kept: Vec<AnswerRequest> = draft
        .answers
        .iter()
        .filter(|a| !a.value.trim().is_empty())
        .map(|a| AnswerRequest {
            value: a.value.trim().to_string(),
            is_correct: a.is_correct,
        })
        .collect();

    if !draft.answers.is_empty() && kept.is_empty() {
        for index in 0..draft.answers.len() {
            errors.push(FormField::Answer(index), ANSWER_TEXT_REQUIRED);
        }
    }

    // 4. 恰好一个正确答案（整体报错）
    if !kept.is_empty() && kept.iter().filter(|a| a.is_correct).count() != 1 {
        errors.push(FormField::Answers, EXACTLY_ONE_CORRECT);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let feedback = draft.feedback.trim();
    Ok(QuestionRequest {
        question: question.to_string(),
        feedback: (!feedback.is_empty()).then(|| feedback.to_string()),
        status: Some(draft.status.unwrap_or_default()),
        answers: kept,
    })
}
