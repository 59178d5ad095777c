//! 题目编辑会话 - 流程层
//!
//! 对应一次创建 / 编辑弹窗的生命周期：
//! 持有表单字段和正确答案选择器，提交前先在本地校验，
//! 提交进行中拒绝再次提交。

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AnswerDraft, Question, QuestionId, QuestionStatus};
use crate::services::{QuestionRepository, QuestionSource};
use crate::workflow::answer_selector::CorrectAnswerSelector;
use crate::workflow::question_form::{validate, QuestionDraft};

/// 编辑模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(QuestionId),
}

/// 题目编辑会话
#[derive(Debug)]
pub struct QuestionEditor {
    mode: EditorMode,
    pub question: String,
    pub feedback: String,
    status: QuestionStatus,
    answers: CorrectAnswerSelector,
    submitting: AtomicBool,
}

impl QuestionEditor {
    /// 新建题目
    pub fn create() -> Self {
        Self::from_draft(EditorMode::Create, QuestionDraft::blank())
    }

    /// 编辑已有题目
    pub fn edit(question: &Question) -> Self {
        Self::from_draft(
            EditorMode::Edit(question.id),
            QuestionDraft::from_question(question),
        )
    }

    fn from_draft(mode: EditorMode, draft: QuestionDraft) -> Self {
        Self {
            mode,
            question: draft.question,
            feedback: draft.feedback,
            status: draft.status.unwrap_or_default(),
            answers: CorrectAnswerSelector::initialize(draft.answers),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn status(&self) -> QuestionStatus {
        self.status
    }

    /// 只有编辑模式可以修改状态
    pub fn set_status(&mut self, status: QuestionStatus) -> bool {
        if self.mode == EditorMode::Create {
            return false;
        }
        self.status = status;
        true
    }

    pub fn answers(&self) -> &CorrectAnswerSelector {
        &self.answers
    }

    pub fn answers_mut(&mut self) -> &mut CorrectAnswerSelector {
        &mut self.answers
    }

    /// 用给定答案替换整个答案列表（按初始化规则选择正确答案）
    pub fn replace_answers(&mut self, answers: Vec<AnswerDraft>) {
        self.answers = CorrectAnswerSelector::initialize(answers);
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// 当前表单内容
    pub fn draft(&self) -> QuestionDraft {
        QuestionDraft {
            question: self.question.clone(),
            feedback: self.feedback.clone(),
            status: Some(self.status),
            answers: self.answers.answers().to_vec(),
        }
    }

    /// 提交
    ///
    /// 本地校验失败时不发出任何请求；上一次提交未结束时返回 `Busy`。
    pub async fn submit<S: QuestionSource + 'static>(
        &self,
        repo: &QuestionRepository<S>,
    ) -> AppResult<()> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("⚠️ 提交进行中，忽略重复提交");
            return Err(AppError::Busy);
        }
        let _reset = SubmitGuard(&self.submitting);

        submit_draft(repo, self.mode, &self.draft()).await
    }
}

/// 校验草稿并按模式提交
///
/// 校验失败时直接返回 `Validation`，不会调用仓库。
pub async fn submit_draft<S: QuestionSource + 'static>(
    repo: &QuestionRepository<S>,
    mode: EditorMode,
    draft: &QuestionDraft,
) -> AppResult<()> {
    let request = validate(draft).map_err(AppError::Validation)?;

    match mode {
        EditorMode::Create => {
            info!("📤 正在创建题目...");
            repo.create(&request).await
        }
        EditorMode::Edit(id) => {
            info!("📤 正在更新题目 {}...", id);
            repo.update(id, &request).await
        }
    }
}

// 提交结束（无论成功与否）时复位标记
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
