//! 正确答案选择器
//!
//! 单选语义：答案列表非空时，恰好有一个答案被标记为正确。
//! 所有改变列表或正确标记的操作都经过这里，
//! 列表不会出现"零个正确"或"多个正确"的中间状态。

use crate::models::AnswerDraft;

/// 正确答案选择器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectAnswerSelector {
    answers: Vec<AnswerDraft>,
    selected: Option<usize>,
}

impl CorrectAnswerSelector {
    /// 空列表，无选中项
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有答案初始化
    ///
    /// 选中第一个标记为正确的答案；都没有标记时选中第 0 个，并统一刷新标记。
    pub fn initialize(answers: Vec<AnswerDraft>) -> Self {
        let mut selector = Self {
            answers,
            selected: None,
        };
        if !selector.answers.is_empty() {
            let index = selector
                .answers
                .iter()
                .position(|a| a.is_correct)
                .unwrap_or(0);
            selector.select(index);
        }
        selector
    }

    pub fn answers(&self) -> &[AnswerDraft] {
        &self.answers
    }

    pub fn into_answers(self) -> Vec<AnswerDraft> {
        self.answers
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// 选中第 `index` 个答案，一次性改写全部标记；越界时忽略
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.answers.len() {
            return false;
        }
        self.selected = Some(index);
        for (i, answer) in self.answers.iter_mut().enumerate() {
            answer.is_correct = i == index;
        }
        true
    }

    /// 追加一个空答案，返回其下标
    pub fn append(&mut self) -> usize {
        self.append_text("")
    }

    /// 追加一个带文本的答案（未选中）；此前没有选中项时自动选中它
    pub fn append_text(&mut self, value: impl Into<String>) -> usize {
        self.answers.push(AnswerDraft::new(value, false));
        let index = self.answers.len() - 1;
        if self.selected.is_none() {
            self.select(index);
        }
        index
    }

    /// 删除第 `index` 个答案
    ///
    /// 删除的是选中项时改选第 0 个；删除的在选中项之前时，选中下标随之前移。
    pub fn remove(&mut self, index: usize) -> Option<AnswerDraft> {
        if index >= self.answers.len() {
            return None;
        }
        let removed = self.answers.remove(index);

        match self.selected {
            _ if self.answers.is_empty() => self.selected = None,
            Some(selected) if selected == index => {
                self.select(0);
            }
            Some(selected) if selected > index => {
                self.select(selected - 1);
            }
            _ => {}
        }

        Some(removed)
    }

    /// 修改答案文本，不影响正确标记
    pub fn set_text(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.answers.get_mut(index) {
            Some(answer) => {
                answer.value = value.into();
                true
            }
            None => false,
        }
    }

    /// 被标记为正确的答案数量
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}
