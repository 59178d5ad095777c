//! 搜索防抖
//!
//! 输入框里显示的词立即更新，真正用于查询的词要等输入停止一段时间后才生效。
//! 只保存一个截止时间，每次输入都会替换它，所以不需要取消后台任务。

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SearchDebounce {
    displayed: String,
    effective: String,
    deadline: Option<Instant>,
    quiet: Duration,
}

impl SearchDebounce {
    pub fn new(quiet: Duration, initial: &str) -> Self {
        Self {
            displayed: initial.to_string(),
            effective: initial.to_string(),
            deadline: None,
            quiet,
        }
    }

    /// 记录一次输入，并重新开始计时
    pub fn input(&mut self, text: &str) {
        self.displayed = text.to_string();
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    pub fn effective(&self) -> &str {
        &self.effective
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// 还在等待生效且输入内容与当前查询不同
    pub fn is_searching(&self) -> bool {
        self.is_pending() && self.displayed != self.effective
    }

    /// 等到静默期结束后提交；没有待生效的输入时立即返回
    ///
    /// 返回查询词是否发生变化。
    pub async fn settle(&mut self) -> bool {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.commit()
            }
            None => false,
        }
    }

    /// 与 `settle` 相同，但没有待生效的输入时永远挂起
    ///
    /// 用于 `tokio::select!`：被丢弃时不会改变任何状态。
    pub async fn wait(&mut self) -> bool {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.commit()
            }
            None => std::future::pending().await,
        }
    }

    fn commit(&mut self) -> bool {
        self.deadline = None;
        if self.displayed == self.effective {
            return false;
        }
        debug!("搜索词生效: {:?} -> {:?}", self.effective, self.displayed);
        self.effective = self.displayed.clone();
        true
    }
}
