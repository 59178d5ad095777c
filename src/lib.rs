//! # Question Bank Admin
//!
//! 题库管理客户端：分页浏览、搜索、创建、编辑和删除选择题
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 持有 HTTP 连接，统一附加认证头并映射状态码
//! - `ApiClient` - 唯一的 reqwest 客户端持有者
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionRepository` - 列表缓存、重试和写后失效
//! - `AuthService` / `SessionStore` - 登录、角色检查、会话持久化
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 与输入方式无关的交互状态
//! - `QuestionEditor` - 一次创建 / 编辑会话（表单校验 + 正确答案选择器）
//! - `ListController` - 分页、每页数量和防抖搜索
//!
//! ### ④ 展示层（Views）
//! - `views/` - 纯文本表格和分页条，供命令行使用
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod views;
pub mod workflow;

// 重新导出常用类型
pub use clients::ApiClient;
pub use config::Config;
pub use error::{AppError, AppResult, AuthError, ValidationErrors};
pub use models::{PageRequest, PageResult, Question, QuestionId, QuestionStatus};
pub use services::{
    AuthService, DeleteOutcome, HttpQuestionSource, ListCache, QuestionRepository, SessionStore,
};
pub use workflow::{ListController, QuestionEditor, ViewState};
