pub mod auth_service;
pub mod list_cache;
pub mod question_repository;
pub mod session_store;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_service::AuthService;
pub use list_cache::ListCache;
pub use question_repository::{
    DeleteOutcome, HttpQuestionSource, QuestionRepository, QuestionSource, RetryPolicy,
};
pub use session_store::SessionStore;
