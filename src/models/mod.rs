pub mod page;
pub mod question;
pub mod user;

pub use page::{Envelope, PagePayload, PageRequest, PageResult, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
pub use question::{
    Answer, AnswerDraft, AnswerRequest, Question, QuestionId, QuestionRequest, QuestionStatus,
};
pub use user::{ApiErrorResponse, Session, SignInRequest, User, ADMIN_ROLE};
