pub mod answer_selector;
pub mod list_controller;
pub mod question_editor;
pub mod question_form;
pub mod search_debounce;
pub mod view_state;

pub use answer_selector::CorrectAnswerSelector;
pub use list_controller::ListController;
pub use question_editor::{submit_draft, EditorMode, QuestionEditor};
pub use question_form::{validate, QuestionDraft};
pub use search_debounce::SearchDebounce;
pub use view_state::ViewState;
