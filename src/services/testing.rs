//! 测试用的内存题目集合，记录每一次调用

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::{
    Answer, AnswerRequest, PageRequest, PageResult, Question, QuestionId, QuestionRequest,
};
use crate::services::QuestionSource;

#[derive(Default)]
struct Recorded {
    questions: Vec<Question>,
    next_id: u64,
    list_requests: Vec<PageRequest>,
    mutation_calls: usize,
    list_failures: usize,
    mutation_failures: VecDeque<AppError>,
}

/// 记录调用的内存题目集合
#[derive(Default)]
pub struct RecordingSource {
    inner: Mutex<Recorded>,
}

impl RecordingSource {
    pub fn with_questions(count: u64) -> Self {
        let questions = (1..=count).map(sample_question).collect();
        Self {
            inner: Mutex::new(Recorded {
                questions,
                next_id: count + 1,
                ..Default::default()
            }),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_requests.len()
    }

    pub fn list_requests(&self) -> Vec<PageRequest> {
        self.inner.lock().unwrap().list_requests.clone()
    }

    pub fn mutation_calls(&self) -> usize {
        self.inner.lock().unwrap().mutation_calls
    }

    pub fn fail_next_lists(&self, count: usize) {
        self.inner.lock().unwrap().list_failures = count;
    }

    pub fn fail_next_mutation(&self, error: AppError) {
        self.inner.lock().unwrap().mutation_failures.push_back(error);
    }

    pub fn questions(&self) -> Vec<Question> {
        self.inner.lock().unwrap().questions.clone()
    }
}

#[async_trait]
impl QuestionSource for RecordingSource {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<PageResult<Question>> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_requests.push(request.clone());

        if inner.list_failures > 0 {
            inner.list_failures -= 1;
            return Err(AppError::Server {
                endpoint: "/questions_with_answers".into(),
                status: 503,
                message: None,
            });
        }

        let matching: Vec<Question> = inner
            .questions
            .iter()
            .filter(|q| request.search.is_empty() || q.question.contains(&request.search))
            .cloned()
            .collect();
        let total_items = matching.len() as u64;
        let size = request.page_size as usize;
        let items = matching
            .into_iter()
            .skip((request.page as usize - 1) * size)
            .take(size)
            .collect();

        Ok(PageResult {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_items.div_ceil(request.page_size as u64) as u32,
        })
    }

    async fn create(&self, question: &QuestionRequest) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.mutation_calls += 1;
        if let Some(error) = inner.mutation_failures.pop_front() {
            return Err(error);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.questions.push(to_question(id, question));
        Ok(())
    }

    async fn update(&self, id: QuestionId, question: &QuestionRequest) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.mutation_calls += 1;
        if let Some(error) = inner.mutation_failures.pop_front() {
            return Err(error);
        }
        match inner.questions.iter_mut().find(|q| q.id == id) {
            Some(existing) => {
                *existing = to_question(id.0, question);
                Ok(())
            }
            None => Err(AppError::NotFound { id }),
        }
    }

    async fn delete(&self, id: QuestionId) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.mutation_calls += 1;
        if let Some(error) = inner.mutation_failures.pop_front() {
            return Err(error);
        }
        let before = inner.questions.len();
        inner.questions.retain(|q| q.id != id);
        if inner.questions.len() == before {
            return Err(AppError::NotFound { id });
        }
        Ok(())
    }
}

pub fn sample_question(id: u64) -> Question {
    Question {
        id: QuestionId(id),
        question: format!("Pregunta {}", id),
        feedback: None,
        status: None,
        answers: vec![
            Answer {
                id: id * 10,
                answer: "Correcta".into(),
                is_correct: true,
            },
            Answer {
                id: id * 10 + 1,
                answer: "Incorrecta".into(),
                is_correct: false,
            },
        ],
    }
}

pub fn question_request(text: &str) -> QuestionRequest {
    QuestionRequest {
        question: text.to_string(),
        feedback: None,
        status: None,
        answers: vec![AnswerRequest {
            value: "Sí".into(),
            is_correct: true,
        }],
    }
}

fn to_question(id: u64, request: &QuestionRequest) -> Question {
    Question {
        id: QuestionId(id),
        question: request.question.clone(),
        feedback: request.feedback.clone(),
        status: request.status,
        answers: request
            .answers
            .iter()
            .enumerate()
            .map(|(i, a)| Answer {
                id: id * 10 + i as u64,
                answer: a.value.clone(),
                is_correct: a.is_correct,
            })
            .collect(),
    }
}
