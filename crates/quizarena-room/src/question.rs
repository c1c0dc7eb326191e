//! Questions and where they come from.
//!
//! A room asks a [`QuestionProvider`] for its questions exactly once, when
//! the host starts the game. The provider is the only place the server
//! touches question storage, so swapping a database for a JSON file (or a
//! fixed list in tests) never changes room code.

use std::future::Future;

use quizarena_protocol::QuestionView;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::ProviderError;
use crate::config::ANY_CATEGORY;

/// One multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: u64,
    #[serde(alias = "question")]
    pub prompt: String,
    pub correct_answer: String,
    pub incorrect_answers: [String; 3],
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

impl Question {
    /// All four options, correct one first.
    pub fn options(&self) -> Vec<String> {
        let mut options = Vec::with_capacity(4);
        options.push(self.correct_answer.clone());
        options.extend(self.incorrect_answers.iter().cloned());
        options
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    /// The outbound view of this question with the options in random order.
    pub fn to_view<R: Rng>(
        &self,
        question_index: usize,
        total: usize,
        duration_secs: u64,
        rng: &mut R,
    ) -> QuestionView {
        let mut options = self.options();
        options.shuffle(rng);
        QuestionView {
            question_index,
            number: question_index + 1,
            total,
            text: self.prompt.clone(),
            options,
            category: self.category.clone(),
            duration_secs,
        }
    }
}

/// Supplies questions for a game.
///
/// # Example
///
/// ```rust
/// use quizarena_room::{ProviderError, Question, QuestionProvider};
///
/// struct Fixed(Vec<Question>);
///
/// impl QuestionProvider for Fixed {
///     async fn fetch(
///         &self,
///         _categories: &[String],
///         count: usize,
///     ) -> Result<Vec<Question>, ProviderError> {
///         Ok(self.0.iter().take(count).cloned().collect())
///     }
/// }
/// ```
pub trait QuestionProvider: Send + Sync + 'static {
    /// Returns up to `count` distinct questions from `categories`.
    ///
    /// `["all"]` means any category. Returning fewer than `count` is fine;
    /// the room plays what it gets. Returning none makes the start fail
    /// with `NoQuestions`.
    fn fetch(
        &self,
        categories: &[String],
        count: usize,
    ) -> impl Future<Output = Result<Vec<Question>, ProviderError>> + Send;
}

// ---------------------------------------------------------------------------
// InMemoryQuestionBank
// ---------------------------------------------------------------------------

/// A provider serving a fixed set of questions held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Vec<Question>,
}

impl InMemoryQuestionBank {
    /// Builds a bank. Questions without an id get their position as one.
    pub fn new(mut questions: Vec<Question>) -> Self {
        for (i, q) in questions.iter_mut().enumerate() {
            if q.id == 0 {
                q.id = i as u64 + 1;
            }
        }
        Self { questions }
    }

    /// Parses a JSON array of questions.
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let questions: Vec<Question> =
            serde_json::from_str(json).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(Self::new(questions))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Distinct category names, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.questions.iter().map(|q| q.category.to_lowercase()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Draws up to `count` distinct questions matching `categories`.
    pub fn sample<R: Rng>(&self, categories: &[String], count: usize, rng: &mut R) -> Vec<Question> {
        let any = categories.is_empty() || categories.iter().any(|c| c.eq_ignore_ascii_case(ANY_CATEGORY));
        let matching: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| any || categories.iter().any(|c| c.eq_ignore_ascii_case(&q.category)))
            .collect();
        let mut picked: Vec<Question> = matching
            .choose_multiple(rng, count)
            .map(|q| (*q).clone())
            .collect();
        picked.shuffle(rng);
        picked
    }
}

impl QuestionProvider for InMemoryQuestionBank {
    fn fetch(
        &self,
        categories: &[String],
        count: usize,
    ) -> impl Future<Output = Result<Vec<Question>, ProviderError>> + Send {
        let picked = self.sample(categories, count, &mut rand::rng());
        std::future::ready(Ok(picked))
    }
}
