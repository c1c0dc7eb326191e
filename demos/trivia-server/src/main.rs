use std::sync::Arc;

use quizarena::prelude::*;

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

/// Served when `QUIZARENA_QUESTIONS` is not set.
const SAMPLE_QUESTIONS: &str = r#"[
  { "prompt": "What is the chemical symbol for gold?", "correct_answer": "Au",
    "incorrect_answers": ["Ag", "Gd", "Go"], "category": "science" },
  { "prompt": "How many legs does a spider have?", "correct_answer": "8",
    "incorrect_answers": ["6", "10", "12"], "category": "science" },
  { "prompt": "Which planet is known as the Red Planet?", "correct_answer": "Mars",
    "incorrect_answers": ["Venus", "Jupiter", "Mercury"], "category": "science" },
  { "prompt": "What is the capital of Canada?", "correct_answer": "Ottawa",
    "incorrect_answers": ["Toronto", "Vancouver", "Montreal"], "category": "geography" },
  { "prompt": "Which river flows through Cairo?", "correct_answer": "Nile",
    "incorrect_answers": ["Tigris", "Euphrates", "Jordan"], "category": "geography" },
  { "prompt": "What is the largest ocean on Earth?", "correct_answer": "Pacific",
    "incorrect_answers": ["Atlantic", "Indian", "Arctic"], "category": "geography" },
  { "prompt": "In which year did the Berlin Wall fall?", "correct_answer": "1989",
    "incorrect_answers": ["1987", "1991", "1993"], "category": "history" },
  { "prompt": "Who was the first emperor of Rome?", "correct_answer": "Augustus",
    "incorrect_answers": ["Julius Caesar", "Nero", "Trajan"], "category": "history" },
  { "prompt": "What is 7 x 8?", "correct_answer": "56",
    "incorrect_answers": ["54", "58", "64"], "category": "math" },
  { "prompt": "What is the square root of 144?", "correct_answer": "12",
    "incorrect_answers": ["11", "14", "16"], "category": "math" },
  { "prompt": "How many sides does a hexagon have?", "correct_answer": "6",
    "incorrect_answers": ["5", "7", "8"], "category": "math" },
  { "prompt": "Which language has the crate registry crates.io?", "correct_answer": "Rust",
    "incorrect_answers": ["Go", "Zig", "Haskell"], "category": "technology" }
]"#;

fn load_bank() -> Result<InMemoryQuestionBank, QuizarenaError> {
    let json = match std::env::var("QUIZARENA_QUESTIONS") {
        Ok(path) => {
            tracing::info!(%path, "loading question bank");
            std::fs::read_to_string(path)?
        }
        Err(_) => SAMPLE_QUESTIONS.to_string(),
    };
    Ok(InMemoryQuestionBank::from_json(&json).map_err(RoomError::from)?)
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), QuizarenaError> {
    quizarena::init_logging("info");

    let bind = std::env::var("QUIZARENA_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let bank = load_bank()?;
    tracing::info!(
        questions = bank.len(),
        categories = ?bank.categories(),
        "question bank ready"
    );

    let leaderboard = Arc::new(MemoryLeaderboard::default());
    let server = QuizarenaServer::builder()
        .bind(&bind)
        .recorder(leaderboard)
        .build(bank)
        .await?;

    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_bank_parses_with_categories() {
        let bank = InMemoryQuestionBank::from_json(SAMPLE_QUESTIONS).unwrap();
        assert_eq!(bank.len(), 12);
        assert!(bank.categories().contains(&"geography".to_string()));
    }
}
