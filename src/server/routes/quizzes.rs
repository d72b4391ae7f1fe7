use std::collections::HashSet;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions, Question},
    server::{app::AppState, error::ApiError},
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizRequest {
    previous_questions: Vec<i64>,
    quiz_category: QuizCategory,
}

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum QuizResponse {
    Next { question: Question, success: bool },
    // every question of the category was already asked
    Exhausted { question: bool },
}

/// Picks one question of the category that has not been asked yet, uniformly at random.
fn pick_question(candidates: Vec<Question>, previous: &HashSet<i64>) -> Option<Question> {
    let remaining: Vec<Question> = candidates
        .into_iter()
        .filter(|q| !previous.contains(&q.id))
        .collect();
    remaining.choose(&mut rand::thread_rng()).cloned()
}

async fn next_quiz_question(
    State(pool): State<SqlitePool>,
    body: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResponse<Json<QuizResponse>> {
    // any unusable body is unprocessable here, syntax errors included
    let Json(request) = body.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let previous: HashSet<i64> = request.previous_questions.into_iter().collect();
    let category = request.quiz_category.id;

    let candidates = questions::get_questions_for_category(&pool, category).await?;
    let response = match pick_question(candidates, &previous) {
        Some(question) => {
            let label = category.to_string();
            QUIZ_QUESTIONS_SERVED.with_label_values(&[label.as_str()]).inc();
            tracing::debug!(category, question_id = question.id, "Serving quiz question");
            QuizResponse::Next {
                question,
                success: true,
            }
        }
        None => QuizResponse::Exhausted { question: false },
    };
    Ok(Json(response))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_quiz_question))
        .with_state(state)
}
