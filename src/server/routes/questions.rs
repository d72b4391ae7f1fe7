use std::collections::BTreeMap;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        error::ApiError,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    telemetry::{QUESTIONS_CREATED, QUESTIONS_DELETED},
};

use super::{paginate, ApiResponse, PageQuery};

#[derive(Deserialize)]
struct NewQuestionBody {
    question: Option<String>,
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm")]
    search_term: Option<Value>,
}

/// The text to search for, `None` when the term is empty or falsy.
///
/// Numbers and `true` are searched by their printed form, containers never match.
fn search_text(term: Value) -> Option<String> {
    match term {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_owned()),
        _ => None,
    }
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: i64,
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct DeletedResponse {
    success: bool,
    deleted: i64,
    questions: Vec<Question>,
    total_questions: i64,
}

#[derive(Serialize)]
struct CreatedResponse {
    success: bool,
    created: i64,
    questions: Vec<Question>,
    total_questions: i64,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    questions: Vec<Question>,
    current_category: Option<String>,
}

/// The requested page over all questions, plus the table size.
async fn current_page(pool: &SqlitePool, page: i64) -> sqlx::Result<(Vec<Question>, i64)> {
    let selection = questions::get_all_questions(pool).await?;
    let total = questions::count_questions(pool).await?;
    Ok((paginate(selection, page), total))
}

async fn get_questions(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<Json<QuestionsPage>> {
    let (questions, total_questions) = current_page(&pool, query.page).await?;
    let categories = categories::get_category_map(&pool).await?;
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions,
        categories,
    }))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(question_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<Json<DeletedResponse>> {
    questions::delete_question(&pool, question_id).await?;
    QUESTIONS_DELETED.inc();
    tracing::info!(question_id, "Deleted question");

    let (questions, total_questions) = current_page(&pool, query.page).await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted: question_id,
        questions,
        total_questions,
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
    ApiJson(body): ApiJson<NewQuestionBody>,
) -> ApiResponse<Json<CreatedResponse>> {
    let (Some(question), Some(answer), Some(difficulty), Some(category)) =
        (body.question, body.answer, body.difficulty, body.category)
    else {
        return Err(ApiError::Unprocessable(
            "question, answer, difficulty and category are required".to_owned(),
        ));
    };

    let created = questions::create_question(
        &pool,
        NewQuestion {
            question: &question,
            answer: &answer,
            category,
            difficulty,
        },
    )
    .await?;
    QUESTIONS_CREATED.inc();
    tracing::info!(question_id = created, category, "Created question");

    let (questions, total_questions) = current_page(&pool, query.page).await?;
    Ok(Json(CreatedResponse {
        success: true,
        created,
        questions,
        total_questions,
    }))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<SearchResponse>> {
    let term = body
        .search_term
        .and_then(search_text)
        .ok_or(ApiError::NotFound)?;
    let questions = questions::search_questions(&pool, &term).await?;
    tracing::debug!(term = %term, matches = questions.len(), "Searched questions");
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(SearchResponse {
        success: true,
        questions,
        current_category: None,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(get_questions).post(create_question))
        .route("/questions/{question_id}", delete(delete_question))
        .route("/questions/search", post(search_questions))
        .with_state(state)
}
