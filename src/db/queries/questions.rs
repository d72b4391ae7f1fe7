use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::escape_like;

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

pub struct NewQuestion<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub category: i64,
    pub difficulty: i64,
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty
        FROM questions WHERE questions.category = ?1 ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

/// Case-insensitive substring match on the question text.
///
/// SQLite's `LIKE` only folds ASCII case, so non-ASCII terms are matched in Rust.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    if !term.is_ascii() {
        let needle = term.to_lowercase();
        return Ok(get_all_questions(pool)
            .await?
            .into_iter()
            .filter(|q| q.question.to_lowercase().contains(&needle))
            .collect());
    }
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty
        FROM questions WHERE questions.question LIKE '%' || ?1 || '%' ESCAPE '\'
        ORDER BY id
        "#,
    )
    .bind(escape_like(term))
    .fetch_all(pool)
    .await
}

pub async fn create_question(pool: &SqlitePool, new: NewQuestion<'_>) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(new.question)
    .bind(new.answer)
    .bind(new.category)
    .bind(new.difficulty)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Deletes a question, failing with `RowNotFound` when nothing was deleted.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    if deleted == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Replaces the question table with `questions`, keeping ids.
pub async fn import_questions(
    conn: &mut sqlx::SqliteConnection,
    questions: Vec<Question>,
) -> sqlx::Result<()> {
    let existing: Vec<i64> = sqlx::query_scalar("SELECT id FROM questions")
        .fetch_all(&mut *conn)
        .await?;
    let new_ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    for id in existing.into_iter().filter(|id| !new_ids.contains(id)) {
        sqlx::query("DELETE FROM questions WHERE questions.id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    for question in questions {
        sqlx::query(
            r#"
            INSERT INTO questions (id, question, answer, category, difficulty)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                category = excluded.category,
                difficulty = excluded.difficulty
            "#,
        )
        .bind(question.id)
        .bind(question.question)
        .bind(question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::categories::create_category;
    use crate::db::test_pool;
    use pretty_assertions::assert_eq;

    async fn seeded_pool() -> SqlitePool {
        let pool = test_pool().await;
        create_category(&pool, 1, "Science").await.unwrap();
        create_category(&pool, 2, "History").await.unwrap();
        for (question, category) in [
            ("What is the heaviest organ in the human body?", 1),
            ("Who discovered penicillin?", 1),
            ("Which dung beetle was worshipped by the ancient Egyptians?", 2),
            ("Was 100% of Ménière's research in Paris?", 2),
        ] {
            create_question(
                &pool,
                NewQuestion {
                    question,
                    answer: "answer",
                    category,
                    difficulty: 1,
                },
            )
            .await
            .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn ids_follow_insertion_order() {
        let pool = seeded_pool().await;
        let ids: Vec<i64> = get_all_questions(&pool)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(count_questions(&pool).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn filters_by_category() {
        let pool = seeded_pool().await;
        let questions = get_questions_for_category(&pool, 2).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.category == 2));
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let pool = seeded_pool().await;
        let found = search_questions(&pool, "PENICILLIN").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].question, "Who discovered penicillin?");

        let found = search_questions(&pool, "MÉNIÈRE").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let pool = seeded_pool().await;
        assert_eq!(search_questions(&pool, "100%").await.unwrap().len(), 1);
        assert!(search_questions(&pool, "_iscovered").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_violates_foreign_key() {
        let pool = seeded_pool().await;
        let err = create_question(
            &pool,
            NewQuestion {
                question: "Orphan?",
                answer: "yes",
                category: 99,
                difficulty: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(err
            .as_database_error()
            .is_some_and(|e| e.is_foreign_key_violation()));
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let pool = seeded_pool().await;
        delete_question(&pool, 2).await.unwrap();
        assert!(matches!(
            delete_question(&pool, 2).await,
            Err(sqlx::Error::RowNotFound)
        ));
        assert!(get_all_questions(&pool)
            .await
            .unwrap()
            .iter()
            .all(|q| q.id != 2));
        assert_eq!(count_questions(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let pool = seeded_pool().await;
        delete_question(&pool, 4).await.unwrap();
        let id = create_question(
            &pool,
            NewQuestion {
                question: "New?",
                answer: "yes",
                category: 1,
                difficulty: 2,
            },
        )
        .await
        .unwrap();
        assert_eq!(id, 5);
    }
}
