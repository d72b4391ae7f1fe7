use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub label: String,
}

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, type FROM categories ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Category id to label, the shape the API renders under `categories`.
pub async fn get_category_map(pool: &SqlitePool) -> sqlx::Result<BTreeMap<i64, String>> {
    Ok(get_all_categories(pool)
        .await?
        .into_iter()
        .map(|c| (c.id, c.label))
        .collect())
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> sqlx::Result<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, type FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn create_category(pool: &SqlitePool, id: i64, label: &str) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO categories (id, type) VALUES (?1, ?2)
        "#,
    )
    .bind(id)
    .bind(label)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Replaces the category table with `categories`, keeping ids.
///
/// Questions still pointing at a removed category make this fail on the foreign key,
/// so callers importing a full data set import questions in the same transaction.
pub async fn import_categories(
    conn: &mut sqlx::SqliteConnection,
    categories: Vec<Category>,
) -> sqlx::Result<()> {
    let existing: Vec<i64> = sqlx::query_scalar("SELECT id FROM categories")
        .fetch_all(&mut *conn)
        .await?;
    let new_ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    for id in existing.into_iter().filter(|id| !new_ids.contains(id)) {
        sqlx::query("DELETE FROM categories WHERE categories.id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    for category in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, type) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET type = excluded.type
            "#,
        )
        .bind(category.id)
        .bind(category.label)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn lists_categories_in_id_order() {
        let pool = test_pool().await;
        create_category(&pool, 3, "Geography").await.unwrap();
        create_category(&pool, 1, "Science").await.unwrap();

        let categories = get_all_categories(&pool).await.unwrap();
        assert_eq!(
            categories,
            vec![
                Category { id: 1, label: "Science".to_owned() },
                Category { id: 3, label: "Geography".to_owned() },
            ]
        );

        let map = get_category_map(&pool).await.unwrap();
        assert_eq!(map.get(&3).map(String::as_str), Some("Geography"));
    }

    #[tokio::test]
    async fn missing_category_is_row_not_found() {
        let pool = test_pool().await;
        let err = get_category(&pool, 42).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn import_replaces_stale_categories() {
        let pool = test_pool().await;
        create_category(&pool, 1, "Science").await.unwrap();
        create_category(&pool, 2, "Art").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        import_categories(
            &mut conn,
            vec![
                Category { id: 2, label: "Fine Art".to_owned() },
                Category { id: 5, label: "Sports".to_owned() },
            ],
        )
        .await
        .unwrap();
        drop(conn);

        let labels: Vec<String> = get_all_categories(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["Fine Art", "Sports"]);
    }
}
