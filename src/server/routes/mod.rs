mod categories;
mod questions;
mod quizzes;

use serde::Deserialize;

pub use categories::categories_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

use super::deserializers::{deserialize_page, first_page};
use super::error::ApiError;

pub type ApiResponse<T> = Result<T, ApiError>;

pub const QUESTIONS_PER_PAGE: usize = 10;

#[derive(Deserialize, Debug)]
pub struct PageQuery {
    #[serde(default = "first_page", deserialize_with = "deserialize_page")]
    page: i64,
}

/// The `page`-th slice of `QUESTIONS_PER_PAGE` items, counting from 1.
/// Pages below 1 are empty.
pub fn paginate<T>(selection: Vec<T>, page: i64) -> Vec<T> {
    let Ok(offset) = usize::try_from(page.saturating_sub(1)) else {
        return Vec::new();
    };
    let start = offset.saturating_mul(QUESTIONS_PER_PAGE);
    selection
        .into_iter()
        .skip(start)
        .take(QUESTIONS_PER_PAGE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_pages_of_ten() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(items.clone(), 1), (1..=10).collect::<Vec<_>>());
        assert_eq!(paginate(items.clone(), 3), vec![21, 22, 23, 24, 25]);
        assert!(paginate(items.clone(), 4).is_empty());
        assert!(paginate(items, i64::MAX).is_empty());
    }

    #[test]
    fn pages_below_one_are_empty() {
        let items: Vec<u32> = (1..=25).collect();
        assert!(paginate(items.clone(), 0).is_empty());
        assert!(paginate(items.clone(), -1).is_empty());
        assert!(paginate(items, i64::MIN).is_empty());
    }
}
