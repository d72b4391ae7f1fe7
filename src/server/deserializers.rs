use serde::{Deserialize, Deserializer};

pub fn first_page() -> i64 {
    1
}

// `?page=` is looked up leniently: anything that is not an integer means the first page.
// Zero and negative pages are kept, they select nothing.
pub fn deserialize_page<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or_else(first_page))
}
