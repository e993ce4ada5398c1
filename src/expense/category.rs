//! The fixed set of expense categories.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// One of the fixed categories an expense can belong to.
///
/// The set is closed: form validation rejects anything outside it, and
/// filtering by a string that is not a valid code simply matches no rows.
/// The storage code and the display name are the same string for this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Utilities,
    Healthcare,
    Shopping,
    Other,
}

impl Category {
    /// Every category, in the order they are shown in select inputs.
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Utilities,
        Category::Healthcare,
        Category::Shopping,
        Category::Other,
    ];

    /// The code the category is stored and submitted as.
    pub fn code(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Other => "Other",
        }
    }

    /// The human readable name shown in pages and JSON payloads.
    pub fn display_name(self) -> &'static str {
        self.code()
    }

    /// Look up a category by its code. Codes are case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.code() == code)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.code().into())
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;

        Category::from_code(code).ok_or_else(|| {
            FromSqlError::Other(format!("unknown expense category {code:?}").into())
        })
    }
}

#[cfg(test)]
mod category_tests {
    use super::Category;

    #[test]
    fn from_code_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
    }

    #[test]
    fn from_code_rejects_unknown_code() {
        assert_eq!(Category::from_code("Groceries"), None);
    }

    #[test]
    fn from_code_is_case_sensitive() {
        assert_eq!(Category::from_code("food"), None);
    }
}
