// Merchant category value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Electronics,
    Retail,
    Travel,
    Services,
    Groceries,
    /// Any label outside the known set, kept verbatim.
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 5] = [
        Category::Electronics,
        Category::Retail,
        Category::Travel,
        Category::Services,
        Category::Groceries,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Electronics => "Electronics",
            Category::Retail => "Retail",
            Category::Travel => "Travel",
            Category::Services => "Services",
            Category::Groceries => "Groceries",
            Category::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "electronics" => Category::Electronics,
            "retail" => Category::Retail,
            "travel" => Category::Travel,
            "services" => Category::Services,
            "groceries" => Category::Groceries,
            _ => Category::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from(s.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
