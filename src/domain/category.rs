use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Trending shelves the catalog can be browsed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Fiction,
    NonFiction,
    Business,
    Technology,
    Science,
    Romance,
    Mystery,
    Biography,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Fiction,
        Category::NonFiction,
        Category::Business,
        Category::Technology,
        Category::Science,
        Category::Romance,
        Category::Mystery,
        Category::Biography,
    ];

    /// Subject query sent to the catalog.
    pub fn query(self) -> &'static str {
        match self {
            Category::Fiction => "subject:fiction",
            Category::NonFiction => "subject:non-fiction",
            Category::Business => "subject:business",
            Category::Technology => "subject:computers",
            Category::Science => "subject:science",
            Category::Romance => "subject:romance",
            Category::Mystery => "subject:mystery",
            Category::Biography => "subject:biography+autobiography",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::Fiction => "fiction",
            Category::NonFiction => "non-fiction",
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Romance => "romance",
            Category::Mystery => "mystery",
            Category::Biography => "biography",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::NonFiction => "Non-Fiction",
            Category::Business => "Business",
            Category::Technology => "Technology",
            Category::Science => "Science",
            Category::Romance => "Romance",
            Category::Mystery => "Mystery",
            Category::Biography => "Biography",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Category::ALL.iter().map(|c| c.slug()).collect();
                format!("unknown category '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
