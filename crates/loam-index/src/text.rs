//! Weighted text extraction for the full-text index.
//!
//! Titles and item names rank above body text: `name`/`item` extract at
//! weight A, `summary`/`content` at weight B. Nested property values are
//! flattened to their string leaves before indexing.

use loam_core::{string_leaves, StoredObject};

/// Ranking weight for an extracted text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextWeight {
    /// Title-tier text (`name`, `item`).
    A,
    /// Body-tier text (`summary`, `content`).
    B,
}

/// One extracted, weighted text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedText {
    pub weight: TextWeight,
    pub text: String,
}

const WEIGHT_A_PROPERTIES: [&str; 2] = ["name", "item"];
const WEIGHT_B_PROPERTIES: [&str; 2] = ["summary", "content"];

/// Extract the indexable text of an object, in property order.
///
/// Empty strings are dropped; an object with none of the indexed properties
/// extracts to nothing and should simply not be indexed.
pub fn extract_text(object: &StoredObject) -> Vec<WeightedText> {
    let mut fields = Vec::new();
    for (names, weight) in [
        (WEIGHT_A_PROPERTIES, TextWeight::A),
        (WEIGHT_B_PROPERTIES, TextWeight::B),
    ] {
        for name in names {
            if let Some(value) = object.properties.get(name) {
                let mut leaves = Vec::new();
                string_leaves(value, &mut leaves);
                fields.extend(
                    leaves
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .map(|text| WeightedText { weight, text }),
                );
            }
        }
    }
    fields
}
