//! Text-index trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{IndexError, Result};
use crate::text::WeightedText;

/// A full-text index fed by extracted, weighted text.
///
/// (Re)indexing is whole-document: `index` replaces everything previously
/// stored for a URL, matching the store's replace-on-write semantics.
#[async_trait]
pub trait TextIndex: Send + Sync {
    /// Replace the indexed text for a URL.
    async fn index(&self, url: &str, fields: &[WeightedText]) -> Result<()>;

    /// Drop a URL from the index.
    async fn remove(&self, url: &str) -> Result<()>;
}

/// In-memory text index for tests and single-node use.
///
/// Stores the extracted fields verbatim; search/ranking belongs to a real
/// search backend behind the same trait.
pub struct MemoryTextIndex {
    entries: RwLock<HashMap<String, Vec<WeightedText>>>,
}

impl MemoryTextIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The fields currently indexed for a URL.
    pub fn fields(&self, url: &str) -> Option<Vec<WeightedText>> {
        self.entries.read().ok()?.get(url).cloned()
    }
}

impl Default for MemoryTextIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextIndex for MemoryTextIndex {
    async fn index(&self, url: &str, fields: &[WeightedText]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| IndexError::Backend(e.to_string()))?;
        entries.insert(url.to_string(), fields.to_vec());
        Ok(())
    }

    async fn remove(&self, url: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| IndexError::Backend(e.to_string()))?;
        entries.remove(url);
        Ok(())
    }
}

/// A text index that ignores everything. The default when search is not
/// wired up.
pub struct NullTextIndex;

#[async_trait]
impl TextIndex for NullTextIndex {
    async fn index(&self, _url: &str, _fields: &[WeightedText]) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextWeight;

    #[tokio::test]
    async fn test_index_replaces_previous_fields() {
        let index = MemoryTextIndex::new();
        let url = "https://a.example/1";

        index
            .index(url, &[WeightedText { weight: TextWeight::A, text: "old".into() }])
            .await
            .unwrap();
        index
            .index(url, &[WeightedText { weight: TextWeight::B, text: "new".into() }])
            .await
            .unwrap();

        let fields = index.fields(url).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].text, "new");
    }

    #[tokio::test]
    async fn test_remove() {
        let index = MemoryTextIndex::new();
        index
            .index("https://a.example/1", &[WeightedText { weight: TextWeight::A, text: "t".into() }])
            .await
            .unwrap();
        index.remove("https://a.example/1").await.unwrap();
        assert!(index.fields("https://a.example/1").is_none());
    }
}
