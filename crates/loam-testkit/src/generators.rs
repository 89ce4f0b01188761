//! Proptest strategies for document trees.
//!
//! Generated trees are always acyclic and every node gets a unique
//! canonical URL, so normalize/denormalize round-trip properties hold by
//! construction.

use proptest::prelude::*;
use serde_json::{json, Value};

use loam_core::StoredObject;

/// The shape of a document tree; node payloads are filled in
/// deterministically by [`document_from_shape`].
#[derive(Debug, Clone)]
pub struct TreeShape {
    pub children: Vec<TreeShape>,
}

impl TreeShape {
    /// Total node count, root included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeShape::size).sum::<usize>()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> u32 {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Trees up to 4 levels deep with up to 3 embedded replies per node.
pub fn arb_tree_shape() -> impl Strategy<Value = TreeShape> {
    let leaf = Just(TreeShape { children: vec![] });
    leaf.prop_recursive(4, 16, 3, |inner| {
        prop::collection::vec(inner, 0..3).prop_map(|children| TreeShape { children })
    })
}

/// Build a concrete document from a shape.
///
/// Nodes are numbered in pre-order; node `n` gets the URL
/// `https://t.example/{n}`, a distinct name, and its subtree embedded
/// under the `comment` property.
pub fn document_from_shape(shape: &TreeShape) -> StoredObject {
    let mut counter = 0;
    let value = build(shape, &mut counter);
    match StoredObject::from_value(value) {
        Ok(object) => object,
        Err(_) => unreachable!("generated documents are well-formed"),
    }
}

fn build(shape: &TreeShape, counter: &mut u32) -> Value {
    let n = *counter;
    *counter += 1;

    let comments: Vec<Value> = shape
        .children
        .iter()
        .map(|child| build(child, counter))
        .collect();

    let mut properties = json!({
        "url": [format!("https://t.example/{n}")],
        "name": [format!("entry {n}")]
    });
    if !comments.is_empty() {
        properties["comment"] = Value::Array(comments);
    }

    json!({"type": ["h-entry"], "properties": properties})
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_urls_are_unique(shape in arb_tree_shape()) {
            let document = document_from_shape(&shape);
            let mut urls = std::collections::BTreeSet::new();
            collect(&document.to_value(), &mut urls);
            prop_assert_eq!(urls.len(), shape.size());
        }
    }

    fn collect(value: &serde_json::Value, urls: &mut std::collections::BTreeSet<String>) {
        match value {
            serde_json::Value::Object(map) => {
                if let Some(serde_json::Value::Array(url)) = map.get("url") {
                    if let Some(serde_json::Value::String(u)) = url.first() {
                        urls.insert(u.clone());
                    }
                }
                for v in map.values() {
                    collect(v, urls);
                }
            }
            serde_json::Value::Array(items) => {
                for v in items {
                    collect(v, urls);
                }
            }
            _ => {}
        }
    }
}
