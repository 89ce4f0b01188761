//! Configuration for the loam facade.

/// Tuning knobs for reference resolution and fetch assembly.
///
/// The preload depths bound total frontier expansion, not individual store
/// calls: feed views render many shallow sibling references, single entries
/// fewer but deeper ones.
#[derive(Debug, Clone)]
pub struct LoamConfig {
    /// Default object-hop budget for bounded denormalization.
    pub denormalize_depth_limit: u32,
    /// Preload frontier waves for feed and channel views.
    pub preload_depth_feed: u32,
    /// Preload frontier waves for single-entry views.
    pub preload_depth_entry: u32,
    /// Page size when a fetch request does not specify one.
    pub default_page_limit: usize,
}

impl Default for LoamConfig {
    fn default() -> Self {
        Self {
            denormalize_depth_limit: 32,
            preload_depth_feed: 4,
            preload_depth_entry: 16,
            default_page_limit: 20,
        }
    }
}
