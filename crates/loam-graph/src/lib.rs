//! # Loam Graph
//!
//! Bidirectional reference-graph transforms over the stored object graph:
//!
//! - [`normalize`] flattens an embedded document tree into independent
//!   records, replacing embedded objects with bare URL references.
//! - [`Denormalizer`] reconstitutes embedded trees by following URL
//!   references through an [`ObjectStore`](loam_store::ObjectStore), with
//!   cycle and depth safety.
//! - [`substitute`] fills `{name}` placeholders in feed filter templates.
//!
//! Every top-level denormalize call owns its visited set; nothing is shared
//! across calls or threads.

pub mod denormalize;
pub mod error;
pub mod normalize;
pub mod params;

pub use denormalize::Denormalizer;
pub use error::{GraphError, Result};
pub use normalize::normalize;
pub use params::substitute;
