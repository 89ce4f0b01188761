//! # Loam Testkit
//!
//! Testing utilities for loam.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Pre-seeded stores and document builders for common
//!   scenarios (threads, feeds, reader channels)
//! - **Generators**: Proptest strategies producing acyclic document trees
//!   with unique canonical URLs
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use loam_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! fixture.seed_thread().await;
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use loam_testkit::generators::{arb_tree_shape, document_from_shape};
//!
//! proptest! {
//!     #[test]
//!     fn normalize_is_complete(shape in arb_tree_shape()) {
//!         let document = document_from_shape(&shape);
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{entry, entry_at, TestFixture};
pub use generators::{arb_tree_shape, document_from_shape, TreeShape};
