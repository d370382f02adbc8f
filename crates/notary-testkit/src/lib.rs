//! # Notary Testkit
//!
//! Testing utilities for the document notary.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed encodings, digests and signatures for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A registry on a manual clock, plus deterministic parties
//!
//! ## Golden Vectors
//!
//! ```rust
//! use notary_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, digest) in verify_all_vectors() {
//!     println!("{}: {} ({})", name, digest, matches);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use notary_testkit::generators::CreateParams;
//!
//! proptest! {
//!     #[test]
//!     fn digest_is_deterministic(params: CreateParams) {
//!         let program = notary_testkit::fixtures::program_id();
//!         let auth = params.authorization();
//!         prop_assert_eq!(auth.digest(&program), auth.digest(&program));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use notary::StrategyKind;
//! use notary_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::memory(StrategyKind::Segmented);
//! fixture.clock.advance(60);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{parties, sender_and_receiver, ManualClock, TestFixture};
pub use generators::{CreateParams, OpenParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
