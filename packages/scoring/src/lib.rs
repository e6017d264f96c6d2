#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Composite natural-beauty scoring.
//!
//! Fuses the reconciled canopy estimate with terrain, land-cover, water,
//! street-tree, and scenic-viewpoint signals into a single 0-100 score
//! plus a full per-component breakdown. The pipeline is infallible:
//! degraded inputs degrade the score and attach warnings, they never
//! produce errors.
//!
//! Tunable parameters (area-type weights, greenery multipliers,
//! expectation scalers, normalization curves, the dominance guard) live
//! in [`ScoringConfig`], loadable from TOML.

pub mod config;
pub mod context;
pub mod normalize;
pub mod pipeline;
pub mod scenic;
pub mod streets;
pub mod tree;
pub mod validate;

pub use config::{NormalizationParams, ScoringConfig, WeightTriple};
pub use context::context_bonus;
pub use normalize::{NormalizedScore, normalize};
pub use pipeline::{BeautyScorer, ScoreRequest};
pub use scenic::scenic_bonus;
pub use streets::{NoStreetTreeData, StreetTreeProvider};
pub use tree::{TreeComponents, compose, score_tree_canopy};
pub use validate::validate;
