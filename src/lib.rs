//! reqforge: turn unstructured requirement documents into a consolidated
//! product requirements document and role-assigned, estimated tasks.
//!
//! ## Pipeline
//!
//! - `corpus` merges documents behind banners and a manifest
//! - `chunk` splits the corpus into line-preserving chunks
//! - `extract` runs one generation call per chunk, with keyword fallback
//! - `consolidate` deduplicates, caps and default-backs the partials
//! - `estimate` generates, distributes and clamps tasks per role
//! - `pipeline` orchestrates both runs with pacing and cancellation
//!
//! Generation goes through the `engine::Engine` trait; documents go out
//! through `render::DocumentRenderer` and tasks through `sink::WorkItemSink`.

pub mod chunk;
pub mod color;
pub mod config;
pub mod consolidate;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod extract;
pub mod log;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod roster;
pub mod shutdown;
pub mod sink;
#[doc(hidden)]
pub mod testutil;

pub use error::{PipelineError, Result};
