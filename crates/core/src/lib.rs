//! Multi-target code synthesis from OpenAPI documents.
//!
//! The pipeline runs in four stages, each consuming the previous one's
//! output:
//!
//! 1. [`normalize`]: rewrite irregular schema constructs in the parsed document
//! 2. [`ir`]: lower the document into arenas of models and operations
//! 3. [`resolve`]: attach generic envelopes, union dispatch tables and
//!    parameter bindings as side tables
//! 4. [`emit`]: render the resolved API for one target
//!
//! [`pipeline`] chains the stages.

pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod naming;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod spec;

pub use config::GeneratorConfig;
pub use emit::{Artifact, ExclusionReason, GeneratedCode, Target};
pub use error::{ClassificationError, Error, Result};
pub use pipeline::{generate, generate_from_str, prepare, prepare_from_str};
pub use resolve::ResolvedApi;
