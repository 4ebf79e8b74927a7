//! slate-util - Shared foundation types for the Slate interpreter.
//!
//! This crate holds the pieces every pipeline phase needs:
//!
//! - [`Span`] - source location tracking (byte offsets plus line/column)
//! - [`Diagnostic`] - human-readable error rendering against the source text
//! - [`IndexVec`] - vectors with typed indices, used for the environment arena
//!
//! The phases themselves (`slate-lex`, `slate-par`, `slate-eval`) define
//! their own error enums; this crate only provides the location and
//! presentation plumbing those errors share.

mod diagnostic;
mod index_vec;
mod span;

pub use diagnostic::{Diagnostic, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;

// Re-export the hash map used throughout the interpreter so downstream
// crates agree on one implementation.
pub use rustc_hash::FxHashMap;
