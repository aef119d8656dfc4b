//! Core types for the Recette language service.
//!
//! This crate holds the pieces every analysis stage shares: the positioned
//! [`Span`] model, the [`LineIndex`] that maps offsets to line/character
//! pairs, immutable [`Document`] snapshots and the [`Vocabulary`] that
//! configures the validator and the query engine. It knows nothing about
//! parsing.

/// Immutable document snapshots.
pub mod document;
/// Error types used throughout the crate.
pub mod error;
/// Offset ↔ line/character conversion.
pub mod line_index;
/// Positions and half-open spans.
pub mod position;
/// Reserved words of the recipe language.
pub mod vocabulary;

pub use document::Document;
pub use error::{RecetteError, RecetteResult};
pub use line_index::LineIndex;
pub use position::{Position, Span};
pub use vocabulary::Vocabulary;
