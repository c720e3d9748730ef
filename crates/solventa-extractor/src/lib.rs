//! Solventa Extraction Layer
//!
//! Turns parsed audit documents into proposal candidates.
//!
//! # Pipeline position
//!
//! The binary container parser is an external collaborator; it hands this
//! crate a [`document::ParsedDocument`]. From there:
//!
//! 1. [`metadata::MetadataExtractor`] derives entity, funding sources,
//!    period and document type from the filename and sheet names.
//! 2. [`structural::StructuralExtractor`] runs the keyword/position scan,
//!    the primary extraction path.
//! 3. [`fallback::FallbackExtractor`] consults the generative provider
//!    only when the structural scan found nothing, and degrades to an
//!    empty list on any failure.
//!
//! Candidates from both paths share one shape and are tagged with their
//! extraction method.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod enrich;
pub mod error;
pub mod fallback;
pub mod markup;
pub mod metadata;
pub mod structural;

pub use config::ExtractorConfig;
pub use document::{JsonDocumentParser, ParsedDocument};
pub use error::ExtractorError;
pub use fallback::FallbackExtractor;
pub use metadata::MetadataExtractor;
pub use structural::{StructuralExtraction, StructuralExtractor};
