//! Solventa Validator
//!
//! Cross-checks extracted proposals against the embedded images of their
//! source documents. Extraction only sees text; a screenshot pasted next
//! to a proposal may carry the actual evidence, so any image sharing
//! space with a proposal downgrades the file to a manual-review warning.
//!
//! # Examples
//!
//! ```
//! use solventa_validator::{ImageValidator, ValidatorConfig};
//!
//! let mut validator = ImageValidator::new(ValidatorConfig::default());
//! // validator.validate_file(filename, &document, &candidates);
//! let consolidated = validator.consolidated();
//! assert_eq!(consolidated.overall_state, "VÁLIDO");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidatorConfig;
pub use error::ValidatorError;
pub use validator::{
    ConsolidatedImageReport, FileImageReport, FlaggedProposal, ImageDescriptor, ImageValidator,
    ValidationStatus,
};
