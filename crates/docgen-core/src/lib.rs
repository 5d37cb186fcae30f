//! Word template filling for the document generator
//!
//! This crate holds everything below the HTTP layer:
//! - `docx` / `xml`: reading and writing DOCX packages
//! - `substitute`: `{{KEY}}` placeholder replacement in paragraphs and tables
//! - `kinds` / `fields`: the document types and their request schemas
//! - `convert`: DOCX to PDF through an external converter
//! - `retention`: deletion of old generated files
//! - `generate`: the pipeline tying these together

pub mod convert;
pub mod docx;
pub mod error;
pub mod fields;
pub mod generate;
pub mod kinds;
pub mod retention;
pub mod substitute;
pub mod xml;

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;

pub use convert::{ConvertError, DisabledConverter, LibreOfficeConverter, PdfConverter};
pub use docx::DocxPackage;
pub use error::DocgenError;
pub use fields::{extract_fields, FieldSet, FieldSpec, SchemaError};
pub use generate::{DocumentGenerator, GeneratedDocument, PDF_FAILED_WARNING};
pub use kinds::DocumentKind;
pub use retention::{RetentionSweeper, SweepReport, DEFAULT_RETAIN};
pub use substitute::{find_placeholders, substitute_blocks, Placeholder, SubstitutionReport};
