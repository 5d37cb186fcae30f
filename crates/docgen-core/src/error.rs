//! Error types for document generation

use std::io;

use thiserror::Error;

use crate::xml::XmlError;

#[derive(Error, Debug)]
pub enum DocgenError {
    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    #[error("Package is missing part: {0}")]
    MissingPart(String),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl DocgenError {
    /// Re-label a package/parse failure as a failure of the named template.
    pub(crate) fn into_template_error(self, name: &str) -> Self {
        match self {
            DocgenError::Xml(_) | DocgenError::Zip(_) | DocgenError::MissingPart(_) => {
                DocgenError::InvalidTemplate {
                    name: name.to_string(),
                    reason: self.to_string(),
                }
            }
            other => other,
        }
    }

    /// True when the failure comes from the template rather than the output side.
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            DocgenError::TemplateNotFound(_) | DocgenError::InvalidTemplate { .. }
        )
    }
}
