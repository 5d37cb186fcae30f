//! DOCX to PDF conversion through an external converter
//!
//! Conversion is delegated to LibreOffice running headless. Each call gets
//! its own scratch directory and LibreOffice user profile, since concurrent
//! `soffice` processes sharing one profile refuse to start.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("PDF conversion is disabled")]
    Disabled,

    #[error("Failed to launch converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Converter exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("Conversion timed out after {0}s")]
    Timeout(u64),

    #[error("Converter did not produce {0}")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Something that turns a DOCX file into a PDF file
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Convert `docx` into a PDF written at `pdf`.
    ///
    /// Implementations must not modify or remove `docx`.
    async fn convert(&self, docx: &Path, pdf: &Path) -> Result<(), ConvertError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Headless LibreOffice (`soffice --convert-to pdf`)
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    program: String,
    timeout: Duration,
}

impl LibreOfficeConverter {
    pub const DEFAULT_PROGRAM: &'static str = "soffice";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, Self::DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl PdfConverter for LibreOfficeConverter {
    async fn convert(&self, docx: &Path, pdf: &Path) -> Result<(), ConvertError> {
        let scratch = tempfile::Builder::new().prefix("docgen-convert-").tempdir()?;
        let outdir = scratch.path().join("out");
        let profile = scratch.path().join("profile");
        tokio::fs::create_dir_all(&outdir).await?;

        let mut command = Command::new(&self.program);
        command
            .arg("--headless")
            .arg("--norestore")
            .arg(format!("-env:UserInstallation={}", file_url(&profile)))
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&outdir)
            .arg(docx)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(program = %self.program, docx = %docx.display(), "Starting PDF conversion");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ConvertError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_elapsed) => return Err(ConvertError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            return Err(ConvertError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stem = docx
            .file_stem()
            .ok_or_else(|| ConvertError::MissingOutput(pdf.to_path_buf()))?;
        let produced = outdir.join(format!("{}.pdf", stem.to_string_lossy()));
        if !tokio::fs::try_exists(&produced).await.unwrap_or(false) {
            return Err(ConvertError::MissingOutput(produced));
        }

        // scratch may live on another filesystem, so copy rather than rename
        tokio::fs::copy(&produced, pdf).await?;
        info!(pdf = %pdf.display(), "PDF conversion finished");
        Ok(())
    }

    fn name(&self) -> &str {
        "libreoffice"
    }
}

/// `file://` URL of an absolute path, each component percent-encoded
fn file_url(path: &Path) -> String {
    let components: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => {
                Some(urlencoding::encode(&part.to_string_lossy()).into_owned())
            }
            _ => None,
        })
        .collect();
    format!("file:///{}", components.join("/"))
}

/// Converter used when PDF output is turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledConverter;

#[async_trait]
impl PdfConverter for DisabledConverter {
    async fn convert(&self, _docx: &Path, _pdf: &Path) -> Result<(), ConvertError> {
        Err(ConvertError::Disabled)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
