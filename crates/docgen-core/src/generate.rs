//! Template to DOCX/PDF generation pipeline

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::convert::PdfConverter;
use crate::docx::DocxPackage;
use crate::error::DocgenError;
use crate::fields::FieldSet;
use crate::kinds::DocumentKind;
use crate::substitute::SubstitutionReport;

/// Warning returned when the DOCX was produced but the PDF was not
pub const PDF_FAILED_WARNING: &str = "PDF conversion failed, only DOCX is available";

const NAME_ATTEMPTS: usize = 5;

/// Files produced by one generation
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub docx_filename: String,
    pub pdf_filename: Option<String>,
    pub warning: Option<String>,
    pub report: SubstitutionReport,
}

/// Fills templates from one directory into another
#[derive(Clone)]
pub struct DocumentGenerator {
    templates_dir: PathBuf,
    output_dir: PathBuf,
    converter: Arc<dyn PdfConverter>,
}

impl DocumentGenerator {
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        converter: Arc<dyn PdfConverter>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            output_dir: output_dir.into(),
            converter,
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn converter_name(&self) -> &str {
        self.converter.name()
    }

    pub fn template_path(&self, kind: DocumentKind) -> PathBuf {
        self.templates_dir.join(kind.template_file())
    }

    /// Fill the template for `kind`, save the DOCX and try to convert it.
    ///
    /// Template and save failures abort with an error and leave no output.
    /// A conversion failure still returns the DOCX, with a warning set.
    pub async fn generate(
        &self,
        kind: DocumentKind,
        fields: &FieldSet,
    ) -> Result<GeneratedDocument, DocgenError> {
        let template_path = self.template_path(kind);
        info!(
            kind = %kind,
            template = %template_path.display(),
            fields = fields.len(),
            "Generating document"
        );

        if !tokio::fs::try_exists(&template_path).await.unwrap_or(false) {
            error!(template = %template_path.display(), "Template file not found");
            return Err(DocgenError::TemplateNotFound(kind.template_file().to_string()));
        }

        let output_dir = self.output_dir.clone();
        let fields = fields.clone();
        let (stem, report) = tokio::task::spawn_blocking(move || {
            render_to_disk(kind, &template_path, &fields, &output_dir)
        })
        .await
        .map_err(|e| DocgenError::Task(e.to_string()))??;

        let docx_filename = format!("{stem}.docx");
        let pdf_filename = format!("{stem}.pdf");
        let docx_path = self.output_dir.join(&docx_filename);
        let pdf_path = self.output_dir.join(&pdf_filename);

        info!(docx = %docx_path.display(), "Converting Word to PDF");
        let (pdf_filename, warning) = match self.converter.convert(&docx_path, &pdf_path).await {
            Ok(()) => (Some(pdf_filename), None),
            Err(e) => {
                error!(converter = self.converter.name(), "PDF conversion failed: {}", e);
                if let Err(e) = tokio::fs::remove_file(&pdf_path).await {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!(pdf = %pdf_path.display(), "Could not remove partial PDF: {}", e);
                    }
                }
                (None, Some(PDF_FAILED_WARNING.to_string()))
            }
        };

        Ok(GeneratedDocument {
            kind,
            docx_filename,
            pdf_filename,
            warning,
            report,
        })
    }
}

/// `{prefix}_{8 hex chars}`
pub fn unique_stem(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..8])
}

fn render_to_disk(
    kind: DocumentKind,
    template_path: &Path,
    fields: &FieldSet,
    output_dir: &Path,
) -> Result<(String, SubstitutionReport), DocgenError> {
    let template_name = kind.template_file();

    let mut package =
        DocxPackage::open(template_path).map_err(|e| e.into_template_error(template_name))?;
    let report = package
        .fill(fields)
        .map_err(|e| e.into_template_error(template_name))?;

    info!(kind = %kind, replaced = report.replaced, "Template filled");
    if !report.unresolved.is_empty() {
        warn!(
            kind = %kind,
            "Placeholders left without a value: {:?}",
            report.unresolved
        );
    }

    for _ in 0..NAME_ATTEMPTS {
        let stem = unique_stem(kind.output_prefix());
        let docx_path = output_dir.join(format!("{stem}.docx"));
        match package.save_new(&docx_path) {
            Ok(()) => {
                info!(docx = %docx_path.display(), "Saved Word document");
                return Ok((stem, report));
            }
            Err(DocgenError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(docx = %docx_path.display(), "Output name collision, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(DocgenError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "could not allocate a unique output filename",
    )))
}
