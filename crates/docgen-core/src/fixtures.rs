//! In-memory DOCX builders and a stub converter for tests
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for downstream test suites.

use std::io::{Cursor, Write};
use std::path::Path;

use async_trait::async_trait;
use quick_xml::escape::partial_escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::convert::{ConvertError, PdfConverter};
use crate::kinds::DocumentKind;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// A paragraph with one run per entry of `runs`
pub fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|text| {
            format!(
                r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                partial_escape(text)
            )
        })
        .collect();
    format!("<w:p>{runs}</w:p>")
}

/// A table with one single-run paragraph per cell
pub fn table<S: AsRef<str>, R: AsRef<[S]>>(rows: &[R]) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .as_ref()
                .iter()
                .map(|cell| format!("<w:tc><w:tcPr/>{}</w:tc>", paragraph(&[cell.as_ref()])))
                .collect();
            format!("<w:tr>{cells}</w:tr>")
        })
        .collect();
    format!("<w:tbl><w:tblPr/><w:tblGrid/>{rows}</w:tbl>")
}

pub fn document_xml(blocks: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        blocks.concat()
    )
}

pub fn header(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| paragraph(&[*p])).collect();
    format!(r#"<w:hdr xmlns:w="{W_NS}">{body}</w:hdr>"#)
}

pub fn footer(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| paragraph(&[*p])).collect();
    format!(r#"<w:ftr xmlns:w="{W_NS}">{body}</w:ftr>"#)
}

/// A zip archive holding exactly `parts`
pub fn zip_of(parts: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        zip.write_all(content.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

pub fn docx(blocks: &[String]) -> Vec<u8> {
    docx_with_parts(blocks, &[])
}

pub fn docx_with_parts(blocks: &[String], extra: &[(&str, String)]) -> Vec<u8> {
    let mut parts = vec![
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("word/document.xml", document_xml(blocks)),
    ];
    parts.extend(extra.iter().cloned());
    zip_of(&parts)
}

/// A template for `kind`: a title, then `FIELD: {{PLACEHOLDER}}` per field.
pub fn template_for(kind: DocumentKind) -> Vec<u8> {
    let mut blocks = vec![paragraph(&[kind.label()])];
    for spec in kind.fields() {
        let marker = format!("{{{{{}}}}}", spec.placeholder);
        let label = format!("{}: ", spec.field);
        blocks.push(paragraph(&[label.as_str(), marker.as_str()]));
    }
    docx(&blocks)
}

/// Write a template for every kind into `dir`, under its expected filename.
pub fn write_all_templates(dir: &Path) {
    for kind in DocumentKind::ALL {
        std::fs::write(dir.join(kind.template_file()), template_for(kind)).expect("write template");
    }
}

/// Converter that writes a placeholder PDF, or fails after leaving a partial one
#[derive(Debug, Clone, Copy, Default)]
pub struct StubConverter {
    fail: bool,
}

impl StubConverter {
    pub fn succeeding() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl PdfConverter for StubConverter {
    async fn convert(&self, docx: &Path, pdf: &Path) -> Result<(), ConvertError> {
        tokio::fs::metadata(docx).await?;
        if self.fail {
            tokio::fs::write(pdf, b"%PDF-1.4\n").await?;
            return Err(ConvertError::Failed {
                status: Some(1),
                stderr: "stub converter failure".to_string(),
            });
        }
        tokio::fs::write(pdf, b"%PDF-1.4\n%stub\n%%EOF\n").await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stub"
    }
}
