//! DOCX package I/O
//!
//! A DOCX file is a zip archive of XML parts. The package is read fully into
//! memory; only the text-bearing WordprocessingML parts are parsed and
//! rewritten, every other entry is copied through byte for byte.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocgenError;
use crate::fields::FieldSet;
use crate::substitute::{paragraph_texts, substitute_blocks, SubstitutionReport};
use crate::xml::XmlDocument;

/// Main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    compression: CompressionMethod,
    is_dir: bool,
    data: Vec<u8>,
}

/// An opened Word package
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self, DocgenError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DocgenError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                compression: file.compression(),
                is_dir: file.is_dir(),
                data,
            });
        }

        if !entries.iter().any(|entry| entry.name == DOCUMENT_PART) {
            return Err(DocgenError::MissingPart(DOCUMENT_PART.to_string()));
        }

        Ok(Self { entries })
    }

    /// Names of all entries, in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    /// Fill placeholders in the body, headers and footers.
    ///
    /// Parts without a replacement are left untouched, byte for byte.
    pub fn fill(&mut self, fields: &FieldSet) -> Result<SubstitutionReport, DocgenError> {
        let mut report = SubstitutionReport::default();

        for entry in self.entries.iter_mut().filter(|e| is_text_part(&e.name)) {
            let mut xml = XmlDocument::from_bytes(&entry.data)?;
            let Some(root) = xml.root_mut() else {
                continue;
            };

            let part_report = substitute_blocks(root, fields);
            debug!(
                part = %entry.name,
                replaced = part_report.replaced,
                "Substituted placeholders"
            );
            if part_report.replaced > 0 {
                entry.data = xml.to_bytes()?;
            }
            report.merge(part_report);
        }

        Ok(report)
    }

    /// Paragraph texts of the main document, body and table cells in order
    pub fn paragraph_texts(&self) -> Result<Vec<String>, DocgenError> {
        let data = self
            .part(DOCUMENT_PART)
            .ok_or_else(|| DocgenError::MissingPart(DOCUMENT_PART.to_string()))?;
        let mut xml = XmlDocument::from_bytes(data)?;
        Ok(xml.root_mut().map(paragraph_texts).unwrap_or_default())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, DocgenError> {
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }

        Ok(zip.finish()?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocgenError> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Write the package to a path that must not exist yet.
    ///
    /// Fails with an `AlreadyExists` IO error if it does. A partially written
    /// file is removed on failure.
    pub fn save_new(&self, path: &Path) -> Result<(), DocgenError> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;

        let written = self
            .write_to(BufWriter::new(file))
            .and_then(|mut writer| writer.flush().map_err(DocgenError::from));
        if let Err(err) = written {
            let _ = fs::remove_file(path);
            return Err(err);
        }
        Ok(())
    }
}

fn is_text_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    name.strip_prefix("word/")
        .filter(|rest| !rest.contains('/'))
        .is_some_and(|rest| {
            (rest.starts_with("header") || rest.starts_with("footer")) && rest.ends_with(".xml")
        })
}
