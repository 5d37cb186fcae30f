//! Document kinds and their template metadata

use std::fmt;

use serde::Serialize;

use crate::fields::FieldSpec;

const OFFER_LETTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::same("REF"),
    FieldSpec::same("DATE"),
    FieldSpec::same("NAME"),
    FieldSpec::same("DURATION"),
    FieldSpec::same("STARTDATE"),
    FieldSpec::same("SUPNAME"),
    FieldSpec::same("TASKS"),
    FieldSpec::same("POSITION"),
    FieldSpec::same("DEPARTMENT"),
    FieldSpec::same("FROMANDTODATE"),
    FieldSpec::same("TYPE"),
    FieldSpec::same("RESPONSEDATE"),
];

// The termination template spells its reference placeholder REFNO.
const TERMINATION_LETTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::mapped("REF", "REFNO"),
    FieldSpec::same("DATE"),
    FieldSpec::same("NAME"),
    FieldSpec::same("POSITION"),
    FieldSpec::same("TERMDATE"),
    FieldSpec::same("LASTDAY"),
];

const CERTIFICATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::same("NAME"),
    FieldSpec::same("POSITION"),
    FieldSpec::same("DURATION"),
];

const EXPERIENCE_LETTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::same("REF"),
    FieldSpec::same("DATE"),
    FieldSpec::same("NAME"),
    FieldSpec::same("DURATION"),
    FieldSpec::same("STARTDATE"),
    FieldSpec::same("ENDDATE"),
];

/// The document types the service can generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    OfferLetter,
    TerminationLetter,
    Certificate,
    AimlExperienceLetter,
    WebDevExperienceLetter,
    GraphicDesignExperienceLetter,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::OfferLetter,
        DocumentKind::TerminationLetter,
        DocumentKind::Certificate,
        DocumentKind::AimlExperienceLetter,
        DocumentKind::WebDevExperienceLetter,
        DocumentKind::GraphicDesignExperienceLetter,
    ];

    /// Path segment(s) after `/generate/`
    pub const fn route(self) -> &'static str {
        match self {
            DocumentKind::OfferLetter => "offer-letter",
            DocumentKind::TerminationLetter => "termination-letter",
            DocumentKind::Certificate => "certificate",
            DocumentKind::AimlExperienceLetter => "experience-letter/aiml",
            DocumentKind::WebDevExperienceLetter => "experience-letter/webdev",
            DocumentKind::GraphicDesignExperienceLetter => "experience-letter/graphic-design",
        }
    }

    /// Template filename inside the templates directory
    pub const fn template_file(self) -> &'static str {
        match self {
            DocumentKind::OfferLetter => "offer_template.docx",
            DocumentKind::TerminationLetter => "Termination Letter.docx",
            DocumentKind::Certificate => "certificate.docx",
            DocumentKind::AimlExperienceLetter => "Experince_AI.docx",
            DocumentKind::WebDevExperienceLetter => "Experience_template.docx",
            DocumentKind::GraphicDesignExperienceLetter => "Experience_Graphic.docx",
        }
    }

    /// Prefix of generated filenames
    pub const fn output_prefix(self) -> &'static str {
        match self {
            DocumentKind::OfferLetter => "offer_letter",
            DocumentKind::TerminationLetter => "termination_letter",
            DocumentKind::Certificate => "certificate",
            DocumentKind::AimlExperienceLetter => "aiml_experience_letter",
            DocumentKind::WebDevExperienceLetter => "webdev_experience_letter",
            DocumentKind::GraphicDesignExperienceLetter => "graphic_design_experience_letter",
        }
    }

    /// Human-readable name used in response messages
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::OfferLetter => "Offer letter",
            DocumentKind::TerminationLetter => "Termination letter",
            DocumentKind::Certificate => "Experience certificate",
            DocumentKind::AimlExperienceLetter => "AI/ML Experience letter",
            DocumentKind::WebDevExperienceLetter => "Web Development Experience letter",
            DocumentKind::GraphicDesignExperienceLetter => "Graphic Design Experience letter",
        }
    }

    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            DocumentKind::OfferLetter => OFFER_LETTER_FIELDS,
            DocumentKind::TerminationLetter => TERMINATION_LETTER_FIELDS,
            DocumentKind::Certificate => CERTIFICATE_FIELDS,
            DocumentKind::AimlExperienceLetter
            | DocumentKind::WebDevExperienceLetter
            | DocumentKind::GraphicDesignExperienceLetter => EXPERIENCE_LETTER_FIELDS,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}
