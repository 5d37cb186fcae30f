//! Placeholder substitution over WordprocessingML
//!
//! Placeholders are `{{KEY}}` markers in paragraph text. Word freely splits
//! a paragraph's text into runs (`w:r`) whenever formatting, spell-check
//! state or revision ids change, so a marker typed as one word can end up
//! spread over several runs. Matching therefore happens on the concatenated
//! text of a paragraph, and each match is written back into the runs it
//! covers:
//!
//! - the replacement value goes into the run holding the opening `{{`,
//!   taking that run's formatting
//! - the rest of the marker is cut out of the following runs
//! - runs outside any marker are left exactly as they were
//!
//! Table cells are visited row by row, cell by cell, paragraph by paragraph
//! with the same rules, including tables nested inside cells.

use std::collections::BTreeSet;

use crate::fields::FieldSet;
use crate::xml::{XmlElement, XmlNode};

const W_P: &str = "w:p";
const W_T: &str = "w:t";
const W_TBL: &str = "w:tbl";
const W_TR: &str = "w:tr";
const W_TC: &str = "w:tc";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A `{{KEY}}` marker located in a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte offset of the opening `{{`
    pub start: usize,
    /// Byte offset just past the closing `}}`
    pub end: usize,
    pub key: String,
}

/// Outcome of a substitution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    /// Number of markers replaced
    pub replaced: usize,
    /// Marker keys found in the text with no value in the field set
    pub unresolved: BTreeSet<String>,
}

impl SubstitutionReport {
    pub fn merge(&mut self, other: SubstitutionReport) {
        self.replaced += other.replaced;
        self.unresolved.extend(other.unresolved);
    }
}

/// Scan `text` for `{{KEY}}` markers, left to right, without overlaps.
///
/// A key is any non-empty run of characters without braces. Text such as
/// `{{{NAME}}}` yields the inner `{{NAME}}`.
pub fn find_placeholders(text: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(OPEN) {
        let start = cursor + offset;
        let key_start = start + OPEN.len();
        let Some(close) = text[key_start..].find(CLOSE) else {
            break;
        };
        let key = &text[key_start..key_start + close];

        if is_key(key) {
            let end = key_start + close + CLOSE.len();
            found.push(Placeholder {
                start,
                end,
                key: key.to_string(),
            });
            cursor = end;
        } else {
            // `{` is one byte; retry from the next brace
            cursor = start + 1;
        }
    }

    found
}

fn is_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['{', '}'])
}

/// Fill placeholders in every paragraph and table below `container`.
pub fn substitute_blocks(container: &mut XmlElement, fields: &FieldSet) -> SubstitutionReport {
    let mut report = SubstitutionReport::default();
    for_each_paragraph(container, &mut |paragraph| {
        report.merge(substitute_paragraph(paragraph, fields));
    });
    report
}

/// Fill placeholders in a single `w:p`.
///
/// Paragraphs nested inside this one (text boxes) are not touched here;
/// [`substitute_blocks`] reaches them separately.
pub fn substitute_paragraph(paragraph: &mut XmlElement, fields: &FieldSet) -> SubstitutionReport {
    let mut report = SubstitutionReport::default();

    let mut slots = Vec::new();
    collect_text_nodes(paragraph, &mut slots);
    if slots.is_empty() {
        return report;
    }

    let original: Vec<String> = slots.iter().map(|slot| slot.text()).collect();
    let joined = original.concat();

    let mut matches = Vec::new();
    for placeholder in find_placeholders(&joined) {
        match fields.get(&placeholder.key) {
            Some(value) => matches.push((placeholder, value)),
            None => {
                report.unresolved.insert(placeholder.key);
            }
        }
    }
    if matches.is_empty() {
        return report;
    }

    let mut starts = Vec::with_capacity(original.len());
    let mut offset = 0;
    for text in &original {
        starts.push(offset);
        offset += text.len();
    }

    let mut texts = original.clone();
    // Right to left, so earlier offsets stay valid while later slots change.
    for (placeholder, value) in matches.iter().rev() {
        let first = slot_containing(&starts, &original, placeholder.start);
        let last = slot_containing(&starts, &original, placeholder.end - 1);
        let head = placeholder.start - starts[first];
        let tail = placeholder.end - starts[last];

        if first == last {
            texts[first].replace_range(head..tail, value);
        } else {
            texts[first].replace_range(head.., value);
            for text in &mut texts[first + 1..last] {
                text.clear();
            }
            texts[last].replace_range(..tail, "");
        }
        report.replaced += 1;
    }

    for ((slot, before), after) in slots.iter_mut().zip(&original).zip(texts) {
        if *before == after {
            continue;
        }
        if after.starts_with(char::is_whitespace) || after.ends_with(char::is_whitespace) {
            slot.ensure_attribute("xml:space", "preserve");
        }
        slot.set_text(after);
    }

    report
}

/// Plain text of every paragraph below `container`, in visiting order.
pub fn paragraph_texts(container: &mut XmlElement) -> Vec<String> {
    let mut texts: Vec<String> = Vec::new();
    for_each_paragraph(container, &mut |paragraph| {
        let mut slots = Vec::new();
        collect_text_nodes(paragraph, &mut slots);
        texts.push(slots.iter().map(|slot| slot.text()).collect::<String>());
    });
    texts
}

fn slot_containing(starts: &[usize], texts: &[String], pos: usize) -> usize {
    starts
        .iter()
        .zip(texts)
        .position(|(start, text)| pos >= *start && pos < start + text.len())
        .unwrap_or(texts.len() - 1)
}

/// Visit body paragraphs and table cell paragraphs in document order.
fn for_each_paragraph(container: &mut XmlElement, visit: &mut dyn FnMut(&mut XmlElement)) {
    for child in container.child_elements_mut() {
        if child.is(W_P) {
            visit(child);
            // text boxes anchored in the paragraph carry their own blocks
            for_each_paragraph(child, visit);
        } else if child.is(W_TBL) {
            for_each_table_paragraph(child, visit);
        } else {
            for_each_paragraph(child, visit);
        }
    }
}

fn for_each_table_paragraph(table: &mut XmlElement, visit: &mut dyn FnMut(&mut XmlElement)) {
    for row in table.child_elements_mut() {
        if !row.is(W_TR) {
            // rows wrapped in content controls, plus tblPr/tblGrid
            for_each_paragraph(row, visit);
            continue;
        }
        for cell in row.child_elements_mut().filter(|cell| cell.is(W_TC)) {
            for_each_paragraph(cell, visit);
        }
    }
}

/// Collect the `w:t` nodes belonging to `paragraph`, stopping at nested blocks.
fn collect_text_nodes<'a>(element: &'a mut XmlElement, out: &mut Vec<&'a mut XmlElement>) {
    for child in element.children.iter_mut() {
        let XmlNode::Element(child) = child else {
            continue;
        };
        if child.is(W_T) {
            out.push(child);
        } else if child.is(W_P) || child.is(W_TBL) {
            continue;
        } else {
            collect_text_nodes(child, out);
        }
    }
}
