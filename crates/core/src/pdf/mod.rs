//! Printable documents.
//!
//! Documents are described as a [`Layout`]: a flat list of [`Block`]s (titles, key/value
//! fields, tables, paragraphs). [`render`] lays the blocks out on A4 pages, starting a new
//! page whenever the next line would run into the footer, and emits PDF bytes.
//!
//! Builders for the concrete documents (bills, prescriptions, reports) live in [`documents`].

pub mod documents;
mod render;

pub use render::{compose, render, Page, Run};

use crate::time::Timestamp;
use chrono::FixedOffset;

/// Hospital name and the local offset used for printed dates.
#[derive(Debug, Clone)]
pub struct Letterhead {
    hospital_name: String,
    offset: FixedOffset,
}

impl Letterhead {
    pub fn new(hospital_name: &str, offset: FixedOffset) -> Self {
        Self {
            hospital_name: hospital_name.to_owned(),
            offset,
        }
    }

    pub fn hospital_name(&self) -> &str {
        &self.hospital_name
    }

    /// `DD-MM-YYYY HH:MM` in hospital local time.
    pub fn date(&self, at: Timestamp) -> String {
        at.as_datetime()
            .with_timezone(&self.offset)
            .format("%d-%m-%Y %H:%M")
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A table column. `width` is a fraction of the printable width.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub fn left(header: &str, width: f32) -> Self {
        Self {
            header: header.to_owned(),
            width,
            align: Align::Left,
        }
    }

    pub fn right(header: &str, width: f32) -> Self {
        Self {
            header: header.to_owned(),
            width,
            align: Align::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Large, centred, bold.
    Title(String),
    /// Centred, bold.
    Subtitle(String),
    /// `label: value` pairs, two per row.
    Fields(Vec<(String, String)>),
    Heading(String),
    /// Rows that do not fit start a new page, which repeats the header row.
    Table {
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
    },
    Paragraph(String),
    Spacer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub document_title: String,
    pub blocks: Vec<Block>,
    /// Printed at the bottom left of every page.
    pub footer: Option<String>,
}

impl Layout {
    pub fn new(document_title: impl Into<String>) -> Self {
        Self {
            document_title: document_title.into(),
            blocks: Vec::new(),
            footer: None,
        }
    }

    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Title(text.into()));
        self
    }

    pub fn subtitle(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Subtitle(text.into()));
        self
    }

    /// Adds a field block; pairs with an empty value are dropped.
    pub fn fields(mut self, pairs: Vec<(String, String)>) -> Self {
        let pairs: Vec<_> = pairs.into_iter().filter(|(_, v)| !v.trim().is_empty()).collect();
        if !pairs.is_empty() {
            self.blocks.push(Block::Fields(pairs));
        }
        self
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading(text.into()));
        self
    }

    pub fn table(mut self, columns: Vec<Column>, rows: Vec<Vec<String>>) -> Self {
        self.blocks.push(Block::Table { columns, rows });
        self
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn spacer(mut self) -> Self {
        self.blocks.push(Block::Spacer);
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterhead_prints_local_time() {
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("offset");
        let letterhead = Letterhead::new("City Hospital", ist);
        let at = Timestamp::parse("2026-10-16T18:45:00Z").expect("ts");
        assert_eq!(letterhead.date(at), "17-10-2026 00:15");
    }

    #[test]
    fn test_fields_drop_blank_values() {
        let layout = Layout::new("x").fields(vec![
            ("UHID".into(), "UHID202610160001".into()),
            ("Email".into(), " ".into()),
        ]);
        assert_eq!(
            layout.blocks,
            vec![Block::Fields(vec![("UHID".into(), "UHID202610160001".into())])]
        );
        assert!(Layout::new("x").fields(vec![]).blocks.is_empty());
    }
}
