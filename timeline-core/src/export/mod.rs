//! Self-contained HTML exports of the story.
//!
//! Every export is a pure function of the record, the catalog, the mode and
//! the current time. Documents embed their photos and styles, so a single
//! file can be opened, printed or sent anywhere.

mod full_story;
pub mod html;
mod reel;
mod slides;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::{Section, SectionCatalog};
use crate::record::{PhotoRef, StoryRecord};

pub use html::{escape, truncate, RECAP_TRUNCATE, TEMPLATE_TRUNCATE};

/// Errors from generating or delivering a document.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No section has a photo")]
    NoPhotos,

    #[error("Failed to render document: {0}")]
    Format(#[from] fmt::Error),

    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

/// Which documents to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportMode {
    /// One printable page with every section that has content.
    FullStory,
    /// One navigable document with a slide per photographed section.
    Reel,
    /// One standalone document per photographed section.
    Slides,
}

impl ExportMode {
    pub fn label(&self) -> &'static str {
        match self {
            ExportMode::FullStory => "full story",
            ExportMode::Reel => "story reel",
            ExportMode::Slides => "slides",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A generated file, ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub contents: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }
}

/// A section that will become a slide.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slide<'a> {
    pub section: &'a Section,
    pub photo: &'a PhotoRef,
    pub story: Option<&'a str>,
}

/// Photographed sections in catalog order.
pub(crate) fn slides<'a>(record: &'a StoryRecord, catalog: &'a SectionCatalog) -> Vec<Slide<'a>> {
    catalog
        .iter()
        .filter_map(|section| {
            record.photo(&section.id).map(|photo| Slide {
                section,
                photo,
                story: record.story(&section.id),
            })
        })
        .collect()
}

/// Number of slides a reel or slide export would contain.
pub fn slide_count(record: &StoryRecord, catalog: &SectionCatalog) -> usize {
    slides(record, catalog).len()
}

pub(crate) fn file_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Render the single full-story document.
pub fn full_story_document(
    record: &StoryRecord,
    catalog: &SectionCatalog,
    now: DateTime<Utc>,
) -> Result<Document, ExportError> {
    full_story::render(record, catalog, now)
}

/// Render the documents for `mode`.
pub fn export(
    record: &StoryRecord,
    catalog: &SectionCatalog,
    mode: ExportMode,
    now: DateTime<Utc>,
) -> Result<Vec<Document>, ExportError> {
    match mode {
        ExportMode::FullStory => Ok(vec![full_story_document(record, catalog, now)?]),
        ExportMode::Reel => {
            let slides = slides(record, catalog);
            if slides.is_empty() {
                return Err(ExportError::NoPhotos);
            }
            Ok(vec![reel::render(&slides, now)?])
        }
        ExportMode::Slides => {
            let slides = slides(record, catalog);
            if slides.is_empty() {
                return Err(ExportError::NoPhotos);
            }
            slides::render_all(&slides, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 14, 18, 0, 0).unwrap()
    }

    fn photo() -> PhotoRef {
        PhotoRef::from_data_url("data:image/png;base64,iVBORw0KGgo=")
    }

    fn abc() -> (StoryRecord, SectionCatalog) {
        let catalog = SectionCatalog::new(vec![
            Section::new("a", "Alpha", "First.", ""),
            Section::new("b", "Bravo", "Second.", ""),
            Section::new("c", "Charlie", "Third.", ""),
        ]);
        let mut record = StoryRecord::new();
        record.set_photo("a", Some(photo()));
        record.set_story("b", "words only");
        record.set_photo("c", Some(photo()));
        record.set_story("c", "x".repeat(250));
        (record, catalog)
    }

    #[test]
    fn test_full_story_document_matches_export() {
        let (record, catalog) = abc();
        let single = full_story_document(&record, &catalog, now()).unwrap();
        let exported = export(&record, &catalog, ExportMode::FullStory, now()).unwrap();
        assert_eq!(exported, vec![single]);
    }

    #[test]
    fn test_empty_record_full_story() {
        let docs = export(
            &StoryRecord::new(),
            SectionCatalog::standard(),
            ExportMode::FullStory,
            now(),
        )
        .unwrap();
        assert_eq!(docs.len(), 1);
        let html = &docs[0].contents;
        assert!(html.contains("class=\"header\""));
        assert!(html.contains("class=\"footer\""));
        assert!(!html.contains("class=\"section\""));
        assert_eq!(docs[0].filename, "our-story-2025-02-14.html");
    }

    #[test]
    fn test_full_story_sections_and_placeholder() {
        let (record, catalog) = abc();
        let html = export(&record, &catalog, ExportMode::FullStory, now())
            .unwrap()
            .remove(0)
            .contents;
        assert_eq!(html.matches("class=\"section\"").count(), 3);
        // Alpha has a photo and no text.
        assert!(html.contains("<em>No story written yet...</em>"));
        // Full text survives.
        assert!(html.contains(&"x".repeat(250)));
        assert!(html.contains(">3</div>"));
    }

    #[test]
    fn test_reel_has_one_slide_per_photo() {
        let (record, catalog) = abc();
        let docs = export(&record, &catalog, ExportMode::Reel, now()).unwrap();
        assert_eq!(docs.len(), 1);
        let html = &docs[0].contents;

        assert_eq!(html.matches("data-index=").count(), 2);
        assert!(html.contains("Alpha"));
        assert!(!html.contains("Bravo"));
        assert!(html.contains(&format!("&quot;{}...&quot;", "x".repeat(180))));
        assert!(!html.contains(&"x".repeat(181)));
        assert!(html.contains("1 of 2"));
        assert_eq!(docs[0].filename, "love-story-templates-2025-02-14.html");
    }

    #[test]
    fn test_per_slide_documents() {
        let (record, catalog) = abc();
        let docs = export(&record, &catalog, ExportMode::Slides, now()).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "story-slide-01-a-2025-02-14.html",
                "story-slide-02-c-2025-02-14.html"
            ]
        );
        assert!(docs.iter().all(|d| !d.contents.contains("<script>")));
    }

    #[test]
    fn test_reel_without_photos_is_rejected() {
        let mut record = StoryRecord::new();
        record.set_story("today", "no pictures");
        let err = export(&record, SectionCatalog::standard(), ExportMode::Reel, now()).unwrap_err();
        assert!(matches!(err, ExportError::NoPhotos));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut record = StoryRecord::new();
        record.set_story("today", "<script>alert(1)</script>");
        let html = export(&record, SectionCatalog::standard(), ExportMode::FullStory, now())
            .unwrap()
            .remove(0)
            .contents;
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn test_export_is_deterministic() {
        let (record, catalog) = abc();
        for mode in [ExportMode::FullStory, ExportMode::Reel, ExportMode::Slides] {
            let first = export(&record, &catalog, mode, now()).unwrap();
            let second = export(&record, &catalog, mode, now()).unwrap();
            assert_eq!(first, second);
        }
    }
}
