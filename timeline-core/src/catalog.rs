//! The static catalog of timeline prompts.
//!
//! Sections are defined at build time and never created or destroyed at
//! runtime. Their order is the order of the journey, the recap and every
//! export.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A single prompt on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier, used as the key in stories and photos.
    pub id: String,
    /// Short heading ("First Met").
    pub title: String,
    /// The poetic guide line shown above the input.
    pub subtitle: String,
    /// Hint shown in the empty input.
    pub placeholder: String,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: subtitle.into(),
            placeholder: placeholder.into(),
        }
    }
}

/// Ordered, immutable list of sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCatalog {
    sections: Vec<Section>,
}

static DEFAULT_CATALOG: Lazy<SectionCatalog> = Lazy::new(|| {
    SectionCatalog::new(vec![
        Section::new(
            "beginning",
            "Beginning",
            "Every story starts quietly.",
            "Write if you want to…",
        ),
        Section::new(
            "first-met",
            "First Met",
            "Some moments don't announce themselves.",
            "A normal day that didn't feel normal afterward…",
        ),
        Section::new(
            "first-laugh",
            "First Laugh",
            "Laughter makes things real.",
            "What made it real…",
        ),
        Section::new(
            "first-memory",
            "First Memory",
            "The ones you revisit without trying.",
            "The one you return to…",
        ),
        Section::new(
            "today",
            "Today",
            "Still here. Still choosing.",
            "Where you are now…",
        ),
    ])
});

impl SectionCatalog {
    /// Build a catalog from an ordered list. Later duplicates of an id are dropped.
    pub fn new(sections: Vec<Section>) -> Self {
        let mut unique: Vec<Section> = Vec::with_capacity(sections.len());
        for section in sections {
            if !unique.iter().any(|s| s.id == section.id) {
                unique.push(section);
            }
        }
        Self { sections: unique }
    }

    /// The built-in five-prompt journey.
    pub fn standard() -> &'static SectionCatalog {
        &DEFAULT_CATALOG
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Zero-based position of a section in the journey.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::standard().clone()
    }
}

impl<'a> IntoIterator for &'a SectionCatalog {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}
