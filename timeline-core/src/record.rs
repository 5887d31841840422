//! The story record: everything the user has written and attached.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::SectionCatalog;

/// An embeddable encoded image (`data:<mime>;base64,<payload>`).
///
/// Self-contained: it can be written into markup and into the persisted
/// document without any external file handle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    /// Wrap an already encoded data URL.
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The MIME type declared in the data URL, if any.
    pub fn mime(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let end = rest.find([';', ','])?;
        Some(&rest[..end])
    }

    /// Size of the encoded reference in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Payloads are large; keep debug output readable.
impl fmt::Debug for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhotoRef({}, {} bytes)",
            self.mime().unwrap_or("unknown"),
            self.0.len()
        )
    }
}

/// All user content for one journey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Section id → free text.
    #[serde(default)]
    pub stories: BTreeMap<String, String>,

    /// Section id → photo. `None` marks a removed photo.
    #[serde(default)]
    pub photos: BTreeMap<String, Option<PhotoRef>>,

    /// When the record was last persisted.
    #[serde(rename = "lastSaved", default)]
    pub last_saved: Option<DateTime<Utc>>,
}

impl StoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// The story for a section, if it has any text.
    pub fn story(&self, id: &str) -> Option<&str> {
        self.stories
            .get(id)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The photo for a section, if one is attached.
    pub fn photo(&self, id: &str) -> Option<&PhotoRef> {
        self.photos.get(id).and_then(Option::as_ref)
    }

    pub fn set_story(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.stories.insert(id.into(), text.into());
    }

    pub fn set_photo(&mut self, id: impl Into<String>, photo: Option<PhotoRef>) {
        self.photos.insert(id.into(), photo);
    }

    /// Whether a section contributes anything (text or photo).
    pub fn has_content(&self, id: &str) -> bool {
        self.story(id).is_some() || self.photo(id).is_some()
    }

    /// True when no section has text or a photo.
    pub fn is_empty(&self) -> bool {
        self.stories.values().all(String::is_empty) && self.photos.values().all(Option::is_none)
    }

    /// Drop keys that do not belong to the catalog. Returns how many were removed.
    pub fn retain_catalog(&mut self, catalog: &SectionCatalog) -> usize {
        let before = self.stories.len() + self.photos.len();
        self.stories.retain(|id, _| catalog.contains(id));
        self.photos.retain(|id, _| catalog.contains(id));
        before - (self.stories.len() + self.photos.len())
    }

    /// Reset to the empty record.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Same stories and photos, ignoring the save timestamp.
    pub fn same_content(&self, other: &StoryRecord) -> bool {
        self.stories == other.stories && self.photos == other.photos
    }

    /// Number of sections that carry a photo.
    pub fn photo_count(&self) -> usize {
        self.photos.values().filter(|p| p.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Section;

    #[test]
    fn test_photo_ref_mime() {
        let photo = PhotoRef::from_data_url("data:image/png;base64,AAAA");
        assert_eq!(photo.mime(), Some("image/png"));
        assert_eq!(PhotoRef::from_data_url("nonsense").mime(), None);
    }

    #[test]
    fn test_empty_story_is_no_content() {
        let mut record = StoryRecord::new();
        record.set_story("beginning", "");
        assert!(record.story("beginning").is_none());
        assert!(!record.has_content("beginning"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_removed_photo_is_no_content() {
        let mut record = StoryRecord::new();
        record.set_photo("today", Some(PhotoRef::from_data_url("data:image/jpeg;base64,AA")));
        assert!(record.has_content("today"));
        record.set_photo("today", None);
        assert!(!record.has_content("today"));
        assert_eq!(record.photo_count(), 0);
    }

    #[test]
    fn test_retain_catalog_drops_foreign_keys() {
        let catalog = SectionCatalog::new(vec![Section::new("a", "A", "", "")]);
        let mut record = StoryRecord::new();
        record.set_story("a", "kept");
        record.set_story("zzz", "dropped");
        record.set_photo("zzz", None);

        assert_eq!(record.retain_catalog(&catalog), 2);
        assert_eq!(record.story("a"), Some("kept"));
        assert!(record.stories.get("zzz").is_none());
    }

    #[test]
    fn test_json_field_names() {
        let mut record = StoryRecord::new();
        record.set_story("beginning", "hello");
        record.set_photo("today", None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["stories"]["beginning"], "hello");
        assert!(json["photos"]["today"].is_null());
        assert!(json.get("lastSaved").is_some());
    }

    #[test]
    fn test_parses_document_without_timestamp() {
        let record: StoryRecord =
            serde_json::from_str(r#"{"stories":{"today":"now"},"photos":{}}"#).unwrap();
        assert_eq!(record.story("today"), Some("now"));
        assert!(record.last_saved.is_none());
    }
}
