//! First-crossing visibility tracking for scrollable regions.
//!
//! A region "becomes visible" the first time its visible fraction reaches
//! its threshold. The set of visible regions only ever grows: a region that
//! scrolls back out of view is never un-revealed, and never fires again for
//! the lifetime of the tracker.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

/// Threshold for prompt regions.
pub const PROMPT_THRESHOLD: f32 = 0.3;
/// Threshold for the transition region.
pub const TRANSITION_THRESHOLD: f32 = 0.5;
/// Threshold for the proposal region.
pub const PROPOSAL_THRESHOLD: f32 = 0.3;

/// An observable area of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    Intro,
    Prompt(String),
    Transition,
    Proposal,
    Export,
}

impl RegionId {
    pub fn prompt(id: impl Into<String>) -> Self {
        Self::Prompt(id.into())
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Intro => write!(f, "intro"),
            RegionId::Prompt(id) => write!(f, "prompt:{id}"),
            RegionId::Transition => write!(f, "transition"),
            RegionId::Proposal => write!(f, "proposal"),
            RegionId::Export => write!(f, "export"),
        }
    }
}

/// Regions that have been seen at least once. Never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    regions: HashSet<RegionId>,
}

impl VisibilitySet {
    pub fn contains(&self, region: &RegionId) -> bool {
        self.regions.contains(region)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionId> {
        self.regions.iter()
    }

    fn insert(&mut self, region: RegionId) -> bool {
        self.regions.insert(region)
    }
}

/// Watches a set of regions and reports each one once.
#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    thresholds: HashMap<RegionId, f32>,
    visible: VisibilitySet,
    connected: bool,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self {
            thresholds: HashMap::new(),
            visible: VisibilitySet::default(),
            connected: true,
        }
    }

    /// Start observing `region` with the given threshold (0.0..=1.0).
    pub fn observe(&mut self, region: RegionId, threshold: f32) {
        if !self.connected {
            return;
        }
        self.thresholds.insert(region, threshold.clamp(0.0, 1.0));
    }

    pub fn is_observing(&self, region: &RegionId) -> bool {
        self.connected && self.thresholds.contains_key(region)
    }

    /// Feed the current visible fraction of a region.
    ///
    /// Returns the region the first time its threshold is reached.
    pub fn report(&mut self, region: &RegionId, fraction: f32) -> Option<RegionId> {
        if !self.connected || self.visible.contains(region) {
            return None;
        }
        let threshold = *self.thresholds.get(region)?;
        // A zero fraction never counts as intersecting, even with a zero threshold.
        if fraction <= 0.0 || fraction < threshold {
            return None;
        }
        self.visible.insert(region.clone());
        debug!(%region, fraction, "region became visible");
        Some(region.clone())
    }

    /// Feed several fractions at once. Fired regions come back in input order.
    pub fn report_all<'a>(
        &mut self,
        fractions: impl IntoIterator<Item = (&'a RegionId, f32)>,
    ) -> Vec<RegionId> {
        fractions
            .into_iter()
            .filter_map(|(region, fraction)| self.report(region, fraction))
            .collect()
    }

    pub fn visible(&self) -> &VisibilitySet {
        &self.visible
    }

    pub fn has_seen(&self, region: &RegionId) -> bool {
        self.visible.contains(region)
    }

    /// Stop observing everything. Later reports never fire.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.thresholds.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Vertical extent of a region in document rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub top: u32,
    pub height: u32,
}

impl Span {
    pub fn new(top: u32, height: u32) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }
}

/// The window of document rows currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(offset: u32, height: u32) -> Self {
        Self { offset, height }
    }

    pub fn bottom(&self) -> u32 {
        self.offset.saturating_add(self.height)
    }
}

/// Fraction of `span` inside `viewport`.
///
/// Regions taller than the viewport are measured against the viewport
/// height, so a region that fills the screen counts as fully visible.
pub fn visible_fraction(span: Span, viewport: Viewport) -> f32 {
    if span.height == 0 || viewport.height == 0 {
        return 0.0;
    }
    let top = span.top.max(viewport.offset);
    let bottom = span.bottom().min(viewport.bottom());
    if bottom <= top {
        return 0.0;
    }
    let visible = (bottom - top) as f32;
    let basis = span.height.min(viewport.height) as f32;
    (visible / basis).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_region() {
        let mut tracker = VisibilityTracker::new();
        let region = RegionId::prompt("beginning");
        tracker.observe(region.clone(), PROMPT_THRESHOLD);

        assert_eq!(tracker.report(&region, 0.5), Some(region.clone()));
        assert_eq!(tracker.report(&region, 1.0), None);
        // Scrolling away and back never re-fires.
        assert_eq!(tracker.report(&region, 0.0), None);
        assert_eq!(tracker.report(&region, 0.9), None);
        assert!(tracker.has_seen(&region));
    }

    #[test]
    fn test_below_threshold_does_not_fire() {
        let mut tracker = VisibilityTracker::new();
        tracker.observe(RegionId::Transition, TRANSITION_THRESHOLD);
        assert_eq!(tracker.report(&RegionId::Transition, 0.49), None);
        assert_eq!(
            tracker.report(&RegionId::Transition, 0.5),
            Some(RegionId::Transition)
        );
    }

    #[test]
    fn test_unobserved_region_is_ignored() {
        let mut tracker = VisibilityTracker::new();
        assert_eq!(tracker.report(&RegionId::Proposal, 1.0), None);
        assert!(!tracker.has_seen(&RegionId::Proposal));
    }

    #[test]
    fn test_disconnect_stops_everything() {
        let mut tracker = VisibilityTracker::new();
        tracker.observe(RegionId::Transition, 0.5);
        tracker.disconnect();
        assert_eq!(tracker.report(&RegionId::Transition, 1.0), None);
        tracker.observe(RegionId::Proposal, 0.3);
        assert!(!tracker.is_observing(&RegionId::Proposal));
    }

    #[test]
    fn test_multiple_regions_in_one_update() {
        let mut tracker = VisibilityTracker::new();
        let a = RegionId::prompt("a");
        let b = RegionId::prompt("b");
        tracker.observe(a.clone(), 0.3);
        tracker.observe(b.clone(), 0.3);

        let fired = tracker.report_all([(&b, 0.4), (&a, 0.8)]);
        assert_eq!(fired, vec![b, a]);
        assert_eq!(tracker.visible().len(), 2);
    }

    #[test]
    fn test_visible_fraction_geometry() {
        let viewport = Viewport::new(10, 20);
        assert_eq!(visible_fraction(Span::new(0, 5), viewport), 0.0);
        assert_eq!(visible_fraction(Span::new(10, 10), viewport), 1.0);
        assert_eq!(visible_fraction(Span::new(25, 10), viewport), 0.5);
        assert_eq!(visible_fraction(Span::new(30, 10), viewport), 0.0);
    }

    #[test]
    fn test_tall_region_measured_against_viewport() {
        let viewport = Viewport::new(0, 20);
        assert_eq!(visible_fraction(Span::new(0, 100), viewport), 1.0);
        assert_eq!(visible_fraction(Span::new(10, 100), viewport), 0.5);
    }
}
