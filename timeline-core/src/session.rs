//! The session: one journey through the timeline.
//!
//! [`TimelineSession`] owns everything mutable: the story record, the
//! presentation machine, both visibility trackers, the timer queue and the
//! autosave debounce. Hosts feed it viewport geometry, user actions and the
//! passage of time (via [`TimelineSession::tick`]) and read back the stage,
//! the record and any [`Notice`]s to show.

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Section, SectionCatalog};
use crate::clock::{Clock, SystemClock, TimerQueue};
use crate::config::Timings;
use crate::debounce::Debouncer;
use crate::export::{self, html, Document, ExportError, ExportMode};
use crate::host::Host;
use crate::persist::{self, FileStore, KeyValueStore, ParseError, StoryStorage};
use crate::presentation::{Command, Event, Presentation, Stage, TimerKind};
use crate::record::{PhotoRef, StoryRecord};
use crate::visibility::{
    visible_fraction, RegionId, Span, Viewport, VisibilityTracker, PROMPT_THRESHOLD,
    PROPOSAL_THRESHOLD, TRANSITION_THRESHOLD,
};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Session has been torn down")]
    TornDown,

    #[error("Import failed: {0}")]
    Import(#[from] ParseError),

    #[error("Backup failed: {0}")]
    Backup(#[from] serde_json::Error),
}

/// Something the host should show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Manual save succeeded.
    Saved,
    /// A save failed. Blocking; nothing is retried.
    StorageFull,
    /// Documents were written.
    Exported(Vec<PathBuf>),
    /// A print copy was written.
    Printed(PathBuf),
    /// A slide export was requested without any photos.
    NeedPhotos,
    ExportFailed,
    /// Restart was requested and needs a yes or no.
    ConfirmRestart,
    Imported,
    ImportFailed(String),
}

impl Notice {
    /// Whether the host must wait for acknowledgement.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Notice::StorageFull | Notice::ConfirmRestart | Notice::ExportFailed
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Saved => write!(f, "Your moment has been saved."),
            Notice::StorageFull => write!(f, "Failed to save. Storage might be full."),
            Notice::Exported(paths) => match paths.as_slice() {
                [one] => write!(
                    f,
                    "Story exported to {}. Open the file and print to PDF.",
                    one.display()
                ),
                many => write!(
                    f,
                    "Story exported ({} files). Open the file and print to PDF.",
                    many.len()
                ),
            },
            Notice::Printed(path) => {
                write!(f, "Print copy ready at {}. Open it and print.", path.display())
            }
            Notice::NeedPhotos => {
                write!(f, "Please add at least one photo to create a story template.")
            }
            Notice::ExportFailed => write!(f, "Failed to export. Please try again."),
            Notice::ConfirmRestart => {
                write!(f, "Start over? This clears everything you have written.")
            }
            Notice::Imported => write!(f, "Story imported."),
            Notice::ImportFailed(reason) => write!(f, "Invalid file format: {reason}"),
        }
    }
}

/// Where the host should scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    Top,
    Export,
}

/// What the recap shows for the current slide.
#[derive(Debug, Clone)]
pub struct RecapSlide<'a> {
    pub section: &'a Section,
    pub index: usize,
    pub total: usize,
    pub photo: Option<&'a PhotoRef>,
    /// Story text, truncated for the recap.
    pub quote: Option<Cow<'a, str>>,
}

impl RecapSlide<'_> {
    /// Caption for a photo without words.
    pub fn caption(&self) -> Option<&'static str> {
        (self.quote.is_none() && self.photo.is_some()).then_some("A moment worth remembering")
    }
}

/// Shown under every recap slide.
pub const RECAP_TAGLINE: &str = "Moments become memories. Memories become stories.";

/// One journey through the timeline.
pub struct TimelineSession<S = FileStore, C = SystemClock> {
    catalog: SectionCatalog,
    record: StoryRecord,
    machine: Presentation,
    prompts: VisibilityTracker,
    journey: VisibilityTracker,
    last_fractions: HashMap<RegionId, f32>,
    timers: TimerQueue<TimerKind>,
    autosave: Debouncer,
    storage: StoryStorage<S>,
    clock: C,
    notices: VecDeque<Notice>,
    scroll: Option<ScrollRequest>,
    torn_down: bool,
}

impl<S: KeyValueStore, C: Clock> TimelineSession<S, C> {
    /// Start a session, loading whatever the store holds.
    pub fn new(catalog: SectionCatalog, storage: StoryStorage<S>, clock: C, timings: Timings) -> Self {
        let mut record = storage.load().unwrap_or_default();
        let dropped = record.retain_catalog(&catalog);
        if dropped > 0 {
            warn!(dropped, "stored story had entries for unknown sections");
        }
        info!(
            sections = catalog.len(),
            has_content = !record.is_empty(),
            "session started"
        );

        let mut prompts = VisibilityTracker::new();
        for section in &catalog {
            prompts.observe(RegionId::prompt(&section.id), PROMPT_THRESHOLD);
        }

        Self {
            machine: Presentation::new(catalog.len(), timings),
            catalog,
            record,
            prompts,
            journey: Self::journey_tracker(),
            last_fractions: HashMap::new(),
            timers: TimerQueue::new(),
            autosave: Debouncer::new(timings.autosave_quiet),
            storage,
            clock,
            notices: VecDeque::new(),
            scroll: None,
            torn_down: false,
        }
    }

    fn journey_tracker() -> VisibilityTracker {
        let mut journey = VisibilityTracker::new();
        journey.observe(RegionId::Transition, TRANSITION_THRESHOLD);
        journey
    }

    // -------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    pub fn record(&self) -> &StoryRecord {
        &self.record
    }

    pub fn stage(&self) -> Stage {
        self.machine.stage()
    }

    pub fn presentation(&self) -> &Presentation {
        &self.machine
    }

    pub fn storage(&self) -> &StoryStorage<S> {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_revealed(&self, section_id: &str) -> bool {
        self.machine.is_revealed(section_id)
    }

    pub fn has_seen(&self, region: &RegionId) -> bool {
        self.prompts.has_seen(region) || self.journey.has_seen(region)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Time of the next timer or autosave, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.timers.next_due(), self.autosave.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Drain notices in the order they were raised.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn take_scroll(&mut self) -> Option<ScrollRequest> {
        self.scroll.take()
    }

    /// The recap slide on screen, while the recap is playing.
    pub fn recap_slide(&self) -> Option<RecapSlide<'_>> {
        let index = self.machine.recap_slide()?;
        let section = self.catalog.sections().get(index)?;
        Some(RecapSlide {
            section,
            index,
            total: self.catalog.len(),
            photo: self.record.photo(&section.id),
            quote: self
                .record
                .story(&section.id)
                .filter(|s| !s.is_empty())
                .map(|s| html::truncate(s, html::RECAP_TRUNCATE)),
        })
    }

    // -------------------------------------------------------------------
    // Capture
    // -------------------------------------------------------------------

    fn check_section(&self, id: &str) -> Result<(), SessionError> {
        if self.torn_down {
            return Err(SessionError::TornDown);
        }
        if !self.catalog.contains(id) {
            return Err(SessionError::UnknownSection(id.to_string()));
        }
        Ok(())
    }

    /// Replace a section's text. Persisted after the autosave quiet period.
    pub fn edit_story(&mut self, id: &str, text: impl Into<String>) -> Result<(), SessionError> {
        self.check_section(id)?;
        self.record.set_story(id, text);
        self.autosave.touch(self.clock.now());
        Ok(())
    }

    /// Attach a photo. Persisted immediately.
    pub fn set_photo(&mut self, id: &str, photo: PhotoRef) -> Result<(), SessionError> {
        self.check_section(id)?;
        debug!(section = id, bytes = photo.len(), "photo attached");
        self.record.set_photo(id, Some(photo));
        self.persist();
        Ok(())
    }

    /// Remove a photo. Persisted immediately.
    pub fn remove_photo(&mut self, id: &str) -> Result<(), SessionError> {
        self.check_section(id)?;
        self.record.set_photo(id, None);
        self.persist();
        Ok(())
    }

    /// Manual save. Any pending autosave is folded into it.
    pub fn save_now(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.autosave.cancel();
        let saved = self.persist();
        if saved {
            self.notices.push_back(Notice::Saved);
        }
        saved
    }

    /// Write a pending autosave right away.
    pub fn flush(&mut self) {
        if !self.torn_down && self.autosave.cancel() {
            self.persist();
        }
    }

    fn persist(&mut self) -> bool {
        match self.storage.save_at(&self.record, self.clock.wall()) {
            Ok(at) => {
                self.record.last_saved = Some(at);
                true
            }
            Err(_) => {
                self.notices.push_back(Notice::StorageFull);
                false
            }
        }
    }

    // -------------------------------------------------------------------
    // Visibility and time
    // -------------------------------------------------------------------

    /// Feed the visible fraction of one region.
    pub fn report_visibility(&mut self, region: &RegionId, fraction: f32) {
        if self.torn_down {
            return;
        }
        self.last_fractions.insert(region.clone(), fraction);
        let fired = match region {
            RegionId::Prompt(_) => self.prompts.report(region, fraction),
            _ => self.journey.report(region, fraction),
        };
        if let Some(region) = fired {
            self.dispatch(Event::RegionVisible(region));
        }
    }

    /// Feed a whole layout against the current viewport.
    pub fn update_viewport(&mut self, layout: &[(RegionId, Span)], viewport: Viewport) {
        if self.torn_down {
            return;
        }
        if viewport.offset > 0 {
            self.dispatch(Event::ScrolledPastIntro);
        }
        for (region, span) in layout {
            self.report_visibility(region, visible_fraction(*span, viewport));
        }
    }

    /// Fire due timers and a due autosave. Returns true when anything happened.
    pub fn tick(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let now = self.clock.now();
        let mut changed = false;
        while let Some((due, timer)) = self.timers.pop_due(now) {
            debug!(?timer, due_ms = due.as_millis() as u64, "timer fired");
            self.dispatch_at(Event::TimerElapsed(timer), due);
            changed = true;
        }
        if self.autosave.poll(now) {
            self.persist();
            changed = true;
        }
        changed
    }

    // -------------------------------------------------------------------
    // Journey actions
    // -------------------------------------------------------------------

    pub fn skip_recap(&mut self) {
        self.dispatch(Event::SkipRecap);
    }

    pub fn continue_journey(&mut self) {
        self.dispatch(Event::Continue);
    }

    pub fn dismiss_celebration(&mut self) {
        self.dispatch(Event::DismissCelebration);
    }

    pub fn request_restart(&mut self) {
        self.dispatch(Event::RestartRequested);
    }

    pub fn confirm_restart(&mut self) {
        self.dispatch(Event::RestartConfirmed);
    }

    pub fn decline_restart(&mut self) {
        self.dispatch(Event::RestartDeclined);
    }

    fn dispatch(&mut self, event: Event) {
        let now = self.clock.now();
        self.dispatch_at(event, now);
    }

    /// Apply an event as of `at` and carry out its commands.
    fn dispatch_at(&mut self, event: Event, at: Duration) {
        if self.torn_down {
            return;
        }
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for command in self.machine.handle(event) {
                if let Some(follow_up) = self.apply(command, at) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn apply(&mut self, command: Command, at: Duration) -> Option<Event> {
        match command {
            Command::Schedule { timer, after } => {
                self.timers.schedule(timer, at + after);
            }
            Command::CancelTimers(group) => {
                let cancelled = self.timers.cancel_where(|t| group.contains(t));
                debug!(?group, cancelled, "timers cancelled");
            }
            Command::ObserveProposal => {
                self.journey
                    .observe(RegionId::Proposal, PROPOSAL_THRESHOLD);
                // A region already on screen counts as soon as it is observed.
                let fraction = self.last_fractions.get(&RegionId::Proposal).copied()?;
                return self
                    .journey
                    .report(&RegionId::Proposal, fraction)
                    .map(Event::RegionVisible);
            }
            Command::RearmJourney => {
                self.journey = Self::journey_tracker();
                self.last_fractions
                    .retain(|region, _| matches!(region, RegionId::Prompt(_)));
            }
            Command::AskRestartConfirmation => {
                self.notices.push_back(Notice::ConfirmRestart);
            }
            Command::ClearRecord => {
                self.autosave.cancel();
                self.record.clear();
                self.storage.clear();
                info!("story cleared for restart");
            }
            Command::ScrollToTop => self.scroll = Some(ScrollRequest::Top),
            Command::ScrollToExport => self.scroll = Some(ScrollRequest::Export),
        }
        None
    }

    // -------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------

    /// Render documents for `mode` without delivering them.
    pub fn render(&self, mode: ExportMode) -> Result<Vec<Document>, ExportError> {
        export::export(&self.record, &self.catalog, mode, self.clock.wall())
    }

    /// Render and deliver documents. Failures raise a notice and are returned.
    pub fn export(
        &mut self,
        mode: ExportMode,
        host: &mut dyn Host,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let result = self
            .render(mode)
            .and_then(|docs| deliver_all(host, &docs));
        match &result {
            Ok(paths) => {
                info!(%mode, files = paths.len(), "story exported");
                self.notices.push_back(Notice::Exported(paths.clone()));
            }
            Err(ExportError::NoPhotos) => self.notices.push_back(Notice::NeedPhotos),
            Err(e) => {
                warn!(%mode, error = %e, "export failed");
                self.notices.push_back(Notice::ExportFailed);
            }
        }
        result
    }

    /// Hand the full story to the host's printer.
    pub fn print(&mut self, host: &mut dyn Host) -> Result<PathBuf, ExportError> {
        let result = export::full_story_document(&self.record, &self.catalog, self.clock.wall())
            .and_then(|doc| host.print(&doc));
        match &result {
            Ok(path) => self.notices.push_back(Notice::Printed(path.clone())),
            Err(e) => {
                warn!(error = %e, "print failed");
                self.notices.push_back(Notice::ExportFailed);
            }
        }
        result
    }

    /// The record as a pretty JSON backup.
    pub fn backup(&self) -> Result<String, SessionError> {
        Ok(persist::export_backup(&self.record)?)
    }

    /// Replace the record with a backup document and persist it.
    pub fn import(&mut self, content: &str) -> Result<(), SessionError> {
        if self.torn_down {
            return Err(SessionError::TornDown);
        }
        let mut record = match persist::import_backup(content) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "rejected backup import");
                self.notices.push_back(Notice::ImportFailed(e.to_string()));
                return Err(e.into());
            }
        };
        let dropped = record.retain_catalog(&self.catalog);
        if dropped > 0 {
            warn!(dropped, "imported story had entries for unknown sections");
        }
        self.autosave.cancel();
        self.record = record;
        if self.persist() {
            self.notices.push_back(Notice::Imported);
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Stop everything. Nothing fires or persists afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let timers = self.timers.len();
        self.timers.clear();
        self.autosave.cancel();
        self.prompts.disconnect();
        self.journey.disconnect();
        self.torn_down = true;
        info!(cancelled_timers = timers, "session torn down");
    }
}

/// Download every document or none: a failure takes back what was already delivered.
fn deliver_all(host: &mut dyn Host, docs: &[Document]) -> Result<Vec<PathBuf>, ExportError> {
    let mut delivered = Vec::with_capacity(docs.len());
    for doc in docs {
        match host.download(doc) {
            Ok(path) => delivered.push(path),
            Err(e) => {
                for path in &delivered {
                    if let Err(discard) = host.discard(path) {
                        warn!(path = %path.display(), error = %discard, "partial export left behind");
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(delivered)
}

impl<S, C> fmt::Debug for TimelineSession<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineSession")
            .field("stage", &self.machine.stage())
            .field("timers", &self.timers.len())
            .field("autosave_pending", &self.autosave.is_pending())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persist::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn session() -> (TimelineSession<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 2, 14, 9, 0, 0).unwrap());
        let session = TimelineSession::new(
            SectionCatalog::standard().clone(),
            StoryStorage::new(MemoryStore::new()),
            clock.clone(),
            Timings::default(),
        );
        (session, clock)
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let (mut session, _) = session();
        let err = session.edit_story("nope", "hi").unwrap_err();
        assert!(matches!(err, SessionError::UnknownSection(id) if id == "nope"));
    }

    #[test]
    fn test_edit_is_visible_immediately_and_saved_later() {
        let (mut session, clock) = session();
        session.edit_story("today", "hello").unwrap();
        assert_eq!(session.record().story("today"), Some("hello"));
        assert!(session.storage().load().is_none());

        clock.advance_ms(1000);
        session.tick();
        assert_eq!(
            session.storage().load().unwrap().story("today"),
            Some("hello")
        );
    }

    #[test]
    fn test_recap_slide_view() {
        let (mut session, clock) = session();
        session.edit_story("beginning", "b".repeat(300)).unwrap();
        session.report_visibility(&RegionId::Transition, 1.0);
        clock.advance_ms(2000);
        session.tick();

        let slide = session.recap_slide().unwrap();
        assert_eq!(slide.index, 0);
        assert_eq!(slide.total, 5);
        assert_eq!(slide.quote.as_deref(), Some(format!("{}...", "b".repeat(200)).as_str()));
        assert!(slide.caption().is_none());
    }

    #[test]
    fn test_notice_copy() {
        assert_eq!(Notice::Saved.to_string(), "Your moment has been saved.");
        assert_eq!(
            Notice::StorageFull.to_string(),
            "Failed to save. Storage might be full."
        );
        assert!(Notice::StorageFull.is_blocking());
        assert!(!Notice::Saved.is_blocking());
    }
}
