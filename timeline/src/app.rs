//! Main application state and logic

use std::path::PathBuf;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use timeline_core::persist::{self, backup_file_name};
use timeline_core::{
    photo, Clock, DirectoryHost, ExportMode, PhotoError, PhotoRef, RegionId, Stage,
    TimelineSession, Viewport,
};

use crate::effects;
use crate::ui::layout::{AppLayout, DocumentLayout, PROMPT_HEIGHT};
use crate::ui::theme::TimelineTheme;
use crate::ui::widgets::Ornament;
use crate::ui::Overlay;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - writing the focused story
    Insert,
    /// Command mode - entering : commands
    Command,
}

/// A photo read finished on a background task.
#[derive(Debug)]
pub struct PhotoLoaded {
    /// Restart count when the read started.
    pub generation: u64,
    pub section_id: String,
    pub path: PathBuf,
    pub result: Result<PhotoRef, PhotoError>,
}

/// File work the run loop awaits between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTask {
    Backup(PathBuf),
    Import(PathBuf),
}

/// Parse an export mode name as typed in a command.
pub fn parse_export_mode(name: &str) -> Option<ExportMode> {
    match name {
        "full" | "story" | "full-story" => Some(ExportMode::FullStory),
        "reel" | "templates" => Some(ExportMode::Reel),
        "slides" | "slide" => Some(ExportMode::Slides),
        _ => None,
    }
}

/// Main application state
pub struct App {
    pub session: TimelineSession,
    pub host: DirectoryHost,
    photo_tx: mpsc::UnboundedSender<PhotoLoaded>,
    photo_rx: mpsc::UnboundedReceiver<PhotoLoaded>,
    photo_generation: u64,

    // UI state
    pub theme: TimelineTheme,
    overlay: Option<Overlay>,

    // Document
    layout: DocumentLayout,
    document_area: Rect,
    scroll: u32,
    focused: usize,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    editing: Option<String>,

    // Status
    status_message: Option<String>,
    pub should_quit: bool,
    pub pending_task: Option<PendingTask>,

    // Animation
    pub animation_frame: u8,
    ornaments: Vec<Ornament>,
    last_stage: Stage,
}

impl App {
    pub fn new(session: TimelineSession, host: DirectoryHost) -> Self {
        let (photo_tx, photo_rx) = mpsc::unbounded_channel();
        let last_stage = session.stage();
        Self {
            session,
            host,
            photo_tx,
            photo_rx,
            photo_generation: 0,
            theme: TimelineTheme::default(),
            overlay: None,
            layout: DocumentLayout::default(),
            document_area: Rect::default(),
            scroll: 0,
            focused: 0,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            editing: None,
            status_message: Some("Scroll when you're ready (j/k, ? for help)".to_string()),
            should_quit: false,
            pending_task: None,
            animation_frame: 0,
            ornaments: Vec::new(),
            last_stage,
        }
    }

    // =========================================================================
    // Document geometry
    // =========================================================================

    /// Fit the document to a new terminal size.
    pub fn resize(&mut self, area: Rect) {
        self.document_area = AppLayout::calculate(area).document_area;
        self.sync_viewport();
    }

    pub fn viewport_height(&self) -> u32 {
        self.document_area.height as u32
    }

    /// Recompute region placement for the current stage and clamp the scroll.
    pub fn relayout(&mut self) {
        self.layout = DocumentLayout::calculate(
            self.session.catalog(),
            self.viewport_height(),
            self.session.stage(),
        );
        self.scroll = self.scroll.min(self.layout.max_offset(self.viewport_height()));
    }

    /// Report what is on screen to the session.
    pub fn sync_viewport(&mut self) {
        self.relayout();
        let viewport = Viewport::new(self.scroll, self.viewport_height());
        self.session.update_viewport(&self.layout.regions, viewport);
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn scroll(&self) -> u32 {
        self.scroll
    }

    pub fn scroll_up(&mut self, lines: u32) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u32) {
        let max = self.layout.max_offset(self.viewport_height());
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.layout.max_offset(self.viewport_height());
    }

    pub fn half_page(&self) -> u32 {
        (self.viewport_height() / 2).max(1)
    }

    /// Scroll so `region` starts at the top of the screen.
    pub fn scroll_to_region(&mut self, region: &RegionId) {
        if let Some(span) = self.layout.span_of(region) {
            self.scroll = span.top.min(self.layout.max_offset(self.viewport_height()));
        }
    }

    // =========================================================================
    // Prompt focus
    // =========================================================================

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn focused_section_id(&self) -> Option<String> {
        self.session
            .catalog()
            .sections()
            .get(self.focused)
            .map(|s| s.id.clone())
    }

    /// Move focus to the next prompt and bring it into view.
    pub fn focus_next(&mut self) {
        let count = self.session.catalog().len();
        if count == 0 {
            return;
        }
        self.focused = (self.focused + 1) % count;
        self.scroll_to_focused();
    }

    pub fn focus_prev(&mut self) {
        let count = self.session.catalog().len();
        if count == 0 {
            return;
        }
        self.focused = (self.focused + count - 1) % count;
        self.scroll_to_focused();
    }

    fn scroll_to_focused(&mut self) {
        if let Some(id) = self.focused_section_id() {
            let region = RegionId::prompt(id);
            if let Some(span) = self.layout.span_of(&region) {
                // Center the prompt when the screen is taller than it.
                let margin = self.viewport_height().saturating_sub(PROMPT_HEIGHT) / 2;
                self.scroll = span
                    .top
                    .saturating_sub(margin)
                    .min(self.layout.max_offset(self.viewport_height()));
            }
        }
    }

    // =========================================================================
    // Story editing
    // =========================================================================

    /// Section currently being written, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Start writing the focused prompt.
    pub fn begin_editing(&mut self) {
        let Some(id) = self.focused_section_id() else {
            return;
        };
        self.scroll_to_focused();
        let story = self.session.record().story(&id).unwrap_or_default().to_string();
        self.set_input(story);
        self.editing = Some(id);
        self.input_mode = InputMode::Insert;
    }

    /// Stop writing. The text is already in the session.
    pub fn finish_editing(&mut self) {
        self.editing = None;
        self.clear_input();
        self.input_mode = InputMode::Normal;
    }

    fn apply_edit(&mut self) {
        let Some(id) = self.editing.clone() else {
            return;
        };
        if let Err(e) = self.session.edit_story(&id, self.input_buffer.clone()) {
            self.set_status(format!("Could not edit: {e}"));
        }
    }

    // =========================================================================
    // Input buffer
    // =========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.enter_command_with("");
    }

    /// Enter command mode with text already typed after the colon.
    pub fn enter_command_with(&mut self, prefill: &str) {
        self.input_mode = InputMode::Command;
        self.set_input(format!(":{prefill}"));
    }

    /// Exit to normal mode
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.input_buffer.starts_with(':') {
            self.clear_input();
        }
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
        self.apply_edit();
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
            self.apply_edit();
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            self.apply_edit();
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Set input buffer content and move cursor to end (unicode-safe)
    pub fn set_input(&mut self, content: impl Into<String>) {
        self.input_buffer = content.into();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Process a colon command. Returns whether it was recognized.
    pub fn process_command(&mut self, command: &str) -> bool {
        let cmd = command.trim_start_matches(':');
        let (name, rest) = match cmd.trim().split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (cmd.trim(), ""),
        };

        match name {
            "" => false,
            "q" | "quit" | "exit" => {
                self.should_quit = true;
                true
            }
            "w" | "save" => {
                self.session.save_now();
                true
            }
            "wq" => {
                if self.session.save_now() {
                    self.should_quit = true;
                }
                true
            }
            "photo" => {
                if rest.is_empty() {
                    self.set_status("Usage: :photo <path>");
                } else {
                    self.attach_photo(PathBuf::from(rest));
                }
                true
            }
            "unphoto" | "rmphoto" => {
                self.remove_photo();
                true
            }
            "export" => {
                match parse_export_mode(rest) {
                    Some(mode) => self.export(mode),
                    None => self.set_status("Usage: :export full|reel|slides"),
                }
                true
            }
            "print" => {
                self.print();
                true
            }
            "backup" => {
                let path = if rest.is_empty() {
                    self.host
                        .dir()
                        .join(backup_file_name(self.session.clock().wall()))
                } else {
                    PathBuf::from(rest)
                };
                self.set_status("Writing backup...");
                self.pending_task = Some(PendingTask::Backup(path));
                true
            }
            "import" => {
                if rest.is_empty() {
                    self.set_status("Usage: :import <path>");
                } else {
                    self.set_status("Importing...");
                    self.pending_task = Some(PendingTask::Import(PathBuf::from(rest)));
                }
                true
            }
            "restart" => {
                self.session.request_restart();
                true
            }
            "help" | "h" => {
                self.toggle_help();
                true
            }
            _ => {
                self.set_status(format!("Unknown command: {name}"));
                false
            }
        }
    }

    // =========================================================================
    // Photos
    // =========================================================================

    /// Read a photo for the focused prompt on a background task.
    pub fn attach_photo(&mut self, path: PathBuf) {
        let Some(section_id) = self.focused_section_id() else {
            return;
        };
        let tx = self.photo_tx.clone();
        let generation = self.photo_generation;
        tokio::spawn(async move {
            let result = photo::ingest(&path).await;
            // The receiver only goes away on shutdown.
            let _ = tx.send(PhotoLoaded {
                generation,
                section_id,
                path,
                result,
            });
        });
        self.set_status("Reading photo...");
    }

    pub fn remove_photo(&mut self) {
        if let Some(id) = self.focused_section_id() {
            if let Err(e) = self.session.remove_photo(&id) {
                self.set_status(format!("Could not remove photo: {e}"));
            }
        }
    }

    /// Apply finished photo reads.
    pub fn drain_photos(&mut self) {
        while let Ok(loaded) = self.photo_rx.try_recv() {
            self.photo_loaded(loaded);
        }
    }

    /// Photo reads still running belong to the story that was just cleared.
    pub fn forget_pending_photos(&mut self) {
        self.photo_generation += 1;
    }

    fn photo_loaded(&mut self, loaded: PhotoLoaded) {
        if loaded.generation != self.photo_generation {
            debug!(section = %loaded.section_id, "dropped photo read from before restart");
            return;
        }
        match loaded.result {
            Ok(photo) => match self.session.set_photo(&loaded.section_id, photo) {
                Ok(()) => self.set_status(format!("Photo added from {}", loaded.path.display())),
                Err(e) => self.set_status(format!("Could not attach photo: {e}")),
            },
            Err(PhotoError::Unsupported(path)) => {
                debug!(path = %path.display(), "ignored non-image file");
                self.clear_status();
            }
            Err(e) => {
                warn!(error = %e, "photo read failed");
                self.set_status(e.to_string());
            }
        }
    }

    // =========================================================================
    // Keeping the moment
    // =========================================================================

    pub fn export(&mut self, mode: ExportMode) {
        // Outcomes arrive as notices.
        let _ = self.session.export(mode, &mut self.host);
    }

    pub fn print(&mut self) {
        let _ = self.session.print(&mut self.host);
    }

    /// Run an export-gate option by its number (1-5).
    pub fn export_option(&mut self, option: u32) {
        match option {
            1 => {
                self.session.save_now();
            }
            2 => self.export(ExportMode::FullStory),
            3 => self.export(ExportMode::Reel),
            4 => self.export(ExportMode::Slides),
            5 => self.print(),
            _ => {}
        }
    }

    // =========================================================================
    // Time and session output
    // =========================================================================

    /// Advance idle animations.
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    /// Fire due timers and apply finished photo reads.
    pub fn poll(&mut self) {
        self.session.tick();
        self.drain_photos();
    }

    /// Run file work queued by a command.
    pub async fn run_pending_task(&mut self) {
        let Some(task) = self.pending_task.take() else {
            return;
        };
        match task {
            PendingTask::Backup(path) => {
                match persist::write_backup_file(self.session.record(), &path).await {
                    Ok(()) => self.set_status(format!("Backup written to {}", path.display())),
                    Err(e) => self.set_status(format!("Backup failed: {e}")),
                }
            }
            PendingTask::Import(path) => match tokio::fs::read_to_string(&path).await {
                // Rejected documents come back as a notice.
                Ok(content) => {
                    let _ = self.session.import(&content);
                }
                Err(e) => self.set_status(format!("Import failed: {e}")),
            },
        }
    }

    /// Pull notices, scroll requests and stage changes out of the session.
    pub fn process_session_output(&mut self) {
        let stage = self.session.stage();
        if stage != self.last_stage {
            debug!(from = %self.last_stage, to = %stage, "stage changed");
            if stage == Stage::Celebration {
                let count = self.session.presentation().timings().ornament_count;
                self.ornaments = Ornament::scatter(count, &mut rand::thread_rng());
            }
            if stage == Stage::Intro {
                self.focused = 0;
            }
            self.last_stage = stage;
        }
        self.relayout();

        for notice in self.session.take_notices() {
            effects::process_notice(self, notice);
        }
        if let Some(request) = self.session.take_scroll() {
            effects::process_scroll(self, request);
        }
        self.sync_viewport();
    }

    pub fn ornaments(&self) -> &[Ornament] {
        &self.ornaments
    }

    // =========================================================================
    // Overlays and status
    // =========================================================================

    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Set status message (always overwrites)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
