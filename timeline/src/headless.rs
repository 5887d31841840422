//! Headless mode for the timeline.
//!
//! This module drives the same session as the TUI from plain text lines,
//! for scripted use and automated testing. Every line is a `#` command;
//! responses are tagged lines such as `[STAGE]`, `[NOTICE]` and `[ERROR]`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use timeline_core::persist::backup_file_name;
use timeline_core::{
    photo, Clock, DirectoryHost, Host, KeyValueStore, PhotoError, RegionId, Stage,
    TimelineSession,
};

use crate::app::parse_export_mode;

const HELP: &[&str] = &[
    "  #write <section> <text>   - Write a section's story",
    "  #photo <section> <path>   - Attach a photo",
    "  #unphoto <section>        - Remove a photo",
    "  #see <region> [fraction]  - Report a region on screen (intro, transition,",
    "                              proposal, export or a section id)",
    "  #wait <ms>                - Let time pass",
    "  #skip                     - Skip the recap",
    "  #continue                 - Save & share from the proposal",
    "  #dismiss                  - Close the celebration",
    "  #restart / #yes / #no     - Start over, with confirmation",
    "  #save                     - Save locally",
    "  #export full|reel|slides  - Write documents",
    "  #print                    - Write a print copy",
    "  #backup [path]            - Write a JSON backup",
    "  #import <path>            - Replace the story with a backup",
    "  #status                   - Show the journey state",
    "  #quit                     - Exit",
];

/// Outcome of one headless line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

/// Runs headless commands against a session.
pub struct HeadlessRunner<S, C, H = DirectoryHost> {
    pub session: TimelineSession<S, C>,
    pub host: H,
    last_stage: Stage,
}

impl<S: KeyValueStore, C: Clock, H: Host> HeadlessRunner<S, C, H> {
    pub fn new(session: TimelineSession<S, C>, host: H) -> Self {
        let last_stage = session.stage();
        Self {
            session,
            host,
            last_stage,
        }
    }

    fn region(&self, name: &str) -> Option<RegionId> {
        match name {
            "intro" => Some(RegionId::Intro),
            "transition" => Some(RegionId::Transition),
            "proposal" => Some(RegionId::Proposal),
            "export" => Some(RegionId::Export),
            id if self.session.catalog().contains(id) => Some(RegionId::prompt(id)),
            _ => None,
        }
    }

    /// Run one input line and return the lines to print.
    pub async fn execute(&mut self, line: &str) -> (Step, Vec<String>) {
        let mut out = Vec::new();
        let line = line.trim();
        let Some(command) = line.strip_prefix('#') else {
            out.push("[ERROR] Commands start with #. Type #help for help.".to_string());
            return (Step::Continue, out);
        };

        let (name, rest) = match command.trim().split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command.trim(), ""),
        };
        debug!(command = name, "headless command");

        let step = match name {
            "quit" | "exit" => {
                self.session.flush();
                out.push("Goodbye!".to_string());
                Step::Quit
            }
            "help" => {
                out.push("[HELP]".to_string());
                out.extend(HELP.iter().map(|s| s.to_string()));
                Step::Continue
            }
            "write" => {
                match rest.split_once(char::is_whitespace) {
                    Some((id, text)) => {
                        if let Err(e) = self.session.edit_story(id, text.trim()) {
                            out.push(format!("[ERROR] {e}"));
                        }
                    }
                    None => out.push("[ERROR] Usage: #write <section> <text>".to_string()),
                }
                Step::Continue
            }
            "photo" => {
                match rest.split_once(char::is_whitespace) {
                    Some((id, path)) => self.attach_photo(id, PathBuf::from(path.trim()), &mut out).await,
                    None => out.push("[ERROR] Usage: #photo <section> <path>".to_string()),
                }
                Step::Continue
            }
            "unphoto" => {
                if let Err(e) = self.session.remove_photo(rest) {
                    out.push(format!("[ERROR] {e}"));
                }
                Step::Continue
            }
            "see" => {
                let mut parts = rest.split_whitespace();
                let region = parts.next().and_then(|r| self.region(r));
                let fraction = parts.next().map(str::parse::<f32>).unwrap_or(Ok(1.0));
                match (region, fraction) {
                    (Some(region), Ok(fraction)) => {
                        self.session.report_visibility(&region, fraction.clamp(0.0, 1.0))
                    }
                    _ => out.push("[ERROR] Usage: #see <region> [fraction]".to_string()),
                }
                Step::Continue
            }
            "wait" => {
                match rest.parse::<u64>() {
                    Ok(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
                    Err(_) => out.push("[ERROR] Usage: #wait <ms>".to_string()),
                }
                Step::Continue
            }
            "skip" => {
                self.session.skip_recap();
                Step::Continue
            }
            "continue" => {
                self.session.continue_journey();
                Step::Continue
            }
            "dismiss" => {
                self.session.dismiss_celebration();
                Step::Continue
            }
            "restart" => {
                self.session.request_restart();
                Step::Continue
            }
            "yes" => {
                self.session.confirm_restart();
                Step::Continue
            }
            "no" => {
                self.session.decline_restart();
                Step::Continue
            }
            "save" => {
                self.session.save_now();
                Step::Continue
            }
            "export" => {
                match parse_export_mode(rest) {
                    Some(mode) => {
                        let _ = self.session.export(mode, &mut self.host);
                    }
                    None => out.push("[ERROR] Usage: #export full|reel|slides".to_string()),
                }
                Step::Continue
            }
            "print" => {
                let _ = self.session.print(&mut self.host);
                Step::Continue
            }
            "backup" => {
                let path = if rest.is_empty() {
                    PathBuf::from(backup_file_name(self.session.clock().wall()))
                } else {
                    PathBuf::from(rest)
                };
                match timeline_core::persist::write_backup_file(self.session.record(), &path).await {
                    Ok(()) => out.push(format!("[SAVED] Backup written to {}", path.display())),
                    Err(e) => out.push(format!("[ERROR] Backup failed: {e}")),
                }
                Step::Continue
            }
            "import" => {
                match tokio::fs::read_to_string(rest).await {
                    // Rejections arrive as a notice.
                    Ok(content) => {
                        let _ = self.session.import(&content);
                    }
                    Err(e) => out.push(format!("[ERROR] Import failed: {e}")),
                }
                Step::Continue
            }
            "status" => {
                self.status(&mut out);
                Step::Continue
            }
            _ => {
                out.push("[ERROR] Unknown command. Type #help for help.".to_string());
                Step::Continue
            }
        };

        self.session.tick();
        self.report(&mut out);
        (step, out)
    }

    async fn attach_photo(&mut self, id: &str, path: PathBuf, out: &mut Vec<String>) {
        match photo::ingest(&path).await {
            Ok(photo) => {
                if let Err(e) = self.session.set_photo(id, photo) {
                    out.push(format!("[ERROR] {e}"));
                }
            }
            Err(PhotoError::Unsupported(_)) => {}
            Err(e) => out.push(format!("[ERROR] {e}")),
        }
    }

    /// Stage changes and notices since the last call.
    fn report(&mut self, out: &mut Vec<String>) {
        let stage = self.session.stage();
        if stage != self.last_stage {
            out.push(format!("[STAGE] {stage}"));
            self.last_stage = stage;
        }
        if self.session.presentation().is_recap_playing() {
            if let Some(slide) = self.session.recap_slide() {
                out.push(format!(
                    "[RECAP] {}/{} {}",
                    slide.index + 1,
                    slide.total,
                    slide.section.title
                ));
            }
        }
        for notice in self.session.take_notices() {
            out.push(format!("[NOTICE] {notice}"));
        }
        if let Some(scroll) = self.session.take_scroll() {
            out.push(format!("[SCROLL] {scroll:?}"));
        }
    }

    fn status(&self, out: &mut Vec<String>) {
        let presentation = self.session.presentation();
        out.push("[STATUS]".to_string());
        out.push(format!("  Stage: {}", self.session.stage()));
        for section in self.session.catalog() {
            let record = self.session.record();
            let written = record.story(&section.id).map_or(0, |s| s.chars().count());
            out.push(format!(
                "  {:<14} revealed: {:<5} chars: {:<4} photo: {}",
                section.id,
                self.session.is_revealed(&section.id),
                written,
                record.photo(&section.id).is_some()
            ));
        }
        out.push(format!("  Proposal unlocked: {}", presentation.proposal_unlocked()));
        out.push(format!("  Pending timers: {}", self.session.pending_timers()));
        out.push(format!("  Autosave pending: {}", self.session.autosave_pending()));
    }
}

/// Run the timeline in headless mode, reading commands from stdin.
pub async fn run_headless<S: KeyValueStore, C: Clock>(
    session: TimelineSession<S, C>,
    host: DirectoryHost,
) -> io::Result<()> {
    let mut runner = HeadlessRunner::new(session, host);

    println!("=== Timeline of Us - Headless Mode ===");
    println!("Stage: {}", runner.session.stage());
    println!();
    println!("Commands:");
    for line in HELP {
        println!("{line}");
    }
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let (step, output) = runner.execute(&line).await;
        for out in output {
            println!("{out}");
        }
        stdout.flush().ok();

        if step == Step::Quit {
            break;
        }
    }

    runner.session.flush();
    runner.session.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_core::testing::{RecordingHost, RecordingStore};
    use timeline_core::{ManualClock, SectionCatalog, StoryStorage, Timings};

    fn runner() -> HeadlessRunner<RecordingStore, ManualClock, RecordingHost> {
        let clock = ManualClock::new(Default::default());
        let session = TimelineSession::new(
            SectionCatalog::standard().clone(),
            StoryStorage::new(RecordingStore::new()),
            clock,
            Timings::default(),
        );
        HeadlessRunner::new(session, RecordingHost::new())
    }

    #[tokio::test]
    async fn test_write_and_save() {
        let mut runner = runner();
        let (_, out) = runner.execute("#write today Still choosing you.").await;
        assert!(out.is_empty(), "{out:?}");
        let (_, out) = runner.execute("#save").await;
        assert_eq!(out, vec!["[NOTICE] Your moment has been saved."]);
        assert_eq!(runner.session.record().story("today"), Some("Still choosing you."));
    }

    #[tokio::test]
    async fn test_see_reports_stage_changes() {
        let mut runner = runner();
        let (_, out) = runner.execute("#see first-met").await;
        assert_eq!(out, vec!["[STAGE] capture"]);
        let (_, out) = runner.execute("#see nowhere").await;
        assert!(out[0].starts_with("[ERROR]"));
    }

    #[tokio::test]
    async fn test_reel_without_photos() {
        let mut runner = runner();
        let (_, out) = runner.execute("#export reel").await;
        assert_eq!(
            out,
            vec!["[NOTICE] Please add at least one photo to create a story template."]
        );
        assert!(runner.host.downloads.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_quit() {
        let mut runner = runner();
        let (step, out) = runner.execute("hello").await;
        assert_eq!(step, Step::Continue);
        assert!(out[0].starts_with("[ERROR]"));
        let (step, _) = runner.execute("#quit").await;
        assert_eq!(step, Step::Quit);
    }
}
