//! The presentation state machine.
//!
//! The journey is a linear sequence of stages driven by two kinds of input:
//! regions becoming visible and timers elapsing. [`Presentation::handle`] is
//! a pure transition: it updates the machine and returns [`Command`]s for the
//! session to carry out (schedule a timer, clear the record, scroll). It
//! never reads a clock, so the whole journey can be replayed in tests with
//! fake time and fake visibility.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::config::Timings;
use crate::visibility::RegionId;

/// One step of the journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    /// Welcome screen, nothing scheduled.
    #[default]
    Intro,
    /// Prompts are being revealed and filled in.
    Capture,
    /// The pause before the recap.
    Transition,
    /// Timed slideshow of every section.
    Recap,
    /// The question, with continue / start over.
    Proposal,
    /// Full-screen burst of ornaments.
    Celebration,
    /// Save and export actions.
    Export,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Intro => "intro",
            Stage::Capture => "capture",
            Stage::Transition => "transition",
            Stage::Recap => "recap",
            Stage::Proposal => "proposal",
            Stage::Celebration => "celebration",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timers the machine asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKind {
    RevealPrompt(String),
    RevealTransitionText,
    StartRecap,
    RecapAdvance,
    RecapFinish,
    Ornament(usize),
}

impl TimerKind {
    pub fn group(&self) -> TimerGroup {
        match self {
            TimerKind::RevealPrompt(_) => TimerGroup::Reveal,
            TimerKind::RevealTransitionText | TimerKind::StartRecap => TimerGroup::Transition,
            TimerKind::RecapAdvance | TimerKind::RecapFinish => TimerGroup::Recap,
            TimerKind::Ornament(_) => TimerGroup::Ornaments,
        }
    }
}

/// Families of timers that are cancelled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerGroup {
    Reveal,
    Transition,
    Recap,
    Ornaments,
    /// Every timer except prompt reveals.
    Journey,
}

impl TimerGroup {
    pub fn contains(&self, timer: &TimerKind) -> bool {
        match self {
            TimerGroup::Journey => timer.group() != TimerGroup::Reveal,
            group => timer.group() == *group,
        }
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The user scrolled away from the top of the page.
    ScrolledPastIntro,
    /// A region crossed its visibility threshold for the first time.
    RegionVisible(RegionId),
    /// A scheduled timer fired.
    TimerElapsed(TimerKind),
    /// The user asked to skip the recap.
    SkipRecap,
    /// "Save & Share" in the proposal.
    Continue,
    /// "Start over": needs confirmation before anything is cleared.
    RestartRequested,
    RestartConfirmed,
    RestartDeclined,
    /// Any click on the celebration overlay.
    DismissCelebration,
}

/// Side effects the session must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Schedule { timer: TimerKind, after: Duration },
    CancelTimers(TimerGroup),
    /// Begin observing the proposal region.
    ObserveProposal,
    /// Give the transition and proposal regions a fresh observation lifetime.
    RearmJourney,
    /// Ask the user to confirm an irreversible restart.
    AskRestartConfirmation,
    /// Drop the in-memory and persisted record.
    ClearRecord,
    ScrollToTop,
    ScrollToExport,
}

/// Whether the recap is still playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecapStatus {
    Playing,
    Finished,
}

/// Progress through the recap slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecapState {
    /// Index of the slide on screen.
    pub index: usize,
    pub status: RecapStatus,
    /// Set when the user skipped instead of watching to the end.
    pub skipped: bool,
}

/// The journey state machine.
#[derive(Debug, Clone)]
pub struct Presentation {
    stage: Stage,
    timings: Timings,
    slide_count: usize,
    revealed: HashSet<String>,
    transition_text: bool,
    recap: Option<RecapState>,
    proposal_unlocked: bool,
    unlock_count: usize,
    ornaments_released: usize,
    restart_pending: bool,
}

impl Presentation {
    /// A machine whose recap shows `slide_count` slides.
    pub fn new(slide_count: usize, timings: Timings) -> Self {
        Self {
            stage: Stage::Intro,
            timings,
            slide_count,
            revealed: HashSet::new(),
            transition_text: false,
            recap: None,
            proposal_unlocked: false,
            unlock_count: 0,
            ornaments_released: 0,
            restart_pending: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Whether a prompt's content has finished its reveal delay.
    pub fn is_revealed(&self, section_id: &str) -> bool {
        self.revealed.contains(section_id)
    }

    pub fn transition_text_visible(&self) -> bool {
        self.transition_text
    }

    pub fn recap(&self) -> Option<&RecapState> {
        self.recap.as_ref()
    }

    /// The slide on screen while the recap is playing.
    pub fn recap_slide(&self) -> Option<usize> {
        self.recap
            .filter(|r| r.status == RecapStatus::Playing)
            .map(|r| r.index)
    }

    pub fn is_recap_playing(&self) -> bool {
        self.recap_slide().is_some()
    }

    pub fn proposal_unlocked(&self) -> bool {
        self.proposal_unlocked
    }

    /// How many times the proposal gate has been unlocked since the last restart.
    pub fn unlock_count(&self) -> usize {
        self.unlock_count
    }

    pub fn ornaments_released(&self) -> usize {
        self.ornaments_released
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    /// Apply an event and return the side effects it requires.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let before = self.stage;
        let commands = match event {
            Event::ScrolledPastIntro => {
                if self.stage == Stage::Intro {
                    self.stage = Stage::Capture;
                }
                Vec::new()
            }
            Event::RegionVisible(region) => self.on_region_visible(region),
            Event::TimerElapsed(timer) => self.on_timer(timer),
            Event::SkipRecap => self.skip_recap(),
            Event::Continue => self.continue_to_celebration(),
            Event::DismissCelebration => {
                if self.stage == Stage::Celebration {
                    self.stage = Stage::Export;
                    vec![
                        Command::CancelTimers(TimerGroup::Ornaments),
                        Command::ScrollToExport,
                    ]
                } else {
                    Vec::new()
                }
            }
            Event::RestartRequested => {
                if self.restart_pending {
                    Vec::new()
                } else {
                    self.restart_pending = true;
                    vec![Command::AskRestartConfirmation]
                }
            }
            Event::RestartConfirmed => self.restart(),
            Event::RestartDeclined => {
                self.restart_pending = false;
                Vec::new()
            }
        };

        if self.stage != before {
            debug!(from = %before, to = %self.stage, "stage changed");
        }
        commands
    }

    fn on_region_visible(&mut self, region: RegionId) -> Vec<Command> {
        match region {
            RegionId::Prompt(id) => {
                if self.stage == Stage::Intro {
                    self.stage = Stage::Capture;
                }
                if self.revealed.contains(&id) {
                    return Vec::new();
                }
                vec![Command::Schedule {
                    timer: TimerKind::RevealPrompt(id),
                    after: self.timings.prompt_reveal,
                }]
            }
            RegionId::Transition => {
                if !matches!(self.stage, Stage::Intro | Stage::Capture) {
                    return Vec::new();
                }
                self.stage = Stage::Transition;
                vec![
                    Command::Schedule {
                        timer: TimerKind::RevealTransitionText,
                        after: self.timings.transition_text,
                    },
                    Command::Schedule {
                        timer: TimerKind::StartRecap,
                        after: self.timings.recap_start,
                    },
                ]
            }
            RegionId::Proposal => {
                // Double gate: the recap must be over, not merely scrolled past.
                if self.proposal_unlocked && self.stage == Stage::Recap {
                    self.stage = Stage::Proposal;
                }
                Vec::new()
            }
            RegionId::Intro | RegionId::Export => Vec::new(),
        }
    }

    fn on_timer(&mut self, timer: TimerKind) -> Vec<Command> {
        match timer {
            TimerKind::RevealPrompt(id) => {
                self.revealed.insert(id);
                Vec::new()
            }
            TimerKind::RevealTransitionText => {
                if self.stage == Stage::Transition {
                    self.transition_text = true;
                }
                Vec::new()
            }
            TimerKind::StartRecap => {
                if self.stage != Stage::Transition {
                    return Vec::new();
                }
                self.stage = Stage::Recap;
                self.recap = Some(RecapState {
                    index: 0,
                    status: RecapStatus::Playing,
                    skipped: false,
                });
                if self.slide_count == 0 {
                    vec![self.schedule_finish()]
                } else {
                    vec![self.schedule_advance()]
                }
            }
            TimerKind::RecapAdvance => {
                let Some(recap) = self.recap.as_mut() else {
                    return Vec::new();
                };
                if recap.status != RecapStatus::Playing {
                    return Vec::new();
                }
                if recap.index + 1 >= self.slide_count {
                    vec![self.schedule_finish()]
                } else {
                    recap.index += 1;
                    vec![self.schedule_advance()]
                }
            }
            TimerKind::RecapFinish => self.unlock_proposal(),
            TimerKind::Ornament(n) => {
                if self.stage == Stage::Celebration {
                    self.ornaments_released = self.ornaments_released.max(n + 1);
                }
                Vec::new()
            }
        }
    }

    fn schedule_advance(&self) -> Command {
        Command::Schedule {
            timer: TimerKind::RecapAdvance,
            after: self.timings.recap_slide,
        }
    }

    fn schedule_finish(&self) -> Command {
        Command::Schedule {
            timer: TimerKind::RecapFinish,
            after: self.timings.recap_finish,
        }
    }

    fn skip_recap(&mut self) -> Vec<Command> {
        match self.recap.as_mut() {
            Some(recap) if recap.status == RecapStatus::Playing => {
                recap.skipped = true;
                let mut commands = vec![Command::CancelTimers(TimerGroup::Recap)];
                commands.extend(self.unlock_proposal());
                commands
            }
            _ => Vec::new(),
        }
    }

    fn unlock_proposal(&mut self) -> Vec<Command> {
        if self.proposal_unlocked {
            return Vec::new();
        }
        if let Some(recap) = self.recap.as_mut() {
            recap.status = RecapStatus::Finished;
        }
        self.proposal_unlocked = true;
        self.unlock_count += 1;
        debug!("proposal unlocked");
        vec![Command::ObserveProposal]
    }

    fn continue_to_celebration(&mut self) -> Vec<Command> {
        if self.stage != Stage::Proposal {
            return Vec::new();
        }
        self.stage = Stage::Celebration;
        self.ornaments_released = 0;
        (0..self.timings.ornament_count)
            .map(|n| Command::Schedule {
                timer: TimerKind::Ornament(n),
                after: self.timings.ornament_stagger * n as u32,
            })
            .collect()
    }

    fn restart(&mut self) -> Vec<Command> {
        if !self.restart_pending {
            return Vec::new();
        }
        // Prompt reveals survive, including those still counting down.
        let revealed = std::mem::take(&mut self.revealed);
        *self = Self::new(self.slide_count, self.timings);
        self.revealed = revealed;
        vec![
            Command::CancelTimers(TimerGroup::Journey),
            Command::ClearRecord,
            Command::RearmJourney,
            Command::ScrollToTop,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TimerQueue;

    /// Minimal driver: a machine plus a timer queue on fake time.
    struct Driver {
        machine: Presentation,
        timers: TimerQueue<TimerKind>,
        now: Duration,
        log: Vec<Command>,
    }

    impl Driver {
        fn new(slides: usize) -> Self {
            Self {
                machine: Presentation::new(slides, Timings::default()),
                timers: TimerQueue::new(),
                now: Duration::ZERO,
                log: Vec::new(),
            }
        }

        fn send(&mut self, event: Event) {
            let at = self.now;
            self.apply(event, at);
        }

        fn apply(&mut self, event: Event, at: Duration) {
            for command in self.machine.handle(event) {
                match &command {
                    Command::Schedule { timer, after } => {
                        self.timers.schedule(timer.clone(), at + *after);
                    }
                    Command::CancelTimers(group) => {
                        self.timers.cancel_where(|t| group.contains(t));
                    }
                    _ => {}
                }
                self.log.push(command);
            }
        }

        fn advance_ms(&mut self, ms: u64) {
            self.now += Duration::from_millis(ms);
            while let Some((due, timer)) = self.timers.pop_due(self.now) {
                self.apply(Event::TimerElapsed(timer), due);
            }
        }

        fn to_recap(&mut self) {
            self.send(Event::RegionVisible(RegionId::Transition));
            self.advance_ms(2000);
            assert_eq!(self.machine.stage(), Stage::Recap);
        }
    }

    #[test]
    fn test_intro_to_capture_on_prompt() {
        let mut d = Driver::new(5);
        d.send(Event::RegionVisible(RegionId::prompt("beginning")));
        assert_eq!(d.machine.stage(), Stage::Capture);
        assert!(!d.machine.is_revealed("beginning"));
        d.advance_ms(299);
        assert!(!d.machine.is_revealed("beginning"));
        d.advance_ms(1);
        assert!(d.machine.is_revealed("beginning"));
    }

    #[test]
    fn test_scrolling_past_intro_enters_capture() {
        let mut d = Driver::new(5);
        d.send(Event::ScrolledPastIntro);
        assert_eq!(d.machine.stage(), Stage::Capture);
    }

    #[test]
    fn test_prompt_reveals_are_independent() {
        let mut d = Driver::new(5);
        d.send(Event::RegionVisible(RegionId::prompt("first-met")));
        d.advance_ms(200);
        d.send(Event::RegionVisible(RegionId::prompt("beginning")));
        d.advance_ms(100);
        assert!(d.machine.is_revealed("first-met"));
        assert!(!d.machine.is_revealed("beginning"));
        d.advance_ms(200);
        assert!(d.machine.is_revealed("beginning"));
    }

    #[test]
    fn test_transition_text_then_recap() {
        let mut d = Driver::new(5);
        d.send(Event::RegionVisible(RegionId::Transition));
        assert_eq!(d.machine.stage(), Stage::Transition);
        d.advance_ms(799);
        assert!(!d.machine.transition_text_visible());
        d.advance_ms(1);
        assert!(d.machine.transition_text_visible());
        d.advance_ms(1199);
        assert_eq!(d.machine.stage(), Stage::Transition);
        d.advance_ms(1);
        assert_eq!(d.machine.stage(), Stage::Recap);
        assert_eq!(d.machine.recap_slide(), Some(0));
    }

    #[test]
    fn test_recap_unlocks_exactly_once_at_end() {
        let mut d = Driver::new(5);
        d.to_recap();

        // 5 slides x 3000ms + 1500ms.
        d.advance_ms(16_499);
        assert!(!d.machine.proposal_unlocked());
        assert_eq!(d.machine.recap_slide(), Some(4));
        d.advance_ms(1);
        assert!(d.machine.proposal_unlocked());
        assert_eq!(d.machine.unlock_count(), 1);

        d.advance_ms(60_000);
        assert_eq!(d.machine.unlock_count(), 1);
        let observes = d
            .log
            .iter()
            .filter(|c| **c == Command::ObserveProposal)
            .count();
        assert_eq!(observes, 1);
    }

    #[test]
    fn test_recap_with_no_slides() {
        let mut d = Driver::new(0);
        d.to_recap();
        d.advance_ms(1499);
        assert!(!d.machine.proposal_unlocked());
        d.advance_ms(1);
        assert!(d.machine.proposal_unlocked());
    }

    #[test]
    fn test_skip_unlocks_immediately() {
        let mut d = Driver::new(5);
        d.to_recap();
        d.advance_ms(3000);
        assert_eq!(d.machine.recap_slide(), Some(1));

        d.send(Event::SkipRecap);
        assert!(d.machine.proposal_unlocked());
        assert!(d.machine.recap().is_some_and(|r| r.skipped));
        assert!(d.timers.pending().all(|t| t.group() != TimerGroup::Recap));

        // Neither more time nor a second skip unlocks again.
        d.advance_ms(60_000);
        d.send(Event::SkipRecap);
        assert_eq!(d.machine.unlock_count(), 1);
    }

    #[test]
    fn test_skip_outside_recap_is_ignored() {
        let mut d = Driver::new(5);
        d.send(Event::SkipRecap);
        assert!(!d.machine.proposal_unlocked());
        assert_eq!(d.machine.stage(), Stage::Intro);
    }

    #[test]
    fn test_proposal_is_double_gated() {
        let mut d = Driver::new(5);
        d.to_recap();
        d.send(Event::RegionVisible(RegionId::Proposal));
        assert_eq!(d.machine.stage(), Stage::Recap);

        d.send(Event::SkipRecap);
        assert_eq!(d.machine.stage(), Stage::Recap);
        d.send(Event::RegionVisible(RegionId::Proposal));
        assert_eq!(d.machine.stage(), Stage::Proposal);
    }

    #[test]
    fn test_celebration_releases_staggered_ornaments() {
        let mut d = Driver::new(5);
        d.to_recap();
        d.send(Event::SkipRecap);
        d.send(Event::RegionVisible(RegionId::Proposal));
        d.send(Event::Continue);
        assert_eq!(d.machine.stage(), Stage::Celebration);

        d.advance_ms(0);
        assert_eq!(d.machine.ornaments_released(), 1);
        d.advance_ms(1000);
        assert_eq!(d.machine.ornaments_released(), 6);
        d.advance_ms(10_000);
        assert_eq!(d.machine.ornaments_released(), 20);

        d.send(Event::DismissCelebration);
        assert_eq!(d.machine.stage(), Stage::Export);
        assert!(d.log.contains(&Command::ScrollToExport));
    }

    #[test]
    fn test_dismiss_cancels_remaining_ornaments() {
        let mut d = Driver::new(5);
        d.to_recap();
        d.send(Event::SkipRecap);
        d.send(Event::RegionVisible(RegionId::Proposal));
        d.send(Event::Continue);
        d.advance_ms(400);
        d.send(Event::DismissCelebration);
        assert!(d.timers.is_empty());
    }

    #[test]
    fn test_restart_requires_confirmation() {
        let mut d = Driver::new(5);
        d.to_recap();
        d.send(Event::SkipRecap);
        d.send(Event::RegionVisible(RegionId::Proposal));

        d.send(Event::RestartRequested);
        assert!(d.machine.restart_pending());
        assert_eq!(d.log.last(), Some(&Command::AskRestartConfirmation));

        d.send(Event::RestartDeclined);
        assert!(!d.machine.restart_pending());
        assert_eq!(d.machine.stage(), Stage::Proposal);
        assert!(!d.log.contains(&Command::ClearRecord));

        // Confirming without a pending request does nothing.
        d.send(Event::RestartConfirmed);
        assert_eq!(d.machine.stage(), Stage::Proposal);
    }

    #[test]
    fn test_confirmed_restart_resets_to_intro() {
        let mut d = Driver::new(5);
        d.send(Event::RegionVisible(RegionId::prompt("today")));
        d.advance_ms(300);
        d.to_recap();
        d.send(Event::SkipRecap);
        d.send(Event::RegionVisible(RegionId::Proposal));

        d.send(Event::RestartRequested);
        d.send(Event::RestartConfirmed);

        assert_eq!(d.machine.stage(), Stage::Intro);
        assert!(!d.machine.proposal_unlocked());
        assert!(d.machine.recap().is_none());
        assert!(d.machine.is_revealed("today"));
        for expected in [
            Command::CancelTimers(TimerGroup::Journey),
            Command::ClearRecord,
            Command::RearmJourney,
            Command::ScrollToTop,
        ] {
            assert!(d.log.contains(&expected), "missing {expected:?}");
        }
    }

    #[test]
    fn test_late_transition_visibility_is_ignored() {
        let mut d = Driver::new(5);
        d.to_recap();
        let commands = d.machine.handle(Event::RegionVisible(RegionId::Transition));
        assert!(commands.is_empty());
        assert_eq!(d.machine.stage(), Stage::Recap);
    }
}
