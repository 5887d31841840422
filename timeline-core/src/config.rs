//! Session configuration and journey pacing.

use std::path::PathBuf;
use std::time::Duration;

use crate::persist::DEFAULT_STORAGE_KEY;

/// Every fixed delay of the journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Delay before a prompt's content fades in after it becomes visible.
    pub prompt_reveal: Duration,
    /// Delay before the transition text appears.
    pub transition_text: Duration,
    /// Delay, from the transition becoming visible, before the recap starts.
    pub recap_start: Duration,
    /// How long each recap slide stays on screen.
    pub recap_slide: Duration,
    /// Pause after the last slide before the proposal unlocks.
    pub recap_finish: Duration,
    /// Quiet period after the last keystroke before text is saved.
    pub autosave_quiet: Duration,
    /// Spacing between celebration ornaments.
    pub ornament_stagger: Duration,
    /// Number of celebration ornaments.
    pub ornament_count: usize,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            prompt_reveal: Duration::from_millis(300),
            transition_text: Duration::from_millis(800),
            recap_start: Duration::from_millis(2000),
            recap_slide: Duration::from_millis(3000),
            recap_finish: Duration::from_millis(1500),
            autosave_quiet: Duration::from_millis(1000),
            ornament_stagger: Duration::from_millis(200),
            ornament_count: 20,
        }
    }
}

impl Timings {
    /// Total recap length for `slides` slides when nothing is skipped.
    pub fn recap_duration(&self, slides: usize) -> Duration {
        self.recap_slide * slides as u32 + self.recap_finish
    }
}

/// Where the session keeps its data and writes exports.
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Directory for the key-value store and the log file.
    pub data_dir: PathBuf,
    /// Directory exported documents are written to.
    pub export_dir: PathBuf,
    /// Store key for the story document.
    pub storage_key: String,
    /// Journey pacing.
    pub timings: Timings,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".timeline"),
            export_dir: PathBuf::from("."),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            timings: Timings::default(),
        }
    }
}

impl TimelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TIMELINE_DATA_DIR`, `TIMELINE_EXPORT_DIR`
    /// and `TIMELINE_STORAGE_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("TIMELINE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TIMELINE_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("TIMELINE_STORAGE_KEY") {
            if !key.trim().is_empty() {
                config.storage_key = key;
            }
        }
        config
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Log file location inside the data directory.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("timeline.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recap_duration() {
        let timings = Timings::default();
        assert_eq!(timings.recap_duration(5), Duration::from_millis(16_500));
        assert_eq!(timings.recap_duration(0), Duration::from_millis(1_500));
    }

    #[test]
    fn test_builder() {
        let config = TimelineConfig::new()
            .with_data_dir("/tmp/data")
            .with_export_dir("/tmp/out")
            .with_storage_key("k");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.storage_key, "k");
        assert_eq!(config.log_path(), PathBuf::from("/tmp/data/timeline.log"));
    }
}
