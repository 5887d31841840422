//! TUI widgets for the timeline

pub mod celebration;
pub mod input;
pub mod prompt;
pub mod recap;
pub mod status_bar;

pub use celebration::{CelebrationWidget, Ornament};
pub use input::InputWidget;
pub use prompt::PromptWidget;
pub use recap::RecapWidget;
pub use status_bar::StatusBarWidget;
