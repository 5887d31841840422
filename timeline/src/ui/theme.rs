//! Color theme and styling for the timeline TUI

use ratatui::style::{Color, Modifier, Style};

/// Timeline UI color theme
#[derive(Debug, Clone)]
pub struct TimelineTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Journey colors
    pub heading: Color,
    pub subtitle: Color,
    pub story_text: Color,
    pub placeholder: Color,
    pub accent: Color,
    pub ornament: Color,

    // Status colors
    pub saved: Color,
    pub warning: Color,
}

impl Default for TimelineTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::LightMagenta,

            heading: Color::LightMagenta,
            subtitle: Color::Magenta,
            story_text: Color::White,
            placeholder: Color::DarkGray,
            accent: Color::LightRed,
            ornament: Color::Red,

            saved: Color::Green,
            warning: Color::Yellow,
        }
    }
}

impl TimelineTheme {
    /// Get style for normal text
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    /// Get style for section and screen headings
    pub fn heading_style(&self) -> Style {
        Style::default()
            .fg(self.heading)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for the poetic guide lines
    pub fn subtitle_style(&self) -> Style {
        Style::default()
            .fg(self.subtitle)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for written stories
    pub fn story_style(&self) -> Style {
        Style::default().fg(self.story_text)
    }

    /// Get style for empty-input hints
    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder)
            .add_modifier(Modifier::DIM)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn ornament_style(&self) -> Style {
        Style::default()
            .fg(self.ornament)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Get style for status messages
    pub fn status_style(&self, warning: bool) -> Style {
        Style::default().fg(if warning { self.warning } else { self.saved })
    }
}
