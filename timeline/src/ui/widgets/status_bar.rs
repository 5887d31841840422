//! Status bar widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use timeline_core::Stage;

use crate::app::InputMode;
use crate::ui::theme::TimelineTheme;

/// One-line status: mode, stage, save state and the latest message.
pub struct StatusBarWidget<'a> {
    mode: InputMode,
    stage: Stage,
    autosave_pending: bool,
    message: Option<&'a str>,
    theme: &'a TimelineTheme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: InputMode, stage: Stage, theme: &'a TimelineTheme) -> Self {
        Self {
            mode,
            stage,
            autosave_pending: false,
            message: None,
            theme,
        }
    }

    pub fn autosave_pending(mut self, pending: bool) -> Self {
        self.autosave_pending = pending;
        self
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mode = match self.mode {
            InputMode::Normal => " NORMAL ",
            InputMode::Insert => " INSERT ",
            InputMode::Command => " COMMAND ",
        };

        let mut spans = vec![
            Span::styled(
                mode,
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            ),
            Span::raw(" "),
            Span::styled(self.stage.name(), self.theme.subtitle_style()),
            Span::raw(" | "),
        ];

        if self.autosave_pending {
            spans.push(Span::styled("saving...", self.theme.status_style(true)));
        } else {
            spans.push(Span::styled("saved", self.theme.dim_style()));
        }

        if let Some(message) = self.message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message, self.theme.text_style()));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
