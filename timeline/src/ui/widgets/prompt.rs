//! One timeline prompt: heading, guide line, story and photo

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use timeline_core::{PhotoRef, Section};

use crate::ui::theme::TimelineTheme;

/// Widget for a single prompt region
pub struct PromptWidget<'a> {
    section: &'a Section,
    number: usize,
    story: Option<&'a str>,
    photo: Option<&'a PhotoRef>,
    revealed: bool,
    focused: bool,
    editing: bool,
    offset: u16,
    theme: &'a TimelineTheme,
}

impl<'a> PromptWidget<'a> {
    pub fn new(section: &'a Section, theme: &'a TimelineTheme) -> Self {
        Self {
            section,
            number: 1,
            story: None,
            photo: None,
            revealed: false,
            focused: false,
            editing: false,
            offset: 0,
            theme,
        }
    }

    pub fn number(mut self, number: usize) -> Self {
        self.number = number;
        self
    }

    pub fn story(mut self, story: Option<&'a str>) -> Self {
        self.story = story;
        self
    }

    pub fn photo(mut self, photo: Option<&'a PhotoRef>) -> Self {
        self.photo = photo;
        self
    }

    pub fn revealed(mut self, revealed: bool) -> Self {
        self.revealed = revealed;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    /// Rows of this region scrolled off above the viewport.
    pub fn offset(mut self, offset: u16) -> Self {
        self.offset = offset;
        self
    }

    fn photo_line(&self) -> Line<'a> {
        match self.photo {
            Some(photo) => Line::from(Span::styled(
                format!(
                    "  ▣ photo attached ({}, {} KB)",
                    photo.mime().unwrap_or("image"),
                    photo.len().div_ceil(1024)
                ),
                self.theme.accent_style(),
            )),
            None if self.focused => Line::from(Span::styled(
                "  □ no photo yet (p to add one)",
                self.theme.placeholder_style(),
            )),
            None => Line::from(Span::styled("  □ no photo yet", self.theme.placeholder_style())),
        }
    }
}

impl Widget for PromptWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let marker = if self.editing {
            "✎ "
        } else if self.focused {
            "▸ "
        } else {
            "  "
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(marker, self.theme.accent_style()),
                Span::styled(format!("{:02}  ", self.number), self.theme.dim_style()),
                Span::styled(self.section.title.to_uppercase(), self.theme.heading_style()),
            ]),
            Line::from(""),
        ];

        // Content fades in only after the reveal delay.
        if self.revealed {
            lines.push(Line::from(Span::styled(
                format!("  {}", self.section.subtitle),
                self.theme.subtitle_style(),
            )));
            lines.push(Line::from(""));
            match self.story.filter(|s| !s.trim().is_empty()) {
                Some(story) => {
                    for text in story.lines() {
                        lines.push(Line::from(Span::styled(
                            format!("  {text}"),
                            self.theme.story_style(),
                        )));
                    }
                }
                None => lines.push(Line::from(Span::styled(
                    format!("  {}", self.section.placeholder),
                    self.theme.placeholder_style().add_modifier(Modifier::ITALIC),
                ))),
            }
            lines.push(Line::from(""));
            lines.push(self.photo_line());
        } else {
            lines.push(Line::from(Span::styled("  · · ·", self.theme.dim_style())));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.offset, 0))
            .render(area, buf);
    }
}
