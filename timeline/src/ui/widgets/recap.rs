//! Recap slideshow widget

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use timeline_core::session::{RecapSlide, RECAP_TAGLINE};

use crate::ui::theme::TimelineTheme;

/// Widget for the current recap slide
pub struct RecapWidget<'a> {
    slide: &'a RecapSlide<'a>,
    theme: &'a TimelineTheme,
}

impl<'a> RecapWidget<'a> {
    pub fn new(slide: &'a RecapSlide<'a>, theme: &'a TimelineTheme) -> Self {
        Self { slide, theme }
    }

    /// Current, past and future slides as dots.
    fn progress(&self) -> Line<'a> {
        let spans: Vec<Span> = (0..self.slide.total)
            .map(|i| {
                if i == self.slide.index {
                    Span::styled("● ", self.theme.ornament_style())
                } else if i < self.slide.index {
                    Span::styled("● ", self.theme.accent_style())
                } else {
                    Span::styled("○ ", self.theme.dim_style())
                }
            })
            .collect();
        Line::from(spans)
    }
}

impl Widget for RecapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Our Story ")
            .title_bottom(Line::from(" s skip ").right_aligned())
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true));
        let inner = block.inner(area);
        block.render(area, buf);

        let section = self.slide.section;
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(section.title.to_uppercase(), self.theme.heading_style())),
            Line::from(Span::styled(section.subtitle.as_str(), self.theme.subtitle_style())),
            Line::from(""),
        ];

        if self.slide.photo.is_some() {
            lines.push(Line::from(Span::styled("▣  photo", self.theme.accent_style())));
            lines.push(Line::from(""));
        }
        if let Some(quote) = &self.slide.quote {
            lines.push(Line::from(Span::styled(
                format!("\u{201c}{quote}\u{201d}"),
                self.theme.story_style(),
            )));
            lines.push(Line::from(""));
        }
        if let Some(caption) = self.slide.caption() {
            lines.push(Line::from(Span::styled(caption, self.theme.subtitle_style())));
            lines.push(Line::from(""));
        }

        lines.push(self.progress());
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(RECAP_TAGLINE, self.theme.dim_style())));

        // Vertically center the slide body.
        let height = lines.len() as u16;
        let top = inner.height.saturating_sub(height) / 2;
        let body = Rect {
            y: inner.y + top,
            height: inner.height - top,
            ..inner
        };

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body, buf);
    }
}
