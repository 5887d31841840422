//! Celebration overlay with rising ornaments

use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget},
};

use crate::ui::theme::TimelineTheme;

const GLYPHS: [char; 4] = ['♥', '❤', '♡', '✿'];

/// One ornament, placed relative to the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ornament {
    /// Horizontal position, 0.0 (left) to 1.0 (right).
    pub x: f32,
    /// Starting height, 0.0 (top) to 1.0 (bottom).
    pub y: f32,
    pub glyph: char,
}

impl Ornament {
    /// Scatter `count` ornaments across the screen.
    pub fn scatter(count: usize, rng: &mut impl Rng) -> Vec<Ornament> {
        (0..count)
            .map(|_| Ornament {
                x: rng.gen_range(0.0..1.0),
                y: rng.gen_range(0.4..1.0),
                glyph: GLYPHS[rng.gen_range(0..GLYPHS.len())],
            })
            .collect()
    }
}

/// Widget for the celebration screen
pub struct CelebrationWidget<'a> {
    ornaments: &'a [Ornament],
    released: usize,
    frame: u8,
    theme: &'a TimelineTheme,
}

impl<'a> CelebrationWidget<'a> {
    pub fn new(ornaments: &'a [Ornament], theme: &'a TimelineTheme) -> Self {
        Self {
            ornaments,
            released: 0,
            frame: 0,
            theme,
        }
    }

    /// Only the first `released` ornaments are drawn.
    pub fn released(mut self, released: usize) -> Self {
        self.released = released;
        self
    }

    pub fn frame(mut self, frame: u8) -> Self {
        self.frame = frame;
        self
    }
}

impl Widget for CelebrationWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        if area.width == 0 || area.height == 0 {
            return;
        }

        let rise = (self.frame / 4) as u16;
        for (i, ornament) in self.ornaments.iter().take(self.released).enumerate() {
            let x = area.x + ((area.width - 1) as f32 * ornament.x) as u16;
            let start = ((area.height - 1) as f32 * ornament.y) as u16;
            // Each ornament drifts upward and wraps, staggered by index.
            let climbed = (rise + i as u16 * 3) % area.height;
            let y = area.y + (start + area.height - climbed) % area.height;
            buf[(x, y)]
                .set_char(ornament.glyph)
                .set_style(self.theme.ornament_style());
        }

        let message = vec![
            Line::from(Span::styled("❤", self.theme.ornament_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Let's preserve these memories",
                self.theme.heading_style(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press any key to continue",
                self.theme.dim_style(),
            )),
        ];
        let height = message.len() as u16;
        let body = Rect {
            y: area.y + area.height.saturating_sub(height) / 2,
            height: height.min(area.height),
            ..area
        };
        Paragraph::new(message)
            .alignment(Alignment::Center)
            .render(body, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scatter_stays_on_screen() {
        let mut rng = StdRng::seed_from_u64(14);
        let ornaments = Ornament::scatter(20, &mut rng);
        assert_eq!(ornaments.len(), 20);
        assert!(ornaments
            .iter()
            .all(|o| (0.0..1.0).contains(&o.x) && (0.4..1.0).contains(&o.y)));
    }

    #[test]
    fn test_only_released_ornaments_drawn() {
        let theme = TimelineTheme::default();
        let ornaments = vec![
            Ornament { x: 0.0, y: 0.95, glyph: '✿' },
            Ornament { x: 1.0, y: 0.95, glyph: '✿' },
        ];
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        CelebrationWidget::new(&ornaments, &theme)
            .released(1)
            .render(area, &mut buf);
        let drawn = buf.content().iter().filter(|c| c.symbol() == "✿").count();
        assert_eq!(drawn, 1);
    }
}
