//! Screen layout and the scrollable document layout

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use timeline_core::{RegionId, SectionCatalog, Span, Stage};

/// Rows given to each prompt region.
pub const PROMPT_HEIGHT: u32 = 12;

/// Screen areas of the main view.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub title_area: Rect,
    pub document_area: Rect,
    pub status_bar: Rect,
    pub input_area: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);

        Self {
            title_area: chunks[0],
            document_area: chunks[1],
            status_bar: chunks[2],
            input_area: chunks[3],
        }
    }
}

/// Vertical placement of every region in the scrollable document.
///
/// Full-screen regions (intro, transition, proposal, export) take one
/// viewport height each, prompts take [`PROMPT_HEIGHT`] rows. The export
/// region only exists once the journey reaches it.
#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    pub regions: Vec<(RegionId, Span)>,
    pub total_height: u32,
}

impl DocumentLayout {
    pub fn calculate(catalog: &SectionCatalog, viewport_height: u32, stage: Stage) -> Self {
        let screen = viewport_height.max(1);
        let mut regions = Vec::with_capacity(catalog.len() + 4);
        let mut top = 0;

        let mut push = |region: RegionId, height: u32| {
            regions.push((region, Span::new(top, height)));
            top += height;
        };

        push(RegionId::Intro, screen);
        for section in catalog {
            push(RegionId::prompt(section.id.clone()), PROMPT_HEIGHT);
        }
        push(RegionId::Transition, screen);
        push(RegionId::Proposal, screen);
        if stage == Stage::Export {
            push(RegionId::Export, screen);
        }

        Self {
            regions,
            total_height: top,
        }
    }

    pub fn span_of(&self, region: &RegionId) -> Option<Span> {
        self.regions
            .iter()
            .find(|(id, _)| id == region)
            .map(|(_, span)| *span)
    }

    /// Largest scroll offset that still fills the viewport.
    pub fn max_offset(&self, viewport_height: u32) -> u32 {
        self.total_height.saturating_sub(viewport_height)
    }
}

/// Create a centered rectangle with fixed dimensions, clamped to `area`.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// The part of `span` inside the viewport, as a screen rect within `area`,
/// plus how many of the region's rows are scrolled off above it.
pub fn visible_slice(span: Span, offset: u32, area: Rect) -> Option<(Rect, u16)> {
    let view_bottom = offset + area.height as u32;
    if span.bottom() <= offset || span.top >= view_bottom {
        return None;
    }
    let start = span.top.max(offset);
    let end = span.bottom().min(view_bottom);
    let clipped = start - span.top;
    let rect = Rect {
        x: area.x,
        y: area.y + (start - offset) as u16,
        width: area.width,
        height: (end - start) as u16,
    };
    Some((rect, clipped.min(u16::MAX as u32) as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_layout_stacks_regions() {
        let layout = DocumentLayout::calculate(SectionCatalog::standard(), 20, Stage::Capture);
        assert_eq!(layout.regions.len(), SectionCatalog::standard().len() + 3);
        assert_eq!(layout.span_of(&RegionId::Intro), Some(Span::new(0, 20)));
        assert_eq!(
            layout.span_of(&RegionId::prompt("beginning")),
            Some(Span::new(20, PROMPT_HEIGHT))
        );
        assert!(layout.span_of(&RegionId::Export).is_none());
    }

    #[test]
    fn test_export_region_appears_in_export_stage() {
        let layout = DocumentLayout::calculate(SectionCatalog::standard(), 20, Stage::Export);
        let export = layout.span_of(&RegionId::Export).unwrap();
        assert_eq!(export.bottom(), layout.total_height);
        assert_eq!(layout.max_offset(20), layout.total_height - 20);
    }

    #[test]
    fn test_visible_slice_clips_top() {
        let area = Rect::new(0, 1, 80, 10);
        let (rect, clipped) = visible_slice(Span::new(5, 10), 8, area).unwrap();
        assert_eq!(clipped, 3);
        assert_eq!(rect.y, 1);
        assert_eq!(rect.height, 7);
        assert!(visible_slice(Span::new(0, 5), 8, area).is_none());
    }

    #[test]
    fn test_centered_rect_fits_area() {
        let rect = centered_rect_fixed(100, 100, Rect::new(0, 0, 40, 20));
        assert_eq!(rect, Rect::new(0, 0, 40, 20));
        let rect = centered_rect_fixed(20, 10, Rect::new(0, 0, 40, 20));
        assert_eq!(rect, Rect::new(10, 5, 20, 10));
    }
}
