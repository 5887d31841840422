//! Render orchestration for the timeline TUI

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use timeline_core::session::RECAP_TAGLINE;
use timeline_core::{Notice, RegionId, Stage};

use crate::app::{App, InputMode};
use crate::ui::layout::{centered_rect_fixed, visible_slice, AppLayout};
use crate::ui::widgets::{
    CelebrationWidget, InputWidget, PromptWidget, RecapWidget, StatusBarWidget,
};

/// Overlay types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
    /// A blocking notice waiting to be acknowledged.
    Notice(Notice),
    /// Start over? yes / no.
    ConfirmRestart,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    if app.session.presentation().is_recap_playing() {
        render_recap(frame, app, layout.document_area);
    } else {
        render_document(frame, app, layout.document_area);
    }

    render_status_bar(frame, app, layout.status_bar);
    render_input(frame, app, layout.input_area);

    if app.session.stage() == Stage::Celebration {
        let widget = CelebrationWidget::new(app.ornaments(), &app.theme)
            .released(app.session.presentation().ornaments_released())
            .frame(app.animation_frame);
        frame.render_widget(widget, area);
    }

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let catalog = app.session.catalog();
    let written = catalog
        .iter()
        .filter(|s| app.session.record().story(&s.id).is_some_and(|t| !t.trim().is_empty()))
        .count();

    let line = Line::from(vec![
        Span::styled(" ♥ Timeline of Us ", app.theme.heading_style()),
        Span::styled(
            format!("| {written}/{} written ", catalog.len()),
            app.theme.dim_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

// =============================================================================
// Document
// =============================================================================

/// Render every region that overlaps the viewport.
fn render_document(frame: &mut Frame, app: &App, area: Rect) {
    let scroll = app.scroll();
    for (region, span) in &app.layout().regions {
        let Some((rect, clipped)) = visible_slice(*span, scroll, area) else {
            continue;
        };
        match region {
            RegionId::Intro => {
                render_screen(frame, intro_lines(app), span.height, rect, clipped)
            }
            RegionId::Prompt(id) => render_prompt(frame, app, id, rect, clipped),
            RegionId::Transition => {
                render_screen(frame, transition_lines(app), span.height, rect, clipped)
            }
            RegionId::Proposal => {
                render_screen(frame, proposal_lines(app), span.height, rect, clipped)
            }
            RegionId::Export => {
                render_screen(frame, export_lines(app), span.height, rect, clipped)
            }
        }
    }
}

/// Render a full-screen region with its lines centered in the region.
fn render_screen(
    frame: &mut Frame,
    lines: Vec<Line<'static>>,
    region_height: u32,
    rect: Rect,
    clipped: u16,
) {
    let pad = (region_height as usize).saturating_sub(lines.len()) / 2;
    let mut padded = vec![Line::from(""); pad];
    padded.extend(lines);

    let paragraph = Paragraph::new(padded)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .scroll((clipped, 0));
    frame.render_widget(paragraph, rect);
}

fn render_prompt(frame: &mut Frame, app: &App, id: &str, rect: Rect, clipped: u16) {
    let catalog = app.session.catalog();
    let (Some(index), Some(section)) = (catalog.position(id), catalog.get(id)) else {
        return;
    };
    let record = app.session.record();
    let widget = PromptWidget::new(section, &app.theme)
        .number(index + 1)
        .story(record.story(id))
        .photo(record.photo(id))
        .revealed(app.session.is_revealed(id))
        .focused(index == app.focused_index())
        .editing(app.editing() == Some(id))
        .offset(clipped);
    frame.render_widget(widget, rect);
}

fn intro_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.theme;
    // Slow blink on the scroll cue.
    let cue = if (app.animation_frame / 8) % 2 == 0 {
        "↓ scroll"
    } else {
        ""
    };
    vec![
        Line::from(Span::styled("♥", theme.ornament_style())),
        Line::from(""),
        Line::from(Span::styled("This is a journey.", theme.heading_style())),
        Line::from(Span::styled("Not a form.", theme.subtitle_style())),
        Line::from(Span::styled("Not a performance.", theme.subtitle_style())),
        Line::from(""),
        Line::from(Span::styled("Take your time. Feel each moment.", theme.text_style())),
        Line::from(Span::styled("Scroll when you're ready.", theme.dim_style())),
        Line::from(""),
        Line::from(Span::styled(cue, theme.accent_style())),
    ]
}

fn transition_lines(app: &App) -> Vec<Line<'static>> {
    if !app.session.presentation().transition_text_visible() {
        return Vec::new();
    }
    let theme = &app.theme;
    vec![
        Line::from(Span::styled("Before the future,", theme.heading_style())),
        Line::from(Span::styled("let's remember.", theme.subtitle_style())),
        Line::from(""),
        Line::from(Span::styled("•  •  •", theme.accent_style())),
    ]
}

fn proposal_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.theme;
    if !app.session.presentation().proposal_unlocked() {
        return vec![Line::from(Span::styled("· · ·", theme.dim_style()))];
    }
    vec![
        Line::from(Span::styled("♥   ♡   ♥", theme.ornament_style())),
        Line::from(""),
        Line::from(Span::styled("Every moment, every memory...", theme.subtitle_style())),
        Line::from(""),
        Line::from(Span::styled(
            "This story was created for you",
            theme.heading_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Now it's time to save and share these memories ✨",
            theme.text_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[c] Save & Share ♥", theme.accent_style().add_modifier(Modifier::BOLD)),
            Span::raw("     "),
            Span::styled("[R] Start over", theme.dim_style()),
        ]),
    ]
}

fn export_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let option = |key: &'static str, label: &'static str, hint: &'static str| {
        Line::from(vec![
            Span::styled(format!("[{key}] "), theme.accent_style().add_modifier(Modifier::BOLD)),
            Span::styled(format!("{label:<18}"), theme.text_style()),
            Span::styled(hint, theme.dim_style()),
        ])
    };
    vec![
        Line::from(Span::styled("Keep this moment", theme.heading_style())),
        Line::from(""),
        option("1", "Save locally", "Keep on this computer"),
        option("2", "Full Story HTML", "Print or save"),
        option("3", "Story Templates", "Click through & screenshot"),
        option("4", "Single slides", "One file per photo"),
        option("5", "Print", "Export PDF"),
        Line::from(""),
        Line::from(Span::styled("How to share", theme.subtitle_style())),
        Line::from("Press 3 to create ONE interactive file"),
        Line::from("Open the HTML file and click through each slide"),
        Line::from("Screenshot each slide (use arrow keys or click sides)"),
        Line::from("Send all screenshots to your special someone ♥"),
        Line::from(""),
        Line::from(Span::styled(
            format!("Files are written to {}", app.host.dir().display()),
            theme.dim_style(),
        )),
    ]
}

/// Render the recap over the document.
fn render_recap(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Clear, area);
    match app.session.recap_slide() {
        Some(slide) => frame.render_widget(RecapWidget::new(&slide, &app.theme), area),
        None => {
            // No sections: only the closing pause.
            let block = Block::default()
                .title(" Our Story ")
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(true));
            let paragraph = Paragraph::new(Line::from(Span::styled(
                RECAP_TAGLINE,
                app.theme.dim_style(),
            )))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(paragraph, area);
        }
    }
}

// =============================================================================
// Bars
// =============================================================================

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let widget = StatusBarWidget::new(app.input_mode, app.session.stage(), &app.theme)
        .autosave_pending(app.session.autosave_pending())
        .message(app.status_message());
    frame.render_widget(widget, area);
}

/// Hotkeys that make sense right now.
fn normal_mode_hint(app: &App) -> &'static str {
    let presentation = app.session.presentation();
    if presentation.is_recap_playing() {
        return "s skip the recap";
    }
    match app.session.stage() {
        Stage::Intro => "j/k scroll  ? help",
        Stage::Capture | Stage::Transition | Stage::Recap => {
            "i write  p photo  x remove photo  Tab next prompt  ? help"
        }
        Stage::Proposal => "c save & share  R start over  ? help",
        Stage::Celebration => "any key to continue",
        Stage::Export => "1-5 keep the moment  i write  R start over  ? help",
    }
}

/// Render the input area
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_command = app.input_mode == InputMode::Command;
    let editing = app
        .editing()
        .and_then(|id| app.session.catalog().get(id));

    let mut widget = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .active(app.input_mode != InputMode::Normal)
        .command_mode(is_command);

    widget = match (app.input_mode, editing) {
        (InputMode::Insert, Some(section)) => widget
            .title(&section.title)
            .placeholder(&section.placeholder),
        (InputMode::Normal, _) => widget.placeholder(normal_mode_hint(app)),
        _ => widget,
    };

    frame.render_widget(widget, area);
}

// =============================================================================
// Overlays
// =============================================================================

fn render_overlay(frame: &mut Frame, app: &App, overlay: &Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
        Overlay::Notice(notice) => render_notice_overlay(frame, app, notice, area),
        Overlay::ConfirmRestart => render_confirm_overlay(frame, app, area),
    }
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(56, 26, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            " Timeline of Us - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Navigation (NORMAL mode):"),
        Line::from("  j/k or ↑/↓     Scroll up/down"),
        Line::from("  Ctrl+u/d       Scroll by half page"),
        Line::from("  g/G            Jump to top/bottom"),
        Line::from("  Tab/Shift+Tab  Next/previous prompt"),
        Line::from("  Mouse wheel    Scroll"),
        Line::from(""),
        heading("Writing:"),
        Line::from("  i / Enter      Write the focused prompt"),
        Line::from("  p              Attach a photo (:photo <path>)"),
        Line::from("  x              Remove the focused photo"),
        Line::from("  Esc            Stop writing"),
        Line::from(""),
        heading("Journey:"),
        Line::from("  s              Skip the recap"),
        Line::from("  c              Save & share"),
        Line::from("  R              Start over"),
        Line::from("  1-5            Keep the moment options"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  :w  :q  :wq  :export full|reel|slides  :print"),
        Line::from("  :backup [path]  :import <path>  :restart"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

fn render_notice_overlay(frame: &mut Frame, app: &App, notice: &Notice, area: Rect) {
    let popup_area = centered_rect_fixed(50, 7, area);
    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(notice.to_string(), app.theme.status_style(true))),
        Line::from(""),
        Line::from(Span::styled("Press Enter to close", app.theme.dim_style())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

fn render_confirm_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(50, 7, area);
    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(""),
        Line::from(Notice::ConfirmRestart.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] Start over", app.theme.accent_style()),
            Span::raw("    "),
            Span::styled("[n] Keep writing", app.theme.dim_style()),
        ]),
    ];
    let block = Block::default()
        .title(" Start over ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}
