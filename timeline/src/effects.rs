//! Notice-to-UI mapping for session output

use timeline_core::{Notice, RegionId, ScrollRequest};

use crate::app::App;
use crate::ui::Overlay;

/// Show a session notice: blocking ones as a popup, the rest in the status bar.
pub fn process_notice(app: &mut App, notice: Notice) {
    match notice {
        Notice::ConfirmRestart => app.set_overlay(Overlay::ConfirmRestart),
        notice if notice.is_blocking() => app.set_overlay(Overlay::Notice(notice)),
        notice => app.set_status(notice.to_string()),
    }
}

/// Follow a scroll request from the session.
pub fn process_scroll(app: &mut App, request: ScrollRequest) {
    match request {
        ScrollRequest::Top => {
            app.forget_pending_photos();
            app.finish_editing();
            app.scroll_to_top();
            app.set_status("A fresh page. Scroll when you're ready.");
        }
        ScrollRequest::Export => app.scroll_to_region(&RegionId::Export),
    }
}
