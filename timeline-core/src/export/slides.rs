//! Standalone slides: one document per photographed section, no navigation.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::html::head;
use super::reel::{slide_markup, SLIDE_CSS};
use super::{file_date, Document, ExportError, Slide};

pub(super) fn render_all(
    slides: &[Slide<'_>],
    now: DateTime<Utc>,
) -> Result<Vec<Document>, ExportError> {
    let date = file_date(now);
    slides
        .iter()
        .enumerate()
        .map(|(index, slide)| {
            let mut out = head(
                &format!("Our Story - {}", slide.section.title),
                "width=1080, initial-scale=1.0",
                SLIDE_CSS,
            );
            writeln!(out, "<body>\n  <div class=\"story-container\">")?;
            slide_markup(&mut out, slide, index, true, now)?;
            writeln!(out, "  </div>\n</body>\n</html>")?;

            let filename = format!(
                "story-slide-{:02}-{}-{date}.html",
                index + 1,
                slide.section.id
            );
            Ok(Document::new(filename, out))
        })
        .collect()
}
