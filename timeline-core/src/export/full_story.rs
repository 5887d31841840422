//! The full-story document: every section with content, in catalog order.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::html::{escape, head};
use super::{file_date, Document, ExportError};
use crate::catalog::SectionCatalog;
use crate::record::StoryRecord;

const CSS: &str = r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
      line-height: 1.6;
      color: #5B4D9D;
      background: linear-gradient(135deg, #FFF5F7 0%, #FFE5E9 100%);
      padding: 60px 20px;
      max-width: 1200px;
      margin: 0 auto;
    }
    .container { background: white; padding: 60px; border-radius: 30px; box-shadow: 0 20px 60px rgba(0,0,0,0.15); }
    .header { text-align: center; margin-bottom: 60px; border-bottom: 3px solid #FF6B7A; padding-bottom: 30px; }
    h1 { font-size: 56px; font-weight: 300; margin-bottom: 20px; }
    .date { color: #999; font-size: 18px; font-style: italic; }
    .section { margin-bottom: 60px; page-break-inside: avoid; }
    .section-header { display: flex; align-items: center; margin-bottom: 30px; }
    .section-number {
      width: 60px; height: 60px; background: #5B4D9D; color: white; border-radius: 50%;
      display: flex; align-items: center; justify-content: center;
      font-weight: bold; font-size: 24px; margin-right: 20px; flex-shrink: 0;
    }
    .section-title { flex: 1; }
    .section-title h2 { font-size: 36px; font-weight: 400; margin-bottom: 5px; }
    .section-title .subtitle { color: #888; font-size: 18px; font-style: italic; }
    .photo {
      width: 100%; max-height: 500px; object-fit: cover; object-position: center;
      border-radius: 20px; margin-bottom: 30px; box-shadow: 0 10px 30px rgba(0,0,0,0.1);
    }
    .story {
      background: #F9F9FB; padding: 30px 40px; border-radius: 15px; border-left: 5px solid #FF6B7A;
      white-space: pre-wrap; line-height: 1.8; color: #333; font-size: 18px;
    }
    .heart-divider { text-align: center; font-size: 32px; margin: 30px 0; }
    .footer { margin-top: 80px; text-align: center; padding-top: 40px; border-top: 2px solid #FFE5E9; color: #999; font-size: 14px; }
    .footer p { margin: 10px 0; }
    .footer .tagline { font-style: italic; }
    @media print {
      body { background: white; padding: 0; }
      .container { box-shadow: none; padding: 40px; }
    }
    @media (max-width: 768px) {
      body { padding: 20px 10px; }
      .container { padding: 30px 20px; }
      h1 { font-size: 36px; }
      .section-number { width: 50px; height: 50px; font-size: 20px; }
      .section-title h2 { font-size: 28px; }
    }
"#;

pub(super) fn render(
    record: &StoryRecord,
    catalog: &SectionCatalog,
    now: DateTime<Utc>,
) -> Result<Document, ExportError> {
    let dated = record.last_saved.unwrap_or(now);
    let mut out = head(
        &format!("Our Story - {}", dated.format("%-m/%-d/%Y")),
        "width=device-width, initial-scale=1.0",
        CSS,
    );

    writeln!(out, "<body>\n  <div class=\"container\">")?;
    writeln!(
        out,
        "    <div class=\"header\">\n      <h1>❤️ Our Story ❤️</h1>\n      <p class=\"date\">{}</p>\n    </div>",
        dated.format("%A, %B %-d, %Y")
    )?;

    for (index, section) in catalog.iter().enumerate() {
        if !record.has_content(&section.id) {
            continue;
        }
        let title = escape(&section.title);
        writeln!(out, "    <div class=\"section\">")?;
        writeln!(
            out,
            "      <div class=\"section-header\">\n        <div class=\"section-number\">{}</div>\n        \
             <div class=\"section-title\">\n          <h2>{title}</h2>\n          \
             <p class=\"subtitle\">{}</p>\n        </div>\n      </div>",
            index + 1,
            escape(&section.subtitle),
        )?;
        if let Some(photo) = record.photo(&section.id) {
            writeln!(
                out,
                "      <img src=\"{}\" alt=\"{title}\" class=\"photo\" />",
                escape(photo.as_str())
            )?;
        }
        match record.story(&section.id) {
            Some(story) => writeln!(out, "      <div class=\"story\">{}</div>", escape(story))?,
            None => writeln!(
                out,
                "      <div class=\"story\"><em>No story written yet...</em></div>"
            )?,
        }
        writeln!(out, "      <div class=\"heart-divider\">❤️</div>\n    </div>")?;
    }

    writeln!(
        out,
        "    <div class=\"footer\">\n      <p class=\"tagline\">This page remembers nothing. You do.</p>\n      \
         <p>Timeline of \"Us\" - Created with love</p>\n    </div>\n  </div>\n</body>\n</html>"
    )?;

    Ok(Document::new(format!("our-story-{}.html", file_date(now)), out))
}
