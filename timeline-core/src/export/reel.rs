//! The story reel: one navigable document with a slide per photographed section.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::html::{escape, head, truncate, TEMPLATE_TRUNCATE};
use super::{file_date, Document, ExportError, Slide};

/// Styles shared with standalone slides.
pub(super) const SLIDE_CSS: &str = r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      overflow: hidden; background: #000; width: 100vw; height: 100vh; position: fixed;
    }
    .story-container { position: relative; width: 100%; height: 100%; max-width: 1080px; max-height: 1920px; margin: 0 auto; }
    .story {
      position: absolute; width: 100%; height: 100%;
      background: linear-gradient(135deg, #FFF5F7 0%, #FFE5E9 50%, #FFD6DC 100%);
      display: flex; align-items: center; justify-content: center;
      padding: 60px 40px; opacity: 0; transition: opacity 0.3s ease;
    }
    .story.active { opacity: 1; z-index: 1; }
    .content { text-align: center; color: #5B4D9D; max-width: 900px; width: 100%; }
    .heart { font-size: 72px; margin-bottom: 40px; }
    h1 { font-size: 64px; font-weight: 300; margin: 0 0 30px 0; line-height: 1.2; }
    .subtitle { font-size: 28px; color: #888; font-style: italic; margin-bottom: 60px; line-height: 1.4; }
    .photo-frame {
      margin: 0 auto 50px; width: 500px; height: 500px; border-radius: 50%; overflow: hidden;
      box-shadow: 0 20px 60px rgba(0,0,0,0.2); border: 10px solid white;
    }
    .photo-frame img { width: 100%; height: 100%; object-fit: cover; object-position: center; display: block; }
    .story-box { background: rgba(255,255,255,0.9); padding: 40px 50px; border-radius: 30px; box-shadow: 0 15px 40px rgba(0,0,0,0.1); margin-bottom: 50px; }
    .story-text { font-size: 24px; line-height: 1.7; color: #333; }
    .footer { margin-top: 60px; }
    .footer p { font-size: 20px; color: #999; font-style: italic; }
    .footer .date { font-size: 18px; color: #BBB; margin-top: 10px; }
    @media (max-width: 768px) {
      .story { padding: 40px 20px; }
      .heart { font-size: 48px; margin-bottom: 20px; }
      h1 { font-size: 36px; margin: 0 0 15px 0; }
      .subtitle { font-size: 18px; margin-bottom: 30px; }
      .photo-frame { width: 280px; height: 280px; margin: 0 auto 30px; border: 6px solid white; }
      .story-box { padding: 20px 25px; border-radius: 20px; margin-bottom: 30px; }
      .story-text { font-size: 16px; line-height: 1.6; }
    }
    @media print {
      @page { size: 1080px 1920px; margin: 0; }
      .nav-overlay, .progress-container, .page-indicator, .instructions { display: none !important; }
    }
"#;

const NAV_CSS: &str = r#"
    .nav-overlay { position: fixed; inset: 0; z-index: 10; display: flex; pointer-events: none; }
    .nav-left, .nav-right { flex: 1; cursor: pointer; display: flex; align-items: center; pointer-events: auto; }
    .nav-left { justify-content: flex-start; padding-left: 40px; }
    .nav-right { justify-content: flex-end; padding-right: 40px; }
    .nav-arrow {
      width: 60px; height: 60px; background: rgba(255,255,255,0.9); border-radius: 50%;
      display: flex; align-items: center; justify-content: center; font-size: 28px; color: #5B4D9D;
      box-shadow: 0 4px 12px rgba(0,0,0,0.15); transition: all 0.3s ease; opacity: 0.5;
    }
    .nav-left .nav-arrow.visible, .nav-right .nav-arrow { opacity: 0.7; }
    .nav-right .nav-arrow.hidden { opacity: 0.3; pointer-events: none; }
    .progress-container {
      position: fixed; top: 20px; left: 50%; transform: translateX(-50%);
      width: 960px; max-width: calc(100% - 40px); display: flex; gap: 8px; z-index: 20;
    }
    .progress-bar { flex: 1; height: 4px; background: rgba(255,255,255,0.3); border-radius: 2px; overflow: hidden; }
    .progress-fill { height: 100%; background: white; width: 0%; transition: width 0.3s ease; }
    .progress-bar.active .progress-fill, .progress-bar.completed .progress-fill { width: 100%; }
    .page-indicator {
      position: fixed; top: 40px; right: 40px; background: rgba(255,255,255,0.9);
      padding: 12px 24px; border-radius: 25px; font-size: 18px; color: #5B4D9D; z-index: 20;
    }
    .instructions {
      position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%);
      background: rgba(0,0,0,0.9); color: white; padding: 40px 60px; border-radius: 20px;
      text-align: center; z-index: 100; animation: fadeOut 3s forwards; max-width: 90%;
    }
    @keyframes fadeOut { 0%, 80% { opacity: 1; } 100% { opacity: 0; pointer-events: none; } }
"#;

const SCRIPT: &str = r#"
    let currentIndex = 0;

    function updateStory() {
      document.querySelectorAll('.story').forEach((story, i) => {
        story.classList.toggle('active', i === currentIndex);
      });
      document.querySelectorAll('.progress-bar').forEach((bar, i) => {
        bar.classList.remove('active', 'completed');
        if (i < currentIndex) bar.classList.add('completed');
        if (i === currentIndex) bar.classList.add('active');
      });
      document.getElementById('pageIndicator').textContent =
        (currentIndex + 1) + ' of ' + totalStories;
      document.getElementById('leftArrow').classList.toggle('visible', currentIndex > 0);
      document.getElementById('rightArrow').classList.toggle('hidden', currentIndex === totalStories - 1);
    }

    function nextStory() {
      if (currentIndex < totalStories - 1) { currentIndex++; updateStory(); }
    }

    function prevStory() {
      if (currentIndex > 0) { currentIndex--; updateStory(); }
    }

    document.addEventListener('keydown', (e) => {
      if (e.key === 'ArrowRight' || e.key === ' ') nextStory();
      if (e.key === 'ArrowLeft') prevStory();
    });

    let touchStartX = 0;
    document.addEventListener('touchstart', (e) => { touchStartX = e.touches[0].clientX; });
    document.addEventListener('touchend', (e) => {
      const diff = touchStartX - e.changedTouches[0].clientX;
      if (Math.abs(diff) > 50) {
        if (diff > 0) nextStory(); else prevStory();
      }
    });

    updateStory();
"#;

/// Markup for one slide. `active` marks the slide shown first.
pub(super) fn slide_markup(
    out: &mut String,
    slide: &Slide<'_>,
    index: usize,
    active: bool,
    now: DateTime<Utc>,
) -> Result<(), ExportError> {
    let title = escape(&slide.section.title);
    let class = if active { "story active" } else { "story" };
    writeln!(out, "    <div class=\"{class}\" data-index=\"{index}\">")?;
    writeln!(out, "      <div class=\"content\">\n        <div class=\"heart\">❤️</div>")?;
    writeln!(out, "        <h1>{title}</h1>")?;
    writeln!(
        out,
        "        <p class=\"subtitle\">{}</p>",
        escape(&slide.section.subtitle)
    )?;
    writeln!(
        out,
        "        <div class=\"photo-frame\"><img src=\"{}\" alt=\"{title}\" /></div>",
        escape(slide.photo.as_str())
    )?;
    if let Some(story) = slide.story {
        writeln!(
            out,
            "        <div class=\"story-box\"><p class=\"story-text\">&quot;{}&quot;</p></div>",
            escape(&truncate(story, TEMPLATE_TRUNCATE))
        )?;
    }
    writeln!(
        out,
        "        <div class=\"footer\">\n          <p>Timeline of \"Us\"</p>\n          \
         <p class=\"date\">{}</p>\n        </div>\n      </div>\n    </div>",
        now.format("%B %Y")
    )?;
    Ok(())
}

pub(super) fn render(slides: &[Slide<'_>], now: DateTime<Utc>) -> Result<Document, ExportError> {
    let total = slides.len();
    let mut out = head(
        "Our Love Story - All Templates",
        "width=1080, initial-scale=1.0",
        &format!("{SLIDE_CSS}{NAV_CSS}"),
    );

    writeln!(out, "<body>")?;
    writeln!(
        out,
        "  <div class=\"instructions\">\n    <h2>How to Use</h2>\n    \
         <p>Click left/right or use arrow keys to navigate</p>\n    \
         <p>Screenshot each slide for stories (1080x1920)</p>\n  </div>"
    )?;

    writeln!(out, "  <div class=\"progress-container\" id=\"progressContainer\">")?;
    for i in 0..total {
        writeln!(
            out,
            "    <div class=\"progress-bar\" id=\"progress-{i}\"><div class=\"progress-fill\"></div></div>"
        )?;
    }
    writeln!(out, "  </div>")?;
    writeln!(
        out,
        "  <div class=\"page-indicator\" id=\"pageIndicator\">1 of {total}</div>"
    )?;

    writeln!(out, "  <div class=\"story-container\">")?;
    for (index, slide) in slides.iter().enumerate() {
        slide_markup(&mut out, slide, index, index == 0, now)?;
    }
    writeln!(out, "  </div>")?;

    writeln!(
        out,
        "  <div class=\"nav-overlay\">\n    \
         <div class=\"nav-left\" onclick=\"prevStory()\"><div class=\"nav-arrow\" id=\"leftArrow\">←</div></div>\n    \
         <div class=\"nav-right\" onclick=\"nextStory()\"><div class=\"nav-arrow\" id=\"rightArrow\">→</div></div>\n  </div>"
    )?;
    writeln!(
        out,
        "  <script>\n    const totalStories = {total};{SCRIPT}  </script>\n</body>\n</html>"
    )?;

    Ok(Document::new(
        format!("love-story-templates-{}.html", file_date(now)),
        out,
    ))
}
