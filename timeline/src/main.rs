//! Timeline of "Us" terminal application.
//!
//! A vim-style terminal journey: scroll through the prompts, write short
//! memories, watch the recap, then keep the moment as HTML documents.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripts:
//!
//! ```bash
//! cargo run -p timeline -- --headless --data-dir /tmp/us
//! ```

mod app;
mod effects;
mod events;
mod headless;
mod ui;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::fs::{self, OpenOptions};
use std::io::{self, stdout};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timeline_core::{
    DirectoryHost, FileStore, SectionCatalog, StoryStorage, SystemClock, TimelineConfig,
    TimelineSession,
};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    // Check for --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = parse_config_from_args(&args, TimelineConfig::from_env());
    init_logging(&config)?;
    info!(
        data_dir = %config.data_dir.display(),
        export_dir = %config.export_dir.display(),
        "starting timeline"
    );

    let store = FileStore::open(&config.data_dir)?;
    let session = TimelineSession::new(
        SectionCatalog::standard().clone(),
        StoryStorage::with_key(store, &config.storage_key),
        SystemClock::new(),
        config.timings,
    );
    let host = DirectoryHost::new(&config.export_dir);

    // Check for --headless mode
    if args.iter().any(|a| a == "--headless") {
        return headless::run_headless(session, host)
            .await
            .map_err(|e| e.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, host);
    let result = run_app(&mut terminal, &mut app).await;

    // Nothing typed is lost on the way out.
    app.session.flush();
    app.session.teardown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));

    loop {
        app.poll();
        app.process_session_output();

        // Render
        terminal.draw(|f| render(f, app))?;

        // Backups and imports
        app.run_pending_task().await;

        // Poll for events with timeout for animations
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if let Event::Resize(width, height) = ev {
                app.resize(Rect::new(0, 0, width, height));
            }

            if handle_event(app, ev) == EventResult::Quit {
                return Ok(());
            }
        } else {
            // Tick animations
            app.tick();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Log to a file in the data directory; the terminal belongs to the UI.
fn init_logging(config: &TimelineConfig) -> io::Result<()> {
    fs::create_dir_all(&config.data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Apply `--data-dir` and `--export-dir` on top of the environment.
fn parse_config_from_args(args: &[String], mut config: TimelineConfig) -> TimelineConfig {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                if let Some(dir) = args.get(i + 1) {
                    config = config.with_data_dir(dir);
                    i += 1;
                }
            }
            "--export-dir" => {
                if let Some(dir) = args.get(i + 1) {
                    config = config.with_export_dir(dir);
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    config
}

fn print_help() {
    println!("Timeline of Us - a journey through your story");
    println!();
    println!("USAGE:");
    println!("  timeline [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help           Show this help message");
    println!("  --headless           Run in headless mode (commands on stdin, no TUI)");
    println!("  --data-dir <DIR>     Where the story and log live (default: .timeline)");
    println!("  --export-dir <DIR>   Where exported documents go (default: .)");
    println!();
    println!("ENVIRONMENT:");
    println!("  TIMELINE_DATA_DIR    Same as --data-dir");
    println!("  TIMELINE_EXPORT_DIR  Same as --export-dir");
    println!("  TIMELINE_STORAGE_KEY Store key for the story document");
    println!("  RUST_LOG             Log filter (default: info)");
    println!();
    println!("EXAMPLES:");
    println!("  timeline                               # Interactive TUI mode");
    println!("  timeline --export-dir ~/Desktop        # Write exports to the desktop");
    println!("  timeline --headless < script.txt       # Scripted run");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flags_override_config() {
        let config = parse_config_from_args(
            &args(&["timeline", "--data-dir", "/tmp/us", "--export-dir", "/tmp/out"]),
            TimelineConfig::new(),
        );
        assert_eq!(config.data_dir, PathBuf::from("/tmp/us"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_missing_flag_value_keeps_default() {
        let config = parse_config_from_args(&args(&["timeline", "--data-dir"]), TimelineConfig::new());
        assert_eq!(config.data_dir, PathBuf::from(".timeline"));
    }
}
