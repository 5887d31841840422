//! Engine for the Timeline of "Us" story journey.
//!
//! This crate provides:
//! - A static catalog of story prompts
//! - A visibility-driven presentation state machine (intro, capture,
//!   transition, recap, proposal, celebration, export)
//! - Debounced autosave over a key-value store
//! - Self-contained HTML exports (full story, story reel, single slides)
//!
//! Nothing in here touches a terminal. Hosts feed the session geometry,
//! actions and time, and render what it reports.
//!
//! # Quick Start
//!
//! ```ignore
//! use timeline_core::{
//!     DirectoryHost, ExportMode, FileStore, SectionCatalog, StoryStorage, SystemClock,
//!     TimelineConfig, TimelineSession,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TimelineConfig::from_env();
//!     let store = FileStore::open(&config.data_dir)?;
//!     let mut session = TimelineSession::new(
//!         SectionCatalog::standard().clone(),
//!         StoryStorage::with_key(store, &config.storage_key),
//!         SystemClock::new(),
//!         config.timings,
//!     );
//!
//!     session.edit_story("today", "Still choosing you.")?;
//!     session.save_now();
//!
//!     let mut host = DirectoryHost::new(&config.export_dir);
//!     session.export(ExportMode::FullStory, &mut host)?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod export;
pub mod host;
pub mod persist;
pub mod photo;
pub mod presentation;
pub mod record;
pub mod session;
pub mod testing;
pub mod visibility;

// Primary public API
pub use catalog::{Section, SectionCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{TimelineConfig, Timings};
pub use export::{Document, ExportError, ExportMode};
pub use host::{DirectoryHost, Host};
pub use persist::{FileStore, KeyValueStore, MemoryStore, ParseError, StorageError, StoryStorage};
pub use photo::PhotoError;
pub use presentation::{RecapStatus, Stage};
pub use record::{PhotoRef, StoryRecord};
pub use session::{Notice, RecapSlide, ScrollRequest, SessionError, TimelineSession};
pub use testing::TestHarness;
pub use visibility::{RegionId, Span, Viewport};
