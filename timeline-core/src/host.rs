//! Where exported documents go.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::export::{Document, ExportError};

/// File name of the print copy.
pub const PRINT_FILE_NAME: &str = "timeline-of-us.html";

/// Delivers documents to the user.
pub trait Host {
    /// Save a document. Returns where it went.
    fn download(&mut self, document: &Document) -> Result<PathBuf, ExportError>;

    /// Hand a document to the printer.
    fn print(&mut self, document: &Document) -> Result<PathBuf, ExportError>;

    /// Take back a document delivered by `download`.
    fn discard(&mut self, path: &Path) -> Result<(), ExportError>;
}

/// Writes documents into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    dir: PathBuf,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        let tmp = self.dir.join(format!(".{file_name}.tmp"));
        if let Err(e) = fs::write(&tmp, contents).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(path)
    }
}

impl Host for DirectoryHost {
    fn download(&mut self, document: &Document) -> Result<PathBuf, ExportError> {
        let path = self.write(&document.filename, &document.contents)?;
        info!(path = %path.display(), "document written");
        Ok(path)
    }

    fn print(&mut self, document: &Document) -> Result<PathBuf, ExportError> {
        let path = self.write(PRINT_FILE_NAME, &document.contents)?;
        info!(path = %path.display(), "print copy written");
        Ok(path)
    }

    fn discard(&mut self, path: &Path) -> Result<(), ExportError> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "document removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
