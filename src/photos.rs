//! Copies attached photos into the application's image directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::errors::Result;

pub struct PhotoLibrary {
    dir: PathBuf,
}

impl PhotoLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies `source` to `<dir>/<restaurant>_<YYYYmmddHHMMSS><ext>` and
    /// returns the stored path.
    pub fn attach(&self, source: &Path, restaurant: &str, now: NaiveDateTime) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let file_name = format!(
            "{}_{}{}",
            sanitize(restaurant),
            now.format("%Y%m%d%H%M%S"),
            ext
        );
        let target = self.dir.join(file_name);

        fs::copy(source, &target)?;
        info!(source = %source.display(), target = %target.display(), "Photo attached");
        Ok(target)
    }

    /// Removes a stored photo. A file that is already gone is only logged.
    pub fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Photo removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Photo already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// Restaurant names go into a file name; path separators must not.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}
