//! Icon shown next to desktop notifications.
//!
//! Platform notifiers only accept a file path, so the PNG compiled into the
//! binary is written to the temp directory the first time it is needed. Temp
//! directories get cleaned behind our back, so the cached path is checked on
//! every use and the file is written again if it disappeared.

use std::{
    io::Write,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use tracing::{debug, warn};

use crate::error::{Error, Result};

static ICON_PNG: &[u8] = include_bytes!("../assets/icon.png");

const ICON_PREFIX: &str = "notify-mcp-icon-";
const ICON_SUFFIX: &str = ".png";

/// Something that can hand out a filesystem path to the notification icon.
pub trait IconSource: Send + Sync {
    /// Path to an existing icon file, or `None` to notify without one.
    fn icon_path(&self) -> Option<PathBuf>;
}

/// Icon bytes embedded in the binary, materialized lazily.
#[derive(Debug)]
pub struct BundledIcon {
    bytes: &'static [u8],
    cached: Mutex<Option<PathBuf>>,
}

impl Default for BundledIcon {
    fn default() -> Self {
        Self::new(ICON_PNG)
    }
}

impl BundledIcon {
    pub fn new(bytes: &'static [u8]) -> Self {
        Self {
            bytes,
            cached: Mutex::new(None),
        }
    }

    /// Return the icon path, writing the file if it does not exist (yet).
    ///
    /// Holds the guard across the probe and the write so concurrent callers
    /// never produce more than one file.
    pub fn path(&self) -> Result<PathBuf> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = cached.as_ref().filter(|p| p.is_file()) {
            return Ok(path.clone());
        }

        let path = materialize(self.bytes).map_err(Error::Icon)?;
        debug!(path = %path.display(), "wrote notification icon");
        *cached = Some(path.clone());
        Ok(path)
    }
}

impl IconSource for BundledIcon {
    fn icon_path(&self) -> Option<PathBuf> {
        self.path()
            .inspect_err(|e| warn!(error = %e, "notification icon unavailable"))
            .ok()
    }
}

fn materialize(bytes: &[u8]) -> std::io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(ICON_PREFIX)
        .suffix(ICON_SUFFIX)
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(std::path::absolute(&path).unwrap_or(path))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;

    #[test]
    fn bundled_icon_is_png() {
        assert!(ICON_PNG.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn first_use_writes_file_once() {
        let icon = BundledIcon::default();
        let first = icon.path().unwrap();
        let second = icon.path().unwrap();

        assert_eq!(first, second);
        assert!(first.is_absolute());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(ICON_PREFIX) && name.ends_with(ICON_SUFFIX));
        assert_eq!(std::fs::read(&first).unwrap(), ICON_PNG);
        std::fs::remove_file(first).unwrap();
    }

    #[test]
    fn deleted_file_is_rewritten() {
        let icon = BundledIcon::default();
        let first = icon.path().unwrap();
        std::fs::remove_file(&first).unwrap();

        let second = icon.path().unwrap();
        assert!(second.is_file());
        assert_eq!(std::fs::read(&second).unwrap(), ICON_PNG);
        std::fs::remove_file(second).unwrap();
    }

    #[test]
    fn concurrent_first_use_shares_one_file() {
        let icon = Arc::new(BundledIcon::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let icon = Arc::clone(&icon);
                std::thread::spawn(move || icon.path().unwrap())
            })
            .collect();
        let paths: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(paths.len(), 1);
        for path in paths {
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn icon_source_yields_existing_path() {
        let icon = BundledIcon::new(b"not really a png");
        let path = icon.icon_path().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a png");
        std::fs::remove_file(path).unwrap();
    }
}
