use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    migrate::decode_settings,
    schema::Settings,
    validate::validate_for_save,
};

/// Directory name under the user config dir.
const APP_DIR: &str = "notify-mcp";
/// Settings file name.
const CONFIG_FILENAME: &str = "config.json";

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the config directory for the rest of the process (e.g. `--config-dir`).
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = Some(path);
}

/// Drop a previous [`set_config_dir`] override.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = None;
}

/// Returns the notify-mcp config directory (`<user-config-dir>/notify-mcp`).
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
    {
        return Ok(dir);
    }
    let base = directories::BaseDirs::new().ok_or_else(|| Error::Environment {
        message: "no home directory could be determined".into(),
    })?;
    Ok(base.config_dir().join(APP_DIR))
}

/// Reads and writes the settings document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// A store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at `<config_dir>/config.json`.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::at(config_dir()?.join(CONFIG_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, decode (upgrading the legacy shape) and validate the settings.
    ///
    /// The stored notification message is returned as-is; callers use
    /// [`Settings::effective_notification_message`] for the fallback.
    pub fn load(&self) -> Result<Settings> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotConfigured {
                    path: self.path.clone(),
                });
            },
            Err(e) => return Err(Error::io("read config", e)),
        };
        let settings = decode_settings(&data)?;
        debug!(
            path = %self.path.display(),
            methods = ?settings.method_types(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Validate and replace the whole document.
    ///
    /// The file is written to a sibling temp file with owner-only
    /// permissions and renamed over the target.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        validate_for_save(settings)?;

        let data = serde_json::to_vec_pretty(settings).map_err(Error::Encode)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| Error::io("create config dir", e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".config-")
            .suffix(".json.tmp")
            .tempfile_in(parent)
            .map_err(|e| Error::io("create temp config", e))?;
        restrict_permissions(tmp.as_file())?;
        tmp.write_all(&data)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::io("write config", e))?;
        tmp.persist(&self.path)
            .map_err(|e| Error::io("write config", e.error))?;

        info!(
            path = %self.path.display(),
            methods = ?settings.method_types(),
            "saved settings"
        );
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(|e| Error::io("set config permissions", e))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> Result<()> {
    Ok(())
}
