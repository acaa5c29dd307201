//! Best-effort persistence of the recovery snapshot and the last-file record.
//!
//! Both files live at fixed paths. Every operation returns a `Result` so the
//! caller decides whether a failure is worth a log line.

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::SessionError;

pub type Result<T> = std::result::Result<T, SessionError>;

const RECOVERY_FILE_NAME: &str = "jotter_recovery.txt";
const SESSION_FILE_NAME: &str = ".jotter_session";

/// On-disk shape: `{"last_file": "<path>" | null}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub last_file: Option<PathBuf>,
}

impl SessionConfig {
    /// The recorded file, if it is non-empty and still exists on disk.
    pub fn existing_last_file(&self) -> Option<&Path> {
        self.last_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty() && p.is_file())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionPaths {
    pub recovery_file: PathBuf,
    pub session_file: PathBuf,
}

impl SessionPaths {
    /// Default locations: the recovery file in the system temp directory,
    /// the session record in the user's home directory. Config overrides win.
    pub fn resolve(config: &Config) -> Self {
        let recovery_file = config
            .paths
            .recovery_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(RECOVERY_FILE_NAME));

        let session_file = config.paths.session_file.clone().unwrap_or_else(|| {
            directories::BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(SESSION_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(SESSION_FILE_NAME))
        });

        Self {
            recovery_file,
            session_file,
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            recovery_file: dir.join(RECOVERY_FILE_NAME),
            session_file: dir.join(SESSION_FILE_NAME),
        }
    }
}

pub struct SessionStore {
    paths: SessionPaths,
}

impl SessionStore {
    pub fn new(paths: SessionPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    /// Recovery snapshot content, `None` when no snapshot exists.
    pub fn load_recovery(&self) -> Result<Option<String>> {
        let path = &self.paths.recovery_file;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        log::debug!(
            "Read {} chars of recovery text from {}",
            content.chars().count(),
            path.display()
        );
        Ok(Some(content))
    }

    pub fn write_recovery(&self, content: &str) -> Result<()> {
        let path = &self.paths.recovery_file;
        ensure_parent(path)?;
        // The snapshot sits in a shared directory: replace a planted link
        // instead of writing through it.
        if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
            log::warn!("Replacing symlink at {}", path.display());
            fs::remove_file(path)?;
        }
        let mut file = create_private(path)?;
        file.write_all(content.as_bytes())?;
        log::debug!("Wrote recovery snapshot to {}", path.display());
        Ok(())
    }

    /// Session record, default (no last file) when none exists.
    pub fn load_config(&self) -> Result<SessionConfig> {
        let path = &self.paths.session_file;
        if !path.exists() {
            return Ok(SessionConfig::default());
        }
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    pub fn write_config(&self, last_file: Option<&Path>) -> Result<()> {
        let path = &self.paths.session_file;
        let record = SessionConfig {
            last_file: last_file.map(Path::to_path_buf),
        };
        ensure_parent(path)?;
        fs::write(path, serde_json::to_string(&record)?)?;
        log::debug!(
            "Recorded last file {:?} in {}",
            record.last_file,
            path.display()
        );
        Ok(())
    }
}

/// Create or truncate `path`, readable by the owner only.
#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies when the file is created.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
