//! # File I/O Module
//!
//! Project file operations:
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **File locking**: one editor per file, also across machines on a shared drive
//! - **Version validation**: refuse files written by a newer schema
//! - **CSV export**: write serialized text to `<title>.csv`
//!
//! ## File Format
//!
//! Projects are saved as `.boq` files containing JSON. Lock files use the
//! `.boq.lock` extension and record who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use boq_core::file_io::{save_project, load_project, FileLock};
//! use boq_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Duplex at Lekki", "Mr. Ade");
//! let path = Path::new("duplex.boq");
//!
//! let lock = FileLock::acquire(path, "estimator@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//!
//! let reopened = load_project(path).unwrap();
//! assert_eq!(reopened.meta.title, "Duplex at Lekki");
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{BoqError, BoqResult};
use crate::export::export_filename;
use crate::project::{Project, SCHEMA_VERSION};

/// Extension for project files
pub const PROJECT_EXTENSION: &str = "boq";

/// Lock file metadata stored in .boq.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on a project file, released on drop.
///
/// Holds an OS-level lock (via fs2) on the `.lock` file and writes
/// [`LockInfo`] into it so other users can see who has the file open.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a project file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired
    /// * `Err(BoqError::FileLocked)` - Another live process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> BoqResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(BoqError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                debug!(path = %lock_path.display(), holder = %existing.user_id, "taking over stale lock");
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| BoqError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            BoqError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| BoqError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;
        lock_file
            .sync_all()
            .map_err(|e| BoqError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "acquired project lock");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(project_path: &Path) -> PathBuf {
    let mut lock_path = project_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_lock_info(lock_path: &Path) -> BoqResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    Ok(serde_json::from_str(&contents)?)
}

/// A lock is stale when its process is gone (same machine) or it is over 24 hours old.
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

fn read_to_string(path: &Path, operation: &str) -> BoqResult<String> {
    let mut file = File::open(path).map_err(|e| BoqError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| BoqError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Write `contents` to `path` via a sibling `.tmp` file and an atomic rename.
fn write_atomic(path: &Path, contents: &[u8]) -> BoqResult<()> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| BoqError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(contents)
        .map_err(|e| BoqError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| BoqError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        BoqError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Save a project to a file with atomic write semantics.
///
/// ```rust,no_run
/// use boq_core::file_io::save_project;
/// use boq_core::project::Project;
/// use std::path::Path;
///
/// let project = Project::new("Duplex", "Mr. Ade");
/// save_project(&project, Path::new("duplex.boq"))?;
/// # Ok::<(), boq_core::errors::BoqError>(())
/// ```
pub fn save_project(project: &Project, path: &Path) -> BoqResult<()> {
    let json = serde_json::to_string_pretty(project)?;
    write_atomic(path, json.as_bytes())?;
    info!(project_id = %project.id(), path = %path.display(), "saved project");
    Ok(())
}

/// Load a project from a file.
///
/// # Returns
///
/// * `Err(BoqError::VersionMismatch)` - File version is incompatible
/// * `Err(BoqError::SerializationError)` - Invalid JSON
/// * `Err(BoqError::FileError)` - I/O error
pub fn load_project(path: &Path) -> BoqResult<Project> {
    let contents = read_to_string(path, "read")?;
    let project: Project = serde_json::from_str(&contents)
        .map_err(|e| BoqError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;
    validate_version(&project.meta.version)?;
    info!(project_id = %project.id(), path = %path.display(), "loaded project");
    Ok(project)
}

/// Write exported CSV text into `dir` under the project's export file name.
///
/// Returns the path written.
pub fn write_export(dir: &Path, title: &str, csv_text: &str) -> BoqResult<PathBuf> {
    let path = dir.join(export_filename(title));
    write_atomic(&path, csv_text.as_bytes())?;
    info!(path = %path.display(), bytes = csv_text.len(), "wrote export");
    Ok(path)
}

/// Major version must match; for 0.x files the minor version must not be newer.
fn validate_version(file_version: &str) -> BoqResult<()> {
    let parse = |version: &str| -> Vec<u32> { version.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);
    let mismatch = || BoqError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    if file_parts.is_empty() || current_parts.is_empty() || file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnConfig;
    use crate::export::{export_csv, ExportLayout};
    use crate::line_item::ItemKind;
    use std::env::temp_dir;

    fn temp_project_path(name: &str) -> PathBuf {
        temp_dir().join(format!("boq_test_{}_{}.boq", name, std::process::id()))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/path/to/project.boq"));
        assert_eq!(lock_path, Path::new("/path/to/project.boq.lock"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("qs@example.com");
        assert_eq!(info.user_id, "qs@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_project_path("roundtrip");
        let mut project = Project::new("Duplex", "Mr. Ade");
        let gid = project.add_grouping("Concrete Works");
        project.add_item(Some(gid), ItemKind::PricedItem);
        project.set_site_multiplier("1.1");

        save_project(&project, &path).unwrap();
        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_project_path("atomic");
        let tmp_path = PathBuf::from(format!("{}.tmp", path.display()));

        save_project(&Project::new("Atomic", ""), &path).unwrap();
        assert!(!tmp_path.exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_project_path("invalid");
        fs::write(&path, "{ not json").unwrap();
        let err = load_project(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_project_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "qs@example.com").unwrap();
        assert_eq!(lock.info.user_id, "qs@example.com");
        assert_eq!(lock.project_path(), path.as_path());
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_write_export() {
        let dir = temp_dir().join(format!("boq_export_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let project = Project::new("Office Fit out", "");
        let csv = export_csv(&project, &ColumnConfig::default(), ExportLayout::Grouped).unwrap();

        let path = write_export(&dir, &project.meta.title, &csv).unwrap();
        assert_eq!(path.file_name().unwrap(), "Office_Fit_out.csv");
        assert_eq!(fs::read_to_string(&path).unwrap(), csv);

        let _ = fs::remove_dir_all(&dir);
    }
}
