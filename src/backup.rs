//! Zip archive of a project directory.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to format backup timestamp: {0}")]
    Clock(#[from] time::error::Format),

    #[error("backup task failed: {0}")]
    Join(String),
}

impl BackupError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn archive(path: &Path, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `<name>_backup_<YYYYMMDD_HHMMSS>.zip`
pub fn backup_file_name(name: &str, at: OffsetDateTime) -> Result<String, BackupError> {
    let stamp = at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))?;
    Ok(format!("{name}_backup_{stamp}.zip"))
}

/// Archive every file under `root` into `<workspace>/<name>_backup_<stamp>.zip`
/// with entry names relative to `root`. Returns the archive path.
pub async fn backup_project(
    root: &Path,
    name: &str,
    workspace: &Path,
) -> Result<PathBuf, BackupError> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let destination = workspace.join(backup_file_name(name, now)?);
    let root = root.to_path_buf();
    let target = destination.clone();

    let entries = tokio::task::spawn_blocking(move || write_archive(&root, &target))
        .await
        .map_err(|error| BackupError::Join(error.to_string()))??;

    tracing::info!(path = %destination.display(), entries, "project backup written");
    Ok(destination)
}

fn write_archive(root: &Path, destination: &Path) -> Result<usize, BackupError> {
    let file = File::create(destination).map_err(|source| BackupError::io(destination, source))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| BackupError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || entry.path() == destination {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let contents =
            std::fs::read(entry.path()).map_err(|source| BackupError::io(entry.path(), source))?;
        writer
            .start_file(name, options)
            .map_err(|source| BackupError::archive(destination, source))?;
        writer
            .write_all(&contents)
            .map_err(|source| BackupError::io(destination, source))?;
        entries += 1;
    }

    writer
        .finish()
        .map_err(|source| BackupError::archive(destination, source))?;
    Ok(entries)
}
