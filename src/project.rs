//! On-disk project tree with a content cache and a directory snapshot.
//!
//! Every path goes through [`crate::sandbox::normalize`] first. The snapshot is
//! a read cache rebuilt after create and delete; the filesystem stays the
//! source of truth.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::OperationError;
use crate::sandbox::{normalize, SandboxedPath};

/// Snapshot key of the project root directory.
pub const ROOT_KEY: &str = "/";

/// Immediate children of one directory, names sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub subdirectories: Vec<String>,
    pub files: Vec<String>,
}

/// One file in the tree with its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
}

#[derive(Debug)]
pub struct ProjectStore {
    name: String,
    root: PathBuf,
    file_cache: BTreeMap<String, String>,
    structure: BTreeMap<String, DirectoryEntry>,
}

impl ProjectStore {
    /// Open (creating if needed) the project directory at `root` and scan it.
    pub async fn open(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Result<Self, OperationError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| OperationError::io("creating", root.display().to_string(), source))?;

        let mut store = Self {
            name: name.into(),
            root,
            file_cache: BTreeMap::new(),
            structure: BTreeMap::new(),
        };
        store.rescan().await?;
        Ok(store)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn structure(&self) -> &BTreeMap<String, DirectoryEntry> {
        &self.structure
    }

    #[must_use]
    pub fn cached(&self, path: &str) -> Option<&str> {
        self.file_cache.get(path).map(String::as_str)
    }

    /// Write `content` at `path`, creating parents. Overwrites an existing file.
    pub async fn create(&mut self, path: &str, content: &str) -> Result<String, OperationError> {
        let target = normalize(path)?;
        let full = target.resolve(&self.root);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| OperationError::io("creating parent of", target.as_str(), source))?;
        }
        write_atomic(&full, content)
            .await
            .map_err(|source| OperationError::io("writing", target.as_str(), source))?;

        self.file_cache
            .insert(target.to_string(), content.to_string());
        self.rescan().await?;
        Ok(format!("✓ File created successfully: {target}"))
    }

    /// Overwrite an existing file. The tree shape cannot change, so the
    /// snapshot is left alone.
    pub async fn edit(&mut self, path: &str, content: &str) -> Result<String, OperationError> {
        let target = normalize(path)?;
        let full = target.resolve(&self.root);
        self.require_file(&target, &full).await?;

        write_atomic(&full, content)
            .await
            .map_err(|source| OperationError::io("writing", target.as_str(), source))?;
        self.file_cache
            .insert(target.to_string(), content.to_string());
        Ok(format!("✓ File updated successfully: {target}"))
    }

    /// Cached content when present, otherwise read from disk and cache it.
    pub async fn read(&mut self, path: &str) -> Result<String, OperationError> {
        let target = normalize(path)?;
        if let Some(content) = self.file_cache.get(target.as_str()) {
            return Ok(content.clone());
        }

        let full = target.resolve(&self.root);
        let content = tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| OperationError::from_io("reading", target.as_str(), source))?;
        self.file_cache.insert(target.to_string(), content.clone());
        Ok(content)
    }

    pub async fn delete(&mut self, path: &str) -> Result<String, OperationError> {
        let target = normalize(path)?;
        let full = target.resolve(&self.root);
        self.require_file(&target, &full).await?;

        tokio::fs::remove_file(&full)
            .await
            .map_err(|source| OperationError::from_io("deleting", target.as_str(), source))?;
        self.file_cache.remove(target.as_str());
        self.rescan().await?;
        Ok(format!("File deleted: {target}"))
    }

    /// Every file under the root, relative and `/`-joined, sorted.
    pub async fn list_files(&self) -> Result<Vec<String>, OperationError> {
        Ok(self
            .list_entries()
            .await?
            .into_iter()
            .map(|entry| entry.path)
            .collect())
    }

    /// Every file under the root with its size, read from disk.
    pub async fn list_entries(&self) -> Result<Vec<FileEntry>, OperationError> {
        let root = self.root.clone();
        run_blocking(&self.root, move || walk_files(&root)).await
    }

    /// File paths recorded in the current snapshot.
    #[must_use]
    pub fn tracked_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (dir, entry) in &self.structure {
            for file in &entry.files {
                if dir == ROOT_KEY {
                    paths.push(file.clone());
                } else {
                    paths.push(format!("{dir}/{file}"));
                }
            }
        }
        paths.sort();
        paths
    }

    /// Rebuild the directory snapshot from disk.
    pub async fn rescan(&mut self) -> Result<(), OperationError> {
        let root = self.root.clone();
        self.structure = run_blocking(&self.root, move || scan_structure(&root)).await?;
        Ok(())
    }

    async fn require_file(&self, target: &SandboxedPath, full: &Path) -> Result<(), OperationError> {
        match tokio::fs::metadata(full).await {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(OperationError::NotFound {
                path: target.to_string(),
            }),
            Err(source) => Err(OperationError::from_io("inspecting", target.as_str(), source)),
        }
    }
}

/// Write through a temporary sibling and rename it into place.
async fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp_path, contents).await?;
    if let Err(error) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(error);
    }
    Ok(())
}

async fn run_blocking<T, F>(root: &Path, job: F) -> Result<T, OperationError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, OperationError> + Send + 'static,
{
    tokio::task::spawn_blocking(job).await.map_err(|error| {
        OperationError::io("scanning", root.display().to_string(), io::Error::other(error))
    })?
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        Some(ROOT_KEY.to_string())
    } else {
        Some(parts.join("/"))
    }
}

fn scan_structure(root: &Path) -> Result<BTreeMap<String, DirectoryEntry>, OperationError> {
    let mut structure: BTreeMap<String, DirectoryEntry> = BTreeMap::new();
    structure.insert(ROOT_KEY.to_string(), DirectoryEntry::default());

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|error| {
            OperationError::io("scanning", root.display().to_string(), error.into())
        })?;
        let Some(parent) = entry.path().parent().and_then(|p| relative_key(root, p)) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();

        if entry.file_type().is_dir() {
            if let Some(key) = relative_key(root, entry.path()) {
                structure.entry(key).or_default();
            }
            structure.entry(parent).or_default().subdirectories.push(name);
        } else {
            structure.entry(parent).or_default().files.push(name);
        }
    }

    Ok(structure)
}

fn walk_files(root: &Path) -> Result<Vec<FileEntry>, OperationError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|error| {
            OperationError::io("listing", root.display().to_string(), error.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = relative_key(root, entry.path()) else {
            continue;
        };
        let size = entry
            .metadata()
            .map_err(|error| OperationError::io("listing", path.clone(), error.into()))?
            .len();
        files.push(FileEntry { path, size });
    }
    files.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(files)
}
