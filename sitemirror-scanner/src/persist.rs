use crate::error::PersistError;
use crate::normalize::SiteUrl;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

pub const INDEX_FILE: &str = "index.html";

// Distinct URLs can map to one target; every write gets its own temp file.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directories are world readable and traversable.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Maps crawled URLs below a destination root and writes them there.
#[derive(Debug, Clone)]
pub struct Persister {
    dest_root: PathBuf,
    seed_key: String,
}

impl Persister {
    pub fn new(dest_root: impl Into<PathBuf>, seed: &SiteUrl) -> Self {
        Self {
            dest_root: dest_root.into(),
            seed_key: seed.key().to_string(),
        }
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    pub fn path_for(&self, url: &SiteUrl) -> PathBuf {
        map_to_path(url, &self.dest_root, url.key() == self.seed_key)
    }

    /// Writes `bytes` for `url` and returns the path actually written.
    pub async fn persist(&self, url: &SiteUrl, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let path = self.path_for(url);
        debug!("Persisting {} to {}", url, path.display());
        write_page(&path, bytes).await
    }
}

/// Where a page lives on disk.
///
/// The seed becomes `<dest>/<url without scheme>/index.html`. Any other URL is
/// split on `/`: the last segment is the file name (with `&` and `?` turned into
/// `_`), the rest are directories. Empty, `.` and `..` segments are dropped so
/// nothing escapes `dest_root`.
pub fn map_to_path(url: &SiteUrl, dest_root: &Path, is_seed: bool) -> PathBuf {
    let stripped = url.key();
    let mut path = dest_root.to_path_buf();

    if is_seed {
        path.extend(safe_segments(stripped));
        path.push(INDEX_FILE);
        return path;
    }

    let (folders, file_name) = stripped.rsplit_once('/').unwrap_or(("", stripped));
    path.extend(safe_segments(folders));
    match file_name {
        "" | "." | ".." => path.push(INDEX_FILE),
        name => path.push(name.replace(['&', '?'], "_")),
    }
    path
}

fn safe_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
}

/// Writes the whole buffer to a uniquely named sibling temp file, then renames
/// it into place, so the target is either complete or absent. Concurrent writes
/// to one target never share a temp file; the last rename wins.
///
/// When `path` is already a directory (a page that was mirrored as a folder
/// first) the page goes to `index.html` inside it.
pub async fn write_page(path: &Path, bytes: &[u8]) -> Result<PathBuf, PersistError> {
    let mut target = path.to_path_buf();
    if fs::metadata(&target).await.is_ok_and(|meta| meta.is_dir()) {
        target.push(INDEX_FILE);
    }

    let parent = target.parent().map(Path::to_path_buf).unwrap_or_default();
    ensure_dir(&parent).await?;

    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| INDEX_FILE.to_string());
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp = parent.join(format!(".{file_name}.{}.{seq}.part", std::process::id()));

    fs::write(&temp, bytes)
        .await
        .map_err(|source| PersistError::Write {
            path: temp.clone(),
            source,
        })?;

    if let Err(source) = fs::rename(&temp, &target).await {
        let _ = fs::remove_file(&temp).await;
        return Err(PersistError::Rename {
            from: temp,
            to: target,
            source,
        });
    }

    Ok(target)
}

/// Recursively creates `dir` with permissive access.
pub async fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(dir, std::fs::Permissions::from_mode(DIR_MODE)).await {
            debug!("Could not change permissions on {}: {}", dir.display(), e);
        }
    }

    Ok(())
}
