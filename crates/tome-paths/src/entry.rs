//! File and directory refinements of [`AnchoredPath`].
//!
//! All filesystem access goes through `tokio::fs` so callers can issue many
//! operations concurrently during a tree pass.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::anchored::AnchoredPath;

/// A location that exists on disk as either a file or a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Regular file (or anything that is not a directory).
    File(FileRef),
    /// Directory.
    Dir(DirRef),
}

impl Entry {
    /// Inspect `path` on disk.
    ///
    /// Returns `Ok(None)` when nothing exists there. Symlinks are followed.
    pub async fn open(path: AnchoredPath) -> io::Result<Option<Self>> {
        match fs::metadata(path.absolute()).await {
            Ok(meta) if meta.is_dir() => Ok(Some(Self::Dir(DirRef::new(path)))),
            Ok(_) => Ok(Some(Self::File(FileRef::new(path)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Underlying anchored path.
    #[must_use]
    pub fn path(&self) -> &AnchoredPath {
        match self {
            Self::File(file) => file.path(),
            Self::Dir(dir) => dir.path(),
        }
    }

    /// Rebase onto `anchor`, keeping the variant.
    #[must_use]
    pub fn chdir(&self, anchor: &Path) -> Self {
        match self {
            Self::File(file) => Self::File(file.chdir(anchor)),
            Self::Dir(dir) => Self::Dir(dir.chdir(anchor)),
        }
    }
}

/// Reference to a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileRef {
    path: AnchoredPath,
}

impl FileRef {
    #[must_use]
    pub fn new(path: AnchoredPath) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &AnchoredPath {
        &self.path
    }

    #[must_use]
    pub fn absolute(&self) -> &Path {
        self.path.absolute()
    }

    /// Basename, including the extension.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.absolute()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Basename without the extension.
    #[must_use]
    pub fn stem(&self) -> String {
        self.absolute()
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lower-cased extension with its leading dot, or `""` when there is none.
    ///
    /// Only the basename is inspected, so dots in directory names and
    /// dotfiles such as `.gitignore` never produce an extension.
    #[must_use]
    pub fn ext(&self) -> String {
        self.absolute()
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    /// Directory containing this file.
    #[must_use]
    pub fn parent(&self) -> DirRef {
        DirRef::new(self.path.parent().unwrap_or_else(|| self.path.clone()))
    }

    #[must_use]
    pub fn chdir(&self, anchor: &Path) -> Self {
        Self::new(self.path.chdir(anchor))
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(self.absolute()).await.unwrap_or(false)
    }

    pub async fn is_file(&self) -> bool {
        fs::metadata(self.absolute())
            .await
            .is_ok_and(|m| m.is_file())
    }

    pub async fn read_to_string(&self) -> io::Result<String> {
        fs::read_to_string(self.absolute()).await
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(self.absolute()).await
    }

    /// Last modification time.
    pub async fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(self.absolute()).await?.modified()
    }

    /// Open a writable sink, creating missing parent directories.
    ///
    /// The file is truncated. It is closed when the returned handle drops.
    pub async fn create(&self) -> io::Result<fs::File> {
        if let Some(parent) = self.absolute().parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::File::create(self.absolute()).await
    }

    /// Replace the file's content with `contents`.
    pub async fn write(&self, contents: impl AsRef<[u8]>) -> io::Result<()> {
        let mut sink = self.create().await?;
        sink.write_all(contents.as_ref()).await?;
        sink.flush().await
    }

    /// Copy this file byte-for-byte to `dest`, creating its parent directories.
    pub async fn copy_to(&self, dest: &FileRef) -> io::Result<u64> {
        if let Some(parent) = dest.absolute().parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(self.absolute(), dest.absolute()).await
    }
}

/// Reference to a directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirRef {
    path: AnchoredPath,
}

impl DirRef {
    #[must_use]
    pub fn new(path: AnchoredPath) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &AnchoredPath {
        &self.path
    }

    #[must_use]
    pub fn absolute(&self) -> &Path {
        self.path.absolute()
    }

    /// Directory name (last path segment).
    #[must_use]
    pub fn name(&self) -> String {
        self.absolute()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn chdir(&self, anchor: &Path) -> Self {
        Self::new(self.path.chdir(anchor))
    }

    /// File at `rel` below this directory.
    #[must_use]
    pub fn file(&self, rel: &Path) -> FileRef {
        FileRef::new(self.path.join(rel))
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(self.absolute()).await.unwrap_or(false)
    }

    pub async fn is_dir(&self) -> bool {
        fs::metadata(self.absolute())
            .await
            .is_ok_and(|m| m.is_dir())
    }

    /// Create the directory and any missing ancestors.
    pub async fn create(&self) -> io::Result<()> {
        fs::create_dir_all(self.absolute()).await
    }

    /// All files below this directory, recursively, sorted by path.
    ///
    /// Each entry is anchored at its own absolute location. Directories are
    /// descended into but not returned; symlinks are followed.
    pub async fn files(&self) -> io::Result<Vec<FileRef>> {
        let mut files = Vec::new();
        let mut pending: Vec<PathBuf> = vec![self.absolute().to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let Ok(meta) = fs::metadata(&path).await else {
                    // Dangling symlink
                    continue;
                };
                if meta.is_dir() {
                    pending.push(path);
                } else if meta.is_file() {
                    files.push(FileRef::new(AnchoredPath::from_absolute(&path)));
                }
            }
        }

        files.sort_by(|a, b| a.absolute().cmp(b.absolute()));
        Ok(files)
    }

    /// Remove everything inside this directory, keeping the directory itself.
    ///
    /// A missing directory counts as already clear.
    pub async fn clear(&self) -> io::Result<()> {
        let mut entries = match fs::read_dir(self.absolute()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(entry.path()).await?;
            } else {
                fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }
}
