use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether [`FileManager::create_dir`] made the directory or found it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Created,
    Existing,
}

/// Disk side of a download, rooted at the destination directory.
#[derive(Clone)]
pub struct FileManager {
    base_dir: PathBuf,
}

impl FileManager {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Creates `<base>/<name>`. An existing directory is reused and reported
    /// as [`DirStatus::Existing`]; anything else in the way is an error.
    pub fn create_dir(&self, name: &str) -> io::Result<DirStatus> {
        let path = self.base_dir.join(name);
        match fs::create_dir(&path) {
            Ok(()) => {
                debug!("Created directory: {:?}", path);
                Ok(DirStatus::Created)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
                debug!("Reusing directory: {:?}", path);
                Ok(DirStatus::Existing)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes `<base>/<name>` with everything in it.
    pub fn remove_dir(&self, name: &str) -> io::Result<()> {
        let path = self.base_dir.join(name);
        fs::remove_dir_all(&path)?;
        debug!("Removed directory: {:?}", path);
        Ok(())
    }

    pub fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)?;
        debug!("Removed file: {:?}", path);
        Ok(())
    }

    /// Truncates or creates `path` and writes `content` to it.
    pub fn save_bytes(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(content)?;
        Ok(())
    }

    /// Fails with `PermissionDenied` when the base directory, or an existing
    /// file at `path`, is marked read-only.
    pub fn ensure_writable(&self, path: &Path) -> io::Result<()> {
        if fs::metadata(&self.base_dir)?.permissions().readonly() {
            return Err(read_only(&self.base_dir));
        }
        match fs::metadata(path) {
            Ok(meta) if meta.permissions().readonly() => Err(read_only(path)),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Writes a text file under the base directory. On failure the partial
    /// file is removed before the error is returned.
    pub fn save_text(&self, file_name: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.base_dir.join(file_name);
        self.ensure_writable(&path)?;

        if let Err(e) = self.save_bytes(&path, content.as_bytes()) {
            if path.exists() {
                if let Err(cleanup) = fs::remove_file(&path) {
                    warn!("Failed to remove partial file {:?}: {}", path, cleanup);
                }
            }
            return Err(e);
        }

        Ok(path)
    }
}

fn read_only(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("{} is read-only", path.display()),
    )
}
