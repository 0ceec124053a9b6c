//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with in-memory implementations.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATION
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

// ============================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================

/// Filesystem held entirely in memory. Directories are implicit.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper to seed a file.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), content.into());
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file: {}", path.display()),
                )
            })
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }

    fn ensure_parent(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_seeded_file_when_reading_then_returns_content() {
        let fs = MemoryFileSystem::new().with_file("/data/a.csv", "x");
        assert_eq!(fs.read_to_string(Path::new("/data/a.csv")).unwrap(), "x");
        assert!(fs.exists(Path::new("/data/a.csv")));
    }

    #[test]
    fn given_missing_file_when_reading_then_not_found() {
        let fs = MemoryFileSystem::new();
        let err = fs.read_to_string(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
