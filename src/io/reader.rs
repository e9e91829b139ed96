//! UTF-8 text file reading with memory mapping for large inputs.

// Memory mapping needs unsafe; the mapping is read-only and dropped before return.
#![allow(unsafe_code)]

use crate::error::{IoError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Files at or above this size are memory mapped (1 MiB).
pub const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Largest accepted input (1 GiB).
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// An opened input file.
///
/// # Examples
///
/// ```no_run
/// use chunkbench::io::FileReader;
///
/// let reader = FileReader::open("data/large.txt").unwrap();
/// let text = reader.read_to_string().unwrap();
/// ```
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::FileNotFound`] for a missing file and
    /// [`IoError::ReadFailed`] if it is not a regular file, cannot be
    /// opened, or is too large.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(IoError::FileNotFound { path }.into());
        }
        if !path_ref.is_file() {
            return Err(IoError::ReadFailed {
                path,
                reason: "not a regular file".to_string(),
            }
            .into());
        }

        let failed = |e: std::io::Error| IoError::ReadFailed {
            path: path.clone(),
            reason: e.to_string(),
        };
        let file = File::open(path_ref).map_err(failed)?;
        let size = file.metadata().map_err(failed)?.len();

        if size > MAX_FILE_SIZE {
            return Err(IoError::ReadFailed {
                path,
                reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
            }
            .into());
        }

        Ok(Self { file, size, path })
    }

    /// File size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Path as given to [`open`](Self::open).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::ReadFailed`] for read errors or invalid UTF-8 and
    /// [`IoError::MmapFailed`] if mapping a large file fails.
    pub fn read_to_string(&self) -> Result<String> {
        if self.size >= MMAP_THRESHOLD {
            // SAFETY: read-only mapping, not kept beyond this call.
            let mmap = unsafe { Mmap::map(&self.file) }.map_err(|e| IoError::MmapFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
            let text = std::str::from_utf8(&mmap).map_err(|e| self.invalid_utf8(&e))?;
            return Ok(text.to_string());
        }

        let mut bytes = Vec::new();
        (&self.file)
            .read_to_end(&mut bytes)
            .map_err(|e| IoError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| self.invalid_utf8(&e.utf8_error()).into())
    }

    fn invalid_utf8(&self, err: &std::str::Utf8Error) -> IoError {
        IoError::ReadFailed {
            path: self.path.clone(),
            reason: format!("invalid UTF-8: {err}"),
        }
    }
}

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// See [`FileReader::open`] and [`FileReader::read_to_string`].
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    FileReader::open(path)?.read_to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_small_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Hello, wörld!").unwrap();
        let reader = FileReader::open(file.path()).unwrap();
        assert_eq!(reader.size(), 14);
        assert_eq!(reader.read_to_string().unwrap(), "Hello, wörld!");
    }

    #[test]
    fn test_read_mapped_file() {
        let mut file = NamedTempFile::new().unwrap();
        let line = "a line of benchmark text\n";
        let repeats = usize::try_from(MMAP_THRESHOLD).unwrap() / line.len() + 1;
        file.write_all(line.repeat(repeats).as_bytes()).unwrap();

        let text = read_file(file.path()).unwrap();
        assert!(text.len() as u64 >= MMAP_THRESHOLD);
        assert!(text.starts_with(line));
    }

    #[test]
    fn test_missing_file() {
        let err = read_file("/nonexistent/input.txt").unwrap_err();
        assert!(matches!(err, Error::Io(IoError::FileNotFound { .. })));
    }

    #[test]
    fn test_directory_is_not_a_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_file(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io(IoError::ReadFailed { .. })));
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x66, 0xff, 0xfe]).unwrap();
        let err = read_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }
}
