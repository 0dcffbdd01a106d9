//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave a half-written env or
//! policy file behind on failure.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::{GuardError, GuardResult};

/// Read a text file, failing with `SourceFileNotFound` if it is absent
pub fn read_text_required<P: AsRef<Path>>(path: P) -> GuardResult<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GuardError::not_found(path));
    }

    fs::read_to_string(path)
        .map_err(|e| GuardError::Io(format!("Failed to read {}: {}", path.display(), e)))
}

/// Read JSON from a file, returning `None` if the file doesn't exist
pub fn read_json_optional<T, P>(path: P) -> GuardResult<Option<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .map_err(|e| GuardError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map(Some)
        .map_err(|e| GuardError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write text to a file atomically (write to temp, then rename)
///
/// The file is either completely replaced or not modified at all. An
/// existing file keeps its permissions.
pub fn write_text_atomic<P: AsRef<Path>>(path: P, contents: &str) -> GuardResult<()> {
    write_atomic(path.as_ref(), |writer| {
        writer
            .write_all(contents.as_bytes())
            .map_err(|e| GuardError::Io(format!("Failed to write data: {}", e)))
    })
}

/// Write pretty-printed JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> GuardResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_atomic(path.as_ref(), |writer| {
        serde_json::to_writer_pretty(&mut *writer, data)
            .map_err(|e| GuardError::Json(format!("Failed to serialize data: {}", e)))?;
        writer
            .write_all(b"\n")
            .map_err(|e| GuardError::Io(format!("Failed to write data: {}", e)))
    })
}

fn write_atomic<F>(path: &Path, fill: F) -> GuardResult<()>
where
    F: FnOnce(&mut dyn Write) -> GuardResult<()>,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Ensure parent directory exists
    fs::create_dir_all(parent).map_err(|e| {
        GuardError::Io(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    // Temp file in the same directory so the rename stays on one filesystem.
    // It starts owner-only (0600 on unix) and is removed if dropped unpersisted.
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| GuardError::Io(format!("Failed to create temp file: {}", e)))?;

    match fs::metadata(path) {
        Ok(meta) => temp.as_file().set_permissions(meta.permissions()).map_err(|e| {
            GuardError::Io(format!(
                "Failed to copy permissions of {}: {}",
                path.display(),
                e
            ))
        })?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(GuardError::Io(format!(
                "Failed to read metadata of {}: {}",
                path.display(),
                e
            )))
        }
    }

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        fill(&mut writer)?;
        writer
            .flush()
            .map_err(|e| GuardError::Io(format!("Failed to flush data: {}", e)))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| GuardError::Io(format!("Failed to sync data: {}", e)))?;

    temp.persist(path).map_err(|e| {
        GuardError::Io(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_read_nonexistent_json_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let data: Option<TestData> = read_json_optional(&path).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_write_and_read_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json_atomic(&path, &data).unwrap();
        let loaded: Option<TestData> = read_json_optional(&path).unwrap();
        assert_eq!(Some(data), loaded);
        assert!(fs::read_to_string(&path).unwrap().contains("\n  \"name\""));
    }

    #[test]
    fn test_read_text_required_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_text_required(temp_dir.path().join(".env")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");

        write_text_atomic(&path, "A=1\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\n");
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_atomic_write_leaves_sibling_files_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");
        let sibling = temp_dir.path().join(".env.tmp");
        fs::write(&sibling, "KEEP=1\n").unwrap();

        write_text_atomic(&path, "A=1\n").unwrap();

        assert_eq!(fs::read_to_string(&sibling).unwrap(), "KEEP=1\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\n");
    }

    #[test]
    fn test_failed_fill_keeps_original() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");
        fs::write(&path, "A=1\n").unwrap();

        let err = write_atomic(&path, |w| {
            w.write_all(b"PARTIAL").unwrap();
            Err(GuardError::Io("boom".into()))
        })
        .unwrap_err();

        assert!(matches!(err, GuardError::Io(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\n");
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join(".env");

        write_text_atomic(&path, "A=1").unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");
        fs::write(&path, "A=1").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_text_atomic(&path, "A=2").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");

        write_text_atomic(&path, "API_KEY=secret123\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_group_readable_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("env.schema.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_json_atomic(&path, &TestData::default()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
