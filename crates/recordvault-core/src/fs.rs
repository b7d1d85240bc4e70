//! Filesystem utilities for atomic operations.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, VaultError};

/// Move `temp_path` over `destination` in one rename.
///
/// `fs::rename` replaces an existing destination on every supported
/// platform. On failure the destination is left untouched and only the
/// temp file is removed.
pub fn replace_file(temp_path: &Path, destination: &Path) -> io::Result<()> {
    fs::rename(temp_path, destination).map_err(|err| {
        let _ = fs::remove_file(temp_path);
        err
    })
}

/// Write `data` to `path` via a sibling temp file, fsync, then rename.
///
/// A crash mid-write leaves at most a stray `*.tmp` file, never a
/// half-written destination. When `private` is set the temp file is
/// restricted to the owner before any bytes are written.
pub fn write_atomic(path: &Path, data: &[u8], private: bool) -> Result<()> {
    let temp_path = write_temp(path, data, private)
        .map_err(|e| VaultError::Storage(format!("Temp file write failed: {}", e)))?;
    replace_file(&temp_path, path)
        .map_err(|e| VaultError::Storage(format!("Atomic rename failed: {}", e)))
}

/// Write `data` to `path`, which must not exist yet.
///
/// The bytes are staged in a temp file and hard-linked into place, so the
/// destination appears complete or not at all. A concurrent writer of the
/// same path gets `ErrorKind::AlreadyExists` and nothing is replaced.
pub fn write_new_atomic(path: &Path, data: &[u8], private: bool) -> io::Result<()> {
    let temp_path = write_temp(path, data, private)?;
    let linked = fs::hard_link(&temp_path, path);
    let _ = fs::remove_file(&temp_path);
    match linked {
        Err(err) if err.kind() == io::ErrorKind::Unsupported => {
            write_exclusive(path, data, private)
        }
        other => other,
    }
}

/// Stage `data` in a fresh sibling of `path` and fsync it.
fn write_temp(path: &Path, data: &[u8], private: bool) -> io::Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid path: {}", path.display()),
        )
    })?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid filename: {}", path.display()),
            )
        })?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let temp_path = parent.join(format!("{}.{}.{}.tmp", filename, std::process::id(), nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;
    let written = (if private {
        restrict_permissions(&temp_path)
    } else {
        Ok(())
    })
    .and_then(|_| file.write_all(data))
    .and_then(|_| file.sync_all());
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(temp_path)
}

/// Direct `create_new` write for filesystems without hard links.
fn write_exclusive(path: &Path, data: &[u8], private: bool) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = (if private {
        restrict_permissions(path)
    } else {
        Ok(())
    })
    .and_then(|_| file.write_all(data))
    .and_then(|_| file.sync_all());
    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    written
}

fn restrict_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_replace_new_file() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("temp.txt");
        let dest = dir.path().join("dest.txt");

        File::create(&temp).unwrap().write_all(b"test").unwrap();

        replace_file(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "test");
    }

    #[test]
    fn test_failed_replace_keeps_existing_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("private_key.pem");
        fs::write(&dest, b"only copy").unwrap();

        let missing_temp = dir.path().join("never-written.tmp");
        assert!(replace_file(&missing_temp, &dest).is_err());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "only copy");
    }

    #[test]
    fn test_write_atomic_onto_directory_fails_without_damage() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("private_key.pem");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("inner"), b"keep").unwrap();

        assert!(write_atomic(&dest, b"new", true).is_err());
        assert_eq!(fs::read_to_string(dest.join("inner")).unwrap(), "keep");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_write_new_atomic_creates_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("public_key.pem");

        write_new_atomic(&dest, b"fresh", false).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "fresh");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_write_new_atomic_refuses_existing_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("public_key.pem");
        fs::write(&dest, b"first").unwrap();

        let err = write_new_atomic(&dest, b"second", false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "first");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("public_key.pem");

        write_atomic(&dest, b"old", false).unwrap();
        write_atomic(&dest, b"new", false).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_new_atomic_private_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("private_key.pem");
        write_new_atomic(&dest, b"secret", true).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_private_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("private_key.pem");
        write_atomic(&dest, b"secret", true).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_write_atomic_missing_parent_fails() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("missing").join("file.pem");
        assert!(write_atomic(&dest, b"x", false).is_err());
    }
}
