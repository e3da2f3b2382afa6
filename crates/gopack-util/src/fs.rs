use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Overwrite a file by writing to a sibling temp file and renaming it over
/// the target.
///
/// The target ends up with either its old contents or the new contents,
/// never a torn write. The temp file lives in the target's directory so the
/// rename stays on one filesystem.
///
/// # Errors
/// Returns an error if the write or the rename fails; the temp file is
/// removed on every failure path.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("out");
    let tmp = dir.join(format!(".{name}.gopack-{}", std::process::id()));

    let result = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        // Windows refuses to rename over an existing file; retry after
        // removing the target.
        Err(_) if path.exists() => {
            if let Err(e) = fs::remove_file(path) {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            match fs::rename(&tmp, path) {
                Ok(()) => Ok(()),
                Err(e) => {
                    let _ = fs::remove_file(&tmp);
                    Err(e)
                }
            }
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.js");

        atomic_write(&path, b"first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.js");

        atomic_write(&path, b"content").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("main.js")]);
    }

    #[test]
    fn test_atomic_write_error_when_temp_path_is_a_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.js");
        fs::write(&path, "old").unwrap();
        let tmp = dir.path().join(format!(".main.js.gopack-{}", std::process::id()));
        fs::create_dir(&tmp).unwrap();

        assert!(atomic_write(&path, b"new").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }
}
