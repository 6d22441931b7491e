use std::fs;
use std::io;
use std::path::Path;

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    ensure_parent_dir(&path)?;
    fs::write(path, contents)
}
