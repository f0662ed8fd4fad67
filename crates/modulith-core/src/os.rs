//! Platform helpers shared by the dynamic loading code.

use std::io;
use std::path::Path;

/// File extension used by native shared libraries on this platform
/// (`so` on Linux, `dylib` on Apple platforms, `dll` on Windows).
pub const LIBRARY_EXTENSION: &str = std::env::consts::DLL_EXTENSION;

/// The most recent OS error code on the calling thread.
pub fn last_error_code() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Human-readable message for an OS error code.
pub fn error_message(code: i32) -> String {
    io::Error::from_raw_os_error(code).to_string()
}

/// Human-readable message for the most recent OS error.
pub fn last_error_message() -> String {
    io::Error::last_os_error().to_string()
}

/// True when at least one read permission bit (owner, group or other) is
/// set on `path`. Missing files are not readable.
#[cfg(unix)]
pub fn is_readable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o444 != 0)
        .unwrap_or(false)
}

/// True when `path` exists. Windows has no per-class read bits; existing
/// files are always readable by their owner.
#[cfg(not(unix))]
pub fn is_readable(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn library_extension_matches_the_platform() {
        assert_eq!(LIBRARY_EXTENSION, std::env::consts::DLL_EXTENSION);
        assert!(!LIBRARY_EXTENSION.is_empty());
    }

    #[test]
    fn error_message_is_not_empty() {
        // ENOENT exists on every supported platform.
        assert!(!error_message(2).is_empty());
    }

    #[test]
    fn missing_files_are_not_readable() {
        assert!(!is_readable(Path::new("/definitely/not/a/file")));
    }

    #[test]
    fn regular_files_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"probe").unwrap();
        assert!(is_readable(&path));
    }

    #[cfg(unix)]
    #[test]
    fn files_without_read_bits_are_not_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.txt");
        std::fs::write(&path, b"locked").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
        assert!(!is_readable(&path));
    }
}
