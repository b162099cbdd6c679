// ---------------------------------------------------------------------------
// SaveError: typed failures for the transit save file
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while writing or reading a transit save.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    Encode(String),
    /// The payload is not a valid `TransitSaveData`.
    Decode(String),
    /// Save file version is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    MigrationFailed(String),
    /// No save data was available to load.
    NoData,
    /// A required resource was missing from the ECS world.
    MissingResource(String),
    /// The header carries the magic bytes but is truncated, from a newer
    /// header format, or fails its checksum.
    CorruptHeader(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            SaveError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: save is v{found}, but this build only supports up to v{expected_max}"
            ),
            SaveError::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            SaveError::NoData => write!(f, "No save data available to load"),
            SaveError::MissingResource(name) => {
                write!(f, "Missing required resource: {name}")
            }
            SaveError::CorruptHeader(msg) => write!(f, "Invalid file header: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_error_display_io() {
        let err = SaveError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "transit_save.bin",
        ));
        let msg = format!("{err}");
        assert!(msg.contains("I/O error"), "got: {msg}");
        assert!(msg.contains("transit_save.bin"), "got: {msg}");
    }

    #[test]
    fn test_save_error_display_version_mismatch() {
        let err = SaveError::VersionMismatch {
            expected_max: 3,
            found: 7,
        };
        let msg = format!("{err}");
        assert!(msg.contains("v7"), "got: {msg}");
        assert!(msg.contains("v3"), "got: {msg}");
    }

    #[test]
    fn test_save_error_display_corrupt_header() {
        let err = SaveError::CorruptHeader("checksum mismatch".to_string());
        let msg = format!("{err}");
        assert!(msg.starts_with("Invalid file header"), "got: {msg}");
        assert!(msg.contains("checksum mismatch"), "got: {msg}");
    }

    #[test]
    fn test_save_error_source_only_for_io() {
        let io = SaveError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(matches!(io, SaveError::Io(_)));
        assert!(std::error::Error::source(&io).is_some());
        assert!(std::error::Error::source(&SaveError::NoData).is_none());
    }
}
