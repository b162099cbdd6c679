// ---------------------------------------------------------------------------
// file_header: magic bytes, version and checksum in front of the payload
// ---------------------------------------------------------------------------
//
// Header format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "STRN"
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32, currently always 0)
//   [12..20] Timestamp (Unix epoch seconds, u64)
//   [20..24] Payload size (u32)
//   [24..28] xxHash32 checksum of the payload
//
// Files that do not start with "STRN" are read as a bare bitcode payload.

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

pub const MAGIC: [u8; 4] = *b"STRN";

pub const HEADER_SIZE: usize = 28;

/// Layout version of the header itself, independent of
/// `CURRENT_SAVE_VERSION`.
pub const HEADER_FORMAT_VERSION: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub payload_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn new(payload: &[u8]) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            format_version: HEADER_FORMAT_VERSION,
            flags: 0,
            timestamp,
            payload_size: payload.len() as u32,
            checksum: xxh32(payload, XXHASH_SEED),
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.format_version.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.payload_size.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
    }

    fn read_from(bytes: &[u8]) -> Self {
        let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&bytes[12..20]);
        Self {
            format_version: u32_at(4),
            flags: u32_at(8),
            timestamp: u64::from_le_bytes(timestamp),
            payload_size: u32_at(20),
            checksum: u32_at(24),
        }
    }
}

/// Returns `[header] ++ payload`.
pub fn wrap_with_header(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    FileHeader::new(payload).write_to(&mut out);
    out.extend_from_slice(payload);
    out
}

pub enum UnwrapResult<'a> {
    WithHeader {
        header: FileHeader,
        payload: &'a [u8],
    },
    /// No magic bytes; the whole buffer is the payload.
    Legacy(&'a [u8]),
}

/// Split the header off `bytes` and validate it.
///
/// # Errors
///
/// `SaveError::CorruptHeader` when the magic is present but the header is
/// truncated, from a newer header format, or the checksum does not match.
pub fn unwrap_header(bytes: &[u8]) -> Result<UnwrapResult<'_>, SaveError> {
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Ok(UnwrapResult::Legacy(bytes));
    }

    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::CorruptHeader(format!(
            "file is too short ({} bytes, need at least {HEADER_SIZE} for header)",
            bytes.len()
        )));
    }

    let header = FileHeader::read_from(bytes);
    if header.format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::CorruptHeader(format!(
            "header format version {} is newer than supported version {HEADER_FORMAT_VERSION}",
            header.format_version
        )));
    }

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(SaveError::CorruptHeader(format!(
            "checksum mismatch (expected {:#010X}, got {computed:#010X})",
            header.checksum
        )));
    }

    Ok(UnwrapResult::WithHeader { header, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_message(result: Result<UnwrapResult<'_>, SaveError>) -> String {
        match result {
            Err(SaveError::CorruptHeader(msg)) => msg,
            Err(other) => panic!("expected CorruptHeader, got {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let data = b"transit rules and bindings";
        let wrapped = wrap_with_header(data);
        assert_eq!(&wrapped[..4], b"STRN");
        assert_eq!(wrapped.len(), HEADER_SIZE + data.len());

        match unwrap_header(&wrapped).expect("unwrap should succeed") {
            UnwrapResult::WithHeader { header, payload } => {
                assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
                assert_eq!(header.flags, 0);
                assert_eq!(header.payload_size, data.len() as u32);
                assert_eq!(payload, data);
            }
            UnwrapResult::Legacy(_) => panic!("expected WithHeader, got Legacy"),
        }
    }

    #[test]
    fn test_headerless_bytes_are_legacy() {
        for data in [&b""[..], &b"\x00\x01"[..], &b"MEGA and more bytes"[..]] {
            match unwrap_header(data).expect("legacy input is not an error") {
                UnwrapResult::Legacy(payload) => assert_eq!(payload, data),
                UnwrapResult::WithHeader { .. } => panic!("expected Legacy"),
            }
        }
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let mut wrapped = wrap_with_header(b"payload");
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;

        let msg = header_message(unwrap_header(&wrapped));
        assert!(msg.contains("checksum mismatch"), "got: {msg}");
    }

    #[test]
    fn test_future_header_version_rejected() {
        let mut wrapped = wrap_with_header(b"payload");
        wrapped[4..8].copy_from_slice(&9u32.to_le_bytes());

        let msg = header_message(unwrap_header(&wrapped));
        assert!(msg.contains("header format version 9"), "got: {msg}");
    }

    #[test]
    fn test_truncated_header_detected() {
        let msg = header_message(unwrap_header(b"STRN\x01\x00"));
        assert!(msg.contains("too short"), "got: {msg}");
    }

    #[test]
    fn test_empty_payload_keeps_header() {
        let wrapped = wrap_with_header(&[]);
        assert_eq!(wrapped.len(), HEADER_SIZE);
        match unwrap_header(&wrapped).expect("unwrap should succeed") {
            UnwrapResult::WithHeader { header, payload } => {
                assert_eq!(header.payload_size, 0);
                assert!(payload.is_empty());
            }
            UnwrapResult::Legacy(_) => panic!("expected WithHeader"),
        }
    }
}
