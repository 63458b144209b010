//! Reparse-point payload codec
//!
//! Encodes and decodes the raw payload a filesystem driver stores behind a
//! symbolic link or mount point (junction). The layout is the classic
//! `REPARSE_DATA_BUFFER`: an 8-byte header carrying the reparse tag and the
//! payload length, followed by a tag-specific block with two UTF-16LE names
//! addressed by offset and length.
//!
//! Payloads travel through [`NativeBuffer`] regions, so every read is bounds
//! checked against the allocation before it touches memory.

use fsporter_io::NativeBuffer;
use fsporter_types::{LinkKind, LinkTarget, Result, TransferError};
use std::path::PathBuf;

/// Reparse tag for a symbolic link
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;
/// Reparse tag for a mount point (junction)
pub const IO_REPARSE_TAG_MOUNT_POINT: u32 = 0xA000_0003;

const SYMLINK_FLAG_RELATIVE: u32 = 0x1;

const HEADER_LEN: usize = 8;
const SYMLINK_FIXED: usize = 12;
const MOUNT_POINT_FIXED: usize = 8;

/// A decoded reparse payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparsePoint {
    /// The reparse tag identifying the payload layout
    pub tag: u32,
    /// The link target and print name carried in the payload
    pub link: LinkTarget,
    /// Whether a symbolic-link target is relative to the link's parent
    pub relative: bool,
}

impl ReparsePoint {
    /// Describe a symbolic link payload
    pub fn symlink(link: LinkTarget, relative: bool) -> Self {
        Self {
            tag: IO_REPARSE_TAG_SYMLINK,
            link,
            relative,
        }
    }

    /// Describe a mount-point payload
    pub fn mount_point(link: LinkTarget) -> Self {
        Self {
            tag: IO_REPARSE_TAG_MOUNT_POINT,
            link,
            relative: false,
        }
    }
}

/// Decode a reparse payload from a raw buffer
///
/// The payload does not record whether the target is a file or a directory;
/// `kind` supplies the classification of the entry the payload was read from.
/// Mount points always resolve to directories regardless of `kind`.
///
/// # Errors
///
/// Returns `InvalidArgument` when the payload is truncated or internally
/// inconsistent, and `PlatformUnsupported` for tags this codec does not
/// understand.
pub fn decode(buffer: &NativeBuffer, kind: LinkKind) -> Result<ReparsePoint> {
    let header = buffer.to_byte_sequence(0, HEADER_LEN)?;
    if header.len() < HEADER_LEN {
        return Err(TransferError::invalid_argument(
            "reparse buffer is too small for a header",
        ));
    }
    let tag = read_u32(&header, 0);
    let data_length = read_u16(&header, 4) as usize;
    if HEADER_LEN + data_length > buffer.len() {
        return Err(TransferError::invalid_argument(
            "reparse payload is truncated",
        ));
    }

    let (fixed_len, kind, relative) = match tag {
        IO_REPARSE_TAG_SYMLINK => {
            if data_length < SYMLINK_FIXED {
                return Err(TransferError::invalid_argument(
                    "symbolic link payload is truncated",
                ));
            }
            let fixed = buffer.to_byte_sequence(HEADER_LEN, SYMLINK_FIXED)?;
            let flags = read_u32(&fixed, 8);
            (SYMLINK_FIXED, kind, flags & SYMLINK_FLAG_RELATIVE != 0)
        }
        IO_REPARSE_TAG_MOUNT_POINT => {
            if data_length < MOUNT_POINT_FIXED {
                return Err(TransferError::invalid_argument(
                    "mount point payload is truncated",
                ));
            }
            (MOUNT_POINT_FIXED, LinkKind::Directory, false)
        }
        other => {
            return Err(TransferError::platform_unsupported(format!(
                "reparse tag {other:#010x}"
            )));
        }
    };

    let fixed = buffer.to_byte_sequence(HEADER_LEN, fixed_len)?;
    let substitute_offset = read_u16(&fixed, 0) as usize;
    let substitute_length = read_u16(&fixed, 2) as usize;
    let print_offset = read_u16(&fixed, 4) as usize;
    let print_length = read_u16(&fixed, 6) as usize;

    let names_base = HEADER_LEN + fixed_len;
    let names_length = data_length - fixed_len;
    let substitute = read_name(
        buffer,
        names_base,
        names_length,
        substitute_offset,
        substitute_length,
    )?;
    let print_name = read_name(buffer, names_base, names_length, print_offset, print_length)?;

    Ok(ReparsePoint {
        tag,
        link: LinkTarget {
            target: PathBuf::from(substitute),
            print_name,
            kind,
        },
        relative,
    })
}

/// Encode a reparse payload into a freshly allocated buffer
///
/// # Errors
///
/// Returns `PlatformUnsupported` for tags this codec does not understand and
/// `InvalidArgument` when the names do not fit the 16-bit payload length.
pub fn encode(point: &ReparsePoint) -> Result<NativeBuffer> {
    let fixed_len = match point.tag {
        IO_REPARSE_TAG_SYMLINK => SYMLINK_FIXED,
        IO_REPARSE_TAG_MOUNT_POINT => MOUNT_POINT_FIXED,
        other => {
            return Err(TransferError::platform_unsupported(format!(
                "reparse tag {other:#010x}"
            )));
        }
    };
    let substitute = utf16_bytes(&point.link.target.to_string_lossy());
    let print = utf16_bytes(&point.link.print_name);
    let data_length = fixed_len + substitute.len() + print.len();
    if data_length > usize::from(u16::MAX) {
        return Err(TransferError::invalid_argument(
            "reparse names exceed the payload size limit",
        ));
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + data_length);
    bytes.extend_from_slice(&point.tag.to_le_bytes());
    bytes.extend_from_slice(&(data_length as u16).to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&(substitute.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(substitute.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(print.len() as u16).to_le_bytes());
    if point.tag == IO_REPARSE_TAG_SYMLINK {
        let flags = if point.relative {
            SYMLINK_FLAG_RELATIVE
        } else {
            0
        };
        bytes.extend_from_slice(&flags.to_le_bytes());
    }
    bytes.extend_from_slice(&substitute);
    bytes.extend_from_slice(&print);

    let mut buffer = NativeBuffer::allocate(bytes.len())?;
    buffer.copy_in(&bytes, 0)?;
    Ok(buffer)
}

fn read_name(
    buffer: &NativeBuffer,
    base: usize,
    names_length: usize,
    offset: usize,
    length: usize,
) -> Result<String> {
    if offset + length > names_length {
        return Err(TransferError::invalid_argument(
            "reparse name range extends past the payload",
        ));
    }
    if length % 2 != 0 {
        return Err(TransferError::invalid_argument(
            "reparse name length is not a whole number of UTF-16 units",
        ));
    }
    let raw = buffer.to_byte_sequence(base + offset, length)?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|_| TransferError::invalid_argument("reparse name is not valid UTF-16"))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn utf16_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}
