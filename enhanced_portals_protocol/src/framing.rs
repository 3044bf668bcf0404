// Length-delimited message framing.
//
// Wire format for `message.rs` types: a 4-byte big-endian length prefix
// followed by the JSON-serialized message. `write_message` and
// `read_message` move raw bytes only; the caller serializes, so this module
// stays format-agnostic.
//
// `MAX_MESSAGE_SIZE` (1 MiB) bounds the allocation a malformed length prefix
// can cause. A single record update is a few hundred bytes.

use std::io::{self, Read, Write};

/// Maximum allowed message size (1 MiB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

/// Write a length-delimited message: 4-byte big-endian length, then payload.
pub fn write_message<W: Write>(writer: &mut W, msg: &[u8]) -> io::Result<()> {
    let len = u32::try_from(msg.len())
        .ok()
        .filter(|&len| len <= MAX_MESSAGE_SIZE)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "message too large: {} bytes (max {MAX_MESSAGE_SIZE})",
                    msg.len()
                ),
            )
        })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(msg)?;
    writer.flush()
}

/// Read a length-delimited message.
///
/// Returns `UnexpectedEof` if the stream ends before or inside a message,
/// `InvalidData` if the length prefix exceeds `MAX_MESSAGE_SIZE`.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
