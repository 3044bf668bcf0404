// enhanced_portals_protocol — wire protocol for portal record replication.
//
// This crate defines the messages and framing the authoritative server and
// its observers use to keep portal, modifier and part records in sync. It
// has no dependency on the sim crate.
//
// Module overview:
// - `types.rs`:    `ObserverId`, `UpdateSequence`, `WireLocation`.
// - `message.rs`:  Observer-to-server and server-to-observer message enums.
// - `framing.rs`:  Length-delimited framing over any `Read`/`Write` stream:
//                  4-byte big-endian length prefix, then JSON payload.
//
// Record bodies are opaque `Vec<u8>` payloads (JSON-encoded `BlockRecord`s
// in practice), and framing uses plain `std::io` so it works over blocking
// sockets, buffers, or the host's own packet channel.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_message, write_message};
pub use message::{ClientMessage, PROTOCOL_VERSION, ServerMessage};
pub use types::{ObserverId, UpdateSequence, WireLocation};

/// Serialize `msg` to JSON and write it as one frame.
pub fn send<W: std::io::Write, M: serde::Serialize>(writer: &mut W, msg: &M) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg)?;
    write_message(writer, &json)
}

/// Read one frame and deserialize it from JSON.
pub fn receive<R: std::io::Read, M: serde::de::DeserializeOwned>(
    reader: &mut R,
) -> std::io::Result<M> {
    let json = read_message(reader)?;
    Ok(serde_json::from_slice(&json)?)
}
