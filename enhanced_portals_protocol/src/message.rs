// Protocol messages between the authoritative server and observers.
//
// Two enums define the full vocabulary:
// - `ClientMessage`: sent by an observer to the server.
// - `ServerMessage`: sent by the server to an observer.
//
// Records travel as opaque byte payloads (`Vec<u8>`); the protocol never
// inspects them, which keeps this crate independent of the sim crate. The
// server serializes a `BlockRecord` into bytes before sending and the
// observer deserializes it after receiving.

use serde::{Deserialize, Serialize};

use crate::types::{ObserverId, UpdateSequence, WireLocation};

/// Version spoken by this build. Bumped on any incompatible change.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent by an observer to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Start observing (handshake).
    Hello {
        protocol_version: u32,
        observer_name: String,
    },
    /// Ask for the current record at a location, e.g. after the block
    /// itself became visible.
    RequestRecord { location: WireLocation },
    /// The observer is leaving gracefully.
    Goodbye,
}

/// Messages sent by the server to an observer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Handshake accepted.
    Welcome {
        observer_id: ObserverId,
        protocol_version: u32,
    },
    /// Handshake rejected.
    Rejected { reason: String },
    /// The record at `location` changed (or was requested).
    RecordUpdate {
        sequence: UpdateSequence,
        location: WireLocation,
        payload: Vec<u8>,
    },
    /// A requested location holds no record.
    RecordMissing { location: WireLocation },
}
