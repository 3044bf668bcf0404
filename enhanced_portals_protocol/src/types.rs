// Core ID types for the replication protocol.
//
// Lightweight newtypes shared by `message.rs` and by whatever server code
// tracks connected observers. They are connection-scoped: the server assigns
// compact integers to observers and numbers its outgoing updates.

use serde::{Deserialize, Serialize};

/// Server-assigned observer ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(pub u32);

/// Per-connection monotonic update number. Observers use it to drop stale
/// updates that arrive out of order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpdateSequence(pub u64);

impl UpdateSequence {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Wire form of a grid address: world id plus x, y, z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireLocation {
    pub world: i32,
    pub pos: [i32; 3],
}
