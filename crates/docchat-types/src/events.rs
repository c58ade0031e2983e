use serde::{Deserialize, Serialize};

use crate::message::Citation;

/// Event carried by one SSE frame of a chat turn
///
/// The set is closed: a payload with any other `type` fails to deserialize
/// and is treated as a decode error by the stream parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text delta for the AI answer (streamed token-by-token)
    Message {
        content: String,
    },

    /// Full citation list for the current AI answer
    Citation {
        citations: Vec<Citation>,
    },

    /// Error reported by the server; the stream keeps going
    Error {
        message: String,
    },

    /// Server finished the turn
    Done,
}
