mod consumer;
mod decoder;
mod error;
mod frame;

#[cfg(test)]
mod test_server;

pub use consumer::{Phase, StreamConsumer, StreamSnapshot, ABORTED_MARKER, ERROR_MARKER};
pub use decoder::{LineDecoder, Utf8Decoder};
pub use error::{ConfigField, FailureKind, StreamError};
pub use frame::{parse_line, Frame, DONE_SENTINEL};
