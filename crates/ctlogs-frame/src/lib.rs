//! Multiplexed stdout/stderr framing for container output streams.
//!
//! When a container runs without a TTY the daemon interleaves its output
//! streams on one connection. Every chunk is framed with:
//! - A 1-byte stream type (0 stdin, 1 stdout, 2 stderr, 3 system error)
//! - 3 reserved bytes
//! - A 4-byte big-endian payload length
//!
//! [`std_copy`] splits such a stream into two writers; [`StdWriter`]
//! produces it. The `async` feature adds a `tokio_util` codec and async
//! copy helpers.

pub mod codec;
pub mod error;
pub mod reader;
pub mod stream;
pub mod writer;

#[cfg(feature = "async")]
pub mod framed;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use reader::{copy_merged, std_copy, FrameReader};
pub use stream::StdStream;
pub use writer::StdWriter;

#[cfg(feature = "async")]
pub use framed::{copy_merged_async, std_copy_async, StdCodec};
