//! Length-prefixed framing for back-channel messages.
//!
//! # Wire format
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────┐
//! │ length: u32 (BE)     │ payload: `length` bytes      │
//! └──────────────────────┴──────────────────────────────┘
//! ```
//!
//! The payload is a [`Message`] encoded with bincode using big-endian,
//! fixed-width integers:
//!
//! ```text
//! tag u32 │ 0 Control     kind u32 (0 Start, 1 End)
//!         │ 1 Data        test_name, fixture_name
//!         │ 2 TestResult  test_name, fixture_name, result, stack_trace
//!         │ 3 ConsoleOut  message_type u32 (0 Out, 1 Error), text
//! string  = u64 byte length + UTF-8 bytes
//! ```
//!
//! The length prefix is the only frame boundary; receivers must not rely on
//! how the byte stream happens to be split into reads.

use bincode::Options;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::TestlinkError;
use crate::message::Message;

/// Size of the big-endian length prefix in front of every payload.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest payload either side will encode or accept (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
}

/// Serialize a message into its payload bytes (no length prefix).
pub fn encode_payload(message: &Message) -> Result<Vec<u8>, TestlinkError> {
    Ok(wire_options().serialize(message)?)
}

/// Parse exactly one message from `bytes`. Trailing bytes are an error.
pub fn decode_payload(bytes: &[u8]) -> Result<Message, TestlinkError> {
    Ok(wire_options().deserialize(bytes)?)
}

/// Encode a message as a complete frame, ready for a single write.
pub fn encode_frame(message: &Message) -> Result<Bytes, TestlinkError> {
    let mut dst = BytesMut::new();
    BackchannelCodec.encode(message, &mut dst)?;
    Ok(dst.freeze())
}

/// `tokio_util` codec for the back-channel framing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackchannelCodec;

impl Decoder for BackchannelCodec {
    type Item = Message;
    type Error = TestlinkError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
        let length = u32::from_be_bytes(prefix) as usize;

        if length > MAX_PAYLOAD_SIZE {
            return Err(TestlinkError::FrameTooLarge {
                size: length,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let frame_len = LENGTH_PREFIX_SIZE + length;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_SIZE);
        let payload = src.split_to(length);
        decode_payload(&payload).map(Some)
    }
}

impl Encoder<&Message> for BackchannelCodec {
    type Error = TestlinkError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = encode_payload(item)?;
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(TestlinkError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

impl Encoder<Message> for BackchannelCodec {
    type Error = TestlinkError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode(&item, dst)
    }
}
