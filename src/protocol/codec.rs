//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Len (4)  │          Payload (Len bytes)            │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! `Len` is big-endian. The payload is the bincode encoding of a
//! [`Request`] or [`Response`] with varint integers, so enum tags take one
//! byte and strings carry a varint length prefix:
//!
//! - Request:  kind (SET=0, GET=1, STATS=2) + key + value
//! - Response: status (SUCCESS=0, FAILURE=1) + message

use std::io::{self, ErrorKind, Read, Write};

use bincode::Options;
use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DictError, Result};
use super::{Request, Response};

/// Header size: 4 bytes payload length
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Upfront reservation for a payload read from a stream
const READ_CHUNK_SIZE: usize = 64 * 1024;

fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_varint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
        .with_limit(MAX_PAYLOAD_SIZE as u64)
}

fn check_payload_len(payload_len: usize) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(DictError::MalformedFrame(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Generic Framing
// =============================================================================

fn encode_into<T: Serialize>(value: &T, dst: &mut BytesMut) -> Result<()> {
    let payload = payload_options().serialize(value).map_err(|e| {
        DictError::MalformedFrame(format!("Cannot encode payload: {}", e))
    })?;
    check_payload_len(payload.len())?;

    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32(payload.len() as u32);
    dst.put_slice(&payload);
    Ok(())
}

fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_SIZE {
        return Err(DictError::MalformedFrame(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = (&bytes[..HEADER_SIZE]).get_u32() as usize;
    check_payload_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(DictError::MalformedFrame(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }
    if bytes.len() > total_len {
        return Err(DictError::MalformedFrame(format!(
            "Frame has {} trailing bytes",
            bytes.len() - total_len
        )));
    }

    Ok(payload_options().deserialize(&bytes[HEADER_SIZE..total_len])?)
}

/// Read exactly one frame (header + payload) into `buf`
///
/// `buf` is cleared first. Returns `Ok(false)` if the stream ended cleanly
/// before the first header byte. A stream that ends inside a frame is a
/// malformed frame, not a disconnect.
pub fn read_frame<R: Read>(reader: &mut R, buf: &mut BytesMut) -> Result<bool> {
    buf.clear();

    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(DictError::MalformedFrame(format!(
                    "Truncated header: expected {} bytes, got {}",
                    HEADER_SIZE, filled
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let payload_len = (&header[..]).get_u32() as usize;
    check_payload_len(payload_len)?;

    // Grow with the bytes that actually arrive, not with what the header claims
    buf.reserve(HEADER_SIZE + payload_len.min(READ_CHUNK_SIZE));
    buf.put_slice(&header);

    let mut payload = reader.by_ref().take(payload_len as u64);
    let mut writer = (&mut *buf).writer();
    let copied = io::copy(&mut payload, &mut writer)?;
    if copied < payload_len as u64 {
        return Err(DictError::MalformedFrame(format!(
            "Truncated payload: expected {} bytes, got {}",
            payload_len, copied
        )));
    }

    Ok(true)
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Append an encoded request frame to `dst`
pub fn encode_request_into(request: &Request, dst: &mut BytesMut) -> Result<()> {
    encode_into(request, dst)
}

/// Encode a request to a complete frame
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    encode_request_into(request, &mut buf)?;
    Ok(buf.to_vec())
}

/// Decode a request from exactly one complete frame
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    decode_frame(bytes)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Append an encoded response frame to `dst`
pub fn encode_response_into(response: &Response, dst: &mut BytesMut) -> Result<()> {
    encode_into(response, dst)
}

/// Encode a response to a complete frame
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    encode_response_into(response, &mut buf)?;
    Ok(buf.to_vec())
}

/// Decode a response from exactly one complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    decode_frame(bytes)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Returns `Ok(None)` if the peer closed before sending anything.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Option<Request>> {
    let mut buf = BytesMut::new();
    if !read_frame(reader, &mut buf)? {
        return Ok(None);
    }
    decode_request(&buf).map(Some)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
///
/// Returns `Ok(None)` if the peer closed before sending anything.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Option<Response>> {
    let mut buf = BytesMut::new();
    if !read_frame(reader, &mut buf)? {
        return Ok(None);
    }
    decode_response(&buf).map(Some)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
