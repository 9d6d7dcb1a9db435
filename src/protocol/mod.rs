//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Length-Delimited Binary)
//!
//! ### Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │         Payload             │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! ### Request Kinds
//! - 0: SET   - Payload: key + value
//! - 1: GET   - Payload: key + empty value
//! - 2: STATS - Payload: empty key + empty value
//!
//! ### Status Codes
//! - 0: SUCCESS
//! - 1: FAILURE

mod request;
mod response;
mod codec;

pub use request::{Request, RequestKind};
pub use response::{Response, Status};
pub use codec::{
    decode_request, decode_response, encode_request, encode_request_into, encode_response,
    encode_response_into, read_frame, read_request, read_response, write_request,
    write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
