//! RCON packet codec.
//!
//! Wire layout, all integers little-endian:
//!
//! | Field  | Size        | Notes                                   |
//! |--------|-------------|-----------------------------------------|
//! | length | `i32`       | bytes that follow this field            |
//! | id     | `i32`       | echoed by the server; `-1` = auth failed|
//! | type   | `i32`       | 3 login, 2 command / auth reply, 0 reply|
//! | body   | `length-10` | ASCII / UTF-8 text, no NUL              |
//! | pad    | 2           | two NUL bytes                           |
//!
//! Use [`RconCodec`] with [`tokio_util::codec::Framed`] over a TCP stream.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{AppError, Result};

/// Smallest legal `length` field: id + type + two NUL bytes.
pub const MIN_PACKET_LEN: usize = 10;

/// Largest body the server sends in one packet.
pub const MAX_RESPONSE_BODY: usize = 4096;

/// Largest body a server accepts from a client.
pub const MAX_REQUEST_BODY: usize = 1446;

/// Largest `length` field accepted from the server.
pub const MAX_PACKET_LEN: usize = MIN_PACKET_LEN + MAX_RESPONSE_BODY;

/// Packet type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// `SERVERDATA_AUTH` (3): client login carrying the password.
    Login,
    /// `SERVERDATA_EXECCOMMAND` / `SERVERDATA_AUTH_RESPONSE` (2).
    Command,
    /// `SERVERDATA_RESPONSE_VALUE` (0): command output.
    Response,
    /// Any other value.
    Other(i32),
}

impl PacketType {
    /// Numeric wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Login => 3,
            Self::Command => 2,
            Self::Response => 0,
            Self::Other(code) => code,
        }
    }

    /// Decode a wire value.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            3 => Self::Login,
            2 => Self::Command,
            0 => Self::Response,
            other => Self::Other(other),
        }
    }
}

/// One RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Request id chosen by the client and echoed back.
    pub id: i32,
    /// Packet type.
    pub kind: PacketType,
    /// Text payload.
    pub body: String,
}

impl Packet {
    /// Build a packet.
    #[must_use]
    pub fn new(id: i32, kind: PacketType, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }
}

/// Length-prefixed RCON packet codec.
#[derive(Debug, Default)]
pub struct RconCodec;

impl RconCodec {
    /// Create a codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RconCodec {
    type Item = Packet;
    type Error = AppError;

    /// Decode one packet, buffering until the whole frame has arrived.
    ///
    /// Frames whose length field is outside
    /// [`MIN_PACKET_LEN`]..=[`MAX_PACKET_LEN`], that lack the two NUL pad
    /// bytes, or whose body is not UTF-8 return `AppError::Protocol`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if src.len() < 4 {
            return Ok(None);
        }

        let mut header = [0u8; 4];
        header.copy_from_slice(&src[..4]);
        let declared = i32::from_le_bytes(header);
        let len = usize::try_from(declared)
            .ok()
            .filter(|len| (MIN_PACKET_LEN..=MAX_PACKET_LEN).contains(len))
            .ok_or_else(|| AppError::Protocol(format!("invalid packet length {declared}")))?;

        if src.len() < 4 + len {
            src.reserve(4 + len - src.len());
            return Ok(None);
        }

        src.advance(4);
        let mut frame = src.split_to(len);
        let id = frame.get_i32_le();
        let kind = PacketType::from_code(frame.get_i32_le());

        let body_len = len - MIN_PACKET_LEN;
        if frame[body_len..] != [0, 0] {
            return Err(AppError::Protocol("packet is missing its NUL terminator".into()));
        }
        let body = std::str::from_utf8(&frame[..body_len])
            .map_err(|err| AppError::Protocol(format!("packet body is not utf-8: {err}")))?
            .to_owned();

        Ok(Some(Packet { id, kind, body }))
    }
}

impl Encoder<Packet> for RconCodec {
    type Error = AppError;

    /// Encode `item` as one length-prefixed frame.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if the body contains NUL or exceeds
    /// [`MAX_REQUEST_BODY`].
    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        let body = item.body.as_bytes();
        if body.contains(&0) {
            return Err(AppError::InvalidInput("rcon payload must not contain NUL".into()));
        }
        if body.len() > MAX_REQUEST_BODY {
            return Err(AppError::InvalidInput(format!(
                "rcon payload exceeds {MAX_REQUEST_BODY} bytes"
            )));
        }

        let len = MIN_PACKET_LEN + body.len();
        let declared = i32::try_from(len)
            .map_err(|_| AppError::InvalidInput("rcon payload too large".into()))?;

        dst.reserve(4 + len);
        dst.put_i32_le(declared);
        dst.put_i32_le(item.id);
        dst.put_i32_le(item.kind.code());
        dst.put_slice(body);
        dst.put_u8(0);
        dst.put_u8(0);
        Ok(())
    }
}
