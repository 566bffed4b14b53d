//! RCON remote-console control channel.
//!
//! The launcher reaches a running server only through RCON: one TCP
//! connection per command, authenticated with the shared secret that the
//! supervisor writes into `server.properties` before every start.
//!
//! - `codec`: length-prefixed packet framing for [`tokio_util::codec::Framed`].
//! - `client`: [`RconClient`] and the single-exchange [`RconSession`].

pub mod client;
pub mod codec;

pub use client::{RconClient, RconSession};
pub use codec::{Packet, PacketType, RconCodec};
