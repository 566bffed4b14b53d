//! RCON client.
//!
//! Every [`RconClient::send`] opens a fresh [`RconSession`], authenticates,
//! performs exactly one command exchange, and closes the connection. The
//! whole exchange, connect included, runs under one timeout.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use crate::config::RconConfig;
use crate::rcon::codec::{Packet, PacketType, RconCodec};
use crate::{AppError, Result};

/// Id the server returns in place of the request id when login fails.
const AUTH_REJECTED_ID: i32 = -1;

/// RCON client bound to one endpoint and secret.
#[derive(Debug, Clone)]
pub struct RconClient {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
}

impl RconClient {
    /// Create a client.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            timeout,
        }
    }

    /// Create a client from the launcher's RCON settings.
    #[must_use]
    pub fn from_config(config: &RconConfig) -> Self {
        Self::new(
            config.host.clone(),
            config.port,
            config.password.clone(),
            config.timeout(),
        )
    }

    /// `host:port` this client connects to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send `command` and return the server's reply text.
    ///
    /// # Errors
    ///
    /// - `AppError::Connection` if the endpoint is unreachable or closes the
    ///   connection early.
    /// - `AppError::Auth` if the password is rejected.
    /// - `AppError::Protocol` if a reply cannot be parsed or does not match.
    /// - `AppError::Timeout` if the exchange exceeds the configured bound.
    /// - `AppError::InvalidInput` if `command` cannot be encoded.
    pub async fn send(&self, command: &str) -> Result<String> {
        let exchange = async {
            let mut session = RconSession::open(&self.host, self.port).await?;
            session.authenticate(&self.password).await?;
            let reply = session.execute(command).await;
            session.close().await;
            reply
        };

        let reply = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "no reply from {} within {:?}",
                    self.endpoint(),
                    self.timeout
                ))
            })??;

        info!(endpoint = %self.endpoint(), command, "rcon command acknowledged");
        Ok(reply)
    }
}

/// One RCON connection carrying a single command exchange.
///
/// The underlying socket closes when the session is dropped, so every exit
/// path releases the connection.
#[derive(Debug)]
pub struct RconSession {
    framed: Framed<TcpStream, RconCodec>,
    next_id: i32,
}

impl RconSession {
    /// Connect to `host:port`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if the TCP connection fails.
    pub async fn open(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|err| AppError::Connection(format!("cannot reach {host}:{port}: {err}")))?;
        debug!(host, port, "rcon connection opened");

        Ok(Self {
            framed: Framed::new(stream, RconCodec::new()),
            next_id: 1,
        })
    }

    /// Log in with `password`.
    ///
    /// Empty `Response` packets sent ahead of the auth reply are skipped.
    ///
    /// # Errors
    ///
    /// - `AppError::Auth` if the server answers with id `-1`.
    /// - `AppError::Connection` if the connection drops.
    /// - `AppError::Protocol` on an unexpected packet.
    pub async fn authenticate(&mut self, password: &str) -> Result<()> {
        let id = self.write(PacketType::Login, password).await?;

        loop {
            let packet = self.read("authentication").await?;
            match packet.kind {
                PacketType::Command if packet.id == AUTH_REJECTED_ID => {
                    return Err(AppError::Auth("rcon password rejected".into()));
                }
                PacketType::Command if packet.id == id => {
                    debug!("rcon authenticated");
                    return Ok(());
                }
                PacketType::Response if packet.body.is_empty() => {}
                _ => {
                    return Err(AppError::Protocol(format!(
                        "unexpected packet during authentication: id={} type={:?}",
                        packet.id, packet.kind
                    )));
                }
            }
        }
    }

    /// Run `command` and return the single reply payload.
    ///
    /// # Errors
    ///
    /// - `AppError::Connection` if the connection drops before the reply.
    /// - `AppError::Protocol` if the reply id or type does not match.
    pub async fn execute(&mut self, command: &str) -> Result<String> {
        let id = self.write(PacketType::Command, command).await?;
        let packet = self.read("command reply").await?;

        if packet.kind != PacketType::Response || packet.id != id {
            return Err(AppError::Protocol(format!(
                "unexpected reply: id={} type={:?} (expected id={id})",
                packet.id, packet.kind
            )));
        }
        Ok(packet.body)
    }

    /// Flush and shut down the connection.
    pub async fn close(mut self) {
        if let Err(err) = SinkExt::<Packet>::close(&mut self.framed).await {
            debug!(%err, "rcon connection close failed");
        }
    }

    async fn write(&mut self, kind: PacketType, body: &str) -> Result<i32> {
        let id = self.next_id;
        self.next_id += 1;
        self.framed
            .send(Packet::new(id, kind, body))
            .await
            .map_err(into_connection_error)?;
        Ok(id)
    }

    async fn read(&mut self, stage: &str) -> Result<Packet> {
        match self.framed.next().await {
            Some(Ok(packet)) => Ok(packet),
            Some(Err(err)) => Err(into_connection_error(err)),
            None => Err(AppError::Connection(format!("connection closed during {stage}"))),
        }
    }
}

/// Socket-level failures surface as `Connection`; codec errors pass through.
fn into_connection_error(err: AppError) -> AppError {
    match err {
        AppError::Io(msg) => AppError::Connection(msg),
        other => other,
    }
}
