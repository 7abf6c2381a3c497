//! Plain-HTTP collaborators over embassy-net TCP sockets
//!
//! One connection per request, `Connection: close`, no TLS. Request text and
//! response parsing come from `tremor_core::http`.

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpEndpoint, Stack};
use embassy_time::Duration;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use tremor_core::collaborators::{
    AlertPayload, AlertSink, CollaboratorError, StatusSource, StatusValue,
};
use tremor_core::config::{AlertEndpoint, StatusEndpoint};
use tremor_core::http::{self, HttpError, ifttt, thingspeak};

const RX_BUFFER_SIZE: usize = 1024;
const TX_BUFFER_SIZE: usize = 1024;

/// Largest status response kept; the channel metadata alone is a few hundred bytes
const STATUS_RESPONSE_SIZE: usize = 1536;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("DNS lookup failed")]
    Dns,
    #[error("TCP connect failed")]
    Connect,
    #[error("TCP write failed")]
    Write,
    #[error("TCP read failed")]
    Read,
    #[error("HTTP response rejected: {0}")]
    Response(#[from] HttpError),
}

impl TransportError {
    fn details(self) -> &'static str {
        match self {
            Self::Dns => "dns lookup failed",
            Self::Connect => "connect failed",
            Self::Write => "write failed",
            Self::Read => "read failed",
            Self::Response(e) => http_details(e),
        }
    }
}

fn http_details(error: HttpError) -> &'static str {
    match error {
        HttpError::RequestTooLarge { .. } => "request too large",
        HttpError::MissingBody => "response has no body",
        HttpError::MalformedJson => "malformed response",
        HttpError::NoFeeds => "channel has no entries",
        HttpError::StatusTooLong { .. } => "status too long",
        HttpError::ResponseTooLarge { .. } => "response too large",
    }
}

/// One-shot HTTP exchanges on a shared network stack
#[derive(Clone, Copy)]
pub struct HttpClient {
    stack: Stack<'static>,
    socket_timeout: Duration,
}

impl HttpClient {
    pub fn new(stack: Stack<'static>, socket_timeout: Duration) -> Self {
        Self {
            stack,
            socket_timeout,
        }
    }

    /// Connect, send `request`, then read until the server closes.
    /// Returns the number of bytes read.
    ///
    /// A reply that does not fit `response` is rejected. An empty `response`
    /// skips reading entirely.
    pub async fn exchange(
        &self,
        host: &str,
        port: u16,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, TransportError> {
        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|_| TransportError::Dns)?;
        let address = addresses.first().copied().ok_or(TransportError::Dns)?;
        debug!("{} resolved to {}", host, address);

        let mut rx_buffer = [0u8; RX_BUFFER_SIZE];
        let mut tx_buffer = [0u8; TX_BUFFER_SIZE];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(self.socket_timeout));

        socket
            .connect(IpEndpoint::new(address, port))
            .await
            .map_err(|_| TransportError::Connect)?;

        let mut sent = 0;
        while sent < request.len() {
            match socket.write(&request[sent..]).await {
                Ok(0) | Err(_) => {
                    socket.abort();
                    return Err(TransportError::Write);
                }
                Ok(n) => sent += n,
            }
        }
        socket.flush().await.map_err(|_| TransportError::Write)?;

        let read = http::read_response(response, async |chunk: &mut [u8]| {
            socket
                .read(chunk)
                .await
                .map_err(|_| TransportError::Read)
        })
        .await;
        let received = match read {
            Ok(received) => received,
            Err(e) => {
                socket.abort();
                return Err(e);
            }
        };

        socket.close();
        let _ = socket.flush().await;
        Ok(received)
    }
}

/// Arm/disarm switch stored in `field1` of a ThingSpeak channel
pub struct ThingSpeakStatus {
    client: HttpClient,
    endpoint: StatusEndpoint<'static>,
}

impl ThingSpeakStatus {
    pub fn new(client: HttpClient, endpoint: StatusEndpoint<'static>) -> Self {
        Self { client, endpoint }
    }

    fn unavailable(details: &'static str) -> CollaboratorError {
        CollaboratorError::Unavailable {
            collaborator: "thingspeak",
            details,
        }
    }
}

impl StatusSource for ThingSpeakStatus {
    async fn poll(&mut self) -> Result<StatusValue, CollaboratorError> {
        let request = thingspeak::status_request(&self.endpoint)
            .map_err(|e| Self::unavailable(http_details(e)))?;

        let mut response = [0u8; STATUS_RESPONSE_SIZE];
        let len = self
            .client
            .exchange(
                self.endpoint.host,
                self.endpoint.port,
                request.as_bytes(),
                &mut response,
            )
            .await
            .map_err(|e| Self::unavailable(e.details()))?;

        let status = thingspeak::parse_status(&response[..len])
            .map_err(|e| Self::unavailable(http_details(e)))?;
        debug!("Status: {:?}", status.as_str());
        Ok(status)
    }
}

/// IFTTT webhook carrying the triggering acceleration as value1..value3
pub struct IftttAlert {
    client: HttpClient,
    endpoint: AlertEndpoint<'static>,
}

impl IftttAlert {
    pub fn new(client: HttpClient, endpoint: AlertEndpoint<'static>) -> Self {
        Self { client, endpoint }
    }

    fn unavailable(details: &'static str) -> CollaboratorError {
        CollaboratorError::Unavailable {
            collaborator: "ifttt",
            details,
        }
    }
}

impl AlertSink for IftttAlert {
    async fn send(&mut self, payload: AlertPayload) -> Result<(), CollaboratorError> {
        let request = ifttt::alert_request(&self.endpoint, &payload)
            .map_err(|e| Self::unavailable(http_details(e)))?;

        // fire-and-forget: the response is not read
        if let Err(e) = self
            .client
            .exchange(self.endpoint.host, self.endpoint.port, request.as_bytes(), &mut [])
            .await
        {
            warn!("Alert delivery failed: {}", e);
            return Err(Self::unavailable(e.details()));
        }

        info!("Alert sent to {}", self.endpoint.event);
        Ok(())
    }
}
