//! Request/response shapes of the two web services the alarm talks to
//!
//! Only the pure parts live here: building request text and picking the
//! status out of a response. Sockets, DNS and timeouts are the firmware's
//! job.

pub mod ifttt;
pub mod thingspeak;

use thiserror_no_std::Error;

/// Error types for request building and response parsing
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// The request did not fit its fixed-size buffer
    #[error("Request exceeds buffer capacity (max: {max})")]
    RequestTooLarge { max: usize },

    /// No `{ ... }` span in the response
    #[error("Response has no JSON body")]
    MissingBody,

    #[error("Response body is not the expected JSON")]
    MalformedJson,

    /// The channel answered with an empty feed list
    #[error("Status channel has no entries")]
    NoFeeds,

    #[error("Status value longer than {max} bytes")]
    StatusTooLong { max: usize },

    /// The server kept sending after the response buffer was full
    #[error("Response exceeds buffer capacity (max: {max})")]
    ResponseTooLarge { max: usize },
}

/// Read a `Connection: close` response into `buf` until the server closes.
///
/// `read` follows the socket convention of returning `Ok(0)` at end of
/// stream. Filling `buf` before the close is an error rather than a silently
/// truncated body. An empty `buf` reads nothing.
pub async fn read_response<E: From<HttpError>>(
    buf: &mut [u8],
    mut read: impl AsyncFnMut(&mut [u8]) -> Result<usize, E>,
) -> Result<usize, E> {
    if buf.is_empty() {
        return Ok(0);
    }

    let mut received = 0;
    while received < buf.len() {
        match read(&mut buf[received..]).await? {
            0 => return Ok(received),
            n => received += n,
        }
    }

    let mut extra = [0u8; 1];
    match read(&mut extra).await? {
        0 => Ok(received),
        _ => Err(HttpError::ResponseTooLarge { max: buf.len() }.into()),
    }
}

/// Slice from the first `{` to the last `}` of a raw HTTP response.
///
/// Headers and any framing around the JSON document are skipped this way
/// without parsing them.
pub fn extract_json_body(response: &[u8]) -> Option<&[u8]> {
    let start = response.iter().position(|&b| b == b'{')?;
    let end = response.iter().rposition(|&b| b == b'}')?;
    (start < end).then(|| &response[start..=end])
}
