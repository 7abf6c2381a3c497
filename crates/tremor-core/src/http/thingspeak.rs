//! ThingSpeak channel feed used as the remote arm/disarm switch

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use serde::Deserialize;

use super::{HttpError, extract_json_body};
use crate::collaborators::{STATUS_CAPACITY, StatusValue};
use crate::config::StatusEndpoint;

pub const REQUEST_CAPACITY: usize = 256;

#[derive(Deserialize)]
struct FeedsResponse {
    feeds: Vec<Feed>,
}

#[derive(Deserialize)]
struct Feed {
    #[serde(default)]
    field1: Option<String>,
}

/// `GET` for the latest entry of the channel feed.
pub fn status_request(
    endpoint: &StatusEndpoint<'_>,
) -> Result<heapless::String<REQUEST_CAPACITY>, HttpError> {
    let mut request = heapless::String::new();
    write!(
        request,
        "GET /channels/{}/feeds.json?api_key={}&results=1 HTTP/1.1\r\n\
         Host: {}\r\n\
         Connection: close\r\n\r\n",
        endpoint.channel_id, endpoint.api_key, endpoint.host
    )
    .map_err(|_| HttpError::RequestTooLarge {
        max: REQUEST_CAPACITY,
    })?;
    Ok(request)
}

/// Pull `field1` of the newest feed entry out of a raw HTTP response.
///
/// A `null` or missing `field1` comes back as an empty status.
pub fn parse_status(response: &[u8]) -> Result<StatusValue, HttpError> {
    let body = extract_json_body(response).ok_or(HttpError::MissingBody)?;
    let parsed = serde_json::from_slice::<FeedsResponse>(body)
        .map_err(|_| HttpError::MalformedJson)?;
    let feed = parsed.feeds.last().ok_or(HttpError::NoFeeds)?;

    let mut status = StatusValue::new();
    status
        .push_str(feed.field1.as_deref().unwrap_or_default())
        .map_err(|_| HttpError::StatusTooLong {
            max: STATUS_CAPACITY,
        })?;
    Ok(status)
}
