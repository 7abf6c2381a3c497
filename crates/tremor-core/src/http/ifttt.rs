//! IFTTT webhook carrying the triggering acceleration triple

use core::fmt::Write;

use serde::Serialize;

use super::HttpError;
use crate::collaborators::AlertPayload;
use crate::config::AlertEndpoint;

/// Widest rendered axis, e.g. `-0.00012345678901234567` or `-1.7976931348623157e308`
const VALUE_CAPACITY: usize = 32;

/// Three full-width values plus the JSON framing
pub const BODY_CAPACITY: usize = 3 * VALUE_CAPACITY + 48;
pub const REQUEST_CAPACITY: usize = 512;

/// Magnitudes outside `EXPONENT_BELOW..EXPONENT_FROM` are written in
/// exponent form, as Python's `repr(float)` does.
const EXPONENT_BELOW: f64 = 1e-4;
const EXPONENT_FROM: f64 = 1e16;

/// Shortest round-trip rendering of one axis
type Value = heapless::String<VALUE_CAPACITY>;

/// IFTTT passes `value1..value3` through to the applet as strings
#[derive(Serialize)]
struct AlertBody {
    value1: Value,
    value2: Value,
    value3: Value,
}

fn render(value: f64) -> Result<Value, HttpError> {
    let mut rendered = Value::new();
    let written = if value != 0.0 && !(EXPONENT_BELOW..EXPONENT_FROM).contains(&value.abs()) {
        write!(rendered, "{:e}", value)
    } else {
        write!(rendered, "{}", value)
    };
    written.map_err(|_| HttpError::RequestTooLarge {
        max: VALUE_CAPACITY,
    })?;
    Ok(rendered)
}

/// JSON body `{"value1":"<x>","value2":"<y>","value3":"<z>"}`.
pub fn alert_body(payload: &AlertPayload) -> Result<heapless::String<BODY_CAPACITY>, HttpError> {
    let body = AlertBody {
        value1: render(payload.x)?,
        value2: render(payload.y)?,
        value3: render(payload.z)?,
    };

    let text = serde_json::to_string(&body).map_err(|_| HttpError::MalformedJson)?;

    let mut json = heapless::String::new();
    json.push_str(&text).map_err(|_| HttpError::RequestTooLarge {
        max: BODY_CAPACITY,
    })?;
    Ok(json)
}

/// Complete `POST` request for the webhook trigger.
pub fn alert_request(
    endpoint: &AlertEndpoint<'_>,
    payload: &AlertPayload,
) -> Result<heapless::String<REQUEST_CAPACITY>, HttpError> {
    let body = alert_body(payload)?;
    let mut request = heapless::String::new();
    write!(
        request,
        "POST /trigger/{}/json/with/key/{} HTTP/1.1\r\n\
         HOST: {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        endpoint.event,
        endpoint.key,
        endpoint.host,
        body.len(),
        body
    )
    .map_err(|_| HttpError::RequestTooLarge {
        max: REQUEST_CAPACITY,
    })?;
    Ok(request)
}
