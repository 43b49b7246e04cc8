//! Device position queries.
//!
//! Requests are fire-and-forget: a provider is handed a [`PositionTicket`] and
//! answers later, from its `handle_event`, with a [`PositionReply`] carrying
//! the same ticket. Tickets come from a [`RequestSequence`] so the picker can
//! tell the latest request from superseded ones.

use makepad_widgets::*;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::GeolocationError;
use crate::geo::Coordinate;

pub const IPAPI_ENDPOINT: &str = "https://ipapi.co/json/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u32,
    /// Oldest cached position a provider may answer with
    pub maximum_age_ms: u32,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
        }
    }
}

impl PositionOptions {
    pub fn high_accuracy() -> Self {
        Self { high_accuracy: true, ..Self::default() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestPurpose {
    /// Startup position when no default was supplied
    Initial,
    /// Explicit "get my location"
    Locate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PositionTicket {
    pub seq: u64,
    pub purpose: RequestPurpose,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionReply {
    pub ticket: PositionTicket,
    pub result: Result<Coordinate, GeolocationError>,
}

/// Monotonic ticket counter; only the most recently issued ticket is current.
#[derive(Clone, Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn issue(&mut self, purpose: RequestPurpose) -> PositionTicket {
        self.latest += 1;
        PositionTicket { seq: self.latest, purpose }
    }

    pub fn is_current(&self, ticket: &PositionTicket) -> bool {
        ticket.seq == self.latest
    }

    /// Make every ticket issued so far stale without issuing a new one
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

pub trait GeolocationProvider {
    fn request_position(&mut self, cx: &mut Cx, ticket: PositionTicket, options: PositionOptions);

    /// Replies that became available with this event
    fn handle_event(&mut self, cx: &mut Cx, event: &Event) -> Vec<PositionReply>;
}

/// Answers every request with the same configured result on the next frame.
pub struct FixedPositionProvider {
    result: Result<Coordinate, GeolocationError>,
    queued: Vec<PositionTicket>,
    next_frame: NextFrame,
}

impl FixedPositionProvider {
    pub fn new(result: Result<Coordinate, GeolocationError>) -> Self {
        Self { result, queued: Vec::new(), next_frame: NextFrame::default() }
    }

    pub fn at(position: Coordinate) -> Self {
        Self::new(Ok(position))
    }

    pub fn unavailable() -> Self {
        Self::new(Err(GeolocationError::Unsupported))
    }
}

impl GeolocationProvider for FixedPositionProvider {
    fn request_position(&mut self, cx: &mut Cx, ticket: PositionTicket, _options: PositionOptions) {
        self.queued.push(ticket);
        self.next_frame = cx.new_next_frame();
    }

    fn handle_event(&mut self, _cx: &mut Cx, event: &Event) -> Vec<PositionReply> {
        if self.queued.is_empty() || self.next_frame.is_event(event).is_none() {
            return Vec::new();
        }
        self.queued
            .drain(..)
            .map(|ticket| PositionReply { ticket, result: self.result.clone() })
            .collect()
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Decode an ipapi.co style JSON payload.
pub fn parse_ip_response(body: &[u8]) -> Result<Coordinate, GeolocationError> {
    let response: IpApiResponse = serde_json::from_slice(body)
        .map_err(|e| GeolocationError::InvalidResponse(e.to_string()))?;
    if response.error {
        ::log::warn!("ip geolocation refused: {}", response.reason.as_deref().unwrap_or("unknown"));
        return Err(GeolocationError::PositionUnavailable);
    }
    let (Some(lat), Some(lng)) = (response.latitude, response.longitude) else {
        return Err(GeolocationError::InvalidResponse("missing latitude/longitude".into()));
    };
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(GeolocationError::InvalidResponse(format!("position out of range: {}, {}", lat, lng)));
    }
    Ok(Coordinate::new(lat, lng))
}

struct PendingLookup {
    ticket: PositionTicket,
    timeout: Timer,
}

/// Approximate device position from the public IP address over HTTP.
///
/// There is no notion of accuracy here, a high-accuracy request gets the same
/// city-level answer.
pub struct IpGeolocationProvider {
    endpoint: String,
    pending: HashMap<LiveId, PendingLookup>,
}

impl Default for IpGeolocationProvider {
    fn default() -> Self {
        Self::new(IPAPI_ENDPOINT)
    }
}

impl IpGeolocationProvider {
    pub fn new(endpoint: &str) -> Self {
        Self { endpoint: endpoint.to_string(), pending: HashMap::new() }
    }

    fn request_id(ticket: &PositionTicket) -> LiveId {
        LiveId::from_str(&format!("geolocation_{}", ticket.seq))
    }
}

impl GeolocationProvider for IpGeolocationProvider {
    fn request_position(&mut self, cx: &mut Cx, ticket: PositionTicket, options: PositionOptions) {
        if options.high_accuracy {
            ::log::debug!("ip geolocation cannot honor high accuracy, answering city-level position");
        }
        let request_id = Self::request_id(&ticket);
        let mut request = HttpRequest::new(self.endpoint.clone(), HttpMethod::GET);
        request.set_header("User-Agent".to_string(), "MakepadLocationPicker/0.1".to_string());
        cx.http_request(request_id, request);

        let timeout = cx.start_timeout(options.timeout_ms as f64 / 1000.0);
        self.pending.insert(request_id, PendingLookup { ticket, timeout });
    }

    fn handle_event(&mut self, cx: &mut Cx, event: &Event) -> Vec<PositionReply> {
        let mut replies = Vec::new();

        if let Event::NetworkResponses(responses) = event {
            for response in responses {
                let Some(lookup) = self.pending.remove(&response.request_id) else {
                    continue;
                };
                let result = match &response.response {
                    NetworkResponse::HttpResponse(http) if http.status_code == 200 => match &http.body {
                        Some(body) => parse_ip_response(body),
                        None => Err(GeolocationError::InvalidResponse("empty body".into())),
                    },
                    NetworkResponse::HttpResponse(http) => {
                        Err(GeolocationError::Network(format!("HTTP {}", http.status_code)))
                    }
                    NetworkResponse::HttpRequestError(error) => {
                        Err(GeolocationError::Network(format!("{:?}", error)))
                    }
                    _ => {
                        self.pending.insert(response.request_id, lookup);
                        continue;
                    }
                };
                cx.stop_timer(lookup.timeout);
                replies.push(PositionReply { ticket: lookup.ticket, result });
            }
        }

        let expired: Vec<LiveId> = self
            .pending
            .iter()
            .filter(|(_, lookup)| lookup.timeout.is_event(event).is_some())
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(lookup) = self.pending.remove(&id) {
                replies.push(PositionReply { ticket: lookup.ticket, result: Err(GeolocationError::Timeout) });
            }
        }

        replies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_is_current() {
        let mut seq = RequestSequence::default();
        let first = seq.issue(RequestPurpose::Initial);
        let second = seq.issue(RequestPurpose::Locate);
        assert!(second.seq > first.seq);
        assert!(!seq.is_current(&first));
        assert!(seq.is_current(&second));
        seq.invalidate();
        assert!(!seq.is_current(&second));
        assert!(seq.issue(RequestPurpose::Locate).seq > second.seq + 1);
    }

    #[test]
    fn locate_options_ask_for_high_accuracy() {
        assert!(PositionOptions::high_accuracy().high_accuracy);
        assert!(!PositionOptions::default().high_accuracy);
    }

    #[test]
    fn parses_ipapi_payload() {
        let body = br#"{"ip":"1.2.3.4","city":"London","latitude":51.5074,"longitude":-0.1278}"#;
        assert_eq!(parse_ip_response(body), Ok(Coordinate::new(51.5074, -0.1278)));
    }

    #[test]
    fn ipapi_error_payload_is_unavailable() {
        let body = br#"{"error":true,"reason":"RateLimited"}"#;
        assert_eq!(parse_ip_response(body), Err(GeolocationError::PositionUnavailable));
    }

    #[test]
    fn missing_fields_are_invalid() {
        let body = br#"{"city":"Nowhere"}"#;
        assert!(matches!(parse_ip_response(body), Err(GeolocationError::InvalidResponse(_))));
        assert!(matches!(parse_ip_response(b"not json"), Err(GeolocationError::InvalidResponse(_))));
    }

    #[test]
    fn out_of_range_position_is_invalid() {
        let huge = br#"{"latitude":51.5,"longitude":1e300}"#;
        assert!(matches!(parse_ip_response(huge), Err(GeolocationError::InvalidResponse(_))));
        let past_pole = br#"{"latitude":95.0,"longitude":0.0}"#;
        assert!(matches!(parse_ip_response(past_pole), Err(GeolocationError::InvalidResponse(_))));
    }
}
