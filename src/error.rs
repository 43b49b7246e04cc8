use thiserror::Error;

/// Why a position query produced no coordinate.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("position request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid position response: {0}")]
    InvalidResponse(String),
    #[error("geolocation is not supported on this platform")]
    Unsupported,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PickerError {
    /// Save was requested while the picker is still loading
    #[error("no coordinate to save yet")]
    SaveWithoutCoordinate,
    #[error("save requires edit mode")]
    NotEditing,
}

/// Why a map tile could not be shown.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TileError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("empty body")]
    EmptyBody,
    #[error("not a valid PNG: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Request(String),
}

pub type Result<T> = std::result::Result<T, PickerError>;
