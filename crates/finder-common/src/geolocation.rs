//! "Use my location": a single position lookup, mapped to a location string.
//!
//! Reverse geocoding does not exist yet, so any successful fix resolves to the
//! configured fallback location.

use std::future::Future;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::notify::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    #[error("Please allow location access to use this feature")]
    PermissionDenied,

    #[error("Location information is unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Geolocation is not supported by your browser")]
    Unsupported,
}

impl GeolocationError {
    pub fn notification(&self) -> Notification {
        Notification::error("Error", self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where positions come from.
pub trait PositionSource: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Coordinates, GeolocationError>> + Send;
}

/// A position (or failure) already obtained by the caller, e.g. reported by a browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportedPosition {
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub error: Option<GeolocationError>,
}

impl PositionSource for ReportedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Ok(Coordinates {
                    latitude,
                    longitude,
                })
            }
            (None, None) => Err(GeolocationError::Unsupported),
            _ => Err(GeolocationError::PositionUnavailable),
        }
    }
}

/// Resolve the user's location. Errors carry their fixed user-facing message.
pub async fn resolve_current_location<P: PositionSource>(
    source: &P,
    fallback_location: &str,
) -> Result<String, GeolocationError> {
    match source.current_position().await {
        Ok(coords) => {
            info!(
                latitude = coords.latitude,
                longitude = coords.longitude,
                location = fallback_location,
                "position acquired; using fallback location"
            );
            Ok(fallback_location.to_string())
        }
        Err(e) => {
            warn!(error = %e, "geolocation failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_fix_resolves_to_fallback() {
        let source = ReportedPosition {
            latitude: Some(31.22),
            longitude: Some(-85.39),
            error: None,
        };
        let location = resolve_current_location(&source, "New York, NY").await;
        assert_eq!(location, Ok("New York, NY".to_string()));
    }

    #[tokio::test]
    async fn reported_errors_keep_their_messages() {
        let cases = [
            (GeolocationError::PermissionDenied, "Please allow location access to use this feature"),
            (GeolocationError::PositionUnavailable, "Location information is unavailable"),
            (GeolocationError::Timeout, "Location request timed out"),
        ];
        for (error, message) in cases {
            let source = ReportedPosition {
                error: Some(error),
                ..ReportedPosition::default()
            };
            let err = resolve_current_location(&source, "New York, NY").await.unwrap_err();
            assert_eq!(err.to_string(), message);
            assert_eq!(err.notification().description.as_deref(), Some(message));
        }
    }

    #[tokio::test]
    async fn missing_or_partial_position() {
        let none = ReportedPosition::default();
        assert_eq!(
            resolve_current_location(&none, "x").await,
            Err(GeolocationError::Unsupported)
        );
        let partial = ReportedPosition {
            latitude: Some(1.0),
            ..ReportedPosition::default()
        };
        assert_eq!(
            resolve_current_location(&partial, "x").await,
            Err(GeolocationError::PositionUnavailable)
        );
    }

    #[test]
    fn error_codes_deserialize_from_snake_case() {
        let parsed: ReportedPosition =
            serde_json::from_str(r#"{"error":"permission_denied"}"#).unwrap();
        assert_eq!(parsed.error, Some(GeolocationError::PermissionDenied));
    }
}
