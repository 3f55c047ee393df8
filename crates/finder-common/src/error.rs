use crate::booking::BookingError;
use crate::geolocation::GeolocationError;
use crate::intake::IntakeError;
use crate::search_api::ApiError;

/// Error types shared by the finder binaries.
///
/// Each concern keeps its own error enum; this one lets a binary carry any of them
/// through a single `#[from]` on its own error type.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    /// A results view that ended in its error state; carries the message it shows.
    #[error("{0}")]
    Results(String),
}
