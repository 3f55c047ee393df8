//! Appointment booking. Only a local stand-in exists: it validates the request and
//! builds a confirmation, and nothing is stored or sent.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::notify::Notification;

pub const TIME_SLOTS: [&str; 6] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "02:00 PM", "03:00 PM", "04:00 PM",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Please select both date and time")]
    MissingSelection,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unavailable time slot: {0}")]
    UnknownSlot(String),

    #[error("Appointments cannot be booked in the past")]
    PastDate,

    #[error("Appointments are only available on weekdays")]
    Weekend,
}

impl BookingError {
    pub fn notification(&self) -> Notification {
        match self {
            BookingError::MissingSelection => Notification::error_title(self.to_string()),
            _ => Notification::error("Booking failed", self.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub hospital_name: String,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub hospital_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub message: String,
}

impl BookingConfirmation {
    pub fn notification(&self) -> Notification {
        Notification::info("Appointment Booked!", self.message.clone())
    }
}

/// Parse a date as submitted by a form (`YYYY-MM-DD`). Blank means "not picked".
pub fn parse_form_date(raw: &str) -> Result<Option<NaiveDate>, BookingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BookingError::InvalidDate(raw.to_string()))
}

pub trait BookingService: Send + Sync {
    fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation, BookingError>;
}

/// Validates and confirms without persisting anything.
#[derive(Debug, Clone, Default)]
pub struct MockBookingService {
    today: Option<NaiveDate>,
}

impl MockBookingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl BookingService for MockBookingService {
    fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation, BookingError> {
        let slot = request
            .time_slot
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let (Some(date), Some(slot)) = (request.date, slot) else {
            return Err(BookingError::MissingSelection);
        };
        if !TIME_SLOTS.contains(&slot) {
            return Err(BookingError::UnknownSlot(slot.to_string()));
        }
        if date < self.today() {
            return Err(BookingError::PastDate);
        }
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(BookingError::Weekend);
        }

        let message = format!(
            "Your appointment at {} is scheduled for {} at {}",
            request.hospital_name,
            date.format("%-m/%-d/%Y"),
            slot
        );
        info!(hospital = %request.hospital_name, %date, slot, "appointment confirmed");
        Ok(BookingConfirmation {
            hospital_name: request.hospital_name.clone(),
            date,
            time_slot: slot.to_string(),
            message,
        })
    }
}
