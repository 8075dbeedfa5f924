//! Reservation domain entity

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::{DomainError, DomainResult};

/// A record binding a spot, a user and a time. Never mutated once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i32,
    pub spot_id: i32,
    pub user_id: String,
    /// Reserved time slot
    pub time: DateTime<Utc>,
    /// When the reservation was recorded
    pub created_at: DateTime<Utc>,
}

/// Parse an ISO-8601 reservation time.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS` with optional fractional seconds and an
/// optional `Z`/`±HH:MM` offset. Times without an offset are taken as UTC.
pub fn parse_reservation_time(raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            DomainError::Validation(format!(
                "Time must be in ISO 8601 format (e.g. '2023-01-23T15:30:00'), got '{}'",
                raw
            ))
        })
}
