pub mod http;

use async_trait::async_trait;

use crate::models::{BookingOutcome, BookingRequest, DayAvailability, Slot};

/// Failure modes of the external calendar collaborator. A transport failure is
/// distinct from an empty slot list: the latter is a normal `Ok(vec![])`.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("calendar service unreachable: {0}")]
    Transport(String),

    #[error("calendar service rejected the request: {0}")]
    Service(String),
}

/// The three contracts the dialogue depends on. Transport mechanics,
/// authentication, and server-side calendar semantics live behind this trait.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Candidate slots for a date string (`YYYY-MM-DD`, or raw text the
    /// service can interpret itself). `Ok(vec![])` means fully booked/closed.
    async fn available_slots(&self, date: &str) -> Result<Vec<Slot>, CalendarError>;

    /// Submit a booking; the service either confirms it or rejects it,
    /// possibly with alternative slots.
    async fn book(&self, request: &BookingRequest) -> Result<BookingOutcome, CalendarError>;

    /// Days with availability over a lookahead window, used to build a date
    /// menu when no specific date has been given.
    async fn upcoming_days(&self, count: usize) -> Result<Vec<DayAvailability>, CalendarError>;
}
