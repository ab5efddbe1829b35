use async_trait::async_trait;
use serde::Deserialize;

use super::{CalendarError, CalendarProvider};
use crate::models::{BookingOutcome, BookingRequest, DayAvailability, Slot};

/// Thin JSON client for the calendar service that owns Google Calendar
/// access. It only speaks the three contracts; everything else (credentials,
/// conflict logic) stays on the other side.
pub struct HttpCalendarProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SlotsResponse {
    #[serde(default)]
    available_slots: Vec<Slot>,
}

#[derive(Deserialize)]
struct DaysResponse {
    #[serde(default)]
    days: Vec<DayAvailability>,
}

impl HttpCalendarProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CalendarProvider for HttpCalendarProvider {
    async fn available_slots(&self, date: &str) -> Result<Vec<Slot>, CalendarError> {
        let url = format!("{}/calendar/availability/{date}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CalendarError::Service(format!(
                "availability query returned {}",
                resp.status()
            )));
        }

        let data: SlotsResponse = resp
            .json()
            .await
            .map_err(|e| CalendarError::Service(e.to_string()))?;

        Ok(data.available_slots)
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingOutcome, CalendarError> {
        let url = format!("{}/calendar/book", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        // 409 carries a rejection body with alternatives; other non-2xx
        // statuses are service failures.
        if !resp.status().is_success() && resp.status().as_u16() != 409 {
            return Err(CalendarError::Service(format!(
                "booking submission returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| CalendarError::Service(e.to_string()))
    }

    async fn upcoming_days(&self, count: usize) -> Result<Vec<DayAvailability>, CalendarError> {
        let url = format!("{}/calendar/upcoming-days?count={count}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CalendarError::Service(format!(
                "multi-day query returned {}",
                resp.status()
            )));
        }

        let data: DaysResponse = resp
            .json()
            .await
            .map_err(|e| CalendarError::Service(e.to_string()))?;

        Ok(data.days)
    }
}
