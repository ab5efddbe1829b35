use std::env;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc, Weekday};

/// Service catalog offered during service selection: matching key → display label.
pub const SERVICES: &[(&str, &str)] = &[
    ("cleaning", "Regular Cleaning"),
    ("checkup", "Dental Checkup"),
    ("consultation", "Consultation"),
    ("emergency", "Emergency Visit"),
    ("filling", "Dental Filling"),
    ("extraction", "Tooth Extraction"),
    ("root canal", "Root Canal"),
    ("crown", "Crown Placement"),
    ("whitening", "Teeth Whitening"),
    ("general", "General Dentistry"),
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub business_name: String,
    pub business_phone: String,
    pub business_email: String,
    pub business_address: String,
    pub open_hour: u32,
    pub close_hour: u32,
    pub closed_weekday: Weekday,
    pub appointment_duration_minutes: i64,
    pub default_time: String,
    pub utc_offset_minutes: i64,
    pub lookahead_days: usize,
    pub session_timeout_minutes: i64,
    pub typing_delay_ms: u64,
    pub calendar_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| "Bright Smile Dental Office".to_string()),
            business_phone: env::var("BUSINESS_PHONE")
                .unwrap_or_else(|_| "(555) 123-4567".to_string()),
            business_email: env::var("BUSINESS_EMAIL")
                .unwrap_or_else(|_| "contact@brightsmile.com".to_string()),
            business_address: env::var("BUSINESS_ADDRESS")
                .unwrap_or_else(|_| "123 Main St, City, State 12345".to_string()),
            open_hour: env::var("BUSINESS_HOURS_START")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9),
            close_hour: env::var("BUSINESS_HOURS_END")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(19),
            closed_weekday: env::var("CLOSED_WEEKDAY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Weekday::Sun),
            appointment_duration_minutes: env::var("APPOINTMENT_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            default_time: env::var("DEFAULT_APPOINTMENT_TIME")
                .unwrap_or_else(|_| "10:00".to_string()),
            utc_offset_minutes: env::var("UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            lookahead_days: env::var("LOOKAHEAD_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            session_timeout_minutes: env::var("SESSION_TIMEOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            typing_delay_ms: env::var("TYPING_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            calendar_url: env::var("CALENDAR_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
        }
    }

    /// Wall-clock "now" at the office, derived from the configured UTC offset.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::minutes(self.utc_offset_minutes)
    }

    pub fn local_today(&self) -> NaiveDate {
        self.local_now().date()
    }

    pub fn hours_display(&self) -> String {
        format!("{}:00 - {}:00", self.open_hour, self.close_hour)
    }
}
