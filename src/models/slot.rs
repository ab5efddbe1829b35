use serde::{Deserialize, Serialize};

/// A bookable time window as returned by the calendar collaborator.
///
/// `start_time_iso`, when present, is the authoritative instant for the
/// date/time actually submitted; the display strings are derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub formatted_time: String,
    pub time_24h: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_iso: Option<String>,
}

impl Slot {
    pub fn new(formatted_time: &str, time_24h: &str, start_time_iso: Option<&str>) -> Self {
        Self {
            formatted_time: formatted_time.to_string(),
            time_24h: time_24h.to_string(),
            start_time_iso: start_time_iso.map(|s| s.to_string()),
        }
    }
}

/// One entry of the multi-day availability listing: weekday label plus the
/// date it stands for, in both canonical and display form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayAvailability {
    pub day: String,
    pub date: String,
    pub display_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_roundtrip_with_iso() {
        let slot = Slot::new("10:00 AM", "10:00", Some("2025-07-28T10:00:00+05:00"));
        let json = serde_json::to_string(&slot).unwrap();
        let back: Slot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
    }

    #[test]
    fn test_slot_iso_omitted_when_absent() {
        let slot = Slot::new("2:30 PM", "14:30", None);
        let json = serde_json::to_string(&slot).unwrap();
        assert!(!json.contains("start_time_iso"));
        let back: Slot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.start_time_iso, None);
    }
}
