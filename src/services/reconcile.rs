use chrono::DateTime;

use crate::models::Slot;
use crate::services::normalize::is_strict_hhmm;

/// The date/time pair actually submitted to the booking collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTime {
    pub date: String,
    pub time: String,
}

/// Derive the submitted date and time for a booking.
///
/// When the chosen slot carries an authoritative instant, both values come
/// from that instant's wall-clock reading in its own offset, so the time shown
/// to the patient and the time written to the calendar cannot drift apart
/// across timezones. Without an instant, the manually collected date/time pair
/// is used, with `default_time` substituted for anything that fails the strict
/// `HH:MM` shape check.
///
/// Returns `None` only when no date can be derived at all.
pub fn resolve_submission(
    selected: Option<&Slot>,
    fallback_date: Option<&str>,
    fallback_time: Option<&str>,
    default_time: &str,
) -> Option<SubmittedTime> {
    if let Some(slot) = selected {
        if let Some(instant) = slot
            .start_time_iso
            .as_deref()
            .and_then(|iso| DateTime::parse_from_rfc3339(iso).ok())
        {
            return Some(SubmittedTime {
                date: instant.format("%Y-%m-%d").to_string(),
                time: instant.format("%H:%M").to_string(),
            });
        }

        // No authoritative instant: the slot's canonical time with the
        // manually collected date.
        let date = fallback_date?.to_string();
        let time = if is_strict_hhmm(&slot.time_24h) {
            slot.time_24h.clone()
        } else {
            default_time.to_string()
        };
        return Some(SubmittedTime { date, time });
    }

    let date = fallback_date?.to_string();
    let time = match fallback_time {
        Some(t) if is_strict_hhmm(t) => t.to_string(),
        _ => default_time.to_string(),
    };
    Some(SubmittedTime { date, time })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_is_authoritative() {
        let slot = Slot::new("10:00 AM", "10:00", Some("2025-07-28T10:00:00+05:00"));
        // Fallback values deliberately disagree; the instant must win.
        let resolved =
            resolve_submission(Some(&slot), Some("2025-07-27"), Some("11:30"), "10:00").unwrap();
        assert_eq!(resolved.date, "2025-07-28");
        assert_eq!(resolved.time, "10:00");
    }

    #[test]
    fn test_instant_keeps_wall_clock_across_offsets() {
        // A +05:00 evening slot: the wall-clock reading is submitted, not a
        // UTC conversion (which would shift the date).
        let slot = Slot::new("11:30 PM", "23:30", Some("2025-07-28T23:30:00+05:00"));
        let resolved = resolve_submission(Some(&slot), None, None, "10:00").unwrap();
        assert_eq!(resolved.date, "2025-07-28");
        assert_eq!(resolved.time, "23:30");
    }

    #[test]
    fn test_slot_without_instant_uses_canonical_time() {
        let slot = Slot::new("2:30 PM", "14:30", None);
        let resolved =
            resolve_submission(Some(&slot), Some("2025-07-29"), None, "10:00").unwrap();
        assert_eq!(resolved.date, "2025-07-29");
        assert_eq!(resolved.time, "14:30");
    }

    #[test]
    fn test_malformed_slot_time_falls_back_to_default() {
        let slot = Slot::new("afternoon", "2pm", None);
        let resolved =
            resolve_submission(Some(&slot), Some("2025-07-29"), None, "10:00").unwrap();
        assert_eq!(resolved.time, "10:00");
    }

    #[test]
    fn test_manual_pair_with_strict_time() {
        let resolved =
            resolve_submission(None, Some("2025-07-29"), Some("15:00"), "10:00").unwrap();
        assert_eq!(resolved.date, "2025-07-29");
        assert_eq!(resolved.time, "15:00");
    }

    #[test]
    fn test_manual_pair_with_loose_time_gets_default() {
        let resolved =
            resolve_submission(None, Some("2025-07-29"), Some("3 pm"), "10:00").unwrap();
        assert_eq!(resolved.time, "10:00");
    }

    #[test]
    fn test_no_date_available() {
        assert!(resolve_submission(None, None, Some("15:00"), "10:00").is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let slot = Slot::new("10:00 AM", "10:00", Some("2025-07-28T10:00:00+05:00"));
        let first = resolve_submission(Some(&slot), None, None, "10:00").unwrap();
        let second = resolve_submission(Some(&slot), None, None, "10:00").unwrap();
        assert_eq!(first, second);
    }
}
