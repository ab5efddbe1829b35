use serde::{Deserialize, Serialize};

use crate::models::slot::Slot;

/// Submission payload for the booking collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub date: String,
    pub time: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Outcome of a booking submission: confirmed, or rejected with an optional
/// set of alternative slots to re-offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookingOutcome {
    Confirmed {
        event_id: String,
        message: String,
    },
    Rejected {
        message: String,
        #[serde(default)]
        alternatives: Vec<Slot>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_tagged_by_status() {
        let confirmed = BookingOutcome::Confirmed {
            event_id: "evt-1".to_string(),
            message: "Booked".to_string(),
        };
        let json = serde_json::to_string(&confirmed).unwrap();
        assert!(json.contains(r#""status":"confirmed""#));

        let rejected: BookingOutcome = serde_json::from_str(
            r#"{"status":"rejected","message":"Slot taken","alternatives":[]}"#,
        )
        .unwrap();
        assert!(matches!(rejected, BookingOutcome::Rejected { .. }));
    }

    #[test]
    fn test_rejected_alternatives_default_empty() {
        let rejected: BookingOutcome =
            serde_json::from_str(r#"{"status":"rejected","message":"Slot taken"}"#).unwrap();
        match rejected {
            BookingOutcome::Rejected { alternatives, .. } => assert!(alternatives.is_empty()),
            _ => panic!("expected rejection"),
        }
    }
}
