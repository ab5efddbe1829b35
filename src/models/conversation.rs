use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::slot::{DayAvailability, Slot};

/// Position in the scripted dialogue. Determines which handler and which
/// normalizer apply to the next user input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AskingName,
    MainMenu,
    ServiceSelection,
    AskingDatePreference,
    AskingSpecificDate,
    SlotSelection,
    AskingTime,
    AskingPhone,
    AskingEmail,
    FinalConfirmation,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::AskingName => "asking_name",
            Step::MainMenu => "main_menu",
            Step::ServiceSelection => "service_selection",
            Step::AskingDatePreference => "asking_date_preference",
            Step::AskingSpecificDate => "asking_specific_date",
            Step::SlotSelection => "slot_selection",
            Step::AskingTime => "asking_time",
            Step::AskingPhone => "asking_phone",
            Step::AskingEmail => "asking_email",
            Step::FinalConfirmation => "final_confirmation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub origin: Origin,
    pub text: String,
    pub timestamp: NaiveDateTime,
}

/// The appointment record assembled field-by-field as the dialogue advances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub display_time: Option<String>,
    pub selected_slot: Option<Slot>,
}

impl PatientDraft {
    /// Reset after a booking attempt completes or is abandoned. The patient's
    /// name survives so the front-desk loop can keep addressing them.
    pub fn reset_keeping_name(&mut self) {
        let name = self.name.take();
        *self = PatientDraft {
            name,
            ..PatientDraft::default()
        };
    }

    pub fn has_contact_info(&self) -> bool {
        self.phone.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub step: Step,
    pub draft: PatientDraft,
    pub messages: Vec<ChatMessage>,
    /// Slots currently offered for selection, in display order.
    pub offered_slots: Vec<Slot>,
    /// Days currently offered when no specific date has been given.
    pub offered_days: Vec<DayAvailability>,
    pub created_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
}

impl Session {
    pub fn new(id: &str, now: NaiveDateTime) -> Self {
        Self {
            id: id.to_string(),
            step: Step::AskingName,
            draft: PatientDraft::default(),
            messages: Vec::new(),
            offered_slots: Vec::new(),
            offered_days: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn push_message(&mut self, origin: Origin, text: &str, now: NaiveDateTime) {
        self.messages.push(ChatMessage {
            origin,
            text: text.to_string(),
            timestamp: now,
        });
    }
}
