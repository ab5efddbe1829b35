pub mod booking;
pub mod conversation;
pub mod slot;

pub use booking::{BookingOutcome, BookingRequest};
pub use conversation::{ChatMessage, Origin, PatientDraft, Session, Step};
pub use slot::{DayAvailability, Slot};
