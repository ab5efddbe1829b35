use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Weekday};

use crate::config::{AppConfig, SERVICES};
use crate::models::{
    BookingOutcome, BookingRequest, DayAvailability, Origin, PatientDraft, Session, Slot, Step,
};
use crate::services::calendar::CalendarProvider;
use crate::services::normalize::{self, TimeError};
use crate::services::reconcile;
use crate::state::AppState;

/// What the controller hands back for one user input: the assistant text plus
/// any slots currently on offer (so button-driven clients can render them).
#[derive(Debug, Clone)]
pub struct DialogueReply {
    pub text: String,
    pub slots: Vec<Slot>,
}

impl DialogueReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            slots: Vec::new(),
        }
    }

    fn with_slots(text: impl Into<String>, slots: Vec<Slot>) -> Self {
        Self {
            text: text.into(),
            slots,
        }
    }
}

/// Load the session, advance the state machine by one input, persist it back.
pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
) -> DialogueReply {
    let now = state.config.local_now();
    let mut session = state.sessions.get_or_create(session_id, now);
    session.push_message(Origin::User, message, now);

    let from = session.step;
    let reply = advance(
        &mut session,
        message,
        &state.config,
        state.calendar.as_ref(),
        state.config.local_today(),
    )
    .await;

    tracing::info!(
        session = session_id,
        from = from.as_str(),
        to = session.step.as_str(),
        "dialogue transition"
    );

    session.push_message(Origin::Assistant, &reply.text, now);
    state.sessions.save(session, now);
    state.sessions.cleanup_expired(now);

    reply
}

/// Advance the machine by one input. Never fails: validation problems
/// re-prompt in place and external failures fall back to alternative paths,
/// so the conversation can always continue.
pub async fn advance(
    session: &mut Session,
    input: &str,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
    today: NaiveDate,
) -> DialogueReply {
    let input = input.trim();
    match session.step {
        Step::AskingName => handle_name(session, input, config),
        Step::MainMenu => handle_main_menu(session, input, config),
        Step::ServiceSelection => handle_service(session, input),
        Step::AskingDatePreference => {
            handle_date_preference(session, input, config, calendar, today).await
        }
        Step::AskingSpecificDate => {
            handle_specific_date(session, input, config, calendar, today).await
        }
        Step::SlotSelection => handle_slot_selection(session, input, config),
        Step::AskingTime => handle_time(session, input, config),
        Step::AskingPhone => handle_phone(session, input),
        Step::AskingEmail => handle_email(session, input, config),
        Step::FinalConfirmation => handle_confirmation(session, input, config, calendar).await,
    }
}

// ── Step handlers ──

fn handle_name(session: &mut Session, input: &str, config: &AppConfig) -> DialogueReply {
    const GREETINGS: &[&str] = &[
        "hi",
        "hello",
        "hey",
        "good morning",
        "good afternoon",
        "good evening",
    ];

    let lowered = input.to_lowercase();
    if GREETINGS.contains(&lowered.as_str()) {
        return DialogueReply::text(format!(
            "Hello! Welcome to {}. May I have your name?",
            config.business_name
        ));
    }
    if !normalize::valid_patient_name(input) {
        return DialogueReply::text(
            "I didn't quite catch that. Could you tell me your name? Letters only, please.",
        );
    }

    session.draft.name = Some(input.to_string());
    session.step = Step::MainMenu;
    DialogueReply::text(format!("Nice to meet you, {input}! {}", menu_prompt()))
}

fn handle_main_menu(session: &mut Session, input: &str, config: &AppConfig) -> DialogueReply {
    let lowered = input.to_lowercase();

    if contains_any(&lowered, &["book", "appointment", "schedule", "reserve"]) {
        session.step = Step::ServiceSelection;
        return DialogueReply::text(format!(
            "Of course! What kind of visit do you need?\n{}",
            service_list()
        ));
    }

    if contains_any(
        &lowered,
        &[
            "hour", "open", "info", "contact", "address", "phone", "location", "service", "price",
        ],
    ) {
        return DialogueReply::text(format!(
            "{} is at {}. We're open {} daily, closed on {}. You can reach us at {} or {}.\n{}",
            config.business_name,
            config.business_address,
            config.hours_display(),
            weekday_name(config.closed_weekday),
            config.business_phone,
            config.business_email,
            menu_prompt()
        ));
    }

    DialogueReply::text(format!("Sorry, I didn't follow. {}", menu_prompt()))
}

fn handle_service(session: &mut Session, input: &str) -> DialogueReply {
    let lowered = input.to_lowercase();

    if let Ok(n) = lowered.parse::<usize>() {
        if (1..=SERVICES.len()).contains(&n) {
            return select_service(session, SERVICES[n - 1].1);
        }
    }

    let matches: Vec<&str> = SERVICES
        .iter()
        .filter(|(key, display)| {
            let display = display.to_lowercase();
            lowered.contains(key) || display.contains(&lowered) || lowered.contains(&display)
        })
        .map(|(_, display)| *display)
        .collect();

    match matches.as_slice() {
        [one] => select_service(session, one),
        _ => DialogueReply::text(format!(
            "Which service would you like? Here are our options:\n{}",
            service_list()
        )),
    }
}

fn select_service(session: &mut Session, display: &str) -> DialogueReply {
    session.draft.service = Some(display.to_string());
    session.step = Step::AskingDatePreference;
    DialogueReply::text(format!(
        "{display}, noted. When would you like to come in? You can say \"today\", \"tomorrow\", \"this week\", or pick a date."
    ))
}

async fn handle_date_preference(
    session: &mut Session,
    input: &str,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
    today: NaiveDate,
) -> DialogueReply {
    if let Some(date) = normalize::parse_date_expr(input, today, config.closed_weekday) {
        return query_slots(session, config, calendar, DateRef::Resolved(date), today).await;
    }

    let lowered = input.to_lowercase();
    if contains_any(&lowered, &["pick", "another", "specific", "other", "choose"]) {
        return offer_day_menu(
            session,
            config,
            calendar,
            today,
            "Sure, here are the next days with openings:",
        )
        .await;
    }

    if !input.is_empty() {
        // not a term we understand; the calendar service may still parse it
        return query_slots(session, config, calendar, DateRef::Raw(input), today).await;
    }

    DialogueReply::text(
        "When should I look? You can say \"today\", \"tomorrow\", \"this week\", or pick a date.",
    )
}

async fn handle_specific_date(
    session: &mut Session,
    input: &str,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
    today: NaiveDate,
) -> DialogueReply {
    let lowered = input.to_lowercase();

    let chosen: Option<String> = if let Ok(n) = lowered.parse::<usize>() {
        (n >= 1 && n <= session.offered_days.len())
            .then(|| session.offered_days[n - 1].date.clone())
    } else {
        session
            .offered_days
            .iter()
            .find(|d| {
                let day = d.day.to_lowercase();
                lowered == day || lowered.contains(&day)
            })
            .map(|d| d.date.clone())
    };

    if let Some(date_str) = chosen {
        return match NaiveDate::parse_from_str(&date_str, "%Y-%m-%d") {
            Ok(d) => query_slots(session, config, calendar, DateRef::Resolved(d), today).await,
            Err(_) => {
                query_slots(session, config, calendar, DateRef::Raw(date_str.as_str()), today)
                    .await
            }
        };
    }

    if let Some(date) = normalize::parse_date_expr(input, today, config.closed_weekday) {
        return query_slots(session, config, calendar, DateRef::Resolved(date), today).await;
    }

    if !input.is_empty() && session.offered_days.is_empty() {
        return query_slots(session, config, calendar, DateRef::Raw(input), today).await;
    }

    DialogueReply::text(format!(
        "I couldn't match that to a day. Here they are again:\n{}\nPick one, or type a date like 2025-08-15.",
        day_list(&session.offered_days)
    ))
}

fn handle_slot_selection(session: &mut Session, input: &str, config: &AppConfig) -> DialogueReply {
    let lowered = input.to_lowercase();

    let chosen: Option<usize> = if let Ok(n) = lowered.parse::<usize>() {
        (n >= 1 && n <= session.offered_slots.len()).then(|| n - 1)
    } else {
        let matches: Vec<usize> = session
            .offered_slots
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                let label = s.formatted_time.to_lowercase();
                label == lowered || label.contains(&lowered) || s.time_24h == lowered
            })
            .map(|(i, _)| i)
            .collect();
        (matches.len() == 1).then(|| matches[0])
    };

    match chosen {
        Some(i) => {
            let slot = session.offered_slots[i].clone();
            session.draft.time = Some(slot.time_24h.clone());
            session.draft.display_time = Some(slot.formatted_time.clone());
            session.draft.selected_slot = Some(slot.clone());
            // re-entry after a rejection already has contact info on file
            if session.draft.has_contact_info() {
                session.step = Step::FinalConfirmation;
                return DialogueReply::text(confirmation_summary(&session.draft, config));
            }
            session.step = Step::AskingPhone;
            DialogueReply::text(format!(
                "{} it is. What's the best phone number to reach you? (e.g. +92-321-1234567 or 0321-1234567)",
                slot.formatted_time
            ))
        }
        None => DialogueReply::with_slots(
            format!(
                "I couldn't match that to a slot. Here they are again:\n{}\nReply with a number or a time.",
                slot_list(&session.offered_slots)
            ),
            session.offered_slots.clone(),
        ),
    }
}

fn handle_time(session: &mut Session, input: &str, config: &AppConfig) -> DialogueReply {
    match normalize::normalize_time(input, config.open_hour, config.close_hour) {
        Ok(hhmm) => {
            let display = normalize::to_display_time(&hhmm);
            session.draft.time = Some(hhmm);
            session.draft.display_time = Some(display.clone());
            session.draft.selected_slot = None;
            session.step = Step::AskingPhone;
            DialogueReply::text(format!(
                "Noted: {display}. What's the best phone number to reach you? (e.g. +92-321-1234567 or 0321-1234567)"
            ))
        }
        Err(TimeError::OutsideHours { open, close }) => DialogueReply::text(format!(
            "We're open {open}:00 to {close}:00. Could you pick a time inside that window?"
        )),
        Err(TimeError::Unparseable) => DialogueReply::text(
            "I didn't understand that time. Try something like \"10:00 AM\" or \"14:30\".",
        ),
    }
}

fn handle_phone(session: &mut Session, input: &str) -> DialogueReply {
    match normalize::normalize_phone(input) {
        Some(phone) => {
            session.draft.phone = Some(phone);
            session.step = Step::AskingEmail;
            DialogueReply::text(
                "Thanks! Would you like a confirmation email? Type your address, or \"skip\".",
            )
        }
        None => DialogueReply::text(
            "That doesn't look like a phone number I can use. Try formats like +92-321-1234567, 0321-1234567, or a 10-digit number.",
        ),
    }
}

fn handle_email(session: &mut Session, input: &str, config: &AppConfig) -> DialogueReply {
    let lowered = input.to_lowercase();
    if matches!(lowered.as_str(), "skip" | "no" | "none" | "no thanks") {
        session.step = Step::FinalConfirmation;
        return DialogueReply::text(confirmation_summary(&session.draft, config));
    }

    match normalize::normalize_email(input) {
        Some(email) => {
            session.draft.email = Some(email);
            session.step = Step::FinalConfirmation;
            DialogueReply::text(confirmation_summary(&session.draft, config))
        }
        None => {
            DialogueReply::text("That email doesn't look right. Type it again, or say \"skip\".")
        }
    }
}

async fn handle_confirmation(
    session: &mut Session,
    input: &str,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
) -> DialogueReply {
    let lowered = input.to_lowercase();

    // negatives first: "not sure" must not book
    let negative = lowered.contains("never mind")
        || lowered
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
            .any(|w| matches!(w, "no" | "nope" | "not" | "cancel" | "stop"));

    if negative {
        session.draft.reset_keeping_name();
        session.offered_slots.clear();
        session.offered_days.clear();
        session.step = Step::MainMenu;
        return DialogueReply::text(format!("No problem, nothing was booked. {}", menu_prompt()));
    }

    if contains_any(&lowered, &["yes", "confirm", "sure", "ok", "book"]) {
        return submit_booking(session, config, calendar).await;
    }

    DialogueReply::text("Just to be safe: should I book it? Please reply yes or no.")
}

async fn submit_booking(
    session: &mut Session,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
) -> DialogueReply {
    let resolved = reconcile::resolve_submission(
        session.draft.selected_slot.as_ref(),
        session.draft.date.as_deref(),
        session.draft.time.as_deref(),
        &config.default_time,
    );
    let Some(resolved) = resolved else {
        session.step = Step::AskingDatePreference;
        return DialogueReply::text(
            "I still need a date for that. When would you like to come in? You can say \"today\", \"tomorrow\", \"this week\", or pick a date.",
        );
    };

    let request = BookingRequest {
        patient_name: session.draft.name.clone().unwrap_or_default(),
        phone: session.draft.phone.clone().unwrap_or_default(),
        email: session.draft.email.clone(),
        date: resolved.date.clone(),
        time: resolved.time.clone(),
        service: session
            .draft
            .service
            .clone()
            .unwrap_or_else(|| "General Dentistry".to_string()),
        notes: None,
    };

    match calendar.book(&request).await {
        Ok(BookingOutcome::Confirmed { event_id, .. }) => {
            tracing::info!(
                event = %event_id,
                date = %resolved.date,
                time = %resolved.time,
                "appointment booked"
            );
            let name = request.patient_name.clone();
            let when = format!(
                "{} at {}",
                display_date(&resolved.date),
                normalize::to_display_time(&resolved.time)
            );
            session.draft.reset_keeping_name();
            session.offered_slots.clear();
            session.offered_days.clear();
            session.step = Step::MainMenu;
            DialogueReply::text(format!(
                "You're all set, {name}! {} on {when}. We'll see you then. {}",
                request.service,
                menu_prompt()
            ))
        }
        Ok(BookingOutcome::Rejected {
            message,
            alternatives,
        }) if !alternatives.is_empty() => {
            session.draft.selected_slot = None;
            session.draft.time = None;
            session.draft.display_time = None;
            session.offered_slots = alternatives.clone();
            session.step = Step::SlotSelection;
            DialogueReply::with_slots(
                format!(
                    "{message}\nHere's what's still open:\n{}\nReply with a number or a time.",
                    slot_list(&alternatives)
                ),
                alternatives,
            )
        }
        Ok(BookingOutcome::Rejected { message, .. }) => {
            session.draft.reset_keeping_name();
            session.offered_slots.clear();
            session.offered_days.clear();
            session.step = Step::MainMenu;
            DialogueReply::text(format!(
                "{message} Please call us at {} and our staff will sort it out directly. {}",
                config.business_phone,
                menu_prompt()
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "booking submission failed");
            // stay in final_confirmation so "yes" can retry
            DialogueReply::text(format!(
                "I couldn't reach the booking system just now. Say \"yes\" to try again, or call us at {}.",
                config.business_phone
            ))
        }
    }
}

// ── Availability plumbing ──

enum DateRef<'a> {
    Resolved(NaiveDate),
    Raw(&'a str),
}

async fn query_slots(
    session: &mut Session,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
    date_ref: DateRef<'_>,
    today: NaiveDate,
) -> DialogueReply {
    let (query, display) = match &date_ref {
        DateRef::Resolved(d) => (d.format("%Y-%m-%d").to_string(), display_naive(*d)),
        DateRef::Raw(s) => (s.to_string(), s.to_string()),
    };
    session.draft.date = Some(query.clone());

    match calendar.available_slots(&query).await {
        Ok(slots) if !slots.is_empty() => {
            // If the slots carry an authoritative instant, pin the draft date
            // to it; the service may have resolved raw text differently.
            if let Some(date) = slots
                .iter()
                .find_map(|s| s.start_time_iso.as_deref())
                .and_then(|iso| DateTime::parse_from_rfc3339(iso).ok())
                .map(|dt| dt.format("%Y-%m-%d").to_string())
            {
                session.draft.date = Some(date);
            }
            session.offered_slots = slots.clone();
            session.step = Step::SlotSelection;
            DialogueReply::with_slots(
                format!(
                    "Here's what's open on {display}:\n{}\nReply with a number or a time.",
                    slot_list(&slots)
                ),
                slots,
            )
        }
        Ok(_) => {
            offer_day_menu(
                session,
                config,
                calendar,
                today,
                &format!("I'm sorry, {display} is fully booked. Here are the next days with openings:"),
            )
            .await
        }
        Err(e) => {
            tracing::warn!(error = %e, date = %query, "availability query failed, falling back");
            match calendar.upcoming_days(config.lookahead_days).await {
                Ok(days) if !days.is_empty() => {
                    session.offered_days = days;
                    session.step = Step::AskingSpecificDate;
                    DialogueReply::text(format!(
                        "I'm having trouble reading the calendar for {display}. These days should have room:\n{}\nPick one, or give me another date.",
                        day_list(&session.offered_days)
                    ))
                }
                _ => {
                    // both calls failed: take the time manually and let the
                    // booking submission settle conflicts
                    session.step = Step::AskingTime;
                    DialogueReply::text(format!(
                        "I can't reach the calendar right now, but I can still pencil you in for {display}. What time works for you? (e.g. \"10:00 AM\" or \"14:00\")"
                    ))
                }
            }
        }
    }
}

async fn offer_day_menu(
    session: &mut Session,
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
    today: NaiveDate,
    preamble: &str,
) -> DialogueReply {
    let days = match calendar.upcoming_days(config.lookahead_days).await {
        Ok(days) if !days.is_empty() => days,
        Ok(_) => local_day_window(config, today),
        Err(e) => {
            tracing::warn!(error = %e, "multi-day query failed, using local window");
            local_day_window(config, today)
        }
    };

    session.offered_days = days;
    session.step = Step::AskingSpecificDate;
    DialogueReply::text(format!(
        "{preamble}\n{}\nPick one, or type a date like 2025-08-15.",
        day_list(&session.offered_days)
    ))
}

fn local_day_window(config: &AppConfig, today: NaiveDate) -> Vec<DayAvailability> {
    normalize::business_days_ahead(today, config.lookahead_days, config.closed_weekday)
        .into_iter()
        .map(|d| DayAvailability {
            day: d.format("%A").to_string(),
            date: d.format("%Y-%m-%d").to_string(),
            display_date: d.format("%B %d, %Y").to_string(),
        })
        .collect()
}

// ── Text helpers ──

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn menu_prompt() -> &'static str {
    "How can I help you today? You can book an appointment, or ask about our hours and services."
}

fn service_list() -> String {
    SERVICES
        .iter()
        .enumerate()
        .map(|(i, (_, display))| format!("{}. {}", i + 1, display))
        .collect::<Vec<_>>()
        .join("\n")
}

fn slot_list(slots: &[Slot]) -> String {
    slots
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s.formatted_time))
        .collect::<Vec<_>>()
        .join("\n")
}

fn day_list(days: &[DayAvailability]) -> String {
    days.iter()
        .enumerate()
        .map(|(i, d)| format!("{}. {} ({})", i + 1, d.day, d.display_date))
        .collect::<Vec<_>>()
        .join("\n")
}

fn confirmation_summary(draft: &PatientDraft, config: &AppConfig) -> String {
    let resolved = reconcile::resolve_submission(
        draft.selected_slot.as_ref(),
        draft.date.as_deref(),
        draft.time.as_deref(),
        &config.default_time,
    );
    let when = match &resolved {
        Some(r) => format!(
            "{} at {}",
            display_date(&r.date),
            normalize::to_display_time(&r.time)
        ),
        None => "a time we still need to pick".to_string(),
    };
    let email = draft
        .email
        .as_ref()
        .map(|e| format!(", email {e}"))
        .unwrap_or_default();

    format!(
        "Let me confirm: {} for {}, {when}. Phone {}{email}. Shall I book it? (yes/no)",
        draft.service.as_deref().unwrap_or("an appointment"),
        draft.name.as_deref().unwrap_or("you"),
        draft.phone.as_deref().unwrap_or("not provided"),
    )
}

fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(display_naive)
        .unwrap_or_else(|_| date.to_string())
}

fn display_naive(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
