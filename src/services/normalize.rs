use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    Unparseable,
    OutsideHours { open: u32, close: u32 },
}

/// Strip separators and validate against the accepted numbering shapes:
/// 10-15 digits, with or without a leading `+` country prefix.
pub fn normalize_phone(input: &str) -> Option<String> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();

    let (prefix, digits) = match cleaned.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", cleaned.as_str()),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !(10..=15).contains(&digits.len()) {
        return None;
    }

    Some(format!("{prefix}{digits}"))
}

/// Lowercased standard address shape: `local@domain.tld`, tld at least two
/// letters. No attempt at full RFC coverage.
pub fn normalize_email(input: &str) -> Option<String> {
    let email = input.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;

    if local.is_empty()
        || domain.contains('@')
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    for label in &labels {
        if label.is_empty()
            || !label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return None;
        }
    }
    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(email)
}

/// Letters, spaces, hyphens, apostrophes and periods; 2-100 chars.
pub fn valid_patient_name(input: &str) -> bool {
    let name = input.trim();
    (2..=100).contains(&name.chars().count())
        && name.chars().any(|c| c.is_alphabetic())
        && name
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'))
}

/// Resolve a relative date term or literal `YYYY-MM-DD` against `today`.
/// Returns `None` for anything not understood; the caller decides whether to
/// delegate the raw text to the calendar collaborator or fall back to a
/// lookahead listing.
pub fn parse_date_expr(input: &str, today: NaiveDate, closed: Weekday) -> Option<NaiveDate> {
    let text = input.trim().to_lowercase();

    if text.contains("today") {
        return Some(skip_closed(today, closed));
    }
    if text.contains("tomorrow") {
        return Some(skip_closed(today + Duration::days(1), closed));
    }
    if text.contains("next week") {
        return Some(skip_closed(today + Duration::days(7), closed));
    }
    if text.contains("this week") {
        return Some(skip_closed(today + Duration::days(1), closed));
    }

    const DAYS: &[(&str, Weekday)] = &[
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ];
    for (name, weekday) in DAYS {
        if text.contains(name) {
            let ahead = (weekday.num_days_from_monday() as i64
                - today.weekday().num_days_from_monday() as i64)
                .rem_euclid(7);
            // "monday" on a Monday means next week, not right now
            let ahead = if ahead == 0 { 7 } else { ahead };
            return Some(skip_closed(today + Duration::days(ahead), closed));
        }
    }

    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .map(|d| skip_closed(d, closed))
}

/// Canonicalize "H:MM AM/PM" or 24-hour "HH:MM" to "HH:MM", rejecting times
/// outside the business-hour window.
pub fn normalize_time(input: &str, open: u32, close: u32) -> Result<String, TimeError> {
    let text = input.trim().to_uppercase();

    let (clock, meridiem) = if let Some(rest) = text.strip_suffix("AM") {
        (rest.trim_end(), Some('A'))
    } else if let Some(rest) = text.strip_suffix("PM") {
        (rest.trim_end(), Some('P'))
    } else {
        (text.as_str(), None)
    };

    let (h, m) = clock.split_once(':').ok_or(TimeError::Unparseable)?;
    let mut hour: u32 = h.trim().parse().map_err(|_| TimeError::Unparseable)?;
    let minute: u32 = m.trim().parse().map_err(|_| TimeError::Unparseable)?;
    if m.trim().len() != 2 || minute > 59 {
        return Err(TimeError::Unparseable);
    }

    match meridiem {
        Some('P') if hour != 12 => hour += 12,
        Some('A') if hour == 12 => hour = 0,
        _ => {}
    }
    if hour > 23 {
        return Err(TimeError::Unparseable);
    }
    if hour < open || hour >= close {
        return Err(TimeError::OutsideHours { open, close });
    }

    Ok(format!("{hour:02}:{minute:02}"))
}

/// Strict canonical shape check used by the reconciler fallback.
pub fn is_strict_hhmm(s: &str) -> bool {
    let Some((h, m)) = s.split_once(':') else {
        return false;
    };
    h.len() == 2
        && m.len() == 2
        && h.chars().all(|c| c.is_ascii_digit())
        && m.chars().all(|c| c.is_ascii_digit())
        && h.parse::<u32>().map(|v| v < 24).unwrap_or(false)
        && m.parse::<u32>().map(|v| v < 60).unwrap_or(false)
}

pub fn to_display_time(hhmm: &str) -> String {
    match NaiveTime::parse_from_str(hhmm, "%H:%M") {
        Ok(t) => t.format("%I:%M %p").to_string(),
        Err(_) => hhmm.to_string(),
    }
}

/// The next `count` open days after `today`, used when the date term is not
/// understood or the multi-day collaborator is unreachable.
pub fn business_days_ahead(today: NaiveDate, count: usize, closed: Weekday) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut date = today;
    while days.len() < count {
        date += Duration::days(1);
        if date.weekday() != closed {
            days.push(date);
        }
    }
    days
}

fn skip_closed(mut date: NaiveDate, closed: Weekday) -> NaiveDate {
    while date.weekday() == closed {
        date += Duration::days(1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_phone_accepted_shapes() {
        assert_eq!(
            normalize_phone("+92 321 1234567").as_deref(),
            Some("+923211234567")
        );
        assert_eq!(
            normalize_phone("0321-1234567").as_deref(),
            Some("03211234567")
        );
        assert_eq!(
            normalize_phone("(555) 123-4567 89").as_deref(),
            Some("555123456789")
        );
        assert_eq!(normalize_phone("5551234567").as_deref(), Some("5551234567"));
    }

    #[test]
    fn test_phone_rejected_shapes() {
        assert!(normalize_phone("12345").is_none());
        assert!(normalize_phone("call me maybe").is_none());
        assert!(normalize_phone("0321123456x").is_none());
        assert!(normalize_phone("").is_none());
        assert!(normalize_phone("+").is_none());
        assert!(normalize_phone("1234567890123456").is_none());
    }

    #[test]
    fn test_email_valid() {
        assert_eq!(
            normalize_email("  Sam.Khan+dental@Example.COM ").as_deref(),
            Some("sam.khan+dental@example.com")
        );
        assert_eq!(
            normalize_email("a@b.co").as_deref(),
            Some("a@b.co")
        );
    }

    #[test]
    fn test_email_invalid() {
        assert!(normalize_email("no-at-sign").is_none());
        assert!(normalize_email("two@@example.com").is_none());
        assert!(normalize_email("@example.com").is_none());
        assert!(normalize_email("sam@nodot").is_none());
        assert!(normalize_email("sam@example.c").is_none());
        assert!(normalize_email("sam@exa mple.com").is_none());
    }

    #[test]
    fn test_patient_name() {
        assert!(valid_patient_name("Sam"));
        assert!(valid_patient_name("Mary-Jane O'Brien Jr."));
        assert!(!valid_patient_name("X"));
        assert!(!valid_patient_name("Sam123"));
        assert!(!valid_patient_name("---"));
    }

    #[test]
    fn test_date_relative_terms() {
        // 2025-07-28 is a Monday
        let today = d("2025-07-28");
        assert_eq!(
            parse_date_expr("today", today, Weekday::Sun),
            Some(d("2025-07-28"))
        );
        assert_eq!(
            parse_date_expr("Tomorrow please", today, Weekday::Sun),
            Some(d("2025-07-29"))
        );
        assert_eq!(
            parse_date_expr("this week", today, Weekday::Sun),
            Some(d("2025-07-29"))
        );
        assert_eq!(
            parse_date_expr("next week", today, Weekday::Sun),
            Some(d("2025-08-04"))
        );
    }

    #[test]
    fn test_date_weekday_names() {
        // Monday anchor: "friday" is this week, "monday" wraps to next
        let today = d("2025-07-28");
        assert_eq!(
            parse_date_expr("friday", today, Weekday::Sun),
            Some(d("2025-08-01"))
        );
        assert_eq!(
            parse_date_expr("on Monday", today, Weekday::Sun),
            Some(d("2025-08-04"))
        );
    }

    #[test]
    fn test_date_skips_closed_day() {
        // Saturday anchor: "tomorrow" lands on closed Sunday, rolls to Monday
        let saturday = d("2025-08-02");
        assert_eq!(
            parse_date_expr("tomorrow", saturday, Weekday::Sun),
            Some(d("2025-08-04"))
        );
        assert_eq!(
            parse_date_expr("sunday", saturday, Weekday::Sun),
            Some(d("2025-08-04"))
        );
    }

    #[test]
    fn test_date_literal_and_unknown() {
        let today = d("2025-07-28");
        assert_eq!(
            parse_date_expr("2025-08-15", today, Weekday::Sun),
            Some(d("2025-08-15"))
        );
        assert_eq!(parse_date_expr("sometime soonish", today, Weekday::Sun), None);
        assert_eq!(parse_date_expr("July 30", today, Weekday::Sun), None);
    }

    #[test]
    fn test_time_12_hour() {
        assert_eq!(normalize_time("10:00 AM", 9, 19).as_deref(), Ok("10:00"));
        assert_eq!(normalize_time("2:30 pm", 9, 19).as_deref(), Ok("14:30"));
        assert_eq!(normalize_time("12:15 PM", 9, 19).as_deref(), Ok("12:15"));
    }

    #[test]
    fn test_time_24_hour() {
        assert_eq!(normalize_time("14:30", 9, 19).as_deref(), Ok("14:30"));
        assert_eq!(normalize_time("09:00", 9, 19).as_deref(), Ok("09:00"));
    }

    #[test]
    fn test_time_outside_hours() {
        assert_eq!(
            normalize_time("8:00 AM", 9, 19),
            Err(TimeError::OutsideHours { open: 9, close: 19 })
        );
        assert_eq!(
            normalize_time("19:00", 9, 19),
            Err(TimeError::OutsideHours { open: 9, close: 19 })
        );
        // 12:00 AM is midnight, well outside
        assert_eq!(
            normalize_time("12:00 AM", 9, 19),
            Err(TimeError::OutsideHours { open: 9, close: 19 })
        );
    }

    #[test]
    fn test_time_unparseable() {
        assert_eq!(normalize_time("around ten", 9, 19), Err(TimeError::Unparseable));
        assert_eq!(normalize_time("10:5", 9, 19), Err(TimeError::Unparseable));
        assert_eq!(normalize_time("25:00", 9, 19), Err(TimeError::Unparseable));
        assert_eq!(normalize_time("10:75", 9, 19), Err(TimeError::Unparseable));
    }

    #[test]
    fn test_strict_hhmm() {
        assert!(is_strict_hhmm("09:30"));
        assert!(is_strict_hhmm("23:59"));
        assert!(!is_strict_hhmm("9:30"));
        assert!(!is_strict_hhmm("24:00"));
        assert!(!is_strict_hhmm("10:00 AM"));
        assert!(!is_strict_hhmm("1000"));
    }

    #[test]
    fn test_display_time() {
        assert_eq!(to_display_time("14:30"), "02:30 PM");
        assert_eq!(to_display_time("10:00"), "10:00 AM");
    }

    #[test]
    fn test_business_days_exclude_closed() {
        // Friday anchor, Sunday closed: Sat, Mon, Tue
        let friday = d("2025-08-01");
        let days = business_days_ahead(friday, 3, Weekday::Sun);
        assert_eq!(days, vec![d("2025-08-02"), d("2025-08-04"), d("2025-08-05")]);
    }
}
