use chrono::{DateTime, NaiveDate};

/// Renders a due date as `Jan 5, 2025`. The service sends either RFC 3339
/// timestamps or bare dates.
pub fn format_due_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "N/A".to_string();
    };

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn clean_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

pub fn reminder_message(title: &str, days_overdue: &str, library_name: &str) -> String {
    format!(
        "Hi! Reminder from {}: \"{}\" is {} days overdue. Please return it soon. Thank you!",
        library_name, title, days_overdue
    )
}

/// Click-to-chat link that opens WhatsApp with the reminder prefilled.
pub fn whatsapp_link(phone: &str, title: &str, days_overdue: &str, library_name: &str) -> String {
    let message = reminder_message(title, days_overdue, library_name);
    format!(
        "https://wa.me/{}?text={}",
        clean_phone(phone),
        urlencoding::encode(&message)
    )
}
