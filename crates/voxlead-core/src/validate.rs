//! Input validation for intake payloads.

/// Normalize a phone number: strip whitespace, ensure a leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    let cleaned: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.starts_with('+') {
        cleaned
    } else {
        format!("+{cleaned}")
    }
}

/// E.164 check: optional `+`, 8–15 digits, no leading zero.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (8..=15).contains(&digits.len())
        && !digits.starts_with('0')
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// Loose email shape check: one `@`, a dot in the domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot < domain.len() - 1,
        None => false,
    }
}
