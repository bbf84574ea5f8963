// src/models/mod.rs
pub mod admin;
pub mod announcement;
pub mod study;
pub mod team;
pub mod user;

/// Splits a comma separated column (tags, tech stack) into trimmed entries.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Joins list entries back into the stored column form; empty lists become NULL.
pub fn join_list(items: &[String]) -> Option<String> {
    let cleaned: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(","))
    }
}

/// Empty strings in update payloads clear an optional column.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
