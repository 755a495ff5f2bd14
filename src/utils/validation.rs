use anyhow::{anyhow, Result};
use chrono::NaiveTime;

const MAX_QUIZ_LENGTH: u32 = 100;

/// Parses a single `HH:MM` slot
pub fn parse_time_slot(input: &str) -> Result<NaiveTime> {
    let input = input.trim();

    if input.is_empty() {
        return Err(anyhow!("Time slot cannot be empty"));
    }

    NaiveTime::parse_from_str(input, "%H:%M")
        .map_err(|_| anyhow!("Time slot '{}' must look like HH:MM", input))
}

/// Parses a comma separated list of `HH:MM` slots, rejecting duplicates
pub fn parse_time_slots(input: &str) -> Result<Vec<NaiveTime>> {
    let mut slots = Vec::new();

    for part in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slot = parse_time_slot(part)?;
        if slots.contains(&slot) {
            return Err(anyhow!("Time slot '{}' is listed twice", part));
        }
        slots.push(slot);
    }

    if slots.is_empty() {
        return Err(anyhow!("Must provide at least one time slot"));
    }

    Ok(slots)
}

pub fn validate_quiz_length(length: u32) -> Result<()> {
    if length == 0 {
        return Err(anyhow!("Quiz length must be positive"));
    }

    if length > MAX_QUIZ_LENGTH {
        return Err(anyhow!("Quiz length cannot exceed {}", MAX_QUIZ_LENGTH));
    }

    Ok(())
}

/// Parses the comma separated quiz lengths offered in settings
pub fn parse_quiz_lengths(input: &str) -> Result<Vec<u32>> {
    let mut lengths = Vec::new();

    for part in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let length: u32 = part
            .parse()
            .map_err(|_| anyhow!("Quiz length '{}' is not a number", part))?;
        validate_quiz_length(length)?;
        if !lengths.contains(&length) {
            lengths.push(length);
        }
    }

    if lengths.is_empty() {
        return Err(anyhow!("Must provide at least one quiz length"));
    }

    Ok(lengths)
}

/// Parses the answer labels; exactly three distinct labels are required
pub fn parse_answer_labels(input: &str) -> Result<Vec<String>> {
    let labels: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if labels.len() != 3 {
        return Err(anyhow!("Expected exactly three answer labels, got {}", labels.len()));
    }

    if labels[0] == labels[1] || labels[1] == labels[2] || labels[0] == labels[2] {
        return Err(anyhow!("Answer labels must be distinct"));
    }

    Ok(labels)
}

/// Matches free text against the recognized labels.
///
/// Surrounding whitespace and letter case are ignored. Returns the canonical
/// label so the caller never compares raw user input against the answer.
pub fn recognize_answer<'a>(labels: &'a [String], text: &str) -> Option<&'a str> {
    let text = text.trim();
    labels
        .iter()
        .find(|label| label.eq_ignore_ascii_case(text))
        .map(String::as_str)
}
