use crate::config::{messages, CURRENCY_SYMBOL};
use crate::errors::TrackerError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::time::{Duration, Instant};

/// Groups the integer part with `.` the way vi-VN displays amounts.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_currency(value: f64) -> String {
    format!("{} {CURRENCY_SYMBOL}", format_number(value))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn month_title(month: NaiveDate) -> String {
    format!("Tháng {} năm {}", month.month(), month.year())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Empty or malformed input reads as an unset date.
pub fn parse_optional_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn parse_amount(raw: &str) -> Result<f64, TrackerError> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_')
        .collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| TrackerError::validation(messages::INVALID_AMOUNT))
}

pub fn validate_expense(description: &str, amount: f64) -> Result<(), TrackerError> {
    if description.trim().is_empty() {
        return Err(TrackerError::validation(messages::EMPTY_DESCRIPTION));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TrackerError::validation(messages::INVALID_AMOUNT));
    }
    Ok(())
}

/// Hands out ids derived from the creation time in milliseconds, bumping past
/// the last issued id so two expenses created in the same millisecond differ.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn next(&mut self, now: DateTime<Utc>) -> u64 {
        let candidate = now.timestamp_millis().max(0) as u64;
        let id = candidate.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

/// Holds the latest value until no new value has arrived for the quiet period.
///
/// Time is passed in by the caller so the schedule can be driven from a
/// background tick in the server and from fixed instants in tests.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.cancel(),
            _ => None,
        }
    }
}
