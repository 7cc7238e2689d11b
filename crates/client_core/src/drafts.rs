use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    domain::UserId,
    protocol::{AddExpenseRequest, CreateSlotRequest},
};

use crate::{error::ValidationError, summary::parse_timestamp};

pub const MAX_NOTES_LEN: usize = 120;
pub const DEFAULT_WEIGHT: Decimal = Decimal::ONE;

/// Share multipliers offered when recording an expense.
pub const WEIGHT_PRESETS: [(Decimal, &str); 4] = [
    (Decimal::ONE, "Normal share (1x)"),
    (Decimal::from_parts(5, 0, 0, false, 1), "Half share (0.5x)"),
    (Decimal::ZERO, "Not sharing (0x)"),
    (Decimal::TWO, "Double share (2x)"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub amount: String,
    pub notes: String,
    pub weight: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidExpense {
    pub amount: Decimal,
    pub notes: String,
    pub weight: Decimal,
}

impl ValidExpense {
    pub fn into_request(self, user_id: UserId) -> AddExpenseRequest {
        AddExpenseRequest {
            user_id,
            amount: self.amount,
            notes: self.notes,
            weight: self.weight,
        }
    }
}

impl ExpenseDraft {
    pub fn new(
        amount: impl Into<String>,
        notes: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            notes: notes.into(),
            weight: weight.into(),
        }
    }

    pub fn validate(&self, submission_in_flight: bool) -> Result<ValidExpense, ValidationError> {
        if submission_in_flight {
            return Err(ValidationError::SubmissionInFlight);
        }

        let amount = parse_amount(&self.amount)
            .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
            .ok_or(ValidationError::InvalidAmount)?;

        let notes = self.notes.trim();
        if notes.is_empty() {
            return Err(ValidationError::EmptyNotes);
        }
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(ValidationError::NotesTooLong { max: MAX_NOTES_LEN });
        }

        Ok(ValidExpense {
            amount,
            notes: notes.to_string(),
            weight: parse_weight(&self.weight)?,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Exact decimal with either `.` or `,` as the decimal separator.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    parse_decimal(raw).ok()
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(&raw.trim().replacen(',', ".", 1))
}

fn parse_weight(raw: &str) -> Result<Decimal, ValidationError> {
    match parse_decimal(raw) {
        Err(_) => Ok(DEFAULT_WEIGHT),
        Ok(weight) if weight.is_sign_negative() && !weight.is_zero() => {
            Err(ValidationError::InvalidWeight)
        }
        Ok(weight) => Ok(weight),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDraft {
    pub start: String,
    pub end: String,
}

impl SlotDraft {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn validate(&self) -> Result<CreateSlotRequest, ValidationError> {
        if self.start.trim().is_empty() || self.end.trim().is_empty() {
            return Err(ValidationError::MissingSlotTime);
        }
        let start_time = parse_slot_time(&self.start)?;
        let end_time = parse_slot_time(&self.end)?;
        if end_time <= start_time {
            return Err(ValidationError::SlotEndsBeforeStart);
        }
        Ok(CreateSlotRequest {
            start_time,
            end_time,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn parse_slot_time(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    parse_timestamp(raw).ok_or_else(|| ValidationError::InvalidSlotTime(raw.trim().to_string()))
}

#[cfg(test)]
#[path = "tests/drafts_tests.rs"]
mod tests;
