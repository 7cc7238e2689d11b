use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::domain::{ChoiceId, SlotId};

use crate::summary::{EventSummary, PollChoice};

const PARTICIPATION_BASE: u32 = 40;
const PARTICIPATION_PER_VOTE: u32 = 5;
const PARTICIPATION_CAP: u32 = 95;

/// Whole-number share of `part` in `total`; zero when nothing was counted.
pub fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(part) / f64::from(total)) * 100.0).round() as u32
}

/// Highest vote count wins; on a tie the choice listed first keeps the lead.
pub fn winning_choice(choices: &[PollChoice]) -> Option<&PollChoice> {
    choices.iter().fold(None, |best: Option<&PollChoice>, choice| match best {
        Some(current) if choice.votes <= current.votes => Some(current),
        _ => Some(choice),
    })
}

pub fn participation_rate(total_votes: u32) -> u32 {
    total_votes
        .saturating_mul(PARTICIPATION_PER_VOTE)
        .saturating_add(PARTICIPATION_BASE)
        .min(PARTICIPATION_CAP)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceShare {
    pub choice_id: ChoiceId,
    pub name: String,
    pub votes: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotShare {
    pub slot_id: SlotId,
    pub start_time: Option<DateTime<Utc>>,
    pub yes_votes: u32,
    pub no_votes: u32,
    pub yes_percentage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    pub total_slots: usize,
    pub total_votes: u32,
    pub participation_rate: u32,
    pub total_expense: Decimal,
    pub average_expense_per_participant: Decimal,
    pub poll_data: Vec<ChoiceShare>,
    pub slot_data: Vec<SlotShare>,
    pub winning_choice: Option<ChoiceId>,
}

impl Analytics {
    pub fn from_summary(summary: &EventSummary, participant_count: usize) -> Self {
        let choices: &[PollChoice] = summary
            .poll
            .as_ref()
            .map(|poll| poll.choices.as_slice())
            .unwrap_or_default();
        let total_votes = choices
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.votes));

        let poll_data = choices
            .iter()
            .map(|c| ChoiceShare {
                choice_id: c.id.clone(),
                name: c.text.clone(),
                votes: c.votes,
                percentage: percentage(c.votes, total_votes),
            })
            .collect();

        let slot_data = summary
            .slots
            .iter()
            .map(|slot| SlotShare {
                slot_id: slot.id.clone(),
                start_time: slot.start_time,
                yes_votes: slot.yes_votes,
                no_votes: slot.no_votes,
                yes_percentage: percentage(
                    slot.yes_votes,
                    slot.yes_votes.saturating_add(slot.no_votes),
                ),
            })
            .collect();

        let total_expense = summary.expenses.total;
        let average_expense_per_participant = u64::try_from(participant_count)
            .ok()
            .and_then(|count| total_expense.checked_div(Decimal::from(count)))
            .unwrap_or(Decimal::ZERO);

        Self {
            total_slots: summary.slots.len(),
            total_votes,
            participation_rate: participation_rate(total_votes),
            total_expense,
            average_expense_per_participant,
            poll_data,
            slot_data,
            winning_choice: winning_choice(choices).map(|c| c.id.clone()),
        }
    }
}

#[cfg(test)]
#[path = "tests/analytics_tests.rs"]
mod tests;
