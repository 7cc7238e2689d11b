use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::{
    domain::{ChoiceId, EventId, ExpenseId, PollId, SlotChoice, SlotId, UserId},
    protocol::{
        EventInfoPayload, ExpenseItemPayload, ExpensesPayload, PollResultPayload, SlotPayload,
        SummaryPayload, DEFAULT_POLL_QUESTION,
    },
};

use crate::{drafts::parse_decimal, ordering::Chronological};

pub const DEFAULT_POLL_ID: &str = "1";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSummary {
    pub event: EventInfo,
    pub slots: Vec<Slot>,
    pub poll: Option<PollState>,
    pub expenses: ExpenseLedger,
    pub winning_slot: Option<Slot>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventInfo {
    pub event_id: Option<EventId>,
    pub title: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: SlotId,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub yes_votes: u32,
    pub no_votes: u32,
    pub is_winning: bool,
    pub user_choice: Option<SlotChoice>,
}

impl Chronological for Slot {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    fn tie_break_id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollChoice {
    pub id: ChoiceId,
    pub text: String,
    pub location: String,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub poll_id: PollId,
    pub question: String,
    pub choices: Vec<PollChoice>,
    pub my_choice: Option<ChoiceId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub payer: Option<UserId>,
    pub amount: Decimal,
    pub notes: String,
    pub weight: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

impl Chronological for Expense {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn tie_break_id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseLedger {
    pub items: Vec<Expense>,
    /// Signed balance per participant, in the order the server listed them.
    pub balances: Vec<(String, Decimal)>,
    pub total: Decimal,
}

pub fn normalize_summary(payload: SummaryPayload) -> EventSummary {
    let SummaryPayload {
        event,
        expenses,
        poll_results,
        poll,
        poll_id,
        my_vote,
        slots,
        winning_slot,
    } = payload;

    let poll = match poll_results.filter(|results| !results.is_empty()) {
        Some(results) => {
            let (poll_id, question) = match poll {
                Some(info) => (info.poll_id.or(poll_id), info.question),
                None => (poll_id, None),
            };
            Some(normalize_poll(
                results,
                poll_id,
                question,
                my_vote.and_then(|vote| vote.choice_id),
            ))
        }
        None => None,
    };

    EventSummary {
        event: event.map(normalize_event).unwrap_or_default(),
        slots: slots
            .unwrap_or_default()
            .into_iter()
            .filter_map(normalize_slot)
            .collect(),
        poll,
        expenses: expenses.map(normalize_expenses).unwrap_or_default(),
        winning_slot: winning_slot.and_then(normalize_slot),
    }
}

fn normalize_event(event: EventInfoPayload) -> EventInfo {
    EventInfo {
        event_id: event.event_id,
        title: event.title.filter(|t| !t.trim().is_empty()),
        created_by: event.created_by,
        created_at: event.created_at.as_deref().and_then(parse_timestamp),
    }
}

/// `None` when the server sent no id; such a slot could not be voted on or
/// matched across refreshes.
pub(crate) fn normalize_slot(slot: SlotPayload) -> Option<Slot> {
    let yes = slot.yes_votes.as_ref().or(slot.yes.as_ref());
    let no = slot.no_votes.as_ref().or(slot.no.as_ref());
    Some(Slot {
        id: slot.slot_id?,
        start_time: slot.start_time.as_deref().and_then(parse_timestamp),
        end_time: slot.end_time.as_deref().and_then(parse_timestamp),
        yes_votes: loose_count(yes),
        no_votes: loose_count(no),
        is_winning: truthy(slot.is_winning.as_ref()),
        user_choice: slot
            .user_choice
            .as_deref()
            .and_then(|raw| raw.parse::<SlotChoice>().ok()),
    })
}

fn normalize_poll(
    results: Vec<PollResultPayload>,
    poll_id: Option<PollId>,
    question: Option<String>,
    my_vote: Option<ChoiceId>,
) -> PollState {
    let mut reported_choice = None;
    let choices = results
        .into_iter()
        .filter_map(|c| {
            let id = c.choice_id?;
            if reported_choice.is_none()
                && (is_true(c.user_voted.as_ref()) || is_true(c.user_choice.as_ref()))
            {
                reported_choice = Some(id.clone());
            }
            Some(PollChoice {
                id,
                text: c.text.unwrap_or_default(),
                location: c.location.unwrap_or_default(),
                votes: loose_count(c.votes.as_ref()),
            })
        })
        .collect();

    PollState {
        poll_id: poll_id.unwrap_or_else(|| PollId::new(DEFAULT_POLL_ID)),
        question: question
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_POLL_QUESTION.to_string()),
        choices,
        my_choice: my_vote.or(reported_choice),
    }
}

fn normalize_expenses(expenses: ExpensesPayload) -> ExpenseLedger {
    let balances = expenses
        .balances
        .unwrap_or_default()
        .into_iter()
        .map(|(participant, value)| {
            let balance = match &value {
                Value::Object(fields) => loose_amount(fields.get("balance")),
                other => loose_amount(Some(other)),
            };
            (participant, balance)
        })
        .collect();

    ExpenseLedger {
        items: expenses
            .items
            .unwrap_or_default()
            .into_iter()
            .map(normalize_expense)
            .collect(),
        balances,
        total: loose_amount(expenses.total.as_ref()),
    }
}

fn normalize_expense(item: ExpenseItemPayload) -> Expense {
    let weight = loose_decimal(item.weight.as_ref())
        .filter(|w| !w.is_sign_negative() || w.is_zero())
        .unwrap_or(Decimal::ONE);
    Expense {
        id: item.expense_id.unwrap_or_default(),
        payer: item.user_id,
        amount: loose_amount(item.amount.as_ref()).max(Decimal::ZERO),
        notes: item.notes.map(|n| n.trim().to_string()).unwrap_or_default(),
        weight,
        created_at: item.created_at.as_deref().and_then(parse_timestamp),
    }
}

fn loose_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replacen(',', ".", 1).parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn loose_count(value: Option<&Value>) -> u32 {
    match loose_number(value) {
        Some(n) if n > 0.0 => n.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn loose_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => {
            let raw = n.to_string();
            parse_decimal(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
                .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
        }
        Value::String(s) => parse_decimal(s).ok(),
        Value::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        _ => None,
    }
}

fn loose_amount(value: Option<&Value>) -> Decimal {
    loose_decimal(value).unwrap_or(Decimal::ZERO)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

fn is_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Accepts RFC 3339, `datetime-local` style values (`2024-01-02T10:30`,
/// optionally with seconds) and bare dates. Values without an offset are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "tests/summary_tests.rs"]
mod tests;
