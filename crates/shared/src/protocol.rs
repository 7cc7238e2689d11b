use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ChoiceId, EventId, ExpenseId, PollId, SlotChoice, SlotId, UserId};

pub const DEFAULT_POLL_QUESTION: &str = "Where shall we meet?";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventInfoPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expenses: Option<ExpensesPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_results: Option<Vec<PollResultPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollInfoPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<PollId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<MyVotePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<SlotPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_slot: Option<SlotPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventInfoPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpensesPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ExpenseItemPayload>>,
    /// participant -> `{"balance": n}` or a bare number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balances: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseItemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_id: Option<ExpenseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollInfoPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<PollId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MyVotePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<ChoiceId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollResultPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<ChoiceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_voted: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_choice: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<SlotId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_votes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_votes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<Value>,
    #[serde(
        default,
        rename = "isWinning",
        alias = "is_winning",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_winning: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub created_by: UserId,
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub event_id: EventId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddExpenseRequest {
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub notes: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPollChoice {
    pub text: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub choices: Vec<NewPollChoice>,
}

impl CreatePollRequest {
    /// The meeting-place poll every event starts with.
    pub fn default_meeting_poll() -> Self {
        let choice = |text: &str, location: &str| NewPollChoice {
            text: text.to_string(),
            location: location.to_string(),
        };
        Self {
            question: DEFAULT_POLL_QUESTION.to_string(),
            choices: vec![
                choice("Annex Building Cafe", "Next to the Engineering Faculty"),
                choice("Central Library", "Main Campus"),
                choice("Social Facility", "Near the Dormitories"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollVoteRequest {
    pub user_id: UserId,
    pub poll_id: PollId,
    pub choice_id: ChoiceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSlotResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotVoteRequest {
    pub user_id: UserId,
    pub slot_id: SlotId,
    pub choice: SlotChoice,
}
