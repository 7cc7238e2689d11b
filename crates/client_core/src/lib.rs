pub mod analytics;
pub mod api;
pub mod balance;
pub mod boards;
pub mod config;
pub mod dashboard;
pub mod drafts;
pub mod error;
pub mod export;
pub mod ordering;
pub mod summary;
pub mod voting;

#[cfg(test)]
mod test_support;

pub use analytics::Analytics;
pub use api::{EventApi, HttpEventApi};
pub use balance::{BalanceClass, BalancePresenter, CurrencyFormatter};
pub use boards::{
    DashboardEvent, ExpenseSplitter, Feature, PollVoting, SlotPlanner, VoteOutcome,
};
pub use config::{load_settings, Settings};
pub use dashboard::{EventDashboard, Participant};
pub use drafts::{ExpenseDraft, SlotDraft};
pub use error::{ClientError, NoticeSeverity, UserNotice, ValidationError};
pub use summary::EventSummary;
