use std::sync::Arc;

use shared::domain::{EventId, UserId};
use tokio::sync::broadcast;

use crate::{api::EventApi, error::UserNotice};

pub mod expenses;
pub mod poll;
pub mod slots;

pub use expenses::{ExpenseSplitter, ExpenseView};
pub use poll::{PollChoiceView, PollView, PollVoting};
pub use slots::{SlotPlanner, SlotView};

pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Slots,
    Poll,
    Expenses,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    SummaryRefreshed {
        feature: Feature,
    },
    /// An optimistic vote was undone after the server refused it.
    VoteRolledBack {
        feature: Feature,
        target: String,
    },
    Notice {
        feature: Feature,
        notice: UserNotice,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Submitted,
    /// Another vote for the same target was still pending; nothing was sent.
    Ignored,
}

#[derive(Clone)]
pub struct BoardContext {
    pub api: Arc<dyn EventApi>,
    pub event_id: EventId,
    pub user_id: UserId,
    pub events: broadcast::Sender<DashboardEvent>,
}

impl BoardContext {
    pub fn new(api: Arc<dyn EventApi>, event_id: EventId, user_id: UserId) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            event_id,
            user_id,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: DashboardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn notify(&self, feature: Feature, notice: UserNotice) {
        self.publish(DashboardEvent::Notice { feature, notice });
    }
}
