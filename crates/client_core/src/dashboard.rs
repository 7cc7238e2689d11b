use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use shared::{
    domain::{generate_group_id, EventId, ParticipantRole, UserId},
    protocol::CreateEventRequest,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    analytics::Analytics,
    api::EventApi,
    balance::{BalancePresenter, CurrencyFormatter},
    boards::{
        BoardContext, DashboardEvent, ExpenseSplitter, Feature, PollVoting, SlotPlanner,
    },
    config::Settings,
    error::{ClientError, ValidationError},
    export::{export_text, ReportHeader},
    summary::{normalize_summary, EventSummary},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub name: String,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

pub struct EventDashboard {
    ctx: BoardContext,
    settings: Settings,
    title: Option<String>,
    participants: Mutex<Vec<Participant>>,
    summary: Mutex<Option<EventSummary>>,
    slots: SlotPlanner,
    poll: PollVoting,
    expenses: ExpenseSplitter,
}

impl EventDashboard {
    pub async fn create(
        api: Arc<dyn EventApi>,
        settings: Settings,
        title: &str,
        user_name: &str,
    ) -> Result<Arc<Self>, ClientError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyEventTitle.into());
        }
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(ValidationError::EmptyUserName.into());
        }

        let user_id = UserId::generate();
        let request = CreateEventRequest {
            title: title.to_string(),
            created_by: user_id.clone(),
            group_id: generate_group_id(),
        };
        let created = api.create_event(&request).await?;
        info!(event_id = %created.event_id, %user_id, "event created");

        let moderator = Participant {
            id: user_id.clone(),
            name: user_name.to_string(),
            role: ParticipantRole::Moderator,
            joined_at: Utc::now(),
        };
        Ok(Self::assemble(
            BoardContext::new(api, created.event_id, user_id),
            settings,
            Some(title.to_string()),
            vec![moderator],
        ))
    }

    pub fn join(
        api: Arc<dyn EventApi>,
        settings: Settings,
        event_id: EventId,
        user_id: UserId,
        user_name: &str,
    ) -> Arc<Self> {
        let member = Participant {
            id: user_id.clone(),
            name: user_name.trim().to_string(),
            role: ParticipantRole::Member,
            joined_at: Utc::now(),
        };
        Self::assemble(
            BoardContext::new(api, event_id, user_id),
            settings,
            None,
            vec![member],
        )
    }

    fn assemble(
        ctx: BoardContext,
        settings: Settings,
        title: Option<String>,
        participants: Vec<Participant>,
    ) -> Arc<Self> {
        let presenter = BalancePresenter::new(CurrencyFormatter::from_settings(&settings));
        Arc::new(Self {
            slots: SlotPlanner::new(ctx.clone()),
            poll: PollVoting::new(ctx.clone()),
            expenses: ExpenseSplitter::new(ctx.clone(), presenter),
            ctx,
            settings,
            title,
            participants: Mutex::new(participants),
            summary: Mutex::new(None),
        })
    }

    pub fn event_id(&self) -> &EventId {
        &self.ctx.event_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.ctx.user_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn slots(&self) -> &SlotPlanner {
        &self.slots
    }

    pub fn poll(&self) -> &PollVoting {
        &self.poll
    }

    pub fn expenses(&self) -> &ExpenseSplitter {
        &self.expenses
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.ctx.subscribe_events()
    }

    pub fn invite_link(&self) -> String {
        self.settings.invite_link(self.ctx.event_id.as_str())
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.participants.lock().await.clone()
    }

    pub async fn add_participant(&self, participant: Participant) {
        let mut participants = self.participants.lock().await;
        if participants.iter().all(|p| p.id != participant.id) {
            participants.push(participant);
        }
    }

    /// Title given at creation, else whatever the server reports.
    pub async fn title(&self) -> Option<String> {
        if let Some(title) = &self.title {
            return Some(title.clone());
        }
        self.summary
            .lock()
            .await
            .as_ref()
            .and_then(|summary| summary.event.title.clone())
    }

    /// Fetches the summary once and hands it to every board. On failure the
    /// previously shown data stays as it was.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let payload = self.ctx.api.fetch_summary(&self.ctx.event_id).await?;
        let summary = normalize_summary(payload);

        tokio::join!(
            self.slots.apply_summary(&summary),
            self.poll.apply_summary(&summary),
            self.expenses.apply_summary(&summary),
        );
        *self.summary.lock().await = Some(summary);

        debug!(event_id = %self.ctx.event_id, "dashboard refreshed");
        self.ctx.publish(DashboardEvent::SummaryRefreshed {
            feature: Feature::Dashboard,
        });
        Ok(())
    }

    pub async fn summary(&self) -> Option<EventSummary> {
        self.summary.lock().await.clone()
    }

    pub async fn analytics(&self) -> Analytics {
        let participant_count = self.participants.lock().await.len();
        let summary = self.summary.lock().await;
        match summary.as_ref() {
            Some(summary) => Analytics::from_summary(summary, participant_count),
            None => Analytics::from_summary(&EventSummary::default(), participant_count),
        }
    }

    pub async fn export_text(&self) -> String {
        let participants = self.participants().await;
        let summary = self.summary().await.unwrap_or_default();

        let moderator = participants
            .iter()
            .find(|p| p.role == ParticipantRole::Moderator)
            .map(|p| p.name.clone())
            .or_else(|| summary.event.created_by.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        let header = ReportHeader {
            title: self.title().await.unwrap_or_default(),
            event_id: self.ctx.event_id.to_string(),
            moderator,
            participant_count: participants.len(),
            invite_link: self.invite_link(),
        };
        export_text(&summary, &header, self.expenses.presenter())
    }

    pub async fn send_reminder(&self) -> Result<(), ClientError> {
        match self.ctx.api.send_reminder(&self.ctx.event_id).await {
            Ok(()) => {
                info!(event_id = %self.ctx.event_id, "reminder sent");
                Ok(())
            }
            Err(err) => {
                warn!(event_id = %self.ctx.event_id, error = %err, "reminder failed");
                self.ctx.notify(Feature::Dashboard, err.notice());
                Err(err)
            }
        }
    }

    /// Refreshes every `refresh_interval` until the dashboard is dropped or
    /// the task is aborted. Returns `None` when auto refresh is disabled.
    pub fn spawn_auto_refresh(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.settings.auto_refresh {
            return None;
        }
        let period = self.settings.refresh_interval();
        let dashboard: Weak<Self> = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(dashboard) = dashboard.upgrade() else {
                    debug!("dashboard dropped; stopping auto refresh");
                    break;
                };
                if let Err(err) = dashboard.refresh().await {
                    warn!(event_id = %dashboard.ctx.event_id, error = %err, "periodic refresh failed");
                }
            }
        }))
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
