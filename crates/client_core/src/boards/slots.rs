use chrono::Utc;
use shared::{
    domain::{SlotChoice, SlotId},
    protocol::{CreateSlotRequest, SlotVoteRequest},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{BoardContext, DashboardEvent, Feature, VoteOutcome};
use crate::{
    analytics::percentage,
    drafts::SlotDraft,
    error::{ClientError, ValidationError},
    ordering::sort_newest_first,
    summary::{normalize_slot, normalize_summary, EventSummary, Slot},
    voting::{Ballot, BeginVote, RollbackOutcome, Tally, VoteReconciler},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    /// Counts and `user_choice` already include any pending optimistic vote.
    pub slot: Slot,
    pub yes_percentage: u32,
    pub my_choice: Option<SlotChoice>,
    pub vote_in_flight: bool,
}

#[derive(Debug, Default)]
struct SlotBoardState {
    slots: Vec<Slot>,
    reconciler: VoteReconciler,
    adding: bool,
}

/// Candidate time slots with a yes/no vote per participant.
pub struct SlotPlanner {
    ctx: BoardContext,
    state: Mutex<SlotBoardState>,
}

fn slot_ballot(slot: &Slot, selection: Option<String>) -> Ballot {
    Ballot::new(
        Tally::from_counts([
            (SlotChoice::Yes.as_str(), slot.yes_votes),
            (SlotChoice::No.as_str(), slot.no_votes),
        ]),
        selection,
    )
}

const PLACEHOLDER_PREFIX: &str = "tmp_";

fn placeholder_slot(request: &CreateSlotRequest) -> Slot {
    Slot {
        id: SlotId(format!("{PLACEHOLDER_PREFIX}{}", Utc::now().timestamp_millis())),
        start_time: Some(request.start_time),
        end_time: Some(request.end_time),
        yes_votes: 0,
        no_votes: 0,
        is_winning: false,
        user_choice: None,
    }
}

impl SlotPlanner {
    pub fn new(ctx: BoardContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(SlotBoardState::default()),
        }
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let payload = self.ctx.api.fetch_summary(&self.ctx.event_id).await?;
        self.apply_summary(&normalize_summary(payload)).await;
        Ok(())
    }

    /// Replaces local slot data with server data. A selection the server
    /// does not report is kept from local state, minus any unconfirmed vote.
    pub async fn apply_summary(&self, summary: &EventSummary) {
        let mut state = self.state.lock().await;
        let ballots: Vec<(String, Ballot)> = summary
            .slots
            .iter()
            .map(|slot| {
                let selection = slot.user_choice.map(|c| c.as_str().to_string()).or_else(|| {
                    state
                        .reconciler
                        .settled_selection(slot.id.as_str())
                        .map(str::to_string)
                });
                (slot.id.to_string(), slot_ballot(slot, selection))
            })
            .collect();
        state.reconciler.replace_all(ballots);
        state.slots = summary.slots.clone();
        drop(state);

        debug!(count = summary.slots.len(), "slots refreshed");
        self.ctx.publish(DashboardEvent::SummaryRefreshed {
            feature: Feature::Slots,
        });
    }

    pub async fn vote(
        &self,
        slot_id: &SlotId,
        choice: SlotChoice,
    ) -> Result<VoteOutcome, ClientError> {
        if slot_id.as_str().starts_with(PLACEHOLDER_PREFIX) {
            let err = ValidationError::UnsavedSlot(slot_id.to_string());
            return Err(self.fail(err.into()));
        }
        let begun = {
            let mut state = self.state.lock().await;
            state.reconciler.begin(slot_id.as_str(), choice.as_str())
        };
        let ticket = match begun {
            Ok(BeginVote::Started(ticket)) => ticket,
            Ok(BeginVote::AlreadyInFlight) => {
                debug!(%slot_id, "slot vote already in flight; ignoring");
                return Ok(VoteOutcome::Ignored);
            }
            Err(err) => return Err(self.fail(err.into())),
        };

        let request = SlotVoteRequest {
            user_id: self.ctx.user_id.clone(),
            slot_id: slot_id.clone(),
            choice,
        };
        match self.ctx.api.vote_slot(&self.ctx.event_id, &request).await {
            Ok(()) => {
                self.state.lock().await.reconciler.confirm(ticket);
                info!(%slot_id, %choice, "slot vote accepted");
                if let Err(err) = self.refresh().await {
                    warn!(error = %err, "refresh after slot vote failed");
                }
                Ok(VoteOutcome::Submitted)
            }
            Err(err) => {
                let outcome = self.state.lock().await.reconciler.abort(ticket);
                warn!(%slot_id, %choice, code = ?err.code(), error = %err, ?outcome, "slot vote failed");
                if outcome == RollbackOutcome::Restored {
                    self.ctx.publish(DashboardEvent::VoteRolledBack {
                        feature: Feature::Slots,
                        target: slot_id.to_string(),
                    });
                }
                Err(self.fail(err))
            }
        }
    }

    /// Creates a slot from the draft. The new slot is shown right away,
    /// using a temporary id when the server does not echo it back, and the
    /// draft is cleared.
    pub async fn add_slot(&self, draft: &mut SlotDraft) -> Result<SlotId, ClientError> {
        let request = draft.validate().map_err(|err| self.fail(err.into()))?;
        {
            let mut state = self.state.lock().await;
            if state.adding {
                return Err(self.fail(ValidationError::SubmissionInFlight.into()));
            }
            state.adding = true;
        }

        let created = self.ctx.api.create_slot(&self.ctx.event_id, &request).await;
        let mut state = self.state.lock().await;
        state.adding = false;

        let created = match created {
            Ok(created) => created,
            Err(err) => {
                drop(state);
                warn!(error = %err, "slot creation failed");
                return Err(self.fail(err));
            }
        };
        let slot = created
            .slot
            .and_then(normalize_slot)
            .unwrap_or_else(|| placeholder_slot(&request));
        let slot_id = slot.id.clone();
        state
            .reconciler
            .track(slot_id.to_string(), slot_ballot(&slot, None));
        state.slots.insert(0, slot);
        drop(state);

        draft.clear();
        info!(%slot_id, "slot added");
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "refresh after adding slot failed");
        }
        Ok(slot_id)
    }

    pub async fn is_adding(&self) -> bool {
        self.state.lock().await.adding
    }

    /// Slots newest first, with optimistic counts applied.
    pub async fn slots(&self) -> Vec<SlotView> {
        let state = self.state.lock().await;
        let mut slots = state.slots.clone();
        sort_newest_first(&mut slots);

        slots
            .into_iter()
            .map(|mut slot| {
                let vote_in_flight = state.reconciler.is_in_flight(slot.id.as_str());
                let ballot = state.reconciler.ballot(slot.id.as_str());
                let my_choice = ballot
                    .and_then(|b| b.selection.as_deref())
                    .and_then(|raw| raw.parse::<SlotChoice>().ok());
                if let Some(ballot) = ballot {
                    slot.yes_votes = ballot.tally.count(SlotChoice::Yes.as_str());
                    slot.no_votes = ballot.tally.count(SlotChoice::No.as_str());
                }
                slot.user_choice = my_choice;
                SlotView {
                    yes_percentage: percentage(
                        slot.yes_votes,
                        slot.yes_votes.saturating_add(slot.no_votes),
                    ),
                    my_choice,
                    vote_in_flight,
                    slot,
                }
            })
            .collect()
    }

    fn fail(&self, err: ClientError) -> ClientError {
        self.ctx.notify(Feature::Slots, err.notice());
        err
    }
}

#[cfg(test)]
#[path = "../tests/slots_tests.rs"]
mod tests;
