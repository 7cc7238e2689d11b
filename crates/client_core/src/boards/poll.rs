use shared::{
    domain::{ChoiceId, PollId},
    protocol::{CreatePollRequest, PollVoteRequest},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{BoardContext, DashboardEvent, Feature, VoteOutcome};
use crate::{
    analytics::{percentage, winning_choice},
    error::{ClientError, ValidationError},
    summary::{normalize_summary, EventSummary, PollChoice, PollState},
    voting::{Ballot, BeginVote, RollbackOutcome, Tally, VoteReconciler},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PollChoiceView {
    pub id: ChoiceId,
    pub text: String,
    pub location: String,
    pub votes: u32,
    pub percentage: u32,
    pub is_mine: bool,
    pub is_winning: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollView {
    pub poll_id: PollId,
    pub question: String,
    pub choices: Vec<PollChoiceView>,
    pub total_votes: u32,
    pub winning_choice: Option<ChoiceId>,
    pub my_choice: Option<ChoiceId>,
    pub vote_in_flight: bool,
}

#[derive(Debug, Default)]
struct PollBoardState {
    poll: Option<PollState>,
    reconciler: VoteReconciler,
    creating: bool,
}

/// The meeting-place poll. The whole poll is one voting group keyed by its
/// poll id, so a participant has at most one selected choice.
pub struct PollVoting {
    ctx: BoardContext,
    state: Mutex<PollBoardState>,
}

fn poll_ballot(poll: &PollState, selection: Option<String>) -> Ballot {
    Ballot::new(
        Tally::from_counts(
            poll.choices
                .iter()
                .map(|choice| (choice.id.to_string(), choice.votes)),
        ),
        selection,
    )
}

impl PollVoting {
    pub fn new(ctx: BoardContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(PollBoardState::default()),
        }
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let payload = self.ctx.api.fetch_summary(&self.ctx.event_id).await?;
        self.apply_summary(&normalize_summary(payload)).await;
        Ok(())
    }

    pub async fn apply_summary(&self, summary: &EventSummary) {
        let mut state = self.state.lock().await;
        let ballots = summary.poll.as_ref().map(|poll| {
            let group = poll.poll_id.to_string();
            let selection = poll.my_choice.as_ref().map(ToString::to_string).or_else(|| {
                state
                    .reconciler
                    .settled_selection(&group)
                    .map(str::to_string)
            });
            let ballot = poll_ballot(poll, selection);
            (group, ballot)
        });
        state.reconciler.replace_all(ballots);
        state.poll = summary.poll.clone();
        drop(state);

        self.ctx.publish(DashboardEvent::SummaryRefreshed {
            feature: Feature::Poll,
        });
    }

    pub async fn is_created(&self) -> bool {
        self.state.lock().await.poll.is_some()
    }

    /// Creates the default meeting-place poll and reloads it.
    pub async fn create_poll(&self) -> Result<(), ClientError> {
        {
            let mut state = self.state.lock().await;
            if state.creating {
                return Err(self.fail(ValidationError::SubmissionInFlight.into()));
            }
            state.creating = true;
        }

        let request = CreatePollRequest::default_meeting_poll();
        let result = self.ctx.api.create_poll(&self.ctx.event_id, &request).await;
        self.state.lock().await.creating = false;

        if let Err(err) = result {
            warn!(error = %err, "poll creation failed");
            return Err(self.fail(err));
        }
        info!(choices = request.choices.len(), "poll created");
        self.refresh().await.map_err(|err| self.fail(err))
    }

    pub async fn vote(&self, choice_id: &ChoiceId) -> Result<VoteOutcome, ClientError> {
        let begun = {
            let mut state = self.state.lock().await;
            match state.poll.as_ref().map(|poll| poll.poll_id.clone()) {
                None => Err(ValidationError::NoActivePoll),
                Some(poll_id) => state
                    .reconciler
                    .begin(poll_id.as_str(), choice_id.as_str())
                    .map(|begun| (poll_id, begun)),
            }
        };
        let (poll_id, ticket) = match begun {
            Ok((poll_id, BeginVote::Started(ticket))) => (poll_id, ticket),
            Ok((_, BeginVote::AlreadyInFlight)) => {
                debug!(%choice_id, "poll vote already in flight; ignoring");
                return Ok(VoteOutcome::Ignored);
            }
            Err(err) => return Err(self.fail(err.into())),
        };

        let request = PollVoteRequest {
            user_id: self.ctx.user_id.clone(),
            poll_id: poll_id.clone(),
            choice_id: choice_id.clone(),
        };
        match self.ctx.api.vote_poll(&self.ctx.event_id, &request).await {
            Ok(()) => {
                self.state.lock().await.reconciler.confirm(ticket);
                info!(%poll_id, %choice_id, "poll vote accepted");
                if let Err(err) = self.refresh().await {
                    warn!(error = %err, "refresh after poll vote failed");
                }
                Ok(VoteOutcome::Submitted)
            }
            Err(err) => {
                let outcome = self.state.lock().await.reconciler.abort(ticket);
                warn!(%poll_id, %choice_id, code = ?err.code(), error = %err, ?outcome, "poll vote failed");
                if outcome == RollbackOutcome::Restored {
                    self.ctx.publish(DashboardEvent::VoteRolledBack {
                        feature: Feature::Poll,
                        target: poll_id.to_string(),
                    });
                }
                Err(self.fail(err))
            }
        }
    }

    /// Current poll with optimistic counts applied; `None` until a poll
    /// exists.
    pub async fn poll(&self) -> Option<PollView> {
        let state = self.state.lock().await;
        let poll = state.poll.as_ref()?;
        let group = poll.poll_id.as_str();
        let ballot = state.reconciler.ballot(group);

        let choices: Vec<PollChoice> = poll
            .choices
            .iter()
            .map(|choice| PollChoice {
                votes: ballot.map_or(choice.votes, |b| b.tally.count(choice.id.as_str())),
                ..choice.clone()
            })
            .collect();
        let my_choice = ballot
            .and_then(|b| b.selection.as_deref())
            .map(ChoiceId::new);
        let total_votes = choices
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.votes));
        let winner = winning_choice(&choices).map(|c| c.id.clone());

        Some(PollView {
            poll_id: poll.poll_id.clone(),
            question: poll.question.clone(),
            choices: choices
                .into_iter()
                .map(|choice| PollChoiceView {
                    percentage: percentage(choice.votes, total_votes),
                    is_mine: my_choice.as_ref() == Some(&choice.id),
                    is_winning: winner.as_ref() == Some(&choice.id),
                    id: choice.id,
                    text: choice.text,
                    location: choice.location,
                    votes: choice.votes,
                })
                .collect(),
            total_votes,
            winning_choice: winner,
            my_choice,
            vote_in_flight: state.reconciler.is_in_flight(group),
        })
    }

    fn fail(&self, err: ClientError) -> ClientError {
        self.ctx.notify(Feature::Poll, err.notice());
        err
    }
}

#[cfg(test)]
#[path = "../tests/poll_tests.rs"]
mod tests;
