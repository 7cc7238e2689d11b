//! In-memory [`EventApi`] shared by board and dashboard tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::EventId,
    protocol::{
        AddExpenseRequest, CreateEventRequest, CreateEventResponse, CreatePollRequest,
        CreateSlotRequest, CreateSlotResponse, PollVoteRequest, SlotPayload, SlotVoteRequest,
        SummaryPayload,
    },
};
use tokio::sync::oneshot;

use crate::{api::EventApi, error::ClientError};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Status(u16),
    Unreachable,
}

impl Failure {
    fn into_error(self) -> ClientError {
        match self {
            Self::Status(status) => ClientError::from_status(status, "rejected by fake"),
            Self::Unreachable => ClientError::Transport("connection refused".into()),
        }
    }
}

type Gate = (oneshot::Sender<()>, oneshot::Receiver<()>);

pub(crate) struct FakeEventApi {
    summary: Mutex<Value>,
    summary_failure: Mutex<Option<Failure>>,
    write_failure: Mutex<Option<Failure>>,
    vote_gate: Mutex<Option<Gate>>,
    created_slot: Mutex<Option<SlotPayload>>,
    summary_fetches: AtomicUsize,
    pub created_events: Mutex<Vec<CreateEventRequest>>,
    pub expenses: Mutex<Vec<AddExpenseRequest>>,
    pub polls: Mutex<Vec<CreatePollRequest>>,
    pub poll_votes: Mutex<Vec<PollVoteRequest>>,
    pub slots: Mutex<Vec<CreateSlotRequest>>,
    pub slot_votes: Mutex<Vec<SlotVoteRequest>>,
    pub reminders: AtomicUsize,
}

impl FakeEventApi {
    pub(crate) fn new(summary: Value) -> Self {
        Self {
            summary: Mutex::new(summary),
            summary_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
            vote_gate: Mutex::new(None),
            created_slot: Mutex::new(None),
            summary_fetches: AtomicUsize::new(0),
            created_events: Mutex::new(Vec::new()),
            expenses: Mutex::new(Vec::new()),
            polls: Mutex::new(Vec::new()),
            poll_votes: Mutex::new(Vec::new()),
            slots: Mutex::new(Vec::new()),
            slot_votes: Mutex::new(Vec::new()),
            reminders: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_summary(&self, summary: Value) {
        *self.summary.lock().expect("summary lock") = summary;
    }

    pub(crate) fn fail_summary(&self, failure: Option<Failure>) {
        *self.summary_failure.lock().expect("failure lock") = failure;
    }

    /// Every mutating call fails with `failure` until reset with `None`.
    pub(crate) fn fail_writes(&self, failure: Option<Failure>) {
        *self.write_failure.lock().expect("failure lock") = failure;
    }

    pub(crate) fn echo_created_slot(&self, slot: SlotPayload) {
        *self.created_slot.lock().expect("slot lock") = Some(slot);
    }

    /// Parks the next vote inside the fake. The first receiver fires once the
    /// vote arrived; the vote completes when the sender is used or dropped.
    pub(crate) fn hold_next_vote(&self) -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.vote_gate.lock().expect("gate lock") = Some((entered_tx, release_rx));
        (release_tx, entered_rx)
    }

    pub(crate) fn summary_fetches(&self) -> usize {
        self.summary_fetches.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), ClientError> {
        match *self.write_failure.lock().expect("failure lock") {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    async fn pass_vote_gate(&self) {
        let gate = self.vote_gate.lock().expect("gate lock").take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.await;
        }
    }
}

fn record<T: Clone>(log: &Mutex<Vec<T>>, item: &T) {
    log.lock().expect("log lock").push(item.clone());
}

#[async_trait]
impl EventApi for FakeEventApi {
    async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<CreateEventResponse, ClientError> {
        self.check_write()?;
        record(&self.created_events, request);
        Ok(CreateEventResponse {
            event_id: EventId::new("42"),
        })
    }

    async fn fetch_summary(&self, _event_id: &EventId) -> Result<SummaryPayload, ClientError> {
        self.summary_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.summary_failure.lock().expect("failure lock") {
            return Err(failure.into_error());
        }
        let raw = self.summary.lock().expect("summary lock").clone();
        serde_json::from_value(raw).map_err(|err| ClientError::Server {
            status: Some(200),
            message: err.to_string(),
        })
    }

    async fn add_expense(
        &self,
        _event_id: &EventId,
        request: &AddExpenseRequest,
    ) -> Result<(), ClientError> {
        self.check_write()?;
        record(&self.expenses, request);
        Ok(())
    }

    async fn create_poll(
        &self,
        _event_id: &EventId,
        request: &CreatePollRequest,
    ) -> Result<(), ClientError> {
        self.check_write()?;
        record(&self.polls, request);
        Ok(())
    }

    async fn vote_poll(
        &self,
        _event_id: &EventId,
        request: &PollVoteRequest,
    ) -> Result<(), ClientError> {
        record(&self.poll_votes, request);
        self.pass_vote_gate().await;
        self.check_write()
    }

    async fn create_slot(
        &self,
        _event_id: &EventId,
        request: &CreateSlotRequest,
    ) -> Result<CreateSlotResponse, ClientError> {
        self.check_write()?;
        record(&self.slots, request);
        Ok(CreateSlotResponse {
            slot: self.created_slot.lock().expect("slot lock").take(),
        })
    }

    async fn vote_slot(
        &self,
        _event_id: &EventId,
        request: &SlotVoteRequest,
    ) -> Result<(), ClientError> {
        record(&self.slot_votes, request);
        self.pass_vote_gate().await;
        self.check_write()
    }

    async fn send_reminder(&self, _event_id: &EventId) -> Result<(), ClientError> {
        self.check_write()?;
        self.reminders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
