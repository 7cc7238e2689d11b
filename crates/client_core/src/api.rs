use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::EventId,
    error::ErrorBody,
    protocol::{
        AddExpenseRequest, CreateEventRequest, CreateEventResponse, CreatePollRequest,
        CreateSlotRequest, CreateSlotResponse, PollVoteRequest, SlotVoteRequest, SummaryPayload,
    },
};
use tracing::{debug, warn};

use crate::{config::Settings, error::ClientError};

/// Remote operations of the event backend. Boards only ever talk to this
/// trait so tests can swap in an in-memory implementation.
#[async_trait]
pub trait EventApi: Send + Sync {
    async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<CreateEventResponse, ClientError>;
    async fn fetch_summary(&self, event_id: &EventId) -> Result<SummaryPayload, ClientError>;
    async fn add_expense(
        &self,
        event_id: &EventId,
        request: &AddExpenseRequest,
    ) -> Result<(), ClientError>;
    async fn create_poll(
        &self,
        event_id: &EventId,
        request: &CreatePollRequest,
    ) -> Result<(), ClientError>;
    async fn vote_poll(
        &self,
        event_id: &EventId,
        request: &PollVoteRequest,
    ) -> Result<(), ClientError>;
    /// The response may or may not carry the created slot.
    async fn create_slot(
        &self,
        event_id: &EventId,
        request: &CreateSlotRequest,
    ) -> Result<CreateSlotResponse, ClientError>;
    async fn vote_slot(
        &self,
        event_id: &EventId,
        request: &SlotVoteRequest,
    ) -> Result<(), ClientError>;
    async fn send_reminder(&self, event_id: &EventId) -> Result<(), ClientError>;
}

pub struct HttpEventApi {
    http: Client,
    base_url: String,
}

impl HttpEventApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Transport(format!("http client setup failed: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(settings.api_base()?, settings.request_timeout())?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn event_url(&self, event_id: &EventId, path: &str) -> String {
        format!("{}/events/{event_id}{path}", self.base_url)
    }

    async fn post<B: Serialize + Sync>(&self, url: String, body: &B) -> Result<Response, ClientError> {
        debug!(%url, "event api POST");
        let response = self.http.post(&url).json(body).send().await?;
        ensure_success(&url, response).await
    }
}

async fn ensure_success(url: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());
    warn!(%url, status = status.as_u16(), %message, "event api request rejected");
    Err(ClientError::from_status(status.as_u16(), message))
}

async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ClientError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| {
        warn!(%url, status, error = %err, "event api returned an undecodable body");
        ClientError::Server {
            status: Some(status),
            message: format!("undecodable response: {err}"),
        }
    })
}

#[async_trait]
impl EventApi for HttpEventApi {
    async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<CreateEventResponse, ClientError> {
        let url = format!("{}/events", self.base_url);
        let response = self.post(url.clone(), request).await?;
        decode(&url, response).await
    }

    async fn fetch_summary(&self, event_id: &EventId) -> Result<SummaryPayload, ClientError> {
        let url = self.event_url(event_id, "/summary");
        debug!(%url, "event api GET");
        let response = self.http.get(&url).send().await?;
        let response = ensure_success(&url, response).await?;
        decode(&url, response).await
    }

    async fn add_expense(
        &self,
        event_id: &EventId,
        request: &AddExpenseRequest,
    ) -> Result<(), ClientError> {
        self.post(self.event_url(event_id, "/expense"), request)
            .await
            .map(drop)
    }

    async fn create_poll(
        &self,
        event_id: &EventId,
        request: &CreatePollRequest,
    ) -> Result<(), ClientError> {
        self.post(self.event_url(event_id, "/poll"), request)
            .await
            .map(drop)
    }

    async fn vote_poll(
        &self,
        event_id: &EventId,
        request: &PollVoteRequest,
    ) -> Result<(), ClientError> {
        self.post(self.event_url(event_id, "/vote"), request)
            .await
            .map(drop)
    }

    async fn create_slot(
        &self,
        event_id: &EventId,
        request: &CreateSlotRequest,
    ) -> Result<CreateSlotResponse, ClientError> {
        let url = self.event_url(event_id, "/slots");
        let response = self.post(url.clone(), request).await?;
        let bytes = response.bytes().await?;
        // Older backends answer with an empty or non-JSON body; the caller
        // then falls back to a placeholder slot until the next refresh.
        match serde_json::from_slice::<CreateSlotResponse>(&bytes) {
            Ok(created) => Ok(created),
            Err(err) => {
                debug!(%url, error = %err, "slot creation response carried no slot");
                Ok(CreateSlotResponse::default())
            }
        }
    }

    async fn vote_slot(
        &self,
        event_id: &EventId,
        request: &SlotVoteRequest,
    ) -> Result<(), ClientError> {
        self.post(self.event_url(event_id, "/vote-slot"), request)
            .await
            .map(drop)
    }

    async fn send_reminder(&self, event_id: &EventId) -> Result<(), ClientError> {
        self.post(self.event_url(event_id, "/remind"), &serde_json::json!({}))
            .await
            .map(drop)
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
