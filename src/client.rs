//! Typed HTTP client for the incident tracker REST API.

use crate::models::{CreateIncident, Incident, IncidentSource, IncidentStatus};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("{status} {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// Connection, timeout or body decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Client for one incident tracker endpoint
#[derive(Clone)]
pub struct IncidentClient {
    client: Client,
    endpoint: String,
}

impl IncidentClient {
    pub fn new(endpoint: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    pub async fn create(
        &self,
        description: impl Into<String>,
        source: IncidentSource,
    ) -> ClientResult<Incident> {
        let body = CreateIncident {
            description: description.into(),
            source,
        };
        send(self.client.post(self.url("/incidents/")).json(&body)).await
    }

    pub async fn list(&self, status: Option<IncidentStatus>) -> ClientResult<Vec<Incident>> {
        let mut request = self.client.get(self.url("/incidents/"));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        send(request).await
    }

    pub async fn get(&self, id: Uuid) -> ClientResult<Incident> {
        send(self.client.get(self.url(&format!("/incidents/{}", id)))).await
    }

    pub async fn update_status(&self, id: Uuid, status: IncidentStatus) -> ClientResult<Incident> {
        send(
            self.client
                .patch(self.url(&format!("/incidents/{}/status", id)))
                .json(&json!({ "status": status })),
        )
        .await
    }

    pub async fn update_description(
        &self,
        id: Uuid,
        new_description: impl Into<String>,
    ) -> ClientResult<Incident> {
        send(
            self.client
                .patch(self.url(&format!("/incidents/{}/description", id)))
                .json(&json!({ "new_description": new_description.into() })),
        )
        .await
    }

    /// Returns the server's confirmation body
    pub async fn delete(&self, id: Uuid) -> ClientResult<Value> {
        send(self.client.delete(self.url(&format!("/incidents/{}", id)))).await
    }

    pub async fn health(&self) -> ClientResult<Value> {
        send(self.client.get(self.url("/health"))).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await?;
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => ("UNKNOWN".to_string(), text),
    };

    tracing::debug!(status = status.as_u16(), code = %code, "API request failed");
    Err(ClientError::Api {
        status,
        code,
        message,
    })
}
