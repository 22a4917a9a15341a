//! Client for the third-party biometric attendance API.
//!
//! The upstream answers `POST { start_date, end_date }` (both `DD/MM/YYYY`)
//! with either a bare array of punches or `{ "data": [...] }`. It is also
//! known to answer `200 OK` with a Java/SQL stack trace as the body, so every
//! body goes through [`looks_like_error_payload`] before it is decoded.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::{Display, Error};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::model::attendance::{Punch, PunchState, SOURCE_EXTERNAL_API};
use crate::utils::date_format::{format_dmy, parse_upstream_timestamp};

/// Substrings that mark a body as an upstream failure report, not data.
const ERROR_PAYLOAD_MARKERS: [&str; 2] = ["java.sql.", "Exception"];

#[derive(Debug, Display, Error)]
pub enum UpstreamError {
    #[display(fmt = "biometric api transport failed: {}", message)]
    Transport { message: String },

    #[display(fmt = "biometric api timed out: {}", message)]
    Timeout { message: String },

    #[display(fmt = "biometric api answered status {}: {}", status, body)]
    Status { status: u16, body: String },

    #[display(fmt = "biometric api returned an error report: {}", body)]
    ErrorPayload { body: String },

    #[display(fmt = "biometric api response decode failed: {}", message)]
    Decode { message: String },
}

/// Where fresh punches come from.
#[async_trait]
pub trait PunchSource: Send + Sync {
    /// Punches for the calendar days `start..=end`, tagged `external_api`.
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Punch>, UpstreamError>;
}

/// True when `body` is the upstream's error text rather than punch data.
pub fn looks_like_error_payload(body: &str) -> bool {
    ERROR_PAYLOAD_MARKERS
        .iter()
        .any(|marker| body.contains(marker))
}

#[derive(Serialize)]
struct FetchRequest {
    start_date: String,
    end_date: String,
}

/// Device ids and verify modes arrive as numbers or strings depending on the
/// firmware; both are kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Token {
    Text(String),
    Number(serde_json::Number),
}

impl Token {
    fn into_string(self) -> String {
        match self {
            Token::Text(s) => s,
            Token::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct UpstreamPunch {
    user_id: Token,
    state: Token,
    punch_time: String,
    #[serde(default)]
    verify_mode: Option<Token>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Bare(Vec<UpstreamPunch>),
    Wrapped { data: Vec<UpstreamPunch> },
}

pub struct BiometricClient {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl BiometricClient {
    /// `accept_invalid_certs` only affects this client instance.
    pub fn new(
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        })
    }
}

#[async_trait]
impl PunchSource for BiometricClient {
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Punch>, UpstreamError> {
        let request = FetchRequest {
            start_date: format_dmy(start),
            end_date: format_dmy(end),
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            start_date = %request.start_date,
            end_date = %request.end_date,
            "Requesting punches from biometric api"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::USER_AGENT, self.client_id.as_str())
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        if looks_like_error_payload(&body) {
            return Err(UpstreamError::ErrorPayload {
                body: body_preview(&body),
            });
        }

        parse_punches(&body)
    }
}

fn parse_punches(body: &str) -> Result<Vec<Punch>, UpstreamError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| UpstreamError::Decode {
        message: e.to_string(),
    })?;

    let entries = match envelope {
        Envelope::Bare(entries) => entries,
        Envelope::Wrapped { data } => data,
    };

    let mut punches = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(punch_time) = parse_upstream_timestamp(&entry.punch_time) else {
            tracing::warn!(
                punch_time = %entry.punch_time,
                "Dropping upstream punch with unreadable timestamp"
            );
            continue;
        };

        punches.push(Punch {
            user_id: entry.user_id.into_string(),
            state: PunchState::from(entry.state.into_string().as_str()),
            punch_time,
            verify_mode: entry.verify_mode.map(Token::into_string),
            source: Some(SOURCE_EXTERNAL_API.to_string()),
        });
    }

    Ok(punches)
}

fn map_transport_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout {
            message: e.to_string(),
        }
    } else {
        UpstreamError::Transport {
            message: e.to_string(),
        }
    }
}

fn body_preview(body: &str) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
