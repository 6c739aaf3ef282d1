use pollcast_models::{Poll, VoteStatus};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("identity file: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Server error code such as `DUPLICATE_VOTE`, when the server sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePollBody<'a> {
    question: &'a str,
    options: &'a [String],
    allow_multiple_answers: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteBody<'a> {
    user_id: &'a str,
    option_indices: &'a [i64],
}

/// HTTP client for the pollcast REST API.
#[derive(Debug, Clone)]
pub struct PollClient {
    http: Client,
    base: Url,
}

impl PollClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("pollcast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    pub async fn list_polls(&self) -> Result<Vec<Poll>, ClientError> {
        let resp = self.http.get(self.endpoint(&["api", "polls"])?).send().await?;
        decode(resp).await
    }

    pub async fn get_poll(&self, poll_id: &str) -> Result<Poll, ClientError> {
        let resp = self
            .http
            .get(self.endpoint(&["api", "polls", poll_id])?)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn create_poll(
        &self,
        question: &str,
        options: &[String],
        allow_multiple_answers: bool,
    ) -> Result<Poll, ClientError> {
        let resp = self
            .http
            .post(self.endpoint(&["api", "polls"])?)
            .json(&CreatePollBody {
                question,
                options,
                allow_multiple_answers,
            })
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn vote(
        &self,
        poll_id: &str,
        user_id: &str,
        option_indices: &[i64],
    ) -> Result<Poll, ClientError> {
        let resp = self
            .http
            .post(self.endpoint(&["api", "polls", poll_id, "vote"])?)
            .json(&VoteBody {
                user_id,
                option_indices,
            })
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn check_vote(&self, poll_id: &str, user_id: &str) -> Result<VoteStatus, ClientError> {
        let resp = self
            .http
            .get(self.endpoint(&["api", "polls", poll_id, "check-vote", user_id])?)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn health(&self) -> Result<bool, ClientError> {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }
        let resp = self.http.get(self.endpoint(&["health"])?).send().await?;
        let health: Health = decode(resp).await?;
        Ok(health.status == "healthy")
    }

    /// Segments are percent-encoded, so ids and voter names cannot escape their slot.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        code: body.code.unwrap_or_else(|| "HTTP_ERROR".to_string()),
        message: body
            .message
            .or(body.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
    })
}
