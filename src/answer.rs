use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AnswerError;

#[derive(Serialize)]
struct QueryRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    response: Option<String>,
    // The backend reports handler exceptions here, still with a 200 status
    #[serde(default)]
    error: Option<String>,
}

/// Something that maps a free-text question to an optional reply.
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// `Ok(None)` means the service answered but had nothing to say.
    async fn ask(&self, input: &str) -> Result<Option<String>, AnswerError>;
}

#[derive(Clone, Debug)]
pub struct AnswerClient {
    client: Client,
    endpoint: Url,
}

impl AnswerClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Probe the root of the service's origin. Any 2xx counts as online.
    pub async fn health(&self) -> bool {
        let root = match self.endpoint.join("/") {
            Ok(url) => url,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Could not derive health URL");
                return false;
            }
        };

        let online = match self.client.get(root.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %root, error = %e, "Health probe failed");
                false
            }
        };

        info!(url = %root, online, "Answer service health probed");
        online
    }
}

#[async_trait]
impl AnswerService for AnswerClient {
    async fn ask(&self, input: &str) -> Result<Option<String>, AnswerError> {
        debug!(endpoint = %self.endpoint, chars = input.chars().count(), "Sending question");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&QueryRequest { input })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnswerError::Status(response.status()));
        }

        let body = response.text().await?;
        let parsed: QueryResponse = serde_json::from_str(&body)?;

        if let Some(error) = parsed.error {
            warn!(error = %error, "Answer service reported an error");
        }

        Ok(parsed.response)
    }
}
