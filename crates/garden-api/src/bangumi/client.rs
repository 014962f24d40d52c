use reqwest::Client;

use super::types::RelatedPerson;
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.bgm.tv";
const USER_AGENT: &str = "him188/animation-garden";

/// Bangumi v0 API client.
pub struct BangumiClient {
    http: Client,
    base_url: String,
}

impl BangumiClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Persons credited on a subject.
    pub async fn subject_persons(&self, subject_id: i64) -> Result<Vec<RelatedPerson>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/v0/subjects/{subject_id}/persons")))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;
        handle_response(response).await
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    decode(&body)
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| ApiError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}
