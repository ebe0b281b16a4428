//! HTTP client for the flashcard backend.
//!
//! [`FlashcardBackend`] is the seam the pipeline consumes; [`HttpBackend`]
//! is the reqwest implementation. Non-2xx responses are classified into the
//! [`ApiError`] taxonomy from the status code, the `Retry-After` header,
//! and the backend's `{error, message}` body shape.

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use cardgen_core::timing::parse_retry_after;
use cardgen_core::types::{Flashcard, FlashcardSource, Generation};

use crate::error::ApiError;

/// Fixed page size for listing flashcards (the contract maximum).
const LIST_PAGE_SIZE: u32 = 100;

/// One flashcard to create, as the pipeline hands it to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct CreateFlashcardInput {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<i64>,
}

/// The remote operations the generation pipeline depends on.
///
/// Implemented by [`HttpBackend`] in production and by scripted mocks in
/// tests.
#[allow(async_fn_in_trait)]
pub trait FlashcardBackend {
    /// Submit source text for proposal generation.
    async fn generate_proposals(&self, source_text: &str) -> Result<Generation, ApiError>;

    /// Persist a single flashcard (sent as a batch of one).
    async fn create_flashcard(&self, input: &CreateFlashcardInput) -> Result<Flashcard, ApiError>;

    /// List the caller's existing flashcards for duplicate detection.
    ///
    /// Best-effort: implementations may return a partial list rather than
    /// fail, and callers must tolerate an error by skipping deduplication.
    async fn list_existing_flashcards(
        &self,
        generation_id: Option<i64>,
    ) -> Result<Vec<Flashcard>, ApiError>;
}

// === Wire types ===

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    source_text: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateFlashcardsRequest<'a> {
    flashcards: &'a [CreateFlashcardInput],
}

#[derive(Debug, Serialize)]
struct UpdateFlashcardRequest<'a> {
    front: &'a str,
    back: &'a str,
}

#[derive(Debug, Deserialize)]
struct FlashcardListResponse {
    data: Vec<Flashcard>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[allow(dead_code)]
    page: u32,
    #[allow(dead_code)]
    limit: u32,
    #[allow(dead_code)]
    total: u64,
    #[allow(dead_code)]
    total_pages: u32,
    has_next: bool,
    #[allow(dead_code)]
    has_prev: bool,
}

/// Error body shape the backend emits on non-2xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: Option<String>,
    message: Option<String>,
    details: Option<serde_json::Value>,
}

/// Map a non-2xx response into the error taxonomy.
fn classify_status(status: u16, retry_after: Option<&str>, body: &str) -> ApiError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 => ApiError::Authentication,
        429 => ApiError::RateLimited {
            retry_after_secs: parse_retry_after(retry_after, Utc::now()),
        },
        503 => ApiError::ServiceUnavailable,
        400 => ApiError::Validation {
            message,
            details: parsed.and_then(|b| b.details),
        },
        _ => ApiError::Unexpected { status, message },
    }
}

/// Reqwest-backed implementation of [`FlashcardBackend`].
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token for authenticated calls.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a response into `Ok` or a classified [`ApiError`].
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after.as_deref(), &body))
    }

    /// Update one flashcard's text. Not part of the pipeline seam; hosts
    /// use it for post-save edits.
    pub async fn update_flashcard(
        &self,
        id: i64,
        front: &str,
        back: &str,
    ) -> Result<Flashcard, ApiError> {
        let url = format!("{}/api/flashcards/{}", self.base_url, id);
        let request = UpdateFlashcardRequest { front, back };

        let resp = self
            .authorize(self.client.put(&url).json(&request))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let resp = Self::check(resp).await?;

        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Delete one flashcard by id.
    pub async fn delete_flashcard(&self, id: i64) -> Result<(), ApiError> {
        let url = format!("{}/api/flashcards/{}", self.base_url, id);

        let resp = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn fetch_page(
        &self,
        page: u32,
        generation_id: Option<i64>,
    ) -> Result<FlashcardListResponse, ApiError> {
        let url = format!("{}/api/flashcards", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("page", page.to_string()), ("limit", LIST_PAGE_SIZE.to_string())])
            .query(&[("sort", "created_at")]);
        if let Some(id) = generation_id {
            request = request.query(&[("generation_id", id.to_string())]);
        }

        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let resp = Self::check(resp).await?;

        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl FlashcardBackend for HttpBackend {
    async fn generate_proposals(&self, source_text: &str) -> Result<Generation, ApiError> {
        let url = format!("{}/api/generations", self.base_url);
        let request = GenerateRequest { source_text };

        let resp = self
            .authorize(self.client.post(&url).json(&request))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let resp = Self::check(resp).await?;

        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn create_flashcard(&self, input: &CreateFlashcardInput) -> Result<Flashcard, ApiError> {
        let url = format!("{}/api/flashcards", self.base_url);
        let batch = [input.clone()];
        let request = CreateFlashcardsRequest { flashcards: &batch };

        let resp = self
            .authorize(self.client.post(&url).json(&request))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let resp = Self::check(resp).await?;

        let created: Vec<Flashcard> =
            resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Parse("server returned no flashcards".to_string()))
    }

    /// Pages through the list endpoint until the server signals the end.
    ///
    /// Any page failure is logged and swallowed; the rows accumulated so
    /// far are returned so deduplication degrades instead of blocking a
    /// save.
    async fn list_existing_flashcards(
        &self,
        generation_id: Option<i64>,
    ) -> Result<Vec<Flashcard>, ApiError> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            match self.fetch_page(page, generation_id).await {
                Ok(resp) => {
                    all.extend(resp.data);
                    if !resp.pagination.has_next {
                        break;
                    }
                    page += 1;
                }
                Err(err) => {
                    tracing::warn!(page, error = %err, "flashcard list page failed; continuing with partial list");
                    break;
                }
            }
        }

        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_auth() {
        assert!(matches!(classify_status(401, None, ""), ApiError::Authentication));
    }

    #[test]
    fn classify_rate_limit_reads_header() {
        match classify_status(429, Some("120"), "") {
            ApiError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 120),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn classify_rate_limit_defaults_without_header() {
        match classify_status(429, None, "") {
            ApiError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 60),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn classify_service_unavailable() {
        assert!(matches!(
            classify_status(503, None, ""),
            ApiError::ServiceUnavailable
        ));
    }

    #[test]
    fn classify_validation_extracts_message_and_details() {
        let body = r#"{"error":"bad_request","message":"source_text too short","details":{"source_text":"min 1000"}}"#;
        match classify_status(400, None, body) {
            ApiError::Validation { message, details } => {
                assert_eq!(message, "source_text too short");
                assert!(details.unwrap().get("source_text").is_some());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn classify_other_statuses_carry_status_and_body() {
        match classify_status(500, None, "internal") {
            ApiError::Unexpected { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn create_input_serializes_wire_source() {
        let input = CreateFlashcardInput {
            front: "Q".to_string(),
            back: "A".to_string(),
            source: FlashcardSource::AiEdited,
            generation_id: Some(3),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["source"], "ai-edited");
        assert_eq!(json["generation_id"], 3);
    }
}
