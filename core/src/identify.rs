//! Client for the remote vision-identification service.
//!
//! One scan attempt issues at most one `generateContent` request. Every
//! success or failure mode of that request is normalized into a typed
//! [`IdentificationOutcome`] so the orchestrator can apply its reconciliation
//! table without inspecting HTTP details.

use crate::capture::CapturedImage;
use crate::credential::Credential;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Fixed instruction sent alongside every frame. The service is asked for a
/// strict JSON object so the answer can be parsed without heuristics.
const IDENTIFY_PROMPT: &str = "Identify the retail product in this image. Respond with a strict \
JSON object containing exactly the keys \"name\", \"brand\", \"price\" and \"confidence\". \
Format price like \"$170.00\" and confidence like \"98%\". Respond with the JSON object only.";

/// Fields copied verbatim from the service's parsed JSON answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductIdentification {
    pub name: String,
    pub brand: String,
    pub price: String,
    pub confidence: String,
}

/// Result of one identification attempt. Exactly one variant is populated;
/// there is never both data and an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentificationOutcome {
    Success(ProductIdentification),
    Failure(IdentifyFailure),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifyFailure {
    #[error("no identification credential is available")]
    CredentialMissing,
    #[error("the identification credential was rejected by the service")]
    CredentialInvalid,
    #[error("identification service failure: {0}")]
    Service(String),
    #[error("identification response could not be interpreted: {0}")]
    MalformedResponse(String),
}

pub struct IdentifyClient {
    http: Client,
    endpoint: String,
}

impl Default for IdentifyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifyClient {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Identifies the product in `image`.
    ///
    /// Without a credential this short-circuits to
    /// `Failure(CredentialMissing)` and performs no network activity at all.
    /// With one, exactly one request is issued; there are no retries.
    pub async fn identify(
        &self,
        image: &CapturedImage,
        credential: Option<&Credential>,
    ) -> IdentificationOutcome {
        let Some(credential) = credential else {
            return IdentificationOutcome::Failure(IdentifyFailure::CredentialMissing);
        };

        let request = GenerateContentRequest::for_image(image);
        debug!(endpoint = %self.endpoint, "sending identification request");
        let response = match self
            .http
            .post(&self.endpoint)
            .query(&[("key", credential.expose())])
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return IdentificationOutcome::Failure(IdentifyFailure::Service(err.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return IdentificationOutcome::Failure(IdentifyFailure::Service(format!(
                    "failed to read response body: {err}"
                )));
            }
        };

        if !status.is_success() {
            if is_invalid_key_body(&body) {
                return IdentificationOutcome::Failure(IdentifyFailure::CredentialInvalid);
            }
            return IdentificationOutcome::Failure(IdentifyFailure::Service(format!(
                "status {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: GenerateContentResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                return IdentificationOutcome::Failure(IdentifyFailure::MalformedResponse(
                    format!("unexpected response shape: {err}"),
                ));
            }
        };
        let Some(text) = parsed.candidate_text() else {
            return IdentificationOutcome::Failure(IdentifyFailure::MalformedResponse(
                "no textual candidate in response".to_string(),
            ));
        };

        // The service sometimes wraps its JSON answer in a markdown fence.
        match serde_json::from_str::<ProductIdentification>(strip_code_fences(text)) {
            Ok(product) => {
                debug!(name = %product.name, brand = %product.brand, "identification succeeded");
                IdentificationOutcome::Success(product)
            }
            Err(err) => IdentificationOutcome::Failure(IdentifyFailure::MalformedResponse(
                format!("candidate text is not the expected JSON: {err}"),
            )),
        }
    }
}

fn is_invalid_key_body(body: &str) -> bool {
    body.contains("API_KEY_INVALID") || body.contains("API key not valid")
}

/// Strips a surrounding markdown code fence (with an optional `json` language
/// tag) so fenced and bare answers parse identically.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn for_image(image: &CapturedImage) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(IDENTIFY_PROMPT.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: image.base64_data().to_string(),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn candidate_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
