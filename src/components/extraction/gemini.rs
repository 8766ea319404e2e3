use super::prompt::build_prompt;
use super::{Document, EventExtractor};
use crate::config::Config;
use crate::error::{extraction_error, AppResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData { inline_data: InlineData<'a> },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Event extraction through the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiExtractor {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| extraction_error(&format!("Failed to build HTTP client: {}", e)))?;

        info!("Using Gemini model: {}", config.gemini_model);

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl EventExtractor for GeminiExtractor {
    async fn extract_events(&self, document: &Document) -> AppResult<String> {
        info!(
            "Extracting events from {} ({} bytes)",
            document.file_name,
            document.bytes.len()
        );

        let prompt = build_prompt(document.kind, document.base_name(), &document.color_id);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: document.kind.mime_type(),
                            data: STANDARD.encode(&document.bytes),
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| extraction_error(&format!("Failed to send request to Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(extraction_error(&format!(
                "Gemini request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| extraction_error(&format!("Failed to parse Gemini response: {}", e)))?;

        let text = response_text(body)?;
        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }
}

/// Concatenate the text parts of the first candidate
fn response_text(body: GenerateResponse) -> AppResult<String> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| extraction_error("Gemini returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(extraction_error("Gemini returned an empty response"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::extraction::Document;
    use crate::error::Error;

    fn extractor(api_base: String) -> GeminiExtractor {
        let mut config = crate::config::test_config();
        config.gemini_api_base = api_base;
        GeminiExtractor::new(&config).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: STANDARD.encode(b"png"),
                        },
                    },
                    Part::Text {
                        text: "prompt".to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(value["contents"][0]["parts"][0]["inline_data"]["data"], "cG5n");
        assert_eq!(value["contents"][0]["parts"][1]["text"], "prompt");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "```json\n["}, {"text": "]\n```"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(body).unwrap(), "```json\n[]\n```");
    }

    #[test]
    fn test_response_without_candidates() {
        let body: GenerateResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(matches!(response_text(body), Err(Error::Extraction(_))));
    }

    #[tokio::test]
    async fn test_extract_events_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/gemini-flash-latest:generateContent")
            .match_header("x-goog-api-key", "test_gemini_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [{"content": {"parts": [{"text": "[{\"summary\": \"Quiz\"}]"}]}}]}"#,
            )
            .create_async()
            .await;

        let document = Document::new("CS101.png", b"fake image".to_vec(), "4").unwrap();
        let text = extractor(server.url()).extract_events(&document).await.unwrap();

        assert_eq!(text, r#"[{"summary": "Quiz"}]"#);
    }

    #[tokio::test]
    async fn test_extract_events_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/gemini-flash-latest:generateContent")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let document = Document::new("CS101.pdf", b"%PDF".to_vec(), "4").unwrap();
        let result = extractor(server.url()).extract_events(&document).await;

        assert!(matches!(result, Err(Error::Extraction(_))));
    }
}
