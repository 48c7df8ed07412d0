use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{ProviderMetadata, TranslateError, Translation, Translator};

const PROVIDER: &str = "gemini";

/// Google Gemini `generateContent` client
pub struct GeminiTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl GeminiTranslator {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(&self, text: &str) -> GenerateRequest {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: self.system_prompt.clone(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: format!("Text to Translate:\n{text}"),
                }],
            }],
        }
    }
}

#[async_trait::async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        if self.api_key.trim().is_empty() {
            return Err(TranslateError::AuthenticationError);
        }

        tracing::debug!("Translating {} chars with {}", text.len(), self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| TranslateError::ApiError(format!("unexpected response: {e}")))?;

        Ok(Translation {
            text: parsed.into_text()?,
            provider: PROVIDER.to_string(),
            model: self.model.clone(),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: PROVIDER.to_string(),
            requires_api_key: true,
            free_tier_available: true,
        }
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), TranslateError> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TranslateError::AuthenticationError),
        StatusCode::TOO_MANY_REQUESTS => Err(TranslateError::RateLimitExceeded),
        _ => {
            let message = serde_json::from_str::<ErrorResponse>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            Err(TranslateError::ApiError(format!("{status}: {message}")))
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, TranslateError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            Err(TranslateError::EmptyResponse)
        } else {
            Ok(text.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator(api_key: &str) -> GeminiTranslator {
        GeminiTranslator::new(
            "https://example.invalid/v1beta/",
            api_key,
            "gemini-test",
            "Translate to Korean.",
        )
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            translator("k").endpoint(),
            "https://example.invalid/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(translator("k").request_body("Hello")).unwrap();
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Translate to Korean."
        );
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Text to Translate:\nHello"
        );
    }

    #[test]
    fn test_response_parts_joined() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":" 안녕 "},{"text":"하세요\n"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "안녕 하세요");
    }

    #[test]
    fn test_empty_response() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            response.into_text(),
            Err(TranslateError::EmptyResponse)
        ));

        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.into_text(),
            Err(TranslateError::EmptyResponse)
        ));
    }

    #[test]
    fn test_error_status_mapping() {
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, ""),
            Err(TranslateError::AuthenticationError)
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS, ""),
            Err(TranslateError::RateLimitExceeded)
        ));

        let body = r#"{"error":{"code":400,"message":"model not found","status":"INVALID_ARGUMENT"}}"#;
        match check_status(StatusCode::BAD_REQUEST, body) {
            Err(TranslateError::ApiError(message)) => assert!(message.contains("model not found")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_status(StatusCode::OK, "").is_ok());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let result = translator("  ").translate("Hello").await;
        assert!(matches!(result, Err(TranslateError::AuthenticationError)));
    }
}
