use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CollaboratorError;
use crate::config::ResponderConfig;

/// Reply used whenever the generator fails, times out or returns nothing.
pub const FALLBACK_REPLY: &str = "I'm here for you. How have you been feeling?";

const SYSTEM_INSTRUCTION: &str = "You are an empathetic HOSPITAL mental health assistant.\n\
NEVER diagnose. 1-2 sentences MAX. Warm tone.";

/// Opaque text generation capability.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

#[async_trait]
impl<G> ResponseGenerator for Arc<G>
where
    G: ResponseGenerator + ?Sized,
{
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        (**self).generate(prompt).await
    }
}

/// Generator used when no model endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl ResponseGenerator for OfflineGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "response generation disabled".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(config: &ResponderConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| CollaboratorError::Unavailable(format!("http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ResponseGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| CollaboratorError::Unavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| CollaboratorError::Unavailable(err.to_string()))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| CollaboratorError::InvalidResponse(err.to_string()))?;

        Ok(body.response.trim().to_string())
    }
}

/// Prompt wrapper that bounds the generator call and masks every failure
/// behind [`FALLBACK_REPLY`].
pub struct Responder<G> {
    generator: G,
    timeout: Duration,
}

impl<G> Responder<G>
where
    G: ResponseGenerator,
{
    pub fn new(generator: G, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn prompt_for(text: &str) -> String {
        format!("{SYSTEM_INSTRUCTION}\n\nUser: {text}")
    }

    /// Always resolves to a reply. Never fails.
    pub async fn respond(&self, text: &str) -> String {
        let prompt = Self::prompt_for(text);
        let outcome = match tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::TimedOut(self.timeout.as_millis())),
        };

        match outcome.map(|reply| reply.trim().to_string()) {
            Ok(reply) if !reply.is_empty() => reply,
            Ok(_) => {
                tracing::warn!("response generator returned an empty reply; using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(error) => {
                tracing::warn!(%error, "response generator failed; using fallback");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ResponseGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
            Ok(format!("  echo: {}  ", prompt.lines().last().unwrap_or_default()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl ResponseGenerator for Stalled {
        async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn prompt_embeds_instruction_and_user_text() {
        let prompt = Responder::<OfflineGenerator>::prompt_for("rough week");
        assert!(prompt.starts_with("You are an empathetic HOSPITAL"));
        assert!(prompt.contains("NEVER diagnose"));
        assert!(prompt.ends_with("User: rough week"));
    }

    #[tokio::test]
    async fn passes_through_trimmed_reply() {
        let responder = Responder::new(Echo, Duration::from_secs(1));
        assert_eq!(responder.respond("hello").await, "echo: User: hello");
    }

    #[tokio::test]
    async fn failures_fall_back_to_static_reply() {
        let responder = Responder::new(OfflineGenerator, Duration::from_secs(1));
        assert_eq!(responder.respond("hello").await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn timeouts_fall_back_to_static_reply() {
        let responder = Responder::new(Stalled, Duration::from_millis(50));
        assert_eq!(responder.respond("hello").await, FALLBACK_REPLY);
    }
}
