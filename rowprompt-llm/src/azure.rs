//! Azure OpenAI chat client
//!
//! Every configuration value is kept exactly as given so that callers (and
//! tracing) can read back what the client was built with.

use std::fmt;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use rowprompt_core::{RowpromptError, Runnable, StreamEvent};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::Instrument;
use url::Url;

use crate::openai_compatible::{ChatCompletionRequest, ChatCompletionResponse, OpenAiError};
use crate::{LlmRequest, LlmResponse};

pub const API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
pub const ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_VERSION_ENV: &str = "OPENAI_API_VERSION";
pub const OPENAI_API_BASE_ENV: &str = "OPENAI_API_BASE";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Parameters reported to tracing backends for each call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LsParams {
    pub ls_provider: String,
    pub ls_model_name: String,
    pub ls_model_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ls_temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ls_max_tokens: Option<u32>,
}

#[derive(Clone)]
pub struct AzureChatClient {
    http: Client,
    api_key: Option<SecretString>,
    azure_endpoint: String,
    deployment_name: String,
    api_version: String,
    model_name: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Duration,
}

#[derive(Clone, Default)]
pub struct AzureChatClientBuilder {
    api_key: Option<SecretString>,
    azure_endpoint: Option<String>,
    azure_deployment: Option<String>,
    api_version: Option<String>,
    model_name: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    openai_api_base: Option<String>,
    ignore_openai_api_base: bool,
}

impl AzureChatClient {
    pub fn builder() -> AzureChatClientBuilder {
        AzureChatClientBuilder::default()
    }

    /// A builder pre-filled from the standard Azure OpenAI environment variables.
    pub fn from_env() -> AzureChatClientBuilder {
        AzureChatClientBuilder::default()
            .api_key_from_env(API_KEY_ENV)
            .azure_endpoint_from_env(ENDPOINT_ENV)
            .api_version_from_env(API_VERSION_ENV)
            .openai_api_base_from_env(OPENAI_API_BASE_ENV)
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    pub fn azure_endpoint(&self) -> &str {
        &self.azure_endpoint
    }

    pub fn deployment_name(&self) -> &str {
        &self.deployment_name
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn ls_params(&self) -> LsParams {
        LsParams {
            ls_provider: "azure".to_string(),
            ls_model_name: self
                .model_name
                .clone()
                .unwrap_or_else(|| self.deployment_name.clone()),
            ls_model_type: "chat".to_string(),
            ls_temperature: self.temperature,
            ls_max_tokens: self.max_tokens,
        }
    }

    pub fn completions_url(&self) -> Result<Url, RowpromptError> {
        let base = self.azure_endpoint.trim_end_matches('/');
        let mut url = Url::parse(&format!(
            "{base}/openai/deployments/{}/chat/completions",
            self.deployment_name
        ))
        .map_err(|err| {
            RowpromptError::InvalidConfig(format!(
                "azure_endpoint '{}' is not a valid URL: {err}",
                self.azure_endpoint
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn complete(&self, input: LlmRequest) -> Result<LlmResponse, RowpromptError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            RowpromptError::InvalidConfig("api_key is required to call Azure OpenAI".to_string())
        })?;
        let url = self.completions_url()?;
        let request = ChatCompletionRequest {
            model: None,
            messages: input.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(url)
            .header("api-key", api_key.expose_secret().as_str())
            .json(&request)
            .send()
            .await
            .map_err(|err| RowpromptError::LlmProvider(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            tracing::warn!(status = %status, "azure chat completion failed");
            return Err(RowpromptError::LlmProvider(format!("{status}: {message}")));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| RowpromptError::LlmProvider(err.to_string()))?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RowpromptError::LlmProvider("no choices returned".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }
}

impl fmt::Debug for AzureChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureChatClient")
            .field("api_key", &redacted(&self.api_key))
            .field("azure_endpoint", &self.azure_endpoint)
            .field("deployment_name", &self.deployment_name)
            .field("api_version", &self.api_version)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl fmt::Debug for AzureChatClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureChatClientBuilder")
            .field("api_key", &redacted(&self.api_key))
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_deployment", &self.azure_deployment)
            .field("api_version", &self.api_version)
            .field("openai_api_base", &self.openai_api_base)
            .field("ignore_openai_api_base", &self.ignore_openai_api_base)
            .finish_non_exhaustive()
    }
}

fn redacted(secret: &Option<SecretString>) -> &'static str {
    if secret.is_some() {
        "<redacted>"
    } else {
        "<none>"
    }
}

fn env_value(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl AzureChatClientBuilder {
    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(value.into()));
        self
    }

    pub fn azure_endpoint(mut self, value: impl Into<String>) -> Self {
        self.azure_endpoint = Some(value.into());
        self
    }

    pub fn azure_deployment(mut self, value: impl Into<String>) -> Self {
        self.azure_deployment = Some(value.into());
        self
    }

    pub fn api_version(mut self, value: impl Into<String>) -> Self {
        self.api_version = Some(value.into());
        self
    }

    /// Underlying model name, reported in place of the deployment when set.
    pub fn model_name(mut self, value: impl Into<String>) -> Self {
        self.model_name = Some(value.into());
        self
    }

    pub fn temperature(mut self, value: f32) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn max_tokens(mut self, value: u32) -> Self {
        self.max_tokens = Some(value);
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    /// Plain OpenAI base URL. Conflicts with `azure_endpoint` unless ignored.
    pub fn openai_api_base(mut self, value: impl Into<String>) -> Self {
        self.openai_api_base = Some(value.into());
        self
    }

    pub fn ignore_openai_api_base(mut self, value: bool) -> Self {
        self.ignore_openai_api_base = value;
        self
    }

    pub fn api_key_from_env(mut self, var_name: &str) -> Self {
        if let Some(value) = env_value(var_name) {
            self.api_key = Some(SecretString::new(value));
        }
        self
    }

    pub fn azure_endpoint_from_env(mut self, var_name: &str) -> Self {
        if let Some(value) = env_value(var_name) {
            self.azure_endpoint = Some(value);
        }
        self
    }

    pub fn api_version_from_env(mut self, var_name: &str) -> Self {
        if let Some(value) = env_value(var_name) {
            self.api_version = Some(value);
        }
        self
    }

    pub fn openai_api_base_from_env(mut self, var_name: &str) -> Self {
        if let Some(value) = env_value(var_name) {
            self.openai_api_base = Some(value);
        }
        self
    }

    pub fn build(self) -> Result<AzureChatClient, RowpromptError> {
        let azure_endpoint = required(self.azure_endpoint, "azure_endpoint")?;
        let deployment_name = required(self.azure_deployment, "azure_deployment")?;
        let api_version = required(self.api_version, "api_version")?;

        if let Some(base) = &self.openai_api_base {
            if !self.ignore_openai_api_base {
                return Err(RowpromptError::InvalidConfig(format!(
                    "openai_api_base '{base}' conflicts with azure_endpoint; \
                     unset it or enable ignore_openai_api_base"
                )));
            }
            tracing::debug!(openai_api_base = %base, "ignoring openai_api_base for azure client");
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(RowpromptError::InvalidConfig(format!(
                    "temperature must be within 0.0..=2.0, got {temperature}"
                )));
            }
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RowpromptError::LlmProvider(err.to_string()))?;

        Ok(AzureChatClient {
            http,
            api_key: self.api_key,
            azure_endpoint,
            deployment_name,
            api_version,
            model_name: self.model_name,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, RowpromptError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RowpromptError::InvalidConfig(format!("{name} is required")))
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for AzureChatClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, RowpromptError> {
        let params = self.ls_params();
        let span = tracing::info_span!(
            "azure_chat_completion",
            ls_provider = %params.ls_provider,
            ls_model_name = %params.ls_model_name,
            api_version = %self.api_version,
            messages = input.messages.len(),
        );
        self.complete(input).instrument(span).await
    }

    fn stream(&self, input: LlmRequest) -> BoxStream<'_, Result<StreamEvent, RowpromptError>> {
        futures::stream::once(async move {
            Runnable::<LlmRequest, LlmResponse>::invoke(self, input)
                .await
                .map(|response| StreamEvent::FinalAnswer(response.content))
        })
        .boxed()
    }
}

/// Lets a rendered prompt feed the client directly in a chain.
#[async_trait::async_trait]
impl Runnable<String, LlmResponse> for AzureChatClient {
    async fn invoke(&self, input: String) -> Result<LlmResponse, RowpromptError> {
        Runnable::<LlmRequest, LlmResponse>::invoke(self, LlmRequest::from(input)).await
    }

    fn stream(&self, input: String) -> BoxStream<'_, Result<StreamEvent, RowpromptError>> {
        Runnable::<LlmRequest, LlmResponse>::stream(self, LlmRequest::from(input))
    }
}
