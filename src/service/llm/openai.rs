//! OpenAI and Azure OpenAI implementation of `GenericLlmClient`.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::{AzureConfig, Config as OpenAiApiConfig, OpenAIConfig},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        ResponseFormat,
    },
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, info, instrument};

use crate::base::{
    config::{Config, Provider},
    types::{CompletionRequest, Res},
};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    /// Create an LLM client for the configured provider.
    pub fn openai(config: &Config) -> Res<Self> {
        let client = OpenAiLlmClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Specific implementations.

/// Connection settings for the selected API flavor.
#[derive(Clone, Debug)]
enum Backend {
    OpenAi(OpenAIConfig),
    Azure(AzureConfig),
}

/// OpenAI LLM client implementation.
///
/// Azure routes requests by deployment, so the API client is scoped to the
/// request's model at call time; the HTTP client is shared.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    http: reqwest::Client,
    backend: Backend,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let backend = match config.provider {
            Provider::OpenAi => {
                let mut cfg = OpenAIConfig::new().with_api_key(config.api_key.clone());

                if let Some(endpoint) = &config.api_endpoint {
                    cfg = cfg.with_api_base(endpoint.clone());
                }

                Backend::OpenAi(cfg)
            }
            Provider::Azure => {
                let endpoint = config.api_endpoint.as_deref().ok_or_else(|| anyhow::anyhow!("Azure provider requires `api_endpoint`."))?;
                let version = config.api_version.as_deref().ok_or_else(|| anyhow::anyhow!("Azure provider requires `api_version`."))?;

                Backend::Azure(AzureConfig::new().with_api_base(endpoint).with_api_version(version).with_api_key(config.api_key.clone()))
            }
        };

        Ok(Self {
            http: reqwest::Client::new(),
            backend,
        })
    }

    /// Build the chat completion request.
    #[instrument(name = "OpenAiLlmClient::build_request", skip_all)]
    fn build_request(&self, request: &CompletionRequest) -> Res<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default().content(request.system_directive.clone()).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default().content(request.user_content.clone()).build()?.into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&request.model).messages(messages);

        if request.json_response {
            builder.response_format(ResponseFormat::JsonObject);
        }

        // OpenAI reasoning models reject a sampling temperature; Azure deployment names say nothing about the model.
        if let Some(temperature) = request.temperature {
            if matches!(self.backend, Backend::Azure(_)) || !is_reasoning_model(&request.model) {
                builder.temperature(temperature);
            }
        }

        if let Some(max_tokens) = request.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }

        Ok(builder.build()?)
    }

    /// Send the request once and pull the text out of the first choice.
    async fn call_api<C: OpenAiApiConfig>(client: Client<C>, request: CreateChatCompletionRequest) -> Res<String> {
        let response = client.chat().create(request).await?;

        info!("LLM response has {} choices.", response.choices.len());

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Response contained no message content."))
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::get_completion_response", skip_all, fields(model = %request.model))]
    async fn get_completion_response(&self, request: &CompletionRequest) -> Res<String> {
        let api_request = self.build_request(request)?;

        debug!("Sending completion request ...");

        match &self.backend {
            Backend::OpenAi(cfg) => {
                let client = Client::with_config(cfg.clone()).with_http_client(self.http.clone()).with_backoff(single_attempt());
                Self::call_api(client, api_request).await
            }
            Backend::Azure(cfg) => {
                let cfg = cfg.clone().with_deployment_id(request.model.clone());
                let client = Client::with_config(cfg).with_http_client(self.http.clone()).with_backoff(single_attempt());
                Self::call_api(client, api_request).await
            }
        }
    }
}

/// A backoff that gives up after the first attempt, so rate-limit and server errors surface at once.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new().with_max_elapsed_time(Some(Duration::ZERO)).build()
}

/// Whether an OpenAI model name is a reasoning (`o1`, `o3-mini`, ...) model.
fn is_reasoning_model(model: &str) -> bool {
    model.strip_prefix('o').is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

// Tests.
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    use super::*;
    use crate::base::config::ConfigInner;

    fn create_test_request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            system_directive: "Classify the ticket.".to_string(),
            user_content: "App crashes under heavy load".to_string(),
            temperature: Some(0.1),
            max_tokens: Some(200),
            json_response: true,
        }
    }

    fn create_test_client(provider: Provider, endpoint: &str) -> OpenAiLlmClient {
        let config = Config {
            inner: Arc::new(ConfigInner {
                provider,
                api_key: "sk-invalid-key-for-testing".to_string(),
                api_endpoint: Some(endpoint.to_string()),
                api_version: Some("2024-06-01".to_string()),
                ..Default::default()
            }),
        };

        OpenAiLlmClient::new(&config).unwrap()
    }

    /// Read one HTTP request (headers plus `Content-Length` body) off the stream.
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| line.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap()))
                    .unwrap_or(0);

                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    /// Serve `429 Too Many Requests` to every request, counting them.
    async fn spawn_rate_limited_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            let body = r#"{"error":{"message":"Rate limit reached","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#;

            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);

                let response = format!(
                    "HTTP/1.1 429 Too Many Requests\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}"), requests)
    }

    #[test]
    fn test_build_request_sets_json_format_and_temperature() {
        let client = create_test_client(Provider::OpenAi, "http://127.0.0.1:9/v1");
        let request = client.build_request(&create_test_request("gpt-4o")).unwrap();

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_completion_tokens, Some(200));
        assert!(matches!(request.response_format, Some(ResponseFormat::JsonObject)));
    }

    #[test]
    fn test_build_request_omits_temperature_for_openai_reasoning_models() {
        let client = create_test_client(Provider::OpenAi, "http://127.0.0.1:9/v1");

        assert_eq!(client.build_request(&create_test_request("o3-mini")).unwrap().temperature, None);
        assert_eq!(client.build_request(&create_test_request("o1")).unwrap().temperature, None);
        assert_eq!(client.build_request(&create_test_request("omni-classifier")).unwrap().temperature, Some(0.1));
    }

    #[test]
    fn test_build_request_keeps_temperature_for_azure_deployments() {
        let client = create_test_client(Provider::Azure, "https://example.openai.azure.com");

        assert_eq!(client.build_request(&create_test_request("ops-ticket-classifier")).unwrap().temperature, Some(0.1));
        assert_eq!(client.build_request(&create_test_request("o3-mini")).unwrap().temperature, Some(0.1));
    }

    #[test]
    fn test_build_request_without_temperature() {
        let client = create_test_client(Provider::Azure, "https://example.openai.azure.com");
        let mut request = create_test_request("gpt-4o");
        request.temperature = None;

        assert_eq!(client.build_request(&request).unwrap().temperature, None);
    }

    #[test]
    fn test_new_requires_azure_endpoint() {
        let config = Config {
            inner: Arc::new(ConfigInner {
                provider: Provider::Azure,
                api_key: "secret".to_string(),
                ..Default::default()
            }),
        };

        assert!(OpenAiLlmClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_invalid_endpoint_fails() {
        let client = LlmClient {
            inner: Arc::new(create_test_client(Provider::OpenAi, "http://127.0.0.1:9/v1")),
        };

        let result = client.get_completion_response(&create_test_request("gpt-4o")).await;

        assert!(result.is_err(), "Should fail against an unreachable endpoint");
    }

    #[tokio::test]
    async fn test_rate_limited_call_is_not_retried() {
        let (endpoint, requests) = spawn_rate_limited_server().await;

        for (provider, endpoint) in [(Provider::OpenAi, format!("{endpoint}/v1")), (Provider::Azure, endpoint.clone())] {
            let before = requests.load(Ordering::SeqCst);
            let client = create_test_client(provider, &endpoint);

            let result = tokio::time::timeout(Duration::from_secs(5), client.get_completion_response(&create_test_request("gpt-4o"))).await;

            let result = result.expect("call should fail fast instead of backing off");
            assert!(result.is_err(), "A 429 answer should be an error");
            assert_eq!(requests.load(Ordering::SeqCst) - before, 1, "Exactly one request per call");
        }
    }
}
