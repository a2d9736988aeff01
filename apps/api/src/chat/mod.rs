//! Chat Relay: forwards one chat turn to the conversational upstream and passes
//! its JSON answer back untouched.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::relay::{status_from_upstream, RelayError};

pub mod handlers;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub chatflowid: Option<String>,
    pub question: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
    #[serde(rename = "overrideConfig", default)]
    pub override_config: Option<Value>,
}

#[derive(Debug, Serialize)]
struct UpstreamBody<'a> {
    question: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    #[serde(rename = "overrideConfig")]
    override_config: Value,
}

#[derive(Clone)]
pub struct ChatRelay {
    client: Client,
    upstream_base: String,
    default_flow_id: String,
}

impl ChatRelay {
    pub fn new(upstream_base: impl Into<String>, default_flow_id: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            upstream_base: upstream_base.into().trim_end_matches('/').to_string(),
            default_flow_id: default_flow_id.into(),
        })
    }

    pub fn upstream_url(&self, chatflowid: Option<&str>) -> String {
        let flow = chatflowid
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&self.default_flow_id);
        format!("{}/{flow}", self.upstream_base)
    }

    pub async fn forward(&self, request: ChatRequest) -> Result<Value, RelayError> {
        let url = self.upstream_url(request.chatflowid.as_deref());
        let override_config = match request.override_config {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(config) => config,
        };
        let body = UpstreamBody {
            question: &request.question,
            chat_id: &request.chat_id,
            override_config,
        };

        info!(chat_id = %request.chat_id, "Proxying chat request to {url}");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Chat upstream unreachable: {e}");
                RelayError::internal("Internal server error").with_details(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            error!("Chat upstream error: {status}: {details}");
            return Err(RelayError::new(
                status_from_upstream(status.as_u16()),
                "Failed to get response from ChatBot service",
            )
            .with_details(details));
        }

        let data = response.json::<Value>().await.map_err(|e| {
            error!("Chat upstream returned an undecodable body: {e}");
            RelayError::internal("Internal server error").with_details(e.to_string())
        })?;

        info!("Chat upstream response received");
        Ok(data)
    }
}
