//! 中继传输层 - 把封装好的 envelope POST 到 ntfy-me 中继
//!
//! 传输只认字节：给定 body 和可选 bearer token，2xx 算成功，
//! 其余状态连同响应体一起作为失败上抛。不重试，不保证送达。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{NtfyError, NtfyResult};

/// 中继客户端配置
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// 中继地址（如 https://ntfyme.net）
    pub base_url: String,
    /// 消息路径
    pub path: String,
    /// 超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ntfyme.net".to_string(),
            path: "/msg".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 传输层 trait，动作层只依赖这个接口，测试时换成 mock
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// 传输名称（日志用）
    fn name(&self) -> &str;

    /// 发送一条已封装的消息，2xx 即成功
    async fn send(&self, body: &str, bearer_token: Option<&str>) -> NtfyResult<()>;
}

/// ntfy-me 中继客户端
#[derive(Debug)]
pub struct RelayClient {
    client: Client,
    config: RelayConfig,
}

impl RelayClient {
    /// 创建中继客户端
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl MessageTransport for RelayClient {
    fn name(&self) -> &str {
        "ntfy-me"
    }

    async fn send(&self, body: &str, bearer_token: Option<&str>) -> NtfyResult<()> {
        let url = format!("{}{}", self.config.base_url, self.config.path);
        debug!(url = %url, bytes = body.len(), "Sending message to relay");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .header("Content-Length", body.len())
            .body(body.to_string());

        if let Some(token) = bearer_token {
            let token = token.trim();
            if !token.is_empty() {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
        }

        let response = request.send().await.map_err(|e| NtfyError::TransportFailure {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            body: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let body = if body.is_empty() {
            "No response body".to_string()
        } else {
            body
        };

        Err(NtfyError::TransportFailure {
            status: status.as_u16(),
            body,
        })
    }
}
