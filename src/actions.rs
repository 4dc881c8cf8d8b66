//! 流程动作层 - 集线器暴露给自动化流程的五个动作
//!
//! 每个动作都要求先解析出目标设备，拿不到就报 `NoTarget`。
//! 组合逻辑是纯的，只有发送路径会碰传输层。

use std::sync::Arc;

use tracing::info;

use crate::compose::accumulator::{JsonAccumulator, DEFAULT_SLOT};
use crate::compose::composer::{
    compose_flow_message, compose_image_message, compose_plain_message,
};
use crate::error::{NtfyError, NtfyResult};
use crate::image::ImageRef;
use crate::target::Target;
use crate::transport::MessageTransport;

/// 流程动作入口
pub struct FlowActions {
    transport: Arc<dyn MessageTransport>,
    accumulator: Arc<JsonAccumulator>,
}

impl FlowActions {
    /// 创建动作层，传输和累加器由宿主注入
    pub fn new(transport: Arc<dyn MessageTransport>, accumulator: Arc<JsonAccumulator>) -> Self {
        Self {
            transport,
            accumulator,
        }
    }

    /// 宿主持久化累加器状态用
    pub fn accumulator(&self) -> &JsonAccumulator {
        &self.accumulator
    }

    /// send-message：发送普通消息
    pub async fn send_message(&self, target: Option<&Target>, message: &str) -> NtfyResult<()> {
        let target = target.ok_or(NtfyError::NoTarget)?;
        let body = compose_plain_message(message)?;
        self.dispatch(target, &body).await
    }

    /// send-flow-message：发送带流程名的消息
    pub async fn send_flow_message(
        &self,
        target: Option<&Target>,
        flow_name: &str,
        message: &str,
    ) -> NtfyResult<()> {
        let target = target.ok_or(NtfyError::NoTarget)?;
        let body = compose_flow_message(flow_name, message)?;
        self.dispatch(target, &body).await
    }

    /// send-image：发送图片，caption 可以是文本或 JSON 片段
    ///
    /// 封装结果会再过一遍普通消息管线再发送。envelope 序列化后必然是
    /// 合法 JSON，所以这一步恒为透传（与 send-flow-message 同一条路径）。
    pub async fn send_image(
        &self,
        target: Option<&Target>,
        image: ImageRef,
        caption: &str,
    ) -> NtfyResult<()> {
        let target = target.ok_or(NtfyError::NoTarget)?;
        let envelope = compose_image_message(image, caption).await?;
        let body = compose_plain_message(&envelope)?;
        self.dispatch(target, &body).await
    }

    /// start-json：重置累加器并写入第一对键值，返回完整 payload
    pub fn start_json(
        &self,
        target: Option<&Target>,
        key: &str,
        value: &str,
    ) -> NtfyResult<String> {
        target.ok_or(NtfyError::NoTarget)?;
        self.accumulator.start(DEFAULT_SLOT, key, value)
    }

    /// build-json：向累加器合并一对键值，返回完整 payload
    pub fn build_json(
        &self,
        target: Option<&Target>,
        key: &str,
        value: &str,
    ) -> NtfyResult<String> {
        target.ok_or(NtfyError::NoTarget)?;
        self.accumulator.build(DEFAULT_SLOT, key, value)
    }

    async fn dispatch(&self, target: &Target, body: &str) -> NtfyResult<()> {
        info!(
            transport = self.transport.name(),
            device = %target.id,
            bytes = body.len(),
            "Dispatching message"
        );
        self.transport.send(body, target.bearer_token()).await
    }
}
