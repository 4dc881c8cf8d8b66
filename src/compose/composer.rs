//! 消息封装 - 把各种输入整理成发往中继的 JSON envelope
//!
//! 三种消息形态：
//! ```json
//! {"topic":"homey-message","msg":"..."}
//! {"topic":"homey-flow","msg":"...","flow":"..."}
//! {"topic":"homey-image","image":"<base64>","msg":"..."}
//! ```
//! 已经是合法 JSON 的输入原样透传，不做二次包装。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::compose::classify::{is_json_string, parse_json_object};
use crate::error::{NtfyError, NtfyResult};
use crate::image::ImageRef;

/// 普通消息的 topic
pub const TOPIC_MESSAGE: &str = "homey-message";
/// 流程消息的 topic
pub const TOPIC_FLOW: &str = "homey-flow";
/// 图片消息的 topic
pub const TOPIC_IMAGE: &str = "homey-image";

/// 封装普通消息
///
/// trim 后为空返回 `EmptyInput`；输入本身是合法 JSON 时原样透传（任意
/// JSON 值类型都算合法），否则包进 `homey-message` envelope。
pub fn compose_plain_message(raw: &str) -> NtfyResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NtfyError::EmptyInput);
    }

    if is_json_string(trimmed) {
        return Ok(trimmed.to_string());
    }

    let mut envelope = Map::new();
    envelope.insert("topic".to_string(), Value::String(TOPIC_MESSAGE.to_string()));
    envelope.insert("msg".to_string(), Value::String(trimmed.to_string()));

    Ok(Value::Object(envelope).to_string())
}

/// 封装流程消息
///
/// 先构建 `homey-flow` envelope（flow_name 非空时附带 `flow` 字段），
/// 序列化后再走一遍普通消息管线。序列化结果必然是合法 JSON，
/// 所以第二遍恒为透传，这一约定有测试钉死。
pub fn compose_flow_message(flow_name: &str, message: &str) -> NtfyResult<String> {
    if message.trim().is_empty() {
        return Err(NtfyError::EmptyInput);
    }

    let mut envelope = Map::new();
    envelope.insert("topic".to_string(), Value::String(TOPIC_FLOW.to_string()));
    envelope.insert("msg".to_string(), Value::String(message.to_string()));

    let flow = flow_name.trim();
    if !flow.is_empty() {
        envelope.insert("flow".to_string(), Value::String(flow.to_string()));
    }

    compose_plain_message(&Value::Object(envelope).to_string())
}

/// 封装图片消息
///
/// 解析图片句柄得到完整字节后 base64 编码。caption 规则：
/// - 空：不加 `msg` 字段
/// - 合法 JSON 对象：字段逐个并入 envelope，后写覆盖先写，没有保护字段
///   （调用方可以覆盖 `topic`/`image`）
/// - 其余情况（数组、标量、非法 JSON）：原样塞进 `msg`
pub async fn compose_image_message(image: ImageRef, caption: &str) -> NtfyResult<String> {
    let bytes = image.resolve().await?;
    if bytes.is_empty() {
        return Err(NtfyError::EmptyImageData);
    }

    let mut envelope = Map::new();
    envelope.insert("topic".to_string(), Value::String(TOPIC_IMAGE.to_string()));
    envelope.insert("image".to_string(), Value::String(STANDARD.encode(&bytes)));

    let caption_trimmed = caption.trim();
    if !caption_trimmed.is_empty() {
        match parse_json_object(caption_trimmed) {
            Some(fields) => {
                for (key, value) in fields {
                    envelope.insert(key, value);
                }
            }
            None => {
                envelope.insert("msg".to_string(), Value::String(caption.to_string()));
            }
        }
    }

    Ok(Value::Object(envelope).to_string())
}
