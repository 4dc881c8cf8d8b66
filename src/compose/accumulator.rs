//! 增量 JSON 累加器 - 跨多次流程动作拼装同一个 payload
//!
//! 每个槽位存一个序列化后的 JSON 对象（string key → string value）。
//! `start` 重置槽位为单键对象，`build` 在现有对象上合并一个键值对，
//! 同名键后写覆盖先写。两个操作都返回合并后的完整序列化结果，
//! 供下游动作（通常是 send-message）直接发送。

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{NtfyError, NtfyResult};

/// 默认槽位 id，对应集线器上的 `build_json` 流程 token
pub const DEFAULT_SLOT: &str = "build_json";

/// 增量 JSON 累加器
///
/// 显式持有的槽位存储，由动作层注入，不走全局状态。
/// 读-改-写全程持锁，并发 build 串行执行，不会丢写。
#[derive(Debug, Default)]
pub struct JsonAccumulator {
    slots: Mutex<HashMap<String, String>>,
}

impl JsonAccumulator {
    /// 创建空累加器
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有槽位内容恢复累加器（宿主进程重启后回灌）
    pub fn with_slots(slots: HashMap<String, String>) -> Self {
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// 重置槽位为 `{key: value}`，返回序列化结果
    pub fn start(&self, slot: &str, key: &str, value: &str) -> NtfyResult<String> {
        let (key, value) = validate_pair(key, value)?;

        let mut object = Map::new();
        object.insert(key.to_string(), Value::String(value.to_string()));
        let serialized = Value::Object(object).to_string();

        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot.to_string(), serialized.clone());

        Ok(serialized)
    }

    /// 把 `{key: value}` 合并进槽位当前对象，返回序列化结果
    ///
    /// 槽位未初始化、或存的内容解析不出 JSON 对象时，按空对象继续，
    /// 这是刻意的恢复路径而不是错误：build 在 reset 或坏状态后仍然可用。
    pub fn build(&self, slot: &str, key: &str, value: &str) -> NtfyResult<String> {
        let (key, value) = validate_pair(key, value)?;

        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        let mut object = match slots.get(slot) {
            Some(stored) => parse_stored_object(slot, stored),
            None => Map::new(),
        };

        object.insert(key.to_string(), Value::String(value.to_string()));
        let serialized = Value::Object(object).to_string();
        slots.insert(slot.to_string(), serialized.clone());

        Ok(serialized)
    }

    /// 读取槽位当前序列化内容（未初始化返回 None）
    pub fn current(&self, slot: &str) -> Option<String> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(slot).cloned()
    }

    /// 导出全部槽位（宿主持久化用）
    pub fn snapshot(&self) -> HashMap<String, String> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.clone()
    }
}

/// 校验 key/value，返回 trim 后的引用
fn validate_pair<'a>(key: &'a str, value: &'a str) -> NtfyResult<(&'a str, &'a str)> {
    let key = key.trim();
    if key.is_empty() {
        return Err(NtfyError::EmptyKey);
    }

    let value = value.trim();
    if value.is_empty() {
        return Err(NtfyError::EmptyValue);
    }

    Ok((key, value))
}

/// 解析槽位存量内容，坏数据降级为空对象并记一条诊断日志
fn parse_stored_object(slot: &str, stored: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(stored) {
        Ok(Value::Object(map)) => map,
        _ => {
            warn!(slot, "Stored payload is not a JSON object, resetting to empty");
            Map::new()
        }
    }
}
