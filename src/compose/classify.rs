//! JSON 分类辅助 - 判断字符串是否已经是合法 JSON

use serde_json::Value;

/// 判断字符串是否为合法 JSON
///
/// trim 后为空一律视为非 JSON；任何解析失败（语法错误、尾部多余数据）
/// 都归类为"不是 JSON"，错误不向外传播。任意 JSON 值类型都算合法。
pub fn is_json_string(value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }

    serde_json::from_str::<Value>(value).is_ok()
}

/// 解析字符串为 JSON 对象
///
/// 只有顶层是对象（非数组、非标量）时返回 Some，其余情况返回 None。
pub fn parse_json_object(value: &str) -> Option<serde_json::Map<String, Value>> {
    if value.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(value) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
