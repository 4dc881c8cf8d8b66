//! 错误类型定义 - 所有动作直接向调用方暴露的失败原因

use thiserror::Error;

/// 通知动作的错误类型
///
/// 校验类错误在动作入口同步抛出，不做本地恢复；
/// 唯一的吞错路径是累加器读坏槽位时降级为空对象（见 accumulator 模块）。
#[derive(Debug, Error)]
pub enum NtfyError {
    /// 消息为空（trim 后无内容）
    #[error("No message provided")]
    EmptyInput,

    /// JSON key 为空
    #[error("No key provided")]
    EmptyKey,

    /// JSON value 为空
    #[error("No value provided")]
    EmptyValue,

    /// 没有可用的图片句柄
    #[error("No image provided")]
    NoImage,

    /// 图片解析成功但字节数为零
    #[error("Image contains no data")]
    EmptyImageData,

    /// 动作没有解析到目标设备
    #[error("No device available")]
    NoTarget,

    /// 中继返回非 2xx 状态
    #[error("ntfy-me request failed ({status}): {body}")]
    TransportFailure { status: u16, body: String },

    /// 图片流读取中途报错（不返回部分数据）
    #[error("Image stream failed: {0}")]
    StreamFailure(#[from] std::io::Error),
}

/// 通知动作的 Result 别名
pub type NtfyResult<T> = std::result::Result<T, NtfyError>;
