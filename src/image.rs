//! 图片句柄解析 - 把集线器丢过来的三种句柄形态读成完整字节
//!
//! 集线器的动作参数里，图片 token 可能直接就是可读句柄，也可能嵌在
//! `image` 或 `value` 字段下。这里用带标签的枚举收敛三种形态，
//! 单个解析函数做匹配，取第一个能打开流的形态。

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{NtfyError, NtfyResult};

/// 图片字节流及其元数据
pub struct ImageStream {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    metadata: ImageMetadata,
}

/// 图片元数据（集线器提供什么就带什么）
#[derive(Debug, Clone, Default)]
pub struct ImageMetadata {
    /// 文件名
    pub filename: Option<String>,
    /// MIME 类型
    pub content_type: Option<String>,
    /// 声明的字节数
    pub length: Option<u64>,
}

impl ImageStream {
    /// 从任意异步可读流创建
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            metadata: ImageMetadata::default(),
        }
    }

    /// 附加元数据
    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// 查看元数据
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for ImageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStream")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// 图片句柄的三种形态
#[derive(Debug)]
pub enum ImageRef {
    /// 直接就是可读句柄
    Stream(ImageStream),
    /// 句柄嵌在 `image` 字段下（拖拽 token 形态）
    Image { image: Option<ImageStream> },
    /// 句柄嵌在 `value` 字段下（token 求值结果形态）
    Value { value: Option<ImageStream> },
}

impl ImageRef {
    /// 测试和 CLI 用：内存字节直接当作图片流
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let length = bytes.len() as u64;
        Self::Stream(
            ImageStream::new(std::io::Cursor::new(bytes)).with_metadata(ImageMetadata {
                length: Some(length),
                ..Default::default()
            }),
        )
    }

    /// 解析句柄，读完整个流返回全部字节
    ///
    /// 没有任何形态暴露出流时返回 `NoImage`；流中途报错时返回
    /// `StreamFailure`，不返回已读到的部分数据。
    pub async fn resolve(self) -> NtfyResult<Vec<u8>> {
        let stream = match self {
            ImageRef::Stream(stream) => stream,
            ImageRef::Image { image: Some(stream) } => stream,
            ImageRef::Value { value: Some(stream) } => stream,
            ImageRef::Image { image: None } | ImageRef::Value { value: None } => {
                return Err(NtfyError::NoImage)
            }
        };

        let mut reader = stream.reader;
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;
        Ok(buffer)
    }
}
