//! 消息组合层 - envelope 封装与增量 JSON 累加
//!
//! # 设计目标
//! 1. 组合逻辑全部是纯函数：给定输入就能算出最终 envelope，不碰网络
//! 2. 分类规则集中在 classify：解析失败一律归类为"不是 JSON"，不上抛
//! 3. 累加器是显式持有的存储，由宿主注入，不依赖全局状态

pub mod accumulator;
pub mod classify;
pub mod composer;

pub use accumulator::{JsonAccumulator, DEFAULT_SLOT};
pub use classify::{is_json_string, parse_json_object};
pub use composer::{
    compose_flow_message, compose_image_message, compose_plain_message, TOPIC_FLOW, TOPIC_IMAGE,
    TOPIC_MESSAGE,
};
