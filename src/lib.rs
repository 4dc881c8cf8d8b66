//! Ntfy-me Hub - 把集线器流程通知转发到 ntfy-me 中继

pub mod actions;
pub mod compose;
pub mod error;
pub mod image;
pub mod target;
pub mod transport;

pub use actions::FlowActions;
pub use compose::{JsonAccumulator, DEFAULT_SLOT};
pub use error::{NtfyError, NtfyResult};
pub use image::{ImageMetadata, ImageRef, ImageStream};
pub use target::{Target, TargetSettings, TargetStore};
pub use transport::{MessageTransport, RelayClient, RelayConfig};
