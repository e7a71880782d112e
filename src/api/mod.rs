//! 后端 HTTP 接口：客户端、线上数据结构、错误类型与进度统计流

pub mod types;

mod client;
mod errors;
mod progress;

pub use client::ApiClient;
pub use errors::{ApiError, Result};
pub use progress::CountingStream;
