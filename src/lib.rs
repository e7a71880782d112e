#![allow(warnings)]

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod session;
pub mod upload;
pub mod utils;

// 重新导出常用类型
pub use api::{ApiClient, ApiError, CountingStream};
pub use catalog::{CatalogFilter, CatalogSort, SortDirection, SortKey, filter_and_sort};
pub use config::{AppConfig, ConfigError, Theme};
pub use session::{Session, SessionBackend};
pub use upload::{
    QueueEvent, TaskId, TaskStatus, UploadBackend, UploadError, UploadQueue, UploadQueueHandle,
    UploadSpec, UploadTask,
};
