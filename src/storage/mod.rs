pub mod cors;
pub mod local;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cors::{apply_cors, CorsPolicy};
pub use local::LocalStorage;
pub use s3::S3Storage;

// ============ 公共常量 ============

/// 非 IO 操作超时（秒）- stat, list 等
pub const OP_TIMEOUT_SECS: u64 = 60;
/// IO 操作超时（秒）- read, write 等
pub const IO_TIMEOUT_SECS: u64 = 300;

/// 文件信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

/// 写入时附带的 HTTP 头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

/// 存储抽象接口
#[async_trait]
pub trait Storage: Send + Sync {
    /// 递归列出所有文件
    async fn list_files(&self, prefix: Option<&str>) -> Result<Vec<FileInfo>>;

    /// 读取整个文件
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// 写入整个文件
    async fn write(&self, path: &str, data: Vec<u8>, options: &WriteOptions) -> Result<()>;

    /// 获取存储名称（用于日志）
    fn name(&self) -> &str;
}

/// 根据 OSS 配置创建远程存储
pub fn create_remote(config: &crate::config::RemoteConfig) -> Result<std::sync::Arc<dyn Storage>> {
    tracing::info!(
        "初始化 OSS 存储: bucket={}, endpoint={}",
        config.bucket,
        config.endpoint
    );
    Ok(std::sync::Arc::new(S3Storage::new(config)?) as std::sync::Arc<dyn Storage>)
}
