//! 错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 工具链统一错误
#[derive(Debug, Error)]
pub enum ToolError {
    /// 配置文件读取失败（文件不存在或无权限）
    #[error("读取配置文件失败 {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件不是合法 JSON
    #[error("配置文件 JSON 格式错误 {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 配置文件写入失败
    #[error("写入配置文件失败 {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("版本 {0} 已存在")]
    DuplicateVersion(String),

    #[error("版本 {0} 不存在")]
    VersionNotFound(String),

    /// 同一个 commit 被记录到了两个版本中
    #[error("提交 {hash} 已记录在版本 {owner} 中")]
    CommitConflict { hash: String, owner: String },

    #[error("赞助者序号 {index} 超出范围（共 {len} 条）")]
    SponsorIndexOutOfRange { index: usize, len: usize },

    #[error("赞助者信息无效: {0}")]
    InvalidSponsor(String),

    /// 凭证缺失或无效
    #[error("OSS 认证配置错误: {0}")]
    RemoteAuth(String),

    /// 单个远程操作失败
    #[error("远程操作失败 {key}: {message}")]
    RemoteIo { key: String, message: String },

    /// git 等外部命令失败或超时
    #[error("外部命令失败: {0}")]
    ExternalTool(String),
}

impl ToolError {
    /// 是否属于加载阶段的错误
    pub fn is_load_error(&self) -> bool {
        matches!(self, ToolError::ConfigRead { .. } | ToolError::ConfigParse { .. })
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
