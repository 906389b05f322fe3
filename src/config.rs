//! 应用配置模块 - 项目路径与 OSS 连接参数

use crate::error::{ToolError, ToolResult};
use std::path::{Path, PathBuf};

/// 配置文件所在目录名（本地与远程相同）
pub const CONFIGS_DIR_NAME: &str = "gacha-configs";
pub const VERSION_FILE_NAME: &str = "version-history.json";
pub const SITE_INFO_FILE_NAME: &str = "site-info.json";

/// 默认 OSS endpoint
pub const DEFAULT_ENDPOINT: &str = "oss-cn-hangzhou.aliyuncs.com";

/// 项目内各文件位置
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    /// 静态资源目录
    pub public_dir: PathBuf,
    pub configs_dir: PathBuf,
    pub version_file: PathBuf,
    pub site_info_file: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let public_dir = root.join("public");
        let configs_dir = public_dir.join(CONFIGS_DIR_NAME);
        Self {
            version_file: configs_dir.join(VERSION_FILE_NAME),
            site_info_file: configs_dir.join(SITE_INFO_FILE_NAME),
            root,
            public_dir,
            configs_dir,
        }
    }
}

/// OSS 连接配置（来自环境变量或 .env）
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    /// 路径前缀，例如 mw-gacha-simulation；空表示根目录
    pub path_prefix: Option<String>,
}

impl RemoteConfig {
    /// 从 `<root>/.env` 与进程环境加载
    pub fn from_env(root: &Path) -> ToolResult<Self> {
        // .env 不存在时忽略
        let _ = dotenvy::from_path(root.join(".env"));
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构造，缺少的必填项一次性列出
    pub fn from_lookup<F>(lookup: F) -> ToolResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let access_key_id = get("OSS_ACCESS_KEY_ID");
        let access_key_secret = get("OSS_ACCESS_KEY_SECRET");
        let bucket = get("OSS_BUCKET_NAME");

        let (Some(access_key_id), Some(access_key_secret), Some(bucket)) =
            (access_key_id.clone(), access_key_secret.clone(), bucket.clone())
        else {
            let missing: Vec<&str> = [
                ("OSS_ACCESS_KEY_ID", access_key_id.is_none()),
                ("OSS_ACCESS_KEY_SECRET", access_key_secret.is_none()),
                ("OSS_BUCKET_NAME", bucket.is_none()),
            ]
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| *name)
            .collect();
            return Err(ToolError::RemoteAuth(format!(
                "缺少环境变量 {}，请在 .env 中配置",
                missing.join(", ")
            )));
        };

        let endpoint = get("OSS_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let region = get("OSS_REGION").unwrap_or_else(|| region_from_endpoint(&endpoint));
        let path_prefix = get("OSS_PATH_PREFIX")
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            access_key_id,
            access_key_secret,
            bucket,
            endpoint,
            region,
            path_prefix,
        })
    }

    /// 带协议头的 endpoint
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        }
    }

    /// 配置文件的远程路径: `<prefix>/gacha-configs/<relative>`
    pub fn config_key(&self, relative: &str) -> String {
        self.static_key(&format!("{}/{}", CONFIGS_DIR_NAME, relative.trim_start_matches('/')))
    }

    /// 静态资源的远程路径: `<prefix>/<relative>`
    pub fn static_key(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches('/');
        match &self.path_prefix {
            Some(prefix) => format!("{}/{}", prefix, relative),
            None => relative.to_string(),
        }
    }

    /// 列举静态资源时使用的远程目录
    pub fn static_root(&self) -> Option<String> {
        self.path_prefix.as_ref().map(|p| format!("{}/", p))
    }
}

/// oss-cn-hangzhou.aliyuncs.com -> oss-cn-hangzhou
fn region_from_endpoint(endpoint: &str) -> String {
    endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("us-east-1")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_credentials_listed() {
        let err = RemoteConfig::from_lookup(lookup(&[("OSS_ACCESS_KEY_ID", "id")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("OSS_ACCESS_KEY_SECRET"));
        assert!(msg.contains("OSS_BUCKET_NAME"));
        assert!(!msg.contains("OSS_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_defaults_and_keys() {
        let config = RemoteConfig::from_lookup(lookup(&[
            ("OSS_ACCESS_KEY_ID", "id"),
            ("OSS_ACCESS_KEY_SECRET", "secret"),
            ("OSS_BUCKET_NAME", "bucket"),
            ("OSS_PATH_PREFIX", "/mw-gacha-simulation/"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.region, "oss-cn-hangzhou");
        assert_eq!(config.endpoint_url(), "https://oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(
            config.config_key("version-history.json"),
            "mw-gacha-simulation/gacha-configs/version-history.json"
        );
        assert_eq!(config.static_key("images/a.png"), "mw-gacha-simulation/images/a.png");
        assert_eq!(config.static_root().as_deref(), Some("mw-gacha-simulation/"));
    }

    #[test]
    fn test_keys_without_prefix() {
        let config = RemoteConfig::from_lookup(lookup(&[
            ("OSS_ACCESS_KEY_ID", "id"),
            ("OSS_ACCESS_KEY_SECRET", "secret"),
            ("OSS_BUCKET_NAME", "bucket"),
            ("OSS_ENDPOINT", "http://127.0.0.1:9000"),
            ("OSS_REGION", "local"),
        ]))
        .unwrap();

        assert_eq!(config.config_key("site-info.json"), "gacha-configs/site-info.json");
        assert_eq!(config.static_key("a.png"), "a.png");
        assert_eq!(config.static_root(), None);
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000");
    }
}
