//! Bucket CORS 规则配置（opendal 不提供 bucket 级接口，这里直接走 S3 API）

use crate::config::RemoteConfig;
use crate::error::{ToolError, ToolResult};
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::types::{CorsConfiguration, CorsRule};
use aws_sdk_s3::Client;
use tracing::info;

/// 允许前端跨域读取配置文件的规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_seconds: i32,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
            allowed_headers: vec!["*".to_string()],
            expose_headers: vec!["ETag".to_string(), "Content-Type".to_string()],
            max_age_seconds: 300,
        }
    }
}

impl CorsPolicy {
    fn to_rule(&self) -> ToolResult<CorsRule> {
        CorsRule::builder()
            .set_allowed_origins(Some(self.allowed_origins.clone()))
            .set_allowed_methods(Some(self.allowed_methods.clone()))
            .set_allowed_headers(Some(self.allowed_headers.clone()))
            .set_expose_headers(Some(self.expose_headers.clone()))
            .max_age_seconds(self.max_age_seconds)
            .build()
            .map_err(|e| ToolError::RemoteIo {
                key: "cors".to_string(),
                message: e.to_string(),
            })
    }
}

fn client(config: &RemoteConfig) -> Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.access_key_secret,
        None,
        None,
        "siteops-env",
    );
    let conf = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .endpoint_url(config.endpoint_url())
        .credentials_provider(credentials)
        .force_path_style(false)
        .build();
    Client::from_conf(conf)
}

/// 覆盖 bucket 上现有的 CORS 规则
pub async fn apply_cors(config: &RemoteConfig, policy: &CorsPolicy) -> ToolResult<()> {
    let rule = policy.to_rule()?;
    let cors = CorsConfiguration::builder()
        .cors_rules(rule)
        .build()
        .map_err(|e| ToolError::RemoteIo {
            key: "cors".to_string(),
            message: e.to_string(),
        })?;

    info!("设置 bucket {} 的 CORS 规则", config.bucket);

    client(config)
        .put_bucket_cors()
        .bucket(&config.bucket)
        .cors_configuration(cors)
        .send()
        .await
        .map_err(|e| {
            let message = aws_sdk_s3::error::DisplayErrorContext(&e).to_string();
            if message.contains("AccessDenied") {
                ToolError::RemoteAuth(format!("权限不足，请确认 AccessKey 拥有 PutBucketCors 权限: {}", message))
            } else {
                ToolError::RemoteIo {
                    key: config.bucket.clone(),
                    message,
                }
            }
        })?;

    Ok(())
}
