use super::{FileInfo, Storage, WriteOptions, IO_TIMEOUT_SECS, OP_TIMEOUT_SECS};
use crate::config::RemoteConfig;
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use opendal::{layers::TimeoutLayer, Metakey, Operator};
use std::time::Duration;

/// 基于 opendal S3 服务的 OSS 存储（虚拟主机风格访问）
pub struct S3Storage {
    operator: Operator,
    name: String,
}

impl S3Storage {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        use opendal::services::S3;

        // OSS 只接受 bucket.endpoint 形式的地址
        let builder = S3::default()
            .bucket(&config.bucket)
            .region(&config.region)
            .endpoint(&config.endpoint_url())
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.access_key_secret)
            .enable_virtual_host_style();

        // 添加超时层
        let operator = Operator::new(builder)?
            .layer(
                TimeoutLayer::default()
                    .with_timeout(Duration::from_secs(OP_TIMEOUT_SECS))
                    .with_io_timeout(Duration::from_secs(IO_TIMEOUT_SECS)),
            )
            .finish();

        let name = format!(
            "oss://{}{}",
            config.bucket,
            config
                .path_prefix
                .as_deref()
                .map(|p| format!("/{}", p))
                .unwrap_or_default()
        );

        Ok(Self { operator, name })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn list_files(&self, prefix: Option<&str>) -> Result<Vec<FileInfo>> {
        let mut files = Vec::new();
        let path = prefix.unwrap_or("");

        let mut lister = self
            .operator
            .lister_with(path)
            .recursive(true)
            .metakey(Metakey::ContentLength | Metakey::Mode)
            .await?;

        while let Some(entry) = lister.try_next().await? {
            let path_str = entry.path().trim_start_matches('/').to_string();

            // 跳过根目录
            if path_str.is_empty() {
                continue;
            }

            let meta = entry.metadata();
            files.push(FileInfo {
                path: path_str,
                size: meta.content_length(),
                is_dir: meta.is_dir(),
            });
        }

        Ok(files)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let data = self.operator.read(path).await?;
        Ok(data.to_vec())
    }

    async fn write(&self, path: &str, data: Vec<u8>, options: &WriteOptions) -> Result<()> {
        let mut op = self.operator.write_with(path, data);
        if let Some(ct) = &options.content_type {
            op = op.content_type(ct);
        }
        if let Some(cc) = &options.cache_control {
            op = op.cache_control(cc);
        }
        op.await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
