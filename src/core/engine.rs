//! 同步驱动 - 配置文件与静态资源上传

use crate::config::{ProjectPaths, RemoteConfig, SITE_INFO_FILE_NAME, VERSION_FILE_NAME};
use crate::core::comparator::{diff_file_sets, ChangedFile};
use crate::core::policy;
use crate::core::scanner::{FileScanner, FileSet, ScanConfig};
use crate::error::ToolError;
use crate::storage::{LocalStorage, Storage, WriteOptions};
use crate::store::{render_document, ConfigStore};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 同步模式（对应交互菜单 1-4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// 覆盖上传配置文件 (JSON)
    Configs,
    /// 增量上传静态资源
    Incremental,
    /// 预览静态资源增量（不上传）
    Preview,
    /// 覆盖上传所有静态资源
    AllStatic,
}

impl SyncMode {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(SyncMode::Configs),
            "2" => Some(SyncMode::Incremental),
            "3" => Some(SyncMode::Preview),
            "4" => Some(SyncMode::AllStatic),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SyncMode::Configs => "覆盖上传配置文件 (JSON)",
            SyncMode::Incremental => "增量上传静态资源 (图片/音频)",
            SyncMode::Preview => "预览静态资源增量",
            SyncMode::AllStatic => "覆盖上传所有静态资源",
        }
    }
}

/// 单个文件的上传进度
#[derive(Debug, Clone)]
pub struct UploadProgress {
    pub index: usize,
    pub total: usize,
    pub path: String,
    pub size: u64,
    pub error: Option<String>,
}

/// 上传失败的文件
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub path: String,
    pub error: String,
}

/// 一批上传的结果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<UploadFailure>,
    /// JSON 校验未通过而跳过的配置文件
    pub invalid: Vec<UploadFailure>,
    pub bytes_uploaded: u64,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len() + self.invalid.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.invalid.is_empty()
    }
}

/// 同步驱动
pub struct SyncDriver {
    paths: ProjectPaths,
    remote_config: RemoteConfig,
    remote: Arc<dyn Storage>,
    scanner: FileScanner,
    progress_tx: Option<mpsc::UnboundedSender<UploadProgress>>,
}

impl SyncDriver {
    pub fn new(paths: ProjectPaths, remote_config: RemoteConfig, remote: Arc<dyn Storage>) -> Self {
        Self {
            paths,
            remote_config,
            remote,
            scanner: FileScanner::default(),
            progress_tx: None,
        }
    }

    pub fn with_scan_config(mut self, config: ScanConfig) -> Self {
        self.scanner = FileScanner::new(config);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<UploadProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn remote_name(&self) -> &str {
        self.remote.name()
    }

    // ============ 配置文件 ============

    /// 配置目录下所有 JSON 文件（相对路径）
    pub async fn scan_config_files(&self) -> Result<Vec<String>> {
        let storage = LocalStorage::new(&self.paths.configs_dir);
        let files = FileScanner::new(ScanConfig::none())
            .scan_storage(&storage, None)
            .await?;
        Ok(files
            .into_keys()
            .filter(|p| p.to_lowercase().ends_with(".json"))
            .collect())
    }

    /// 功能1: 覆盖上传配置文件，无法解析的 JSON 跳过并记录
    pub async fn upload_configs(&self, files: &[String]) -> SyncReport {
        let start = Instant::now();
        let configs = LocalStorage::new(&self.paths.configs_dir);
        let mut report = SyncReport::default();
        let total = files.len();

        for (i, relative) in files.iter().enumerate() {
            let data = match configs.read(relative).await {
                Ok(d) => d,
                Err(e) => {
                    warn!("读取配置文件失败 {}: {}", relative, e);
                    self.record_read_failure(&mut report, i + 1, total, relative, e.to_string());
                    continue;
                }
            };

            if let Err(e) = serde_json::from_slice::<serde_json::Value>(&data) {
                warn!("JSON 格式错误 {}: {}", relative, e);
                let error = format!("JSON 格式错误 - {}", e);
                report.invalid.push(UploadFailure {
                    path: relative.clone(),
                    error: error.clone(),
                });
                self.send_progress(UploadProgress {
                    index: i + 1,
                    total,
                    path: relative.clone(),
                    size: data.len() as u64,
                    error: Some(error),
                });
                continue;
            }

            let key = self.remote_config.config_key(relative);
            self.upload_one(&mut report, i + 1, total, relative, &key, data, &policy::config_options())
                .await;
        }

        finish(&mut report, start);
        report
    }

    /// 编辑器的"上传"：把内存中的两个文档直接写到远程
    pub async fn publish_documents(&self, store: &ConfigStore) -> Result<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        let documents = [
            (VERSION_FILE_NAME, render_document(&store.versions)?),
            (SITE_INFO_FILE_NAME, render_document(&store.site)?),
        ];
        let total = documents.len();
        for (i, (name, content)) in documents.into_iter().enumerate() {
            let key = self.remote_config.config_key(name);
            self.upload_one(
                &mut report,
                i + 1,
                total,
                name,
                &key,
                content.into_bytes(),
                &policy::config_options(),
            )
            .await;
        }

        finish(&mut report, start);
        Ok(report)
    }

    // ============ 静态资源 ============

    /// 扫描本地 public 目录（排除配置目录等）
    pub async fn scan_local_static(&self) -> Result<FileSet> {
        let storage = LocalStorage::new(&self.paths.public_dir);
        self.scanner.scan_storage(&storage, None).await
    }

    /// 扫描远程前缀下的所有对象
    pub async fn scan_remote_static(&self) -> Result<FileSet> {
        let root = self.remote_config.static_root();
        FileScanner::new(ScanConfig::none())
            .scan_storage(self.remote.as_ref(), root.as_deref())
            .await
            .map_err(|e| {
                anyhow::Error::new(ToolError::RemoteIo {
                    key: root.clone().unwrap_or_else(|| "/".to_string()),
                    message: e.to_string(),
                })
            })
    }

    /// 功能2/3 的差异计算
    pub async fn plan_incremental(&self) -> Result<Vec<ChangedFile>> {
        let local = self.scan_local_static().await?;
        let remote = self.scan_remote_static().await?;
        let changes = diff_file_sets(&local, &remote);
        info!(
            "增量对比: 本地 {} 个, 远程 {} 个, 需上传 {} 个",
            local.len(),
            remote.len(),
            changes.len()
        );
        Ok(changes)
    }

    /// 功能2: 上传差异文件
    pub async fn upload_changes(&self, changes: &[ChangedFile]) -> SyncReport {
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        self.upload_static(&paths).await
    }

    /// 功能4: 不做对比，上传全部静态资源
    pub async fn upload_all_static(&self, files: &FileSet) -> SyncReport {
        let paths: Vec<&str> = files.keys().map(String::as_str).collect();
        self.upload_static(&paths).await
    }

    /// 逐个读取并上传，单个失败不中断整批
    async fn upload_static(&self, paths: &[&str]) -> SyncReport {
        let start = Instant::now();
        let public = LocalStorage::new(&self.paths.public_dir);
        let mut report = SyncReport::default();
        let total = paths.len();

        for (i, relative) in paths.iter().enumerate() {
            match public.read(relative).await {
                Ok(data) => {
                    let key = self.remote_config.static_key(relative);
                    let options = policy::static_options(relative);
                    self.upload_one(&mut report, i + 1, total, relative, &key, data, &options)
                        .await;
                }
                Err(e) => {
                    warn!("读取本地文件失败 {}: {}", relative, e);
                    self.record_read_failure(&mut report, i + 1, total, relative, e.to_string());
                }
            }
        }

        finish(&mut report, start);
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload_one(
        &self,
        report: &mut SyncReport,
        index: usize,
        total: usize,
        relative: &str,
        key: &str,
        data: Vec<u8>,
        options: &WriteOptions,
    ) {
        let size = data.len() as u64;
        debug!("上传 {} -> {}", relative, key);

        let error = match self.remote.write(key, data, options).await {
            Ok(()) => {
                report.uploaded.push(relative.to_string());
                report.bytes_uploaded += size;
                None
            }
            Err(e) => {
                let err = ToolError::RemoteIo {
                    key: key.to_string(),
                    message: e.to_string(),
                };
                error!("{}", err);
                report.failed.push(UploadFailure {
                    path: relative.to_string(),
                    error: err.to_string(),
                });
                Some(err.to_string())
            }
        };

        self.send_progress(UploadProgress {
            index,
            total,
            path: relative.to_string(),
            size,
            error,
        });
    }

    fn record_read_failure(
        &self,
        report: &mut SyncReport,
        index: usize,
        total: usize,
        relative: &str,
        error: String,
    ) {
        report.failed.push(UploadFailure {
            path: relative.to_string(),
            error: error.clone(),
        });
        self.send_progress(UploadProgress {
            index,
            total,
            path: relative.to_string(),
            size: 0,
            error: Some(error),
        });
    }

    fn send_progress(&self, progress: UploadProgress) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(progress);
        }
    }
}

fn finish(report: &mut SyncReport, start: Instant) {
    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "上传完成: 成功 {} 个, 失败 {} 个, 跳过 {} 个",
        report.uploaded.len(),
        report.failed.len(),
        report.invalid.len()
    );
}
