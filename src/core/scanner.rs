use crate::storage::Storage;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// 相对路径 -> 文件大小（按路径排序）
pub type FileSet = BTreeMap<String, u64>;

/// 文件扫描器配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 排除规则：`*.ext` 按文件名匹配，其余匹配文件名或任意一级目录名
    pub exclude_patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "*.swp".to_string(),
                "*.tmp".to_string(),
                ".git".to_string(),
                "node_modules".to_string(),
                // 配置文件单独管理
                crate::config::CONFIGS_DIR_NAME.to_string(),
            ],
        }
    }
}

impl ScanConfig {
    /// 不排除任何文件（远程列举用）
    pub fn none() -> Self {
        Self {
            exclude_patterns: Vec::new(),
        }
    }
}

enum Rule {
    Glob(Regex),
    Name(String),
}

/// 文件扫描器
pub struct FileScanner {
    rules: Vec<Rule>,
}

impl FileScanner {
    pub fn new(config: ScanConfig) -> Self {
        let rules = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| {
                if pattern.contains('*') {
                    let escaped = regex::escape(pattern).replace("\\*", ".*");
                    Regex::new(&format!("^{}$", escaped)).ok().map(Rule::Glob)
                } else {
                    Some(Rule::Name(pattern.clone()))
                }
            })
            .collect();
        Self { rules }
    }

    /// 检查路径是否应该被排除
    pub fn should_exclude(&self, path: &str) -> bool {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let name = components.last().copied().unwrap_or(path);

        self.rules.iter().any(|rule| match rule {
            Rule::Glob(re) => re.is_match(name),
            Rule::Name(n) => components.iter().any(|c| *c == n.as_str()),
        })
    }

    /// 扫描存储，返回相对 `prefix` 的路径 -> 大小
    pub async fn scan_storage(&self, storage: &dyn Storage, prefix: Option<&str>) -> Result<FileSet> {
        info!("开始扫描存储: {}, prefix: {:?}", storage.name(), prefix);

        let files = storage.list_files(prefix).await?;
        debug!("list_files 返回 {} 个条目", files.len());

        let strip = prefix.unwrap_or("");
        let mut tree = FileSet::new();
        let mut excluded_count = 0;

        for file in files {
            if file.is_dir {
                continue;
            }

            let relative = file
                .path
                .strip_prefix(strip)
                .unwrap_or(&file.path)
                .trim_start_matches('/')
                .to_string();
            if relative.is_empty() {
                continue;
            }

            if self.should_exclude(&relative) {
                debug!("排除文件: {}", relative);
                excluded_count += 1;
                continue;
            }

            tree.insert(relative, file.size);
        }

        info!("扫描完成: {} 个文件, {} 个被排除", tree.len(), excluded_count);
        Ok(tree)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
