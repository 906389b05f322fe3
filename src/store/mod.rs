//! 配置文档存储 - version-history.json 与 site-info.json 的加载、修改与保存

pub mod models;
pub use models::*;

use crate::config::ProjectPaths;
use crate::error::{ToolError, ToolResult};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// 两个配置文档的内存副本
///
/// 由调用方显式持有并传入各个命令，不存在全局状态。
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    pub versions: VersionDocument,
    pub site: SiteInfoDocument,
}

impl ConfigStore {
    pub fn new(versions: VersionDocument, site: SiteInfoDocument) -> Self {
        Self { versions, site }
    }

    /// 从项目目录加载两个文档
    pub fn load(paths: &ProjectPaths) -> ToolResult<Self> {
        let versions: VersionDocument = read_document(&paths.version_file)?;
        let site: SiteInfoDocument = read_document(&paths.site_info_file)?;
        info!(
            "已加载配置: {} 个版本, {} 位赞助者",
            versions.version_details().len(),
            site.site_info.as_ref().map_or(0, |info| info.sponsors().len())
        );
        Ok(Self { versions, site })
    }

    /// 保存两个文档到本地
    pub fn save(&self, paths: &ProjectPaths) -> ToolResult<()> {
        write_document(&paths.version_file, &self.versions)?;
        write_document(&paths.site_info_file, &self.site)?;
        info!("配置已保存到 {}", paths.configs_dir.display());
        Ok(())
    }

    // ============ 版本 ============

    pub fn find_version(&self, version: &str) -> Option<&VersionRecord> {
        self.versions
            .version_details()
            .iter()
            .find(|v| v.version == version)
    }

    /// 新增版本，插入到列表最前面
    pub fn insert_version(&mut self, record: VersionRecord) -> ToolResult<()> {
        if self.find_version(&record.version).is_some() {
            return Err(ToolError::DuplicateVersion(record.version));
        }
        self.check_commit_conflicts(&record, None)?;

        debug!("新增版本 {}", record.version);
        self.versions.version_details_mut().insert(0, record);
        Ok(())
    }

    /// 用新记录替换 `key` 对应的版本
    pub fn update_version(&mut self, key: &str, record: VersionRecord) -> ToolResult<()> {
        let index = self
            .versions
            .version_details()
            .iter()
            .position(|v| v.version == key)
            .ok_or_else(|| ToolError::VersionNotFound(key.to_string()))?;

        if record.version != key && self.find_version(&record.version).is_some() {
            return Err(ToolError::DuplicateVersion(record.version));
        }
        self.check_commit_conflicts(&record, Some(key))?;

        debug!("更新版本 {} -> {}", key, record.version);
        self.versions.version_details_mut()[index] = record;
        Ok(())
    }

    pub fn set_current_version(&mut self, version: &str) {
        self.versions.current_version = Some(version.to_string());
    }

    /// 检查记录中的 commit 是否已被其他版本占用
    fn check_commit_conflicts(&self, record: &VersionRecord, skip: Option<&str>) -> ToolResult<()> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for other in self.versions.version_details() {
            if Some(other.version.as_str()) == skip {
                continue;
            }
            for hash in other.commit_hashes() {
                owners.insert(hash, &other.version);
            }
        }

        for hash in record.commit_hashes() {
            if let Some(owner) = owners.get(hash) {
                return Err(ToolError::CommitConflict {
                    hash: hash.to_string(),
                    owner: owner.to_string(),
                });
            }
        }
        Ok(())
    }

    // ============ 赞助者 ============

    pub fn sponsors(&self) -> &[Sponsor] {
        self.site
            .site_info
            .as_ref()
            .map(|info| info.sponsors())
            .unwrap_or_default()
    }

    pub fn add_sponsor(&mut self, sponsor: Sponsor) -> ToolResult<()> {
        validate_sponsor(&sponsor)?;
        self.site.site_info_mut().sponsors_mut().push(sponsor);
        Ok(())
    }

    pub fn update_sponsor_at(&mut self, index: usize, sponsor: Sponsor) -> ToolResult<()> {
        validate_sponsor(&sponsor)?;
        let sponsors = self.site.site_info_mut().sponsors_mut();
        let len = sponsors.len();
        let slot = sponsors
            .get_mut(index)
            .ok_or(ToolError::SponsorIndexOutOfRange { index, len })?;
        *slot = sponsor;
        Ok(())
    }

    pub fn remove_sponsor_at(&mut self, index: usize) -> ToolResult<Sponsor> {
        let len = self.sponsors().len();
        if index >= len {
            return Err(ToolError::SponsorIndexOutOfRange { index, len });
        }
        Ok(self.site.site_info_mut().sponsors_mut().remove(index))
    }

    // ============ 站点信息 ============

    pub fn apply_site_patch(&mut self, patch: SiteInfoPatch) {
        let info = self.site.site_info_mut();
        for (field, value) in [
            (&mut info.name, patch.name),
            (&mut info.name_en, patch.name_en),
            (&mut info.description, patch.description),
            (&mut info.author, patch.author),
            (&mut info.github, patch.github),
        ] {
            if value.is_some() {
                *field = value;
            }
        }
    }

    /// 保存前的收尾：更新时间戳并把当前版本号同步到站点信息
    pub fn touch(&mut self, today: NaiveDate) {
        self.versions.last_updated = Some(today);
        self.site.last_updated = Some(today);
        if let Some(current) = self.versions.current_version.clone() {
            self.site
                .site_info_mut()
                .extra
                .insert("currentVersion".to_string(), serde_json::Value::String(current));
        }
    }
}

fn validate_sponsor(sponsor: &Sponsor) -> ToolResult<()> {
    if sponsor.name.trim().is_empty() {
        return Err(ToolError::InvalidSponsor("姓名不能为空".to_string()));
    }
    if sponsor.amount_value() < MIN_SPONSOR_AMOUNT {
        return Err(ToolError::InvalidSponsor(format!(
            "金额必须不小于 {}",
            MIN_SPONSOR_AMOUNT
        )));
    }
    Ok(())
}

/// 读取并解析 JSON 文档
pub fn read_document<T: DeserializeOwned>(path: &Path) -> ToolResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ToolError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ToolError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// 序列化为两空格缩进的 JSON（非 ASCII 字符不转义）
pub fn render_document<T: Serialize>(doc: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(doc)
}

/// 写入 JSON 文档：先写临时文件再重命名
pub fn write_document<T: Serialize>(path: &Path, doc: &T) -> ToolResult<()> {
    let to_write_err = |source: std::io::Error| ToolError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };

    let content = render_document(doc).map_err(|e| to_write_err(e.into()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(to_write_err)?;
    }
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, content).map_err(to_write_err)?;
    std::fs::rename(&temp_path, path).map_err(to_write_err)?;
    Ok(())
}
