use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// 可选字段用 Option 建模，文档中缺省的字段写回时仍然缺省

/// 版本类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    Major,
    Minor,
    #[default]
    Patch,
}

impl std::fmt::Display for VersionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionType::Major => write!(f, "major"),
            VersionType::Minor => write!(f, "minor"),
            VersionType::Patch => write!(f, "patch"),
        }
    }
}

impl std::str::FromStr for VersionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(VersionType::Major),
            "minor" => Ok(VersionType::Minor),
            "patch" => Ok(VersionType::Patch),
            _ => Err(format!("无效的版本类型: {}", s)),
        }
    }
}

/// 版本中引用的提交
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitRef {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommitRef {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: Some(message.into()),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

/// 版本记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionRecord {
    pub version: String,
    pub date: NaiveDate,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<VersionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits: Option<Vec<CommitRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    /// 未建模的字段，原样写回
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionRecord {
    /// 新建的记录带齐所有字段
    pub fn new(version: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            version: version.into(),
            date,
            typ: Some(VersionType::Patch),
            milestone: Some(false),
            theme: Some(String::new()),
            commits: Some(Vec::new()),
            features: Some(Vec::new()),
            extra: Map::new(),
        }
    }

    pub fn version_type(&self) -> VersionType {
        self.typ.unwrap_or_default()
    }

    pub fn is_milestone(&self) -> bool {
        self.milestone.unwrap_or(false)
    }

    pub fn theme(&self) -> &str {
        self.theme.as_deref().unwrap_or_default()
    }

    pub fn commits(&self) -> &[CommitRef] {
        self.commits.as_deref().unwrap_or_default()
    }

    pub fn features(&self) -> &[String] {
        self.features.as_deref().unwrap_or_default()
    }

    /// 记录中的非空 commit hash
    pub fn commit_hashes(&self) -> impl Iterator<Item = &str> {
        self.commits()
            .iter()
            .map(|c| c.hash.trim())
            .filter(|h| !h.is_empty())
    }
}

/// version-history.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VersionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_details: Option<Vec<VersionRecord>>,
    /// versionRules / versionStats 等
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionDocument {
    pub fn current_version(&self) -> &str {
        self.current_version.as_deref().unwrap_or_default()
    }

    pub fn version_details(&self) -> &[VersionRecord] {
        self.version_details.as_deref().unwrap_or_default()
    }

    pub fn version_details_mut(&mut self) -> &mut Vec<VersionRecord> {
        self.version_details.get_or_insert_with(Vec::new)
    }
}

/// 赞助者
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sponsor {
    pub name: String,
    /// 保留磁盘上的数字原样，避免 10 被写成 10.0
    pub amount: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 最小赞助金额
pub const MIN_SPONSOR_AMOUNT: f64 = 0.01;

/// 金额保留两位小数，整数金额写成整数
pub fn round_amount(amount: f64) -> Option<Number> {
    let rounded = (amount * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 && rounded.abs() < i64::MAX as f64 {
        Some(Number::from(rounded as i64))
    } else {
        Number::from_f64(rounded)
    }
}

impl Sponsor {
    pub fn new(name: impl Into<String>, amount: f64, date: NaiveDate) -> Option<Self> {
        Some(Self {
            name: name.into(),
            amount: round_amount(amount)?,
            date: Some(date),
            extra: Map::new(),
        })
    }

    pub fn amount_value(&self) -> f64 {
        self.amount.as_f64().unwrap_or(0.0)
    }
}

/// 站点信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsors: Option<Vec<Sponsor>>,
    /// currentVersion 等
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteInfo {
    pub fn sponsors(&self) -> &[Sponsor] {
        self.sponsors.as_deref().unwrap_or_default()
    }

    pub fn sponsors_mut(&mut self) -> &mut Vec<Sponsor> {
        self.sponsors.get_or_insert_with(Vec::new)
    }
}

/// site-info.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfoDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_info: Option<SiteInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteInfoDocument {
    pub fn site_info_mut(&mut self) -> &mut SiteInfo {
        self.site_info.get_or_insert_with(SiteInfo::default)
    }
}

/// 站点信息可编辑字段，None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct SiteInfoPatch {
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub github: Option<String>,
}
