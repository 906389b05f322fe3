//! 版本草稿 - 从提交日志中挑选 commit 组成版本记录

use crate::store::{CommitRef, VersionRecord, VersionType};
use chrono::NaiveDate;
use serde_json::Map;

/// 编辑中的版本
#[derive(Debug, Clone)]
pub struct VersionDraft<'a> {
    available: &'a [CommitRef],
    pub version: String,
    pub date: NaiveDate,
    pub typ: VersionType,
    pub milestone: bool,
    pub theme: String,
    selected: Vec<CommitRef>,
    pub features: Vec<String>,
    extra: Map<String, serde_json::Value>,
}

impl<'a> VersionDraft<'a> {
    /// 新增模式
    pub fn new(available: &'a [CommitRef], version: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            available,
            version: version.into(),
            date,
            typ: VersionType::Patch,
            milestone: false,
            theme: String::new(),
            selected: Vec::new(),
            features: Vec::new(),
            extra: Map::new(),
        }
    }

    /// 编辑模式：以现有记录为起点，commit 信息优先取日志中的最新内容
    pub fn from_record(available: &'a [CommitRef], record: &VersionRecord) -> Self {
        let selected = record
            .commits()
            .iter()
            .map(|c| {
                available
                    .iter()
                    .find(|a| a.hash == c.hash.trim())
                    .cloned()
                    .unwrap_or_else(|| c.clone())
            })
            .collect();

        Self {
            available,
            version: record.version.clone(),
            date: record.date,
            typ: record.version_type(),
            milestone: record.is_milestone(),
            theme: record.theme().to_string(),
            selected,
            features: record.features().to_vec(),
            extra: record.extra.clone(),
        }
    }

    pub fn selected(&self) -> &[CommitRef] {
        &self.selected
    }

    /// 按 hash 从可用提交中选择；已选或找不到时返回 false
    pub fn select(&mut self, hash: &str) -> bool {
        let hash = hash.trim();
        if self.selected.iter().any(|c| c.hash == hash) {
            return false;
        }
        match self.available.iter().find(|c| c.hash == hash) {
            Some(commit) => {
                self.selected.push(commit.clone());
                true
            }
            None => false,
        }
    }

    /// 批量选择，返回实际新增的数量
    pub fn select_all<'h>(&mut self, hashes: impl IntoIterator<Item = &'h str>) -> usize {
        hashes.into_iter().filter(|h| self.select(h)).count()
    }

    pub fn deselect(&mut self, hash: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|c| c.hash != hash.trim());
        before != self.selected.len()
    }

    /// 每行一个 feature，去掉首尾空白和空行
    pub fn set_features_text(&mut self, text: &str) {
        self.features = parse_features(text);
    }

    pub fn build(self) -> VersionRecord {
        VersionRecord {
            version: self.version.trim().to_string(),
            date: self.date,
            typ: Some(self.typ),
            milestone: Some(self.milestone),
            theme: Some(self.theme),
            commits: Some(self.selected),
            features: Some(self.features),
            extra: self.extra,
        }
    }
}

pub fn parse_features(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn available() -> Vec<CommitRef> {
        vec![
            CommitRef::new("aaa1111", "feat: A"),
            CommitRef::new("bbb2222", "fix: B"),
            CommitRef::new("ccc3333", "docs: C"),
        ]
    }

    #[test]
    fn test_select_dedupes_and_ignores_unknown() {
        let log = available();
        let mut draft = VersionDraft::new(&log, "1.3.0", today());

        assert!(draft.select("bbb2222"));
        assert!(!draft.select("bbb2222"));
        assert!(!draft.select("zzz9999"));
        assert_eq!(draft.select_all(["aaa1111", "bbb2222"]), 1);
        assert!(draft.deselect("bbb2222"));

        let record = draft.build();
        assert_eq!(record.commits(), [CommitRef::new("aaa1111", "feat: A")]);
    }

    #[test]
    fn test_features_text() {
        let log = available();
        let mut draft = VersionDraft::new(&log, " 1.3.0 ", today());
        draft.set_features_text("  新增版本控制系统 \n\nToast通知功能\n   \n");
        let record = draft.build();
        assert_eq!(record.version, "1.3.0");
        assert_eq!(record.features(), ["新增版本控制系统", "Toast通知功能"]);
    }

    #[test]
    fn test_edit_mode_refreshes_known_messages() {
        let log = available();
        let mut existing = VersionRecord::new("1.2.0", today());
        existing.typ = Some(VersionType::Minor);
        existing.commits = Some(vec![
            CommitRef::new("aaa1111", "old message"),
            CommitRef::new("gone000", "rewritten away"),
        ]);

        let draft = VersionDraft::from_record(&log, &existing);
        assert_eq!(draft.selected()[0].message(), "feat: A");
        assert_eq!(draft.selected()[1].message(), "rewritten away");

        let record = draft.build();
        assert_eq!(record.typ, Some(VersionType::Minor));
        assert_eq!(record.version, "1.2.0");
    }

    #[test]
    fn test_edit_mode_matches_padded_hashes() {
        let log = available();
        let mut existing = VersionRecord::new("1.2.0", today());
        existing.commits = Some(vec![CommitRef {
            hash: " aaa1111 ".to_string(),
            message: None,
        }]);

        let mut draft = VersionDraft::from_record(&log, &existing);
        assert_eq!(draft.selected(), [CommitRef::new("aaa1111", "feat: A")]);
        assert!(!draft.select("aaa1111"));
    }

    #[test]
    fn test_edit_mode_fills_missing_fields() {
        let log = available();
        let sparse: VersionRecord =
            serde_json::from_str(r#"{"version":"1.0.0","date":"2025-01-01"}"#).unwrap();

        let record = VersionDraft::from_record(&log, &sparse).build();
        assert_eq!(record.typ, Some(VersionType::Patch));
        assert_eq!(record.milestone, Some(false));
        assert!(record.commits().is_empty());
    }
}
