//! 提交对账 - 找出 git 历史中尚未记录到任何版本的提交

use crate::store::{CommitRef, VersionRecord};
use std::collections::{BTreeSet, HashMap};

/// 单个提交的对账结果
#[derive(Debug, Clone)]
pub struct CommitVerdict<'a> {
    pub commit: &'a CommitRef,
    /// 记录该提交的版本，None 表示未记录
    pub owner: Option<&'a VersionRecord>,
}

impl CommitVerdict<'_> {
    pub fn is_recorded(&self) -> bool {
        self.owner.is_some()
    }
}

/// 对账报告
#[derive(Debug, Clone)]
pub struct Reconciliation<'a> {
    /// 与提交日志顺序一致（新 -> 旧）
    pub verdicts: Vec<CommitVerdict<'a>>,
    pub total: usize,
    pub recorded: usize,
    pub unrecorded: usize,
    /// 被多个版本同时记录的 hash
    pub duplicate_hashes: Vec<String>,
}

impl<'a> Reconciliation<'a> {
    pub fn unrecorded_commits(&self) -> impl Iterator<Item = &'a CommitRef> + '_ {
        self.verdicts
            .iter()
            .filter(|v| !v.is_recorded())
            .map(|v| v.commit)
    }
}

/// hash -> 所属版本；同一 hash 出现在多个版本时后者覆盖前者
pub fn hash_to_version(records: &[VersionRecord]) -> HashMap<&str, &VersionRecord> {
    let mut map = HashMap::new();
    for record in records {
        for hash in record.commit_hashes() {
            map.insert(hash, record);
        }
    }
    map
}

/// 对账
pub fn reconcile<'a>(records: &'a [VersionRecord], log: &'a [CommitRef]) -> Reconciliation<'a> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut duplicates = BTreeSet::new();
    for record in records {
        for hash in record.commit_hashes() {
            if let Some(prev) = seen.insert(hash, &record.version) {
                if prev != record.version {
                    duplicates.insert(hash.to_string());
                }
            }
        }
    }

    let lookup = hash_to_version(records);

    let verdicts: Vec<CommitVerdict<'a>> = log
        .iter()
        .map(|commit| CommitVerdict {
            commit,
            owner: lookup.get(commit.hash.trim()).copied(),
        })
        .collect();

    let total = verdicts.len();
    let recorded = verdicts.iter().filter(|v| v.is_recorded()).count();

    Reconciliation {
        verdicts,
        total,
        recorded,
        unrecorded: total - recorded,
        duplicate_hashes: duplicates.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(version: &str, hashes: &[&str]) -> VersionRecord {
        let mut r = VersionRecord::new(version, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        r.commits = Some(hashes.iter().map(|h| CommitRef::new(*h, "")).collect());
        r
    }

    fn log(hashes: &[&str]) -> Vec<CommitRef> {
        hashes.iter().map(|h| CommitRef::new(*h, "subject")).collect()
    }

    #[test]
    fn test_basic_reconciliation() {
        let records = vec![record("1.0", &["abc"])];
        let commits = log(&["abc", "def"]);

        let report = reconcile(&records, &commits);
        assert_eq!(report.total, 2);
        assert_eq!(report.recorded, 1);
        assert_eq!(report.unrecorded, 1);
        assert_eq!(report.verdicts[0].owner.map(|v| v.version.as_str()), Some("1.0"));
        assert!(report.verdicts[1].owner.is_none());

        let missing: Vec<&str> = report.unrecorded_commits().map(|c| c.hash.as_str()).collect();
        assert_eq!(missing, vec!["def"]);
    }

    #[test]
    fn test_every_recorded_hash_is_recorded() {
        let records = vec![
            record("1.2", &["a1", " b2 "]),
            record("1.1", &["c3", ""]),
        ];
        let commits = log(&["b2", "x9", "c3", "a1", "y8"]);

        let report = reconcile(&records, &commits);
        for verdict in &report.verdicts {
            let embedded = records
                .iter()
                .any(|r| r.commit_hashes().any(|h| h == verdict.commit.hash));
            assert_eq!(verdict.is_recorded(), embedded);
        }
        assert_eq!(report.recorded + report.unrecorded, report.total);
        assert_eq!(report.recorded, 3);
    }

    #[test]
    fn test_duplicate_hash_last_writer_wins() {
        let records = vec![record("2.0", &["dup"]), record("1.0", &["dup"])];
        let commits = log(&["dup"]);

        let report = reconcile(&records, &commits);
        assert_eq!(report.verdicts[0].owner.map(|v| v.version.as_str()), Some("1.0"));
        assert_eq!(report.duplicate_hashes, vec!["dup".to_string()]);
    }

    #[test]
    fn test_empty_inputs() {
        let report = reconcile(&[], &[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.recorded, 0);
        assert_eq!(report.unrecorded, 0);
    }
}
