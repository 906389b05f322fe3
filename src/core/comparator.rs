use super::scanner::FileSet;
use serde::Serialize;

/// 需要上传的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeReason {
    /// 远程不存在
    New,
    /// 大小不同
    Modified,
}

impl std::fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeReason::New => write!(f, "新增"),
            ChangeReason::Modified => write!(f, "修改"),
        }
    }
}

/// 一个需要上传的本地文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub path: String,
    pub size: u64,
    pub reason: ChangeReason,
}

/// 比较本地与远程文件集合
///
/// 只看名称和大小：远程缺失为 `New`，大小不同为 `Modified`，
/// 大小相同视为未变化。仅存在于远程的文件不报告（不做删除检测）。
/// 输出顺序与 `local` 的迭代顺序一致。
pub fn diff_file_sets(local: &FileSet, remote: &FileSet) -> Vec<ChangedFile> {
    local
        .iter()
        .filter_map(|(path, &size)| {
            let reason = match remote.get(path) {
                None => ChangeReason::New,
                Some(&remote_size) if remote_size != size => {
                    tracing::debug!(
                        "文件大小不同: {} (local={}, remote={})",
                        path,
                        size,
                        remote_size
                    );
                    ChangeReason::Modified
                }
                Some(_) => return None,
            };
            Some(ChangedFile {
                path: path.clone(),
                size,
                reason,
            })
        })
        .collect()
}

/// 变更统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub new_count: usize,
    pub modified_count: usize,
    pub total_bytes: u64,
}

impl DiffSummary {
    pub fn from_changes(changes: &[ChangedFile]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.reason {
                ChangeReason::New => summary.new_count += 1,
                ChangeReason::Modified => summary.modified_count += 1,
            }
            summary.total_bytes += change.size;
        }
        summary
    }

    pub fn total_files(&self) -> usize {
        self.new_count + self.modified_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, u64)]) -> FileSet {
        entries.iter().map(|(p, s)| (p.to_string(), *s)).collect()
    }

    #[test]
    fn test_new_file_detected() {
        let local = set(&[("a.png", 100), ("b.png", 200)]);
        let remote = set(&[("a.png", 100)]);

        let diff = diff_file_sets(&local, &remote);
        assert_eq!(
            diff,
            vec![ChangedFile {
                path: "b.png".to_string(),
                size: 200,
                reason: ChangeReason::New,
            }]
        );
    }

    #[test]
    fn test_size_change_is_modified_and_equal_size_skipped() {
        let local = set(&[("a.png", 100), ("b.png", 200), ("c.png", 300)]);
        let remote = set(&[("a.png", 100), ("b.png", 201), ("c.png", 300)]);

        let diff = diff_file_sets(&local, &remote);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "b.png");
        assert_eq!(diff[0].reason, ChangeReason::Modified);
    }

    #[test]
    fn test_remote_only_not_reported() {
        let local = set(&[]);
        let remote = set(&[("old.png", 1)]);
        assert!(diff_file_sets(&local, &remote).is_empty());
    }

    #[test]
    fn test_every_path_classified_by_rule() {
        let local = set(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
        let remote = set(&[("a", 1), ("b", 20), ("e", 5)]);
        let diff = diff_file_sets(&local, &remote);

        for (path, size) in &local {
            let entry = diff.iter().find(|c| &c.path == path);
            match remote.get(path) {
                None => assert_eq!(entry.map(|c| c.reason), Some(ChangeReason::New)),
                Some(r) if r != size => {
                    assert_eq!(entry.map(|c| c.reason), Some(ChangeReason::Modified))
                }
                Some(_) => assert!(entry.is_none()),
            }
        }

        let summary = DiffSummary::from_changes(&diff);
        assert_eq!(summary.new_count, 2);
        assert_eq!(summary.modified_count, 1);
        assert_eq!(summary.total_bytes, 2 + 3 + 4);
        assert_eq!(summary.total_files(), 3);
    }
}
