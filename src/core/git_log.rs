//! 从 git 读取提交日志

use crate::error::{ToolError, ToolResult};
use crate::store::CommitRef;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// git 命令超时
pub const GIT_TIMEOUT_SECS: u64 = 30;

/// 提交日志来源（新 -> 旧）
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn commits(&self) -> ToolResult<Vec<CommitRef>>;
}

/// 调用 `git log --all` 的实现
pub struct GitLog {
    repo: PathBuf,
    timeout: Duration,
}

impl GitLog {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            timeout: Duration::from_secs(GIT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommitSource for GitLog {
    async fn commits(&self) -> ToolResult<Vec<CommitRef>> {
        let output = Command::new("git")
            .args(["log", "--all", "--pretty=format:%h|%s"])
            .current_dir(&self.repo)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Err(_) => return Err(ToolError::ExternalTool("git 命令执行超时".to_string())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::ExternalTool(
                    "未找到 git 命令，请确保已安装 Git".to_string(),
                ))
            }
            Ok(Err(e)) => return Err(ToolError::ExternalTool(format!("启动 git 失败: {}", e))),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(ToolError::ExternalTool(format!(
                "git 命令失败: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let commits = parse_log(&String::from_utf8_lossy(&output.stdout));
        debug!("git log 返回 {} 个提交", commits.len());
        Ok(commits)
    }
}

/// 解析 `hash|subject` 格式的输出，忽略不含分隔符的行
pub fn parse_log(stdout: &str) -> Vec<CommitRef> {
    stdout
        .lines()
        .filter_map(|line| {
            let (hash, message) = line.split_once('|')?;
            Some(CommitRef::new(hash.trim(), message.trim()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log() {
        let out = "abc1234|feat: 新增时间线|含竖线\n\ngarbage line\ndef5678| fix: 修复 \n";
        let commits = parse_log(out);
        assert_eq!(
            commits,
            vec![
                CommitRef::new("abc1234", "feat: 新增时间线|含竖线"),
                CommitRef::new("def5678", "fix: 修复"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_repo_is_external_tool_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = GitLog::new(missing).commits().await.unwrap_err();
        assert!(matches!(err, ToolError::ExternalTool(_)));
    }
}
