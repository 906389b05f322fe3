//! 提交时间线：git 日志与版本记录对账

use super::Console;
use crate::cli::TimelineArgs;
use crate::config::ProjectPaths;
use crate::core::{reconcile, CommitSource, DocumentWatcher, Reconciliation, DEFAULT_DEBOUNCE_MS};
use crate::store::ConfigStore;
use anyhow::Result;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::warn;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineView<'a> {
    total: usize,
    recorded: usize,
    unrecorded: usize,
    duplicate_hashes: &'a [String],
    commits: Vec<CommitView<'a>>,
}

#[derive(Serialize)]
struct CommitView<'a> {
    hash: &'a str,
    message: &'a str,
    version: Option<&'a str>,
}

impl<'a> TimelineView<'a> {
    fn new(report: &'a Reconciliation<'a>, unrecorded_only: bool) -> Self {
        Self {
            total: report.total,
            recorded: report.recorded,
            unrecorded: report.unrecorded,
            duplicate_hashes: &report.duplicate_hashes,
            commits: report
                .verdicts
                .iter()
                .filter(|v| !unrecorded_only || !v.is_recorded())
                .map(|v| CommitView {
                    hash: &v.commit.hash,
                    message: v.commit.message(),
                    version: v.owner.map(|o| o.version.as_str()),
                })
                .collect(),
        }
    }
}

pub async fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    source: &dyn CommitSource,
    args: &TimelineArgs,
) -> Result<()> {
    let store = super::load_store(paths)?;
    render(console, &store, source, args).await?;

    if !args.watch {
        return Ok(());
    }

    let files = [paths.version_file.clone(), paths.site_info_file.clone()];
    let mut watcher = DocumentWatcher::new(&files, Duration::from_millis(DEFAULT_DEBOUNCE_MS))?;
    writeln!(console, "\n👀 正在监听配置文件变化，Ctrl+C 退出")?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = watcher.changed() => {
                if !changed {
                    break;
                }
                match ConfigStore::load(paths) {
                    Ok(store) => {
                        writeln!(console, "\n🔄 配置已变化，重新对比")?;
                        if let Err(e) = render(console, &store, source, args).await {
                            writeln!(console, "❌ {:#}", e)?;
                        }
                    }
                    // 编辑器保存到一半时可能读到不完整的文件，等下一次变更
                    Err(e) if e.is_load_error() => {
                        warn!("重新加载配置失败: {}", e);
                        writeln!(console, "⚠️ {}", e)?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    writeln!(console, "已停止监听")?;
    Ok(())
}

async fn render<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &ConfigStore,
    source: &dyn CommitSource,
    args: &TimelineArgs,
) -> Result<()> {
    let log = source.commits().await?;
    let report = reconcile(store.versions.version_details(), &log);
    let view = TimelineView::new(&report, args.unrecorded);

    if args.json {
        writeln!(console, "{}", serde_json::to_string_pretty(&view)?)?;
        return Ok(());
    }

    writeln!(
        console,
        "共 {} 个提交: ✅ 已记录 {}, ⚠️ 未记录 {}",
        view.total, view.recorded, view.unrecorded
    )?;
    for commit in &view.commits {
        match commit.version {
            Some(version) => writeln!(console, "  ✅ {} {}  → v{}", commit.hash, commit.message, version)?,
            None => writeln!(console, "  ⚠️ {} {}  (未记录)", commit.hash, commit.message)?,
        }
    }
    if !view.duplicate_hashes.is_empty() {
        writeln!(
            console,
            "⚠️ 以下提交被多个版本记录: {}",
            view.duplicate_hashes.join(", ")
        )?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::fixed;
    use super::*;
    use crate::commands::prompt::test_support::{console, output};
    use crate::commands::test_support::project;

    fn args(json: bool, unrecorded: bool) -> TimelineArgs {
        TimelineArgs {
            watch: false,
            json,
            unrecorded,
        }
    }

    #[tokio::test]
    async fn test_text_report() {
        let (_dir, paths) = project();
        let log = fixed(&[("def5678", "fix: 新修复"), ("abc1234", "feat: 时间线")]);

        let mut c = console("");
        run(&mut c, &paths, &log, &args(false, false)).await.unwrap();
        let out = output(c);
        assert!(out.contains("共 2 个提交: ✅ 已记录 1, ⚠️ 未记录 1"));
        assert!(out.contains("⚠️ def5678 fix: 新修复  (未记录)"));
        assert!(out.contains("✅ abc1234 feat: 时间线  → v1.2.0"));
    }

    #[tokio::test]
    async fn test_json_report_unrecorded_only() {
        let (_dir, paths) = project();
        let log = fixed(&[("def5678", "fix"), ("abc1234", "feat")]);

        let mut c = console("");
        run(&mut c, &paths, &log, &args(true, true)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output(c)).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["unrecorded"], 1);
        assert_eq!(value["commits"].as_array().unwrap().len(), 1);
        assert_eq!(value["commits"][0]["hash"], "def5678");
        assert!(value["commits"][0]["version"].is_null());
    }
}
