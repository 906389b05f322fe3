//! 版本记录命令

use super::{load_store, save_store, today, Console};
use crate::cli::{VersionAddArgs, VersionCommand, VersionEditArgs};
use crate::config::ProjectPaths;
use crate::core::{reconcile, CommitSource, VersionDraft};
use crate::error::ToolError;
use crate::store::{CommitRef, ConfigStore, VersionRecord};
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::warn;

pub async fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    source: &dyn CommitSource,
    cmd: VersionCommand,
) -> Result<()> {
    let mut store = load_store(paths)?;

    match cmd {
        VersionCommand::List => list(console, &store)?,
        VersionCommand::Show { version } => {
            let record = store
                .find_version(&version)
                .ok_or(ToolError::VersionNotFound(version.clone()))?;
            show(console, record, store.versions.current_version() == record.version)?;
        }
        VersionCommand::Add(args) => {
            let current = args.current;
            let record = add(console, &store, source, args).await?;
            let version = record.version.clone();
            store.insert_version(record)?;
            if current {
                store.set_current_version(&version);
            }
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 已新增版本 {}", version)?;
        }
        VersionCommand::Edit(args) => {
            let key = args.version.clone();
            let record = edit(console, &store, source, args).await?;
            let renamed = record.version.clone();
            store.update_version(&key, record)?;
            if renamed != key && store.versions.current_version() == key {
                store.set_current_version(&renamed);
            }
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 已更新版本 {}", renamed)?;
        }
        VersionCommand::SetCurrent { version } => {
            if store.find_version(&version).is_none() {
                return Err(ToolError::VersionNotFound(version).into());
            }
            store.set_current_version(&version);
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 当前版本已设为 {}", version)?;
        }
    }
    Ok(())
}

/// 编辑时读取提交日志失败不致命，只是无法刷新提交信息
async fn commits_or_empty(source: &dyn CommitSource) -> Vec<CommitRef> {
    match source.commits().await {
        Ok(log) => log,
        Err(e) => {
            warn!("读取 git 日志失败: {}", e);
            Vec::new()
        }
    }
}

/// 选择提交，不在日志中的 hash 给出提示
fn select_commits<W: Write>(
    out: &mut W,
    draft: &mut VersionDraft<'_>,
    hashes: &[String],
) -> std::io::Result<()> {
    for hash in hashes {
        if !draft.select(hash) && !draft.selected().iter().any(|c| c.hash == hash.trim()) {
            writeln!(out, "⚠️ 提交 {} 不在 git 日志中，已忽略", hash)?;
        }
    }
    Ok(())
}

async fn add<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &ConfigStore,
    source: &dyn CommitSource,
    args: VersionAddArgs,
) -> Result<VersionRecord> {
    let needs_log = !args.commits.is_empty() || args.all_unrecorded;
    let log = if needs_log { source.commits().await? } else { Vec::new() };

    let mut draft = VersionDraft::new(&log, args.version, args.date.unwrap_or_else(today));
    draft.typ = args.typ;
    draft.milestone = args.milestone;
    draft.theme = args.theme;
    draft.set_features_text(&args.features.join("\n"));

    select_commits(console, &mut draft, &args.commits)?;
    if args.all_unrecorded {
        let report = reconcile(store.versions.version_details(), &log);
        let added = draft.select_all(report.unrecorded_commits().map(|c| c.hash.as_str()));
        writeln!(console, "已关联 {} 个未记录的提交", added)?;
    }

    Ok(draft.build())
}

async fn edit<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &ConfigStore,
    source: &dyn CommitSource,
    args: VersionEditArgs,
) -> Result<VersionRecord> {
    let existing = store
        .find_version(&args.version)
        .ok_or_else(|| ToolError::VersionNotFound(args.version.clone()))?;
    let log = commits_or_empty(source).await;

    let mut draft = VersionDraft::from_record(&log, existing);
    if let Some(version) = args.rename {
        draft.version = version;
    }
    if let Some(date) = args.date {
        draft.date = date;
    }
    if let Some(typ) = args.typ {
        draft.typ = typ;
    }
    if let Some(milestone) = args.milestone {
        draft.milestone = milestone;
    }
    if let Some(theme) = args.theme {
        draft.theme = theme;
    }
    for hash in &args.remove_commits {
        if !draft.deselect(hash) {
            writeln!(console, "⚠️ 版本中没有提交 {}", hash)?;
        }
    }
    select_commits(console, &mut draft, &args.add_commits)?;
    if args.clear_features {
        draft.features.clear();
    } else if !args.features.is_empty() {
        draft.set_features_text(&args.features.join("\n"));
    }

    Ok(draft.build())
}

fn list<W: Write>(out: &mut W, store: &ConfigStore) -> std::io::Result<()> {
    let versions = store.versions.version_details();
    if versions.is_empty() {
        return writeln!(out, "暂无版本记录");
    }
    for v in versions {
        let marker = if v.version == store.versions.current_version() { "*" } else { " " };
        let milestone = if v.is_milestone() { " ★" } else { "" };
        writeln!(
            out,
            "{} {:<10} {}  {:<5}{}  {}  ({} 个提交)",
            marker,
            v.version,
            v.date,
            v.version_type().to_string(),
            milestone,
            v.theme(),
            v.commits().len()
        )?;
    }
    Ok(())
}

fn show<W: Write>(out: &mut W, record: &VersionRecord, current: bool) -> std::io::Result<()> {
    writeln!(out, "版本: {}{}", record.version, if current { "（当前）" } else { "" })?;
    writeln!(out, "日期: {}", record.date)?;
    writeln!(out, "类型: {}", record.version_type())?;
    writeln!(out, "里程碑: {}", if record.is_milestone() { "是" } else { "否" })?;
    if !record.theme().is_empty() {
        writeln!(out, "主题: {}", record.theme())?;
    }
    if !record.features().is_empty() {
        writeln!(out, "功能:")?;
        for feature in record.features() {
            writeln!(out, "  - {}", feature)?;
        }
    }
    if !record.commits().is_empty() {
        writeln!(out, "提交:")?;
        for commit in record.commits() {
            writeln!(out, "  {} {}", commit.hash, commit.message())?;
        }
    }
    Ok(())
}
