//! 同步命令：交互菜单、--mode 直接执行与 publish

use super::{format_size, load_store, save_store, Console};
use crate::config::{ProjectPaths, RemoteConfig};
use crate::core::{DiffSummary, SyncDriver, SyncMode, SyncReport, UploadProgress};
use crate::storage::create_remote;
use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 差异列表最多显示的条数
const PREVIEW_LIMIT: usize = 20;

fn connect(paths: &ProjectPaths) -> Result<SyncDriver> {
    let remote_config = RemoteConfig::from_env(&paths.root)?;
    let remote = create_remote(&remote_config).context("创建 OSS 客户端失败")?;
    Ok(SyncDriver::new(paths.clone(), remote_config, remote))
}

fn progress_line(p: &UploadProgress) -> String {
    match &p.error {
        None => format!("[{}/{}] ✅ {} ({})", p.index, p.total, p.path, format_size(p.size)),
        Some(e) => format!("[{}/{}] ❌ {}: {}", p.index, p.total, p.path, e),
    }
}

/// 后台打印进度，所有发送端释放后任务结束并交还输出
fn spawn_progress_printer<O>(mut out: O) -> (mpsc::UnboundedSender<UploadProgress>, JoinHandle<O>)
where
    O: Write + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();
    let handle = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            let _ = writeln!(out, "{}", progress_line(&p));
        }
        let _ = out.flush();
        out
    });
    (tx, handle)
}

pub async fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    mode: Option<SyncMode>,
    yes: bool,
) -> Result<()> {
    // 进度打印到 stderr，不干扰标准输出里的汇总
    let (tx, printer) = spawn_progress_printer(std::io::stderr());
    let driver = connect(paths)?.with_progress(tx);
    writeln!(console, "📦 目标: {}", driver.remote_name())?;

    let result = execute(console, &driver, mode, yes).await;
    drop(driver);
    if let Err(e) = printer.await {
        tracing::warn!("进度输出任务异常结束: {}", e);
    }
    result
}

async fn execute<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    driver: &SyncDriver,
    mode: Option<SyncMode>,
    yes: bool,
) -> Result<()> {
    match mode {
        Some(mode) => {
            if let Some(report) = run_mode(console, driver, mode, yes).await? {
                if !report.is_success() {
                    bail!(
                        "{} 个文件上传失败, {} 个文件被跳过",
                        report.failed.len(),
                        report.invalid.len()
                    );
                }
            }
            Ok(())
        }
        None => menu(console, driver).await,
    }
}

/// 交互菜单，0 或输入结束时退出
pub async fn menu<R: BufRead, W: Write>(console: &mut Console<R, W>, driver: &SyncDriver) -> Result<()> {
    loop {
        writeln!(console)?;
        writeln!(console, "========== OSS 同步 ==========")?;
        for (choice, mode) in [
            ("1", SyncMode::Configs),
            ("2", SyncMode::Incremental),
            ("3", SyncMode::Preview),
            ("4", SyncMode::AllStatic),
        ] {
            writeln!(console, "  {}. {}", choice, mode.title())?;
        }
        writeln!(console, "  0. 退出")?;

        let Some(choice) = console.ask("请选择 (0-4): ")? else {
            break;
        };
        if choice == "0" {
            writeln!(console, "👋 再见")?;
            break;
        }

        match SyncMode::from_choice(&choice) {
            Some(mode) => {
                // 菜单中单个功能失败不退出
                if let Err(e) = run_mode(console, driver, mode, false).await {
                    writeln!(console, "❌ {:#}", e)?;
                }
            }
            None => writeln!(console, "⚠️ 无效选择: {}", choice)?,
        }
    }
    Ok(())
}

/// 执行一个功能；用户取消或无事可做时返回 None
pub async fn run_mode<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    driver: &SyncDriver,
    mode: SyncMode,
    yes: bool,
) -> Result<Option<SyncReport>> {
    writeln!(console, "\n▶ {}", mode.title())?;

    let report = match mode {
        SyncMode::Configs => {
            let files = driver.scan_config_files().await?;
            if files.is_empty() {
                writeln!(console, "未找到配置文件")?;
                return Ok(None);
            }
            writeln!(console, "找到 {} 个配置文件", files.len())?;
            if !yes && !console.confirm("确认覆盖上传这些配置文件?")? {
                writeln!(console, "已取消")?;
                return Ok(None);
            }
            driver.upload_configs(&files).await
        }
        SyncMode::Incremental | SyncMode::Preview => {
            let changes = driver.plan_incremental().await?;
            if changes.is_empty() {
                writeln!(console, "✨ 所有文件都是最新的")?;
                return Ok(None);
            }

            let summary = DiffSummary::from_changes(&changes);
            writeln!(
                console,
                "需要上传 {} 个文件（新增 {}, 修改 {}），共 {}",
                summary.total_files(),
                summary.new_count,
                summary.modified_count,
                format_size(summary.total_bytes)
            )?;

            let limit = if mode == SyncMode::Preview { changes.len() } else { PREVIEW_LIMIT };
            for change in changes.iter().take(limit) {
                writeln!(console, "  [{}] {} ({})", change.reason, change.path, format_size(change.size))?;
            }
            if changes.len() > limit {
                writeln!(console, "  ... 以及另外 {} 个文件", changes.len() - limit)?;
            }

            if mode == SyncMode::Preview {
                return Ok(None);
            }
            if !yes && !console.confirm("确认上传?")? {
                writeln!(console, "已取消")?;
                return Ok(None);
            }
            driver.upload_changes(&changes).await
        }
        SyncMode::AllStatic => {
            let files = driver.scan_local_static().await?;
            if files.is_empty() {
                writeln!(console, "未找到静态资源")?;
                return Ok(None);
            }
            let total: u64 = files.values().sum();
            writeln!(console, "⚠️ 将覆盖上传 {} 个文件，共 {}", files.len(), format_size(total))?;
            if !yes && !console.confirm("确认覆盖上传所有静态资源?")? {
                writeln!(console, "已取消")?;
                return Ok(None);
            }
            driver.upload_all_static(&files).await
        }
    };

    print_report(console, &report)?;
    Ok(Some(report))
}

pub fn print_report<W: Write>(out: &mut W, report: &SyncReport) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "上传完成: ✅ 成功 {} 个, ❌ 失败 {} 个, ⚠️ 跳过 {} 个, 共 {}, 用时 {:.1}s",
        report.uploaded.len(),
        report.failed.len(),
        report.invalid.len(),
        format_size(report.bytes_uploaded),
        report.duration_ms as f64 / 1000.0
    )?;
    for f in &report.invalid {
        writeln!(out, "  ⚠️ {}: {}", f.path, f.error)?;
    }
    for f in &report.failed {
        writeln!(out, "  ❌ {}: {}", f.path, f.error)?;
    }
    Ok(())
}

/// 保存两个文档到本地，再上传到 OSS
pub async fn publish<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    yes: bool,
) -> Result<()> {
    let mut store = load_store(paths)?;
    let driver = connect(paths)?;

    writeln!(
        console,
        "将上传 version-history.json 与 site-info.json 到 {}（当前版本 {}）",
        driver.remote_name(),
        store.versions.current_version()
    )?;
    if !yes && !console.confirm("确认上传?")? {
        writeln!(console, "已取消")?;
        return Ok(());
    }

    save_store(&mut store, paths)?;
    let report = driver.publish_documents(&store).await?;
    print_report(console, &report)?;

    if !report.is_success() {
        bail!("配置已保存到本地，但上传失败");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::prompt::test_support::{console, output};
    use crate::storage::LocalStorage;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn driver(project: &TempDir, bucket: &TempDir) -> SyncDriver {
        let paths = ProjectPaths::new(project.path());
        std::fs::create_dir_all(paths.public_dir.join("images")).unwrap();
        std::fs::write(paths.public_dir.join("images/a.png"), [0u8; 64]).unwrap();
        let config = RemoteConfig::from_lookup(|key| match key {
            "OSS_ACCESS_KEY_ID" | "OSS_ACCESS_KEY_SECRET" | "OSS_BUCKET_NAME" => Some("x".to_string()),
            _ => None,
        })
        .unwrap();
        SyncDriver::new(paths, config, Arc::new(LocalStorage::new(bucket.path())))
    }

    #[tokio::test]
    async fn test_progress_printer_drains_before_join() {
        let project = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        std::fs::create_dir_all(project.path().join("public/images")).unwrap();
        for name in ["b.png", "c.png"] {
            std::fs::write(project.path().join("public/images").join(name), [0u8; 8]).unwrap();
        }

        let (tx, printer) = spawn_progress_printer(Vec::new());
        let driver = driver(&project, &bucket).with_progress(tx);
        let mut c = console("");
        run_mode(&mut c, &driver, SyncMode::AllStatic, true).await.unwrap();
        drop(driver);

        let printed = String::from_utf8(printer.await.unwrap()).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "[3/3] ✅ images/c.png (8 B)");
    }

    #[tokio::test]
    async fn test_menu_preview_then_exit() {
        let project = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let driver = driver(&project, &bucket);

        let mut c = console("3\n9\n0\n");
        menu(&mut c, &driver).await.unwrap();
        let out = output(c);

        assert!(out.contains("[新增] images/a.png"));
        assert!(out.contains("无效选择: 9"));
        assert!(out.contains("再见"));
        assert!(!bucket.path().join("images/a.png").exists());
    }

    #[tokio::test]
    async fn test_incremental_requires_y() {
        let project = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let driver = driver(&project, &bucket);

        let mut c = console("n\n");
        let report = run_mode(&mut c, &driver, SyncMode::Incremental, false).await.unwrap();
        assert!(report.is_none());
        assert!(!bucket.path().join("images/a.png").exists());

        let mut c = console("y\n");
        let report = run_mode(&mut c, &driver, SyncMode::Incremental, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.uploaded, vec!["images/a.png".to_string()]);
        assert!(bucket.path().join("images/a.png").exists());
    }

    #[tokio::test]
    async fn test_configs_mode_with_yes_flag() {
        let project = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let driver = driver(&project, &bucket);
        let configs = project.path().join("public/gacha-configs");
        std::fs::create_dir_all(&configs).unwrap();
        std::fs::write(configs.join("index.json"), "[]").unwrap();

        let mut c = console("");
        let report = run_mode(&mut c, &driver, SyncMode::Configs, true)
            .await
            .unwrap()
            .unwrap();
        assert!(report.is_success());
        assert!(bucket.path().join("gacha-configs/index.json").exists());
    }
}
