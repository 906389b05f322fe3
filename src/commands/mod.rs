pub mod cors;
pub mod log;
pub mod prompt;
pub mod site;
pub mod sponsor;
pub mod sync;
pub mod timeline;
pub mod version;

pub use prompt::Console;

use crate::cli::{Cli, Commands};
use crate::config::ProjectPaths;
use crate::core::GitLog;
use crate::logging::get_log_dir;
use crate::store::ConfigStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::{BufRead, Write};

/// 执行一条命令
pub async fn dispatch<R: BufRead, W: Write>(cli: Cli, console: &mut Console<R, W>) -> Result<()> {
    let paths = ProjectPaths::new(&cli.root);
    tracing::debug!("项目目录: {}", paths.root.display());

    match cli.command {
        Commands::Sync(args) => sync::run(console, &paths, args.mode, args.yes).await,
        Commands::Publish(args) => sync::publish(console, &paths, args.yes).await,
        Commands::Cors(args) => cors::run(console, &paths, args.yes).await,
        Commands::Timeline(args) => {
            let git = GitLog::new(&paths.root);
            timeline::run(console, &paths, &git, &args).await
        }
        Commands::Version(cmd) => {
            let git = GitLog::new(&paths.root);
            version::run(console, &paths, &git, cmd).await
        }
        Commands::Sponsor(cmd) => sponsor::run(console, &paths, cmd),
        Commands::Site(cmd) => site::run(console, &paths, cmd),
        Commands::LogConfig(args) => log::run(console, &get_log_dir(), args),
    }
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn load_store(paths: &ProjectPaths) -> Result<ConfigStore> {
    ConfigStore::load(paths).context("加载配置失败")
}

/// 修改后保存：更新时间戳再写盘
pub(crate) fn save_store(store: &mut ConfigStore, paths: &ProjectPaths) -> Result<()> {
    store.touch(today());
    store.save(paths).context("保存配置失败")
}

/// 人类可读的文件大小
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_save_store_touches_documents() {
        let (_dir, paths) = test_support::project();
        let mut store = load_store(&paths).unwrap();
        save_store(&mut store, &paths).unwrap();

        let reloaded = load_store(&paths).unwrap();
        assert_eq!(reloaded.versions.last_updated, Some(today()));
        assert_eq!(
            reloaded.site.site_info.unwrap().extra.get("currentVersion"),
            Some(&serde_json::json!("1.2.0"))
        );
    }
}
