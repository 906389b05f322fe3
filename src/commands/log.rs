//! 日志配置命令

use super::Console;
use crate::cli::LogConfigArgs;
use crate::logging::LogConfig;
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;

/// 不带参数时只显示当前配置
pub fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config_dir: &Path,
    args: LogConfigArgs,
) -> Result<()> {
    let mut config = LogConfig::load(config_dir);

    let changed = args.enabled.is_some() || args.max_size_mb.is_some() || args.level.is_some();
    if changed {
        config
            .apply(args.enabled, args.max_size_mb, args.level.as_deref())
            .map_err(|e| anyhow!(e))?;
        config
            .save(config_dir)
            .with_context(|| format!("保存日志配置失败: {}", config_dir.display()))?;
        writeln!(console, "✅ 日志配置已保存（下次运行生效）")?;
    }

    writeln!(console, "日志目录: {}", config_dir.display())?;
    writeln!(console, "  启用: {}", if config.enabled { "是" } else { "否" })?;
    writeln!(console, "  级别: {}", config.level)?;
    writeln!(console, "  大小上限: {} MB", config.max_size_mb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::prompt::test_support::{console, output};
    use tempfile::TempDir;

    #[test]
    fn test_set_and_show() {
        let dir = TempDir::new().unwrap();
        let mut c = console("");
        run(
            &mut c,
            dir.path(),
            LogConfigArgs {
                enabled: None,
                max_size_mb: Some(200),
                level: Some("warn".to_string()),
            },
        )
        .unwrap();
        let out = output(c);
        assert!(out.contains("级别: warn"));
        assert!(out.contains("大小上限: 100 MB"));
        assert_eq!(LogConfig::load(dir.path()).level, "warn");
    }

    #[test]
    fn test_invalid_level_is_error() {
        let dir = TempDir::new().unwrap();
        let mut c = console("");
        let args = LogConfigArgs {
            enabled: None,
            max_size_mb: None,
            level: Some("verbose".to_string()),
        };
        assert!(run(&mut c, dir.path(), args).is_err());
        assert!(!dir.path().join("config.json").exists());
    }
}
