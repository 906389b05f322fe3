//! 设置存储桶 CORS

use super::Console;
use crate::config::{ProjectPaths, RemoteConfig};
use crate::storage::{apply_cors, CorsPolicy};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

pub async fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    yes: bool,
) -> Result<()> {
    let config = RemoteConfig::from_env(&paths.root)?;
    let policy = CorsPolicy::default();

    print_policy(console, &config.bucket, &policy)?;
    if !yes && !console.confirm("这会覆盖存储桶现有的 CORS 规则，确认?")? {
        writeln!(console, "已取消")?;
        return Ok(());
    }

    apply_cors(&config, &policy)
        .await
        .with_context(|| format!("设置存储桶 {} 的 CORS 失败", config.bucket))?;
    writeln!(console, "✅ CORS 规则已生效")?;
    Ok(())
}

fn print_policy<W: Write>(out: &mut W, bucket: &str, policy: &CorsPolicy) -> std::io::Result<()> {
    writeln!(out, "存储桶: {}", bucket)?;
    writeln!(out, "  允许来源: {}", policy.allowed_origins.join(", "))?;
    writeln!(out, "  允许方法: {}", policy.allowed_methods.join(", "))?;
    writeln!(out, "  允许头部: {}", policy.allowed_headers.join(", "))?;
    writeln!(out, "  暴露头部: {}", policy.expose_headers.join(", "))?;
    writeln!(out, "  缓存时间: {} 秒", policy.max_age_seconds)
}
