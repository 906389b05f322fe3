//! 站点信息命令

use super::{load_store, save_store, Console};
use crate::cli::{SiteCommand, SiteSetArgs};
use crate::config::ProjectPaths;
use crate::store::{ConfigStore, SiteInfoPatch};
use anyhow::{bail, Result};
use std::io::{BufRead, Write};

pub fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    cmd: SiteCommand,
) -> Result<()> {
    let mut store = load_store(paths)?;

    match cmd {
        SiteCommand::Show => show(console, &store)?,
        SiteCommand::Set(args) => {
            let patch = to_patch(args);
            if is_empty(&patch) {
                bail!("没有要修改的字段，请使用 --name / --name-en / --description / --author / --github");
            }
            store.apply_site_patch(patch);
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 站点信息已更新")?;
            show(console, &store)?;
        }
    }
    Ok(())
}

fn to_patch(args: SiteSetArgs) -> SiteInfoPatch {
    SiteInfoPatch {
        name: args.name,
        name_en: args.name_en,
        description: args.description,
        author: args.author,
        github: args.github,
    }
}

fn is_empty(patch: &SiteInfoPatch) -> bool {
    patch.name.is_none()
        && patch.name_en.is_none()
        && patch.description.is_none()
        && patch.author.is_none()
        && patch.github.is_none()
}

fn show<W: Write>(out: &mut W, store: &ConfigStore) -> std::io::Result<()> {
    let info = store.site.site_info.clone().unwrap_or_default();
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    writeln!(out, "名称: {}", text(&info.name))?;
    writeln!(out, "英文名: {}", text(&info.name_en))?;
    writeln!(out, "描述: {}", text(&info.description))?;
    writeln!(out, "作者: {}", text(&info.author))?;
    writeln!(out, "GitHub: {}", text(&info.github))?;
    writeln!(out, "当前版本: {}", store.versions.current_version())?;
    writeln!(out, "赞助者: {} 位", info.sponsors().len())?;
    if let Some(date) = store.site.last_updated {
        writeln!(out, "最后更新: {}", date)?;
    }
    Ok(())
}
