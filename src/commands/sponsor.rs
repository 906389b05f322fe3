//! 赞助者命令，序号对用户从 1 开始

use super::{load_store, save_store, today, Console};
use crate::cli::SponsorCommand;
use crate::config::ProjectPaths;
use crate::error::ToolError;
use crate::store::{round_amount, ConfigStore, Sponsor};
use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};

pub fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    paths: &ProjectPaths,
    cmd: SponsorCommand,
) -> Result<()> {
    let mut store = load_store(paths)?;

    match cmd {
        SponsorCommand::List => list(console, &store)?,
        SponsorCommand::Add { name, amount, date } => {
            let sponsor = new_sponsor(name.trim(), amount, date.unwrap_or_else(today))?;
            store.add_sponsor(sponsor)?;
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 已添加赞助者 {}", name.trim())?;
        }
        SponsorCommand::Edit {
            index,
            name,
            amount,
            date,
        } => {
            let slot = to_slot(index, store.sponsors().len())?;
            let mut sponsor = store.sponsors()[slot].clone();
            if let Some(amount) = amount {
                sponsor.amount = round_amount(amount).ok_or_else(|| invalid_amount(amount))?;
            }
            if let Some(name) = name {
                sponsor.name = name.trim().to_string();
            }
            if let Some(date) = date {
                sponsor.date = Some(date);
            }
            store.update_sponsor_at(slot, sponsor)?;
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 已更新第 {} 位赞助者", index)?;
        }
        SponsorCommand::Remove { index, yes } => {
            let slot = to_slot(index, store.sponsors().len())?;
            let name = store.sponsors()[slot].name.clone();
            if !yes && !console.confirm(&format!("确认删除赞助者 {}?", name))? {
                writeln!(console, "已取消")?;
                return Ok(());
            }
            store.remove_sponsor_at(slot)?;
            save_store(&mut store, paths)?;
            writeln!(console, "✅ 已删除赞助者 {}", name)?;
        }
    }
    Ok(())
}

fn new_sponsor(name: &str, amount: f64, date: chrono::NaiveDate) -> Result<Sponsor> {
    Sponsor::new(name, amount, date).ok_or_else(|| invalid_amount(amount))
}

fn invalid_amount(amount: f64) -> anyhow::Error {
    anyhow!(ToolError::InvalidSponsor(format!("金额无效: {}", amount)))
}

/// 1-based 序号转换为下标
fn to_slot(index: usize, len: usize) -> Result<usize, ToolError> {
    match index.checked_sub(1) {
        Some(slot) if slot < len => Ok(slot),
        _ => Err(ToolError::SponsorIndexOutOfRange { index, len }),
    }
}

fn list<W: Write>(out: &mut W, store: &ConfigStore) -> std::io::Result<()> {
    let sponsors = store.sponsors();
    if sponsors.is_empty() {
        return writeln!(out, "暂无赞助者");
    }
    let total: f64 = sponsors.iter().map(Sponsor::amount_value).sum();
    for (i, s) in sponsors.iter().enumerate() {
        let date = s.date.map(|d| d.to_string()).unwrap_or_default();
        writeln!(out, "{:>3}. {}  ¥{}  {}", i + 1, s.name, s.amount, date)?;
    }
    writeln!(out, "共 {} 位，合计 ¥{:.2}", sponsors.len(), total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::prompt::test_support::{console, output};
    use crate::commands::test_support::project;
    use chrono::NaiveDate;

    #[test]
    fn test_add_edit_remove() {
        let (_dir, paths) = project();
        let date = NaiveDate::from_ymd_opt(2025, 4, 1);

        let mut c = console("");
        run(&mut c, &paths, SponsorCommand::Add { name: " 乙 ".to_string(), amount: 6.666, date }).unwrap();
        let store = load_store(&paths).unwrap();
        assert_eq!(store.sponsors()[1].name, "乙");
        assert_eq!(store.sponsors()[1].amount_value(), 6.67);

        let mut c = console("");
        run(
            &mut c,
            &paths,
            SponsorCommand::Edit { index: 2, name: None, amount: Some(20.0), date: None },
        )
        .unwrap();
        let store = load_store(&paths).unwrap();
        assert_eq!(store.sponsors()[1].amount.to_string(), "20");
        assert_eq!(store.sponsors()[1].name, "乙");

        let mut c = console("y\n");
        run(&mut c, &paths, SponsorCommand::Remove { index: 1, yes: false }).unwrap();
        let store = load_store(&paths).unwrap();
        assert_eq!(store.sponsors().len(), 1);
        assert_eq!(store.sponsors()[0].name, "乙");
    }

    #[test]
    fn test_index_out_of_range() {
        let (_dir, paths) = project();
        let mut c = console("");
        let err = run(&mut c, &paths, SponsorCommand::Remove { index: 0, yes: true }).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::SponsorIndexOutOfRange { index: 0, len: 1 })
        ));
        assert!(to_slot(2, 1).is_err());
        assert_eq!(to_slot(1, 1).unwrap(), 0);
    }

    #[test]
    fn test_add_rejects_empty_name_and_small_amount() {
        let (_dir, paths) = project();
        let mut c = console("");
        assert!(run(&mut c, &paths, SponsorCommand::Add { name: "  ".to_string(), amount: 5.0, date: None }).is_err());
        assert!(run(&mut c, &paths, SponsorCommand::Add { name: "丙".to_string(), amount: 0.001, date: None }).is_err());
        assert_eq!(load_store(&paths).unwrap().sponsors().len(), 1);
    }

    #[test]
    fn test_edit_undated_sponsor_stays_undated() {
        let (_dir, paths) = project();
        let mut site: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.site_info_file).unwrap()).unwrap();
        site["siteInfo"]["sponsors"][0].as_object_mut().unwrap().remove("date");
        std::fs::write(&paths.site_info_file, site.to_string()).unwrap();

        let mut c = console("");
        run(
            &mut c,
            &paths,
            SponsorCommand::Edit { index: 1, name: None, amount: Some(12.5), date: None },
        )
        .unwrap();

        let store = load_store(&paths).unwrap();
        assert_eq!(store.sponsors()[0].amount_value(), 12.5);
        assert_eq!(store.sponsors()[0].date, None);

        let mut c = console("");
        run(&mut c, &paths, SponsorCommand::List).unwrap();
        assert!(output(c).contains("  1. 甲  ¥12.5  \n"));
    }

    #[test]
    fn test_list_output() {
        let (_dir, paths) = project();
        let mut c = console("");
        run(&mut c, &paths, SponsorCommand::List).unwrap();
        let out = output(c);
        assert!(out.contains("  1. 甲  ¥10  2025-01-02"));
        assert!(out.contains("合计 ¥10.00"));
    }
}
