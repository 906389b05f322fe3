//! 命令行参数定义

use crate::core::SyncMode;
use crate::store::VersionType;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "siteops",
    version,
    about = "抽奖模拟器站点的配置编辑与 OSS 同步工具"
)]
pub struct Cli {
    /// 项目根目录（包含 public/ 与 .env）
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// 在控制台输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 上传配置文件与静态资源到 OSS（不带 --mode 时进入交互菜单）
    Sync(SyncArgs),
    /// 把两个配置文档保存到本地并上传
    Publish(ConfirmArgs),
    /// 设置存储桶的 CORS 规则
    Cors(ConfirmArgs),
    /// 对比 git 提交与版本记录
    Timeline(TimelineArgs),
    /// 版本记录
    #[command(subcommand)]
    Version(VersionCommand),
    /// 赞助者列表
    #[command(subcommand)]
    Sponsor(SponsorCommand),
    /// 站点信息
    #[command(subcommand)]
    Site(SiteCommand),
    /// 查看或修改日志配置
    LogConfig(LogConfigArgs),
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// 直接执行某个功能，跳过菜单
    #[arg(long, value_enum)]
    pub mode: Option<SyncMode>,

    /// 跳过确认
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// 跳过确认
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// 配置文件变化时重新对比，Ctrl+C 退出
    #[arg(short, long)]
    pub watch: bool,

    /// 以 JSON 输出
    #[arg(long, conflicts_with = "watch")]
    pub json: bool,

    /// 只列出未记录的提交
    #[arg(long)]
    pub unrecorded: bool,
}

#[derive(Subcommand, Debug)]
pub enum VersionCommand {
    /// 列出所有版本
    List,
    /// 查看一个版本的详情
    Show { version: String },
    /// 新增版本（插入到最前面）
    Add(VersionAddArgs),
    /// 修改已有版本
    Edit(VersionEditArgs),
    /// 设置当前版本号
    SetCurrent { version: String },
}

#[derive(Args, Debug)]
pub struct VersionAddArgs {
    pub version: String,

    /// 发布日期，默认今天
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    #[arg(long = "type", value_name = "major|minor|patch", default_value = "patch")]
    pub typ: VersionType,

    #[arg(long)]
    pub milestone: bool,

    #[arg(long, default_value = "")]
    pub theme: String,

    /// 关联的提交 hash，可重复
    #[arg(long = "commit", value_name = "HASH")]
    pub commits: Vec<String>,

    /// 关联所有尚未记录的提交
    #[arg(long)]
    pub all_unrecorded: bool,

    /// 新功能描述，可重复
    #[arg(long = "feature", value_name = "TEXT")]
    pub features: Vec<String>,

    /// 同时设为当前版本
    #[arg(long)]
    pub current: bool,
}

#[derive(Args, Debug)]
pub struct VersionEditArgs {
    /// 要修改的版本号
    pub version: String,

    /// 重命名版本号
    #[arg(long, value_name = "VERSION")]
    pub rename: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    #[arg(long = "type", value_name = "major|minor|patch")]
    pub typ: Option<VersionType>,

    #[arg(long, value_name = "true|false")]
    pub milestone: Option<bool>,

    #[arg(long)]
    pub theme: Option<String>,

    /// 追加提交，可重复
    #[arg(long = "add-commit", value_name = "HASH")]
    pub add_commits: Vec<String>,

    /// 移除提交，可重复
    #[arg(long = "remove-commit", value_name = "HASH")]
    pub remove_commits: Vec<String>,

    /// 替换功能列表，可重复
    #[arg(long = "feature", value_name = "TEXT")]
    pub features: Vec<String>,

    /// 清空功能列表
    #[arg(long, conflicts_with = "features")]
    pub clear_features: bool,
}

#[derive(Subcommand, Debug)]
pub enum SponsorCommand {
    /// 列出赞助者（序号从 1 开始）
    List,
    /// 添加赞助者
    Add {
        name: String,
        amount: f64,
        /// 默认今天
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// 修改第 N 位赞助者
    Edit {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// 删除第 N 位赞助者
    Remove {
        index: usize,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SiteCommand {
    /// 查看站点信息
    Show,
    /// 修改站点信息字段
    Set(SiteSetArgs),
}

#[derive(Args, Debug)]
pub struct SiteSetArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub name_en: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub github: Option<String>,
}

#[derive(Args, Debug)]
pub struct LogConfigArgs {
    #[arg(long, value_name = "true|false")]
    pub enabled: Option<bool>,

    /// 日志文件大小上限（1-100 MB）
    #[arg(long, value_name = "MB")]
    pub max_size_mb: Option<u32>,

    /// error / warn / info / debug / trace
    #[arg(long)]
    pub level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_mode() {
        let cli = Cli::try_parse_from(["siteops", "--root", "/site", "sync", "--mode", "all-static", "-y"])
            .unwrap();
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.mode, Some(SyncMode::AllStatic));
                assert!(args.yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.root, PathBuf::from("/site"));
    }

    #[test]
    fn test_parse_version_add() {
        let cli = Cli::try_parse_from([
            "siteops", "version", "add", "1.3.0", "--type", "minor", "--date", "2025-05-01",
            "--commit", "abc1234", "--commit", "def5678", "--feature", "新功能",
        ])
        .unwrap();
        let Commands::Version(VersionCommand::Add(args)) = cli.command else {
            panic!("expected version add");
        };
        assert_eq!(args.typ, VersionType::Minor);
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(args.commits, vec!["abc1234", "def5678"]);
        assert_eq!(args.features, vec!["新功能"]);
    }

    #[test]
    fn test_invalid_version_type_rejected() {
        assert!(Cli::try_parse_from(["siteops", "version", "add", "1.0", "--type", "huge"]).is_err());
    }
}
