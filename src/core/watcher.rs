//! 文档变更监听 - 文件保存后去抖再触发刷新

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// 去抖计时：每次事件都把触发时间推后
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn on_event(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 到期则清空并返回 true
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

fn is_relevant(event: &Event, targets: &HashSet<PathBuf>) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| targets.contains(p))
}

/// 监听一组文件，变更经去抖后通过 [`DocumentWatcher::changed`] 通知
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<Event>,
    targets: HashSet<PathBuf>,
    debouncer: Debouncer,
}

impl DocumentWatcher {
    pub fn new(files: &[PathBuf], window: Duration) -> Result<Self> {
        // 编辑器通常以"写临时文件再重命名"的方式保存，所以监听父目录
        let targets: HashSet<PathBuf> = files.iter().map(|f| absolute(f)).collect();
        let dirs: HashSet<PathBuf> = targets
            .iter()
            .filter_map(|f| f.parent().map(Path::to_path_buf))
            .collect();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        warn!("监听通道已关闭，丢弃事件");
                    }
                }
                Err(e) => warn!("监听错误: {}", e),
            },
            Config::default(),
        )?;
        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }
        info!("开始监听 {} 个文件", targets.len());

        Ok(Self {
            _watcher: watcher,
            rx,
            targets,
            debouncer: Debouncer::new(window),
        })
    }

    /// 等待下一次（去抖后的）变更；监听通道关闭时返回 false
    pub async fn changed(&mut self) -> bool {
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                event = self.rx.recv() => {
                    let Some(event) = event else { return false };
                    if is_relevant(&event, &self.targets) {
                        debug!("文件变更: {:?}", event.paths);
                        self.debouncer.on_event(Instant::now());
                    }
                }
                _ = sleep_until_deadline(deadline) => {
                    if self.debouncer.fire(Instant::now()) {
                        return true;
                    }
                }
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}
