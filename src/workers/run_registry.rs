// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 采集运行注册表
//!
//! 每次提交在后台任务中执行一个 CrawlWorker，注册表保存各运行的
//! 状态、进度与最近日志。终态运行的结果通过 take_result 一次性
//! 取走并销毁条目。

use crate::config::settings::CrawlerSettings;
use crate::domain::models::crawl_run::{CrawlOptions, CrawlSummary, CrawlTask, RunStatus};
use crate::domain::repositories::VideoRepository;
use crate::domain::services::topic_classifier::ClassifierStrategy;
use crate::domain::source::VideoSource;
use crate::workers::crawl_worker::{CrawlError, CrawlWorker, ProgressFn};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// 保留的最近进度消息条数
const LOG_CAPACITY: usize = 20;

#[derive(Debug)]
struct RunState {
    status: RunStatus,
    done: u64,
    total: u64,
    messages: VecDeque<String>,
    summary: Option<CrawlSummary>,
    error: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    fn push_message(&mut self, message: String) {
        if self.messages.len() >= LOG_CAPACITY {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }
}

struct RunEntry {
    state: Arc<Mutex<RunState>>,
    cancel: Arc<AtomicBool>,
}

/// 运行状态的只读快照
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub id: Uuid,
    pub status: RunStatus,
    pub done: u64,
    pub total: u64,
    pub messages: Vec<String>,
    pub summary: Option<CrawlSummary>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSnapshot {
    /// 完成百分比 0-100
    pub fn progress(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.done * 100) / self.total).min(100) as u8
    }
}

/// 并发安全的运行注册表
#[derive(Default)]
pub struct RunRegistry {
    runs: DashMap<Uuid, RunEntry>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 提交一次采集运行，立即返回运行 ID
    pub fn submit<S, R, C>(
        &self,
        source: S,
        repository: R,
        classifier: C,
        settings: CrawlerSettings,
        tasks: Vec<CrawlTask>,
        options: CrawlOptions,
    ) -> Uuid
    where
        S: VideoSource + 'static,
        R: VideoRepository + 'static,
        C: ClassifierStrategy + 'static,
    {
        let id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(RunState {
            status: RunStatus::Pending,
            done: 0,
            total: tasks.len() as u64 * options.max_pages as u64,
            messages: VecDeque::new(),
            summary: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }));

        self.runs.insert(
            id,
            RunEntry {
                state: state.clone(),
                cancel: cancel.clone(),
            },
        );

        let progress_state = state.clone();
        let progress: ProgressFn = Arc::new(move |done, total, message| {
            let mut s = progress_state.lock();
            s.done = done;
            s.total = total;
            s.push_message(message);
        });

        let run_cancel = cancel.clone();
        tokio::spawn(async move {
            state.lock().status = RunStatus::Running;
            let worker = CrawlWorker::new(source, repository, classifier, settings)
                .with_cancel(run_cancel.clone())
                .with_progress(progress);

            let outcome = worker.run(&tasks, &options).await;

            let mut s = state.lock();
            s.finished_at = Some(Utc::now());
            match outcome {
                Ok((_, summary)) => {
                    s.status = if run_cancel.load(Ordering::Relaxed) {
                        RunStatus::Cancelled
                    } else {
                        RunStatus::Succeeded
                    };
                    s.summary = Some(summary);
                    info!(run_id = %id, status = %s.status, "Crawl run completed");
                }
                Err(e) => {
                    s.status = RunStatus::Failed;
                    s.error = Some(e.to_string());
                    if matches!(e, CrawlError::SigningUnavailable) {
                        error!(run_id = %id, "Crawl run failed: signing unavailable");
                    } else {
                        error!(run_id = %id, error = %e, "Crawl run failed");
                    }
                }
            }
        });

        info!(run_id = %id, "Crawl run submitted");
        id
    }

    /// 请求取消，实际停止发生在页边界
    pub fn cancel(&self, id: &Uuid) -> bool {
        match self.runs.get(id) {
            Some(entry) => {
                entry.cancel.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// 读取运行状态快照
    pub fn snapshot(&self, id: &Uuid) -> Option<RunSnapshot> {
        self.runs.get(id).map(|entry| {
            let s = entry.state.lock();
            RunSnapshot {
                id: *id,
                status: s.status,
                done: s.done,
                total: s.total,
                messages: s.messages.iter().cloned().collect(),
                summary: s.summary.clone(),
                error: s.error.clone(),
                started_at: s.started_at,
                finished_at: s.finished_at,
            }
        })
    }

    /// 取走终态运行的最终结果并销毁条目，非终态返回 None
    pub fn take_result(&self, id: &Uuid) -> Option<RunSnapshot> {
        let terminal = self
            .runs
            .get(id)
            .map(|entry| entry.state.lock().status.is_terminal())
            .unwrap_or(false);
        if !terminal {
            return None;
        }

        let snapshot = self.snapshot(id);
        self.runs.remove(id);
        snapshot
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
