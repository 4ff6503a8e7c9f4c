//! 重复任务再生器
//!
//! 每次触发时扫描所有重复任务，为已有任务补齐下一次出现的克隆。
//! 存在性检查是唯一的去重手段，检查与写入之间没有原子性保证，
//! 调用方需保证同一时间只有一个运行实例。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use studybuddy_core::StudyBuddyResult;
use studybuddy_domain::entities::Task;
use studybuddy_domain::repositories::TaskRepository;

use crate::recurrence::next_occurrence;

/// 单个任务的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationOutcome {
    /// 创建了新的克隆
    Cloned,
    /// 下一次出现已存在
    Duplicate,
    /// 无需处理（无到期日或策略不参与再生）
    Skipped,
}

/// 一次运行的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationReport {
    pub scanned: usize,
    pub cloned: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct TaskRegenerator {
    task_repo: Arc<dyn TaskRepository>,
}

impl TaskRegenerator {
    pub fn new(task_repo: Arc<dyn TaskRepository>) -> Self {
        Self { task_repo }
    }

    /// 执行一次再生运行，以当前时间为基准
    pub async fn run(&self) -> StudyBuddyResult<RegenerationReport> {
        self.run_at(Utc::now()).await
    }

    /// 执行一次再生运行
    ///
    /// 只有到期日已到达`now`的任务才补齐下一次出现，未到期的任务
    /// 保持原样，否则重复运行会沿克隆链无限推进。单个任务的失败只
    /// 记录日志，不影响其余任务；仅候选集查询失败会使整次运行出错，
    /// 等待下次触发自然重试。
    pub async fn run_at(&self, now: DateTime<Utc>) -> StudyBuddyResult<RegenerationReport> {
        info!("开始执行重复任务再生作业");

        let tasks = self.task_repo.find_repeating().await?;

        let mut report = RegenerationReport {
            scanned: tasks.len(),
            ..Default::default()
        };

        for task in &tasks {
            match self.regenerate(task, now).await {
                Ok(RegenerationOutcome::Cloned) => report.cloned += 1,
                Ok(RegenerationOutcome::Duplicate) => report.duplicates += 1,
                Ok(RegenerationOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!("任务 {} ({}) 再生失败: {}", task.id, task.title, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "重复任务再生作业完成: 扫描={} 克隆={} 重复={} 跳过={} 失败={}",
            report.scanned, report.cloned, report.duplicates, report.skipped, report.failed
        );

        Ok(report)
    }

    async fn regenerate(
        &self,
        task: &Task,
        now: DateTime<Utc>,
    ) -> StudyBuddyResult<RegenerationOutcome> {
        let Some(due) = task.due_date else {
            debug!("任务 {} ({}) 没有到期日，跳过", task.id, task.title);
            return Ok(RegenerationOutcome::Skipped);
        };

        if due > now {
            debug!("任务 {} ({}) 尚未到期，跳过", task.id, task.title);
            return Ok(RegenerationOutcome::Skipped);
        }

        let Some(next_due) = next_occurrence(due, task.repeat) else {
            debug!(
                "任务 {} ({}) 的重复策略不参与再生，跳过",
                task.id, task.title
            );
            return Ok(RegenerationOutcome::Skipped);
        };

        if self
            .task_repo
            .exists_occurrence(&task.title, task.owner, next_due)
            .await?
        {
            warn!("发现重复克隆，跳过: {} @ {}", task.title, next_due);
            return Ok(RegenerationOutcome::Duplicate);
        }

        let clone = task.clone_for(next_due);
        let created = self.task_repo.create(&clone).await?;
        info!("任务克隆成功: 用户 {} → {}", created.owner, created.title);

        Ok(RegenerationOutcome::Cloned)
    }
}
