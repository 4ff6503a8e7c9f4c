//! 再生作业的定时触发
//!
//! `TriggerSchedule`判定CRON表达式是否到达触发点，`RecurrenceJob`
//! 在独立的tokio任务中轮询该判定并驱动`TaskRegenerator`。测试可以
//! 绕过本模块直接调用`TaskRegenerator::run`。

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use std::str::FromStr;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use studybuddy_core::{StudyBuddyError, StudyBuddyResult};

use crate::regenerator::TaskRegenerator;

/// CRON表达式触发判定
pub struct TriggerSchedule {
    schedule: Schedule,
}

impl TriggerSchedule {
    pub fn new(cron_expr: &str) -> StudyBuddyResult<Self> {
        let schedule = Schedule::from_str(cron_expr).map_err(|e| StudyBuddyError::InvalidCron {
            expr: cron_expr.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { schedule })
    }

    /// 检查当前时间是否到达下一次触发点
    pub fn should_trigger(&self, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_run {
            Some(last) => match self.schedule.after(&last).next() {
                Some(next_time) => next_time <= now,
                None => {
                    warn!("无法计算下一次触发时间");
                    false
                }
            },
            None => {
                // 从未运行过时，只在当前检查窗口内命中触发点才算到达，
                // 避免进程启动立即补跑
                let check_from = now - Duration::minutes(1);
                match self.schedule.after(&check_from).next() {
                    Some(next_time) => next_time <= now,
                    None => false,
                }
            }
        }
    }

    /// 获取下一次触发时间
    pub fn next_execution_time(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }
}

/// 重复任务再生的后台作业
pub struct RecurrenceJob {
    regenerator: TaskRegenerator,
    trigger: TriggerSchedule,
    poll_interval: StdDuration,
}

impl RecurrenceJob {
    pub fn new(
        regenerator: TaskRegenerator,
        schedule: &str,
        poll_interval: StdDuration,
    ) -> StudyBuddyResult<Self> {
        Ok(Self {
            regenerator,
            trigger: TriggerSchedule::new(schedule)?,
            poll_interval,
        })
    }

    /// 运行触发循环直到收到关闭信号
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        if let Some(next) = self.trigger.next_execution_time(Utc::now()) {
            info!("重复任务再生作业已启动，下一次触发: {}", next);
        }

        let mut interval = tokio::time::interval(self.poll_interval);
        let mut last_run: Option<DateTime<Utc>> = None;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    if !self.trigger.should_trigger(last_run, now) {
                        continue;
                    }

                    last_run = Some(now);
                    // 任何运行错误都被吞掉，等待下一次触发自然重试
                    if let Err(e) = self.regenerator.run().await {
                        error!("重复任务再生作业运行失败: {}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("重复任务再生作业收到关闭信号");
                    break;
                }
            }
        }

        info!("重复任务再生作业已停止");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_trigger_schedule_creation() {
        assert!(TriggerSchedule::new("0 0 0 * * *").is_ok());
        assert!(TriggerSchedule::new("invalid").is_err());
    }

    #[test]
    fn test_should_trigger_daily_at_midnight() {
        let trigger = TriggerSchedule::new("0 0 0 * * *").unwrap();

        let yesterday_noon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let just_after_midnight = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 30).unwrap();
        assert!(trigger.should_trigger(Some(yesterday_noon), just_after_midnight));

        // 同一天内再次检查不会重复触发
        let later_same_day = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        assert!(!trigger.should_trigger(Some(just_after_midnight), later_same_day));
    }

    #[test]
    fn test_should_trigger_without_last_run() {
        let trigger = TriggerSchedule::new("0 0 0 * * *").unwrap();

        // 刚过午夜、从未运行过 → 触发
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 30).unwrap();
        assert!(trigger.should_trigger(None, now));

        // 中午启动则等待下一个午夜
        let noon = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        assert!(!trigger.should_trigger(None, noon));
    }

    #[test]
    fn test_next_execution_time() {
        let trigger = TriggerSchedule::new("0 0 0 * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        assert_eq!(
            trigger.next_execution_time(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap())
        );
    }
}
