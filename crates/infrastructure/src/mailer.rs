//! 邮件端口的日志实现
//!
//! 真实投递机制不在本系统范围内，部署时可替换为任意`Mailer`实现。

use async_trait::async_trait;
use tracing::info;

use studybuddy_core::StudyBuddyResult;
use studybuddy_domain::ports::mailer::{EmailMessage, Mailer};

/// 将邮件内容写入日志的发送器
pub struct LogMailer {
    from_address: String,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> StudyBuddyResult<()> {
        info!(
            "发送邮件: from={} to={} subject={}",
            self.from_address, message.to, message.subject
        );
        Ok(())
    }
}
