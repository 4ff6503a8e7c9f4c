//! 邮件发送端口
//!
//! 投递机制由基础设施层提供，领域层只依赖该抽象。

use async_trait::async_trait;

use studybuddy_core::StudyBuddyResult;

/// 一封待发送的邮件
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 邮件发送抽象
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> StudyBuddyResult<()>;
}
