//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{NewTask, NewUser, OtpCode, Task, User};
use studybuddy_core::StudyBuddyResult;

/// 任务仓储抽象
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &NewTask) -> StudyBuddyResult<Task>;
    async fn find_by_id(&self, id: i64) -> StudyBuddyResult<Option<Task>>;
    /// 按到期日升序返回指定用户的全部任务
    async fn find_by_owner(&self, owner: Uuid) -> StudyBuddyResult<Vec<Task>>;
    /// 返回所有repeat不为none的任务
    async fn find_repeating(&self) -> StudyBuddyResult<Vec<Task>>;
    /// 精确匹配 (title, owner, due_date) 的存在性检查
    async fn exists_occurrence(
        &self,
        title: &str,
        owner: Uuid,
        due_date: DateTime<Utc>,
    ) -> StudyBuddyResult<bool>;
    async fn update(&self, task: &Task) -> StudyBuddyResult<Task>;
    async fn delete(&self, id: i64) -> StudyBuddyResult<bool>;
}

/// 用户仓储抽象
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> StudyBuddyResult<User>;
    async fn find_by_id(&self, id: Uuid) -> StudyBuddyResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StudyBuddyResult<Option<User>>;
    async fn update(&self, user: &User) -> StudyBuddyResult<User>;
}

/// 密码重置验证码仓储抽象
#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn create(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StudyBuddyResult<OtpCode>;
    /// 查找未过期的验证码
    async fn find_valid(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> StudyBuddyResult<Option<OtpCode>>;
    async fn delete(&self, id: i64) -> StudyBuddyResult<bool>;
    /// 清理过期验证码，返回删除数量
    async fn purge_expired(&self, now: DateTime<Utc>) -> StudyBuddyResult<u64>;
}
