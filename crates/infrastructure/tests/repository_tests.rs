use chrono::{Duration, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use studybuddy_domain::entities::{NewTask, NewUser, Priority, RepeatPolicy};
use studybuddy_domain::repositories::{OtpRepository, TaskRepository, UserRepository};
use studybuddy_infrastructure::{
    run_migrations, SqliteOtpRepository, SqliteTaskRepository, SqliteUserRepository,
};

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("创建内存数据库失败");
    run_migrations(&pool).await.expect("迁移失败");
    pool
}

async fn create_user(pool: &SqlitePool) -> Uuid {
    let repo = SqliteUserRepository::new(pool.clone());
    let user = repo
        .create(&NewUser {
            username: "alice".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password: "Passw0rd".to_string(),
        })
        .await
        .unwrap();
    user.id
}

fn new_task(owner: Uuid, title: &str, repeat: RepeatPolicy) -> NewTask {
    NewTask {
        title: title.to_string(),
        category: Some("study".to_string()),
        due_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
        priority: Priority::Medium,
        estimated_minutes: Some(45),
        use_pomodoro: true,
        description: Some("chapter 3".to_string()),
        reminder: false,
        completed: false,
        color: "#00BCD4".to_string(),
        owner,
        repeat,
    }
}

#[tokio::test]
async fn test_user_create_and_password_hashing() {
    let pool = setup_pool().await;
    let repo = SqliteUserRepository::new(pool.clone());

    let user = repo
        .create(&NewUser {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "Secret1x".to_string(),
        })
        .await
        .unwrap();

    assert_ne!(user.password_hash, "Secret1x");
    assert!(bcrypt::verify("Secret1x", &user.password_hash).unwrap());

    let found = repo.find_by_email("bob@example.com").await.unwrap();
    assert_eq!(found.unwrap().id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let pool = setup_pool().await;
    let repo = SqliteUserRepository::new(pool.clone());

    let new_user = NewUser {
        username: "bob".to_string(),
        email: "dup@example.com".to_string(),
        password: "Secret1x".to_string(),
    };
    repo.create(&new_user).await.unwrap();

    let err = repo.create(&new_user).await.unwrap_err();
    assert!(err.to_string().contains("Email already in use"));
}

#[tokio::test]
async fn test_user_update_refresh_token() {
    let pool = setup_pool().await;
    let repo = SqliteUserRepository::new(pool.clone());

    let mut user = repo
        .create(&NewUser {
            username: "carol".to_string(),
            email: "carol@example.com".to_string(),
            password: "Secret1x".to_string(),
        })
        .await
        .unwrap();

    user.refresh_token = Some("token-123".to_string());
    repo.update(&user).await.unwrap();

    let found = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(found.refresh_token.as_deref(), Some("token-123"));
}

#[tokio::test]
async fn test_task_crud_roundtrip() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let created = repo
        .create(&new_task(owner, "Review", RepeatPolicy::Weekly))
        .await
        .unwrap();
    assert!(created.id > 0);

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Review");
    assert_eq!(found.repeat, RepeatPolicy::Weekly);
    assert_eq!(found.priority, Priority::Medium);
    assert_eq!(found.owner, owner);
    assert!(found.use_pomodoro);

    let mut task = found;
    task.completed = true;
    task.priority = Priority::High;
    let updated = repo.update(&task).await.unwrap();
    assert!(updated.completed);

    assert!(repo.delete(task.id).await.unwrap());
    assert!(repo.find_by_id(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_owner_ordered_by_due_date() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let other = create_user(&pool).await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let mut late = new_task(owner, "late", RepeatPolicy::None);
    late.due_date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    let mut early = new_task(owner, "early", RepeatPolicy::None);
    early.due_date = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

    repo.create(&late).await.unwrap();
    repo.create(&early).await.unwrap();
    repo.create(&new_task(other, "someone else", RepeatPolicy::None))
        .await
        .unwrap();

    let tasks = repo.find_by_owner(owner).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "early");
    assert_eq!(tasks[1].title, "late");
}

#[tokio::test]
async fn test_find_repeating_excludes_none() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let repo = SqliteTaskRepository::new(pool.clone());

    repo.create(&new_task(owner, "once", RepeatPolicy::None))
        .await
        .unwrap();
    repo.create(&new_task(owner, "daily", RepeatPolicy::Daily))
        .await
        .unwrap();

    let repeating = repo.find_repeating().await.unwrap();
    assert_eq!(repeating.len(), 1);
    assert_eq!(repeating[0].title, "daily");
}

#[tokio::test]
async fn test_unknown_repeat_value_decodes_as_unsupported() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;

    // 模拟其他写入方留下的未知策略值
    sqlx::query(
        "INSERT INTO tasks (title, owner, repeat, created_at, updated_at) VALUES ($1, $2, 'yearly', $3, $3)",
    )
    .bind("legacy")
    .bind(owner.to_string())
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    let repo = SqliteTaskRepository::new(pool.clone());
    let repeating = repo.find_repeating().await.unwrap();
    assert_eq!(repeating.len(), 1);
    assert_eq!(repeating[0].repeat, RepeatPolicy::Unsupported);
    assert!(!repeating[0].is_repeating());
}

#[tokio::test]
async fn test_exists_occurrence_exact_match() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let other = create_user(&pool).await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let due = Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap();
    let mut task = new_task(owner, "Review", RepeatPolicy::Weekly);
    task.due_date = Some(due);
    repo.create(&task).await.unwrap();

    assert!(repo.exists_occurrence("Review", owner, due).await.unwrap());
    // 不同标题、不同用户、不同日期都不算存在
    assert!(!repo.exists_occurrence("Other", owner, due).await.unwrap());
    assert!(!repo.exists_occurrence("Review", other, due).await.unwrap());
    assert!(!repo
        .exists_occurrence("Review", owner, due + Duration::days(1))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_otp_lifecycle() {
    let pool = setup_pool().await;
    let repo = SqliteOtpRepository::new(pool.clone());

    let now = Utc::now();
    let otp = repo
        .create("bob@example.com", "123456", now + Duration::minutes(10))
        .await
        .unwrap();

    // 正确的邮箱+验证码可命中
    let found = repo
        .find_valid("bob@example.com", "123456", now)
        .await
        .unwrap();
    assert!(found.is_some());

    // 错误验证码不命中
    assert!(repo
        .find_valid("bob@example.com", "654321", now)
        .await
        .unwrap()
        .is_none());

    // 过期后不命中
    assert!(repo
        .find_valid("bob@example.com", "123456", now + Duration::minutes(11))
        .await
        .unwrap()
        .is_none());

    assert!(repo.delete(otp.id).await.unwrap());
    assert!(repo
        .find_valid("bob@example.com", "123456", now)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_purge_expired_otps() {
    let pool = setup_pool().await;
    let repo = SqliteOtpRepository::new(pool.clone());

    let now = Utc::now();
    repo.create("a@example.com", "111111", now - Duration::minutes(1))
        .await
        .unwrap();
    repo.create("b@example.com", "222222", now + Duration::minutes(10))
        .await
        .unwrap();

    let purged = repo.purge_expired(now).await.unwrap();
    assert_eq!(purged, 1);
}
