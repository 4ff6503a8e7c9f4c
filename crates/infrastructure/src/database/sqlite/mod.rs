mod sqlite_otp_repository;
mod sqlite_task_repository;
mod sqlite_user_repository;

pub use sqlite_otp_repository::SqliteOtpRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
pub use sqlite_user_repository::SqliteUserRepository;
