pub mod database;
pub mod mailer;

pub use database::sqlite::{SqliteOtpRepository, SqliteTaskRepository, SqliteUserRepository};
pub use database::{connect, run_migrations};
pub use mailer::LogMailer;
