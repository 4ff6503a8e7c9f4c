pub mod entities;
pub mod ports;
pub mod repositories;

pub use entities::{NewTask, NewUser, OtpCode, Priority, RepeatPolicy, Task, User};
pub use ports::mailer::{EmailMessage, Mailer};
pub use repositories::{OtpRepository, TaskRepository, UserRepository};
