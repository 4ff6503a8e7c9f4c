pub mod auth;
pub mod health;
pub mod root;
pub mod tasks;
