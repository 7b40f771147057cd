pub mod activity;
pub mod chat;
pub mod insights;
pub mod providers;
pub mod recommendations;
pub mod tips;
pub mod users;
