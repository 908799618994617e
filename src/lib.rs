pub mod calendar;
pub mod cli;
pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod reminders;

pub use db::Database;
