pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod session;
pub mod telegram;
pub mod wallet;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
