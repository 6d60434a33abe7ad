pub mod app;
pub mod calendar;
pub mod config;
pub mod controller;
pub mod errors;
pub mod handlers;
pub mod modal;
pub mod models;
pub mod repository;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod utils;

pub use app::router;
pub use config::AppConfig;
pub use controller::ExpenseApp;
pub use state::AppState;
