pub mod aggregate;
pub mod app;
pub mod carousel;
pub mod chart;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod refresh;
pub mod state;
pub mod storage;
pub mod text;
pub mod ticker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
