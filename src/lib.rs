/*
 * Responsibility
 * - crate の公開インターフェース (mod 宣言と re-export)
 * - main.rs と tests/ から同じ Router / server を使う
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routing;

pub use app::{ServerConfig, bind, build_router, serve, start};
pub use error::{AppError, ServerError};
pub use routing::{Route, RouteError, RouteTable};
