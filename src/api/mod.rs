/*
 * Responsibility
 * - アプリケーションの route 一覧 (routes() の re-export)
 */
pub mod handlers;
mod routes;

pub use routes::routes;
