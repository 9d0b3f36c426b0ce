/*
 * Responsibility
 * - URL 構造を定義 (method + path -> handler)
 * - 登録順は RouteTable にそのまま渡る
 */
use crate::api::handlers::ping::ping;
use crate::routing::Route;

pub fn routes() -> Vec<Route> {
    vec![Route::get("/ping", ping)]
}
