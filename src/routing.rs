/*
 * Responsibility
 * - フラットな route table (method + リテラル path -> handler)
 * - 起動時に一度だけ登録し、axum Router に変換する
 * - (method, path) の重複は拒否 (上書きしない)
 * - path は一致するが method が無い場合も 404 (405 は返さない)
 */

use axum::{
    Router,
    handler::Handler,
    http::Method,
    routing::{MethodFilter, MethodRouter, on},
};
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("duplicate route: {method} {path}")]
    Duplicate { method: Method, path: String },

    #[error("invalid route path: {0:?}")]
    InvalidPath(String),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(Method),
}

/// A (method, path) pair bound to a handler.
#[derive(Clone, Debug)]
pub struct Route {
    method: Method,
    path: String,
    endpoint: MethodRouter,
}

impl Route {
    pub fn new<H, T>(method: Method, path: impl Into<String>, handler: H) -> Result<Self, RouteError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))?;

        Ok(Self {
            method,
            path: path.into(),
            endpoint: on(filter, handler),
        })
    }

    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            method: Method::GET,
            path: path.into(),
            endpoint: on(MethodFilter::GET, handler),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Result<Self, RouteError> {
        let mut table = Self::new();
        for route in routes {
            table.insert(route)?;
        }
        Ok(table)
    }

    /// Registers a route. Duplicates are rejected, never overwritten.
    pub fn insert(&mut self, route: Route) -> Result<(), RouteError> {
        if !is_literal_path(&route.path) {
            return Err(RouteError::InvalidPath(route.path));
        }

        if self
            .routes
            .iter()
            .any(|r| r.method == route.method && r.path == route.path)
        {
            return Err(RouteError::Duplicate {
                method: route.method,
                path: route.path,
            });
        }

        self.routes.push(route);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn into_router(self) -> Router {
        let mut paths: Vec<PathEntry> = Vec::new();

        for route in self.routes {
            let is_head = route.method == Method::HEAD;
            match paths.iter_mut().find(|p| p.path == route.path) {
                Some(entry) => {
                    let current = std::mem::replace(&mut entry.endpoint, MethodRouter::new());
                    entry.endpoint = current.merge(route.endpoint);
                    entry.has_head |= is_head;
                }
                None => paths.push(PathEntry {
                    path: route.path,
                    endpoint: route.endpoint,
                    has_head: is_head,
                }),
            }
        }

        let mut router = Router::new();
        for entry in paths {
            let mut endpoint = entry.endpoint;
            // axum answers HEAD with the GET handler unless HEAD has its own endpoint.
            if !entry.has_head {
                endpoint = endpoint.head(not_found);
            }
            router = router.route(&entry.path, endpoint.fallback(not_found));
        }

        router.fallback(not_found)
    }
}

/// Only literal paths are accepted: captures (`{id}`), wildcards (`*rest`)
/// and legacy `:id` segments would make distinct strings collide in axum.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['{', '}', '*'])
        && !path.split('/').any(|segment| segment.starts_with(':'))
}

struct PathEntry {
    path: String,
    endpoint: MethodRouter,
    has_head: bool,
}

async fn not_found() -> AppError {
    AppError::NotFound
}
