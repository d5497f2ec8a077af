//! HTTP request handlers and the route table.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::{HttpRequest, Method};
use crate::server::{HttpResponse, Error};

/// Type alias for a boxed future that returns a Result<HttpResponse, Error>.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// Type alias for a handler function that takes an HttpRequest and returns a HandlerFuture.
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Represents a route in the HTTP server.
#[derive(Clone)]
pub struct Route {
    /// The exact path to match.
    pub path: String,
    /// The HTTP method to match.
    pub method: Method,
    /// The handler function.
    pub handler: HandlerFn,
}

/// An exact-match route table keyed by `(method, path)`.
///
/// The table is built once and then only read; the server shares it behind an
/// `Arc`. There is no pattern matching and no trailing-slash normalization:
/// `/basic/` and `/basic` are different routes.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<(Method, String), Route>,
}

impl Router {
    /// Create an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` on `path`, replacing any previous
    /// registration for the same pair.
    pub fn add_route<F, Fut>(&mut self, path: impl Into<String>, method: Method, handler: F)
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        let path = path.into();
        let handler: HandlerFn = Arc::new(move |req: HttpRequest| -> HandlerFuture {
            Box::pin(handler(req))
        });

        let route = Route {
            path: path.clone(),
            method,
            handler,
        };

        self.routes.insert((method, path), route);
    }

    /// Builder-style [`Router::add_route`] for `GET`.
    pub fn get<F, Fut>(mut self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.add_route(path, Method::GET, handler);
        self
    }

    /// Builder-style [`Router::add_route`] for `POST`.
    pub fn post<F, Fut>(mut self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.add_route(path, Method::POST, handler);
        self
    }

    /// Find the route registered for exactly this method and path.
    pub fn lookup(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes.get(&(method, path.to_string()))
    }

    /// Run the matching handler, or fail with [`Error::NotFound`].
    pub async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        match self.lookup(request.method, &request.path) {
            Some(route) => (route.handler)(request).await,
            None => Err(Error::NotFound(request.method, request.path)),
        }
    }

    /// All registered routes, sorted by path and then method name.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self.routes.values().collect();
        routes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        routes
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
