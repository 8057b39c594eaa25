//! # Route Registration
//!
//! Feature modules attach their routes to a shared, prefixed group through
//! [`RouteModule`]. The composition root holds an ordered list of modules and
//! folds them into one router, so adding a feature is a single append to
//! that list.

use axum::routing::MethodRouter;
use axum::Router;

/// A feature that contributes routes under the API prefix.
pub trait RouteModule: Send + Sync {
    /// Short name used in startup logs.
    fn name(&self) -> &'static str;

    /// Attach this module's routes to `group` and hand it back.
    fn register(&self, group: RouteGroup) -> RouteGroup;
}

/// A router under construction, bound to a path prefix.
///
/// Routes and nested routers are relative to the prefix. The group's router
/// carries no state; modules resolve their own state before attaching.
#[derive(Debug)]
pub struct RouteGroup {
    prefix: String,
    router: Router,
    attached: usize,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            router: Router::new(),
            attached: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Mount `router` at `path` relative to the prefix.
    #[must_use]
    pub fn nest(mut self, path: &str, router: Router) -> Self {
        self.router = self.router.nest(path, router);
        self.attached += 1;
        self
    }

    /// Add a single route relative to the prefix.
    #[must_use]
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self.attached += 1;
        self
    }

    /// Whether any route has been attached.
    pub fn has_routes(&self) -> bool {
        self.attached > 0
    }

    /// The finished router, mounted at the prefix.
    pub fn into_router(self) -> Router {
        if !self.has_routes() {
            return Router::new();
        }
        Router::new().nest(&self.prefix, self.router)
    }
}

/// Fold `modules`, in order, into one group under `prefix`.
pub fn register_modules(prefix: &str, modules: &[Box<dyn RouteModule>]) -> RouteGroup {
    modules.iter().fold(RouteGroup::new(prefix), |group, module| {
        tracing::debug!(module = module.name(), prefix, "registering route module");
        module.register(group)
    })
}
