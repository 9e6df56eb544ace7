// HTTP controller trait for route registration.

use axum::Router;

/// A controller owns one resource and registers its routes on the shared router.
pub trait Controller: Send + Sync {
    /// Adds routes to the router.
    ///
    /// ```rust
    /// # use axum::{Router, routing::get};
    /// # async fn players() -> &'static str { "[]" }
    /// let router: Router<()> = Router::new().route("/api/servers/:id/players", get(players));
    /// # let _ = router;
    /// ```
    fn add_route(&self, router: Router) -> Router;
}
