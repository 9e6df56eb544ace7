// Application wiring: collaborators, HTTP server and lifecycle.

#[allow(clippy::module_inception)]
pub mod app;
pub mod server;

pub use app::App;
pub use server::HttpServer;
