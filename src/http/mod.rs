// HTTP module: server and the JSON error taxonomy.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::HttpServer;

pub use crate::controller::controller::Controller;
pub use crate::middleware::middleware::Middleware;
