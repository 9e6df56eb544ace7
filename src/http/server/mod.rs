#[allow(clippy::module_inception)]
pub mod server;

pub use server::{bind_addr, HttpServer};
