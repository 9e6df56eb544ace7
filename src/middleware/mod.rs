// HTTP middlewares applied around every controller.

pub mod middleware;
pub mod rate_limit_middleware;
pub mod recover_middleware;


pub use rate_limit_middleware::RateLimitMiddleware;
pub use recover_middleware::PanicRecoverMiddleware;
