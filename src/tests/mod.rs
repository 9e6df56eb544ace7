//! Integration tests for mboxd.
//!
//! Cases drive the fully layered router (rate limiter, panic recovery,
//! controllers) against the in-memory runtime and store; the end-to-end case
//! serves it over a real socket.

mod cases_create_test;
mod cases_e2e_test;
mod cases_lifecycle_test;
mod cases_players_test;
mod cases_rate_limit_test;
mod cases_servers_test;

pub mod support;
