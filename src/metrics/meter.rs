// Metric names and recording helpers.

// Metric name constants
pub const HTTP_RATE_LIMITED: &str = "mboxd_http_rate_limited_total";
pub const HTTP_PANICS: &str = "mboxd_http_panics_total";
pub const RATE_LIMIT_CLIENTS: &str = "mboxd_rate_limit_tracked_clients";

pub const PROVISIONS: &str = "mboxd_provisions_total";
pub const REPLACEMENTS: &str = "mboxd_replacements_total";
pub const IMAGE_PULLS: &str = "mboxd_image_pulls_total";
pub const PLAYER_PROBE_FAILURES: &str = "mboxd_player_probe_failures_total";
pub const RUNTIME_TIMEOUTS: &str = "mboxd_runtime_timeouts_total";

const OUTCOME: &str = "outcome";

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

/// Counts a request rejected by the rate limiter.
pub fn inc_rate_limited() {
    metrics::counter!(HTTP_RATE_LIMITED).increment(1);
}

/// Counts a panic caught at the HTTP boundary.
pub fn inc_panics() {
    metrics::counter!(HTTP_PANICS).increment(1);
}

/// Sets the number of clients tracked by the rate limiter.
pub fn set_rate_limit_clients(count: usize) {
    metrics::gauge!(RATE_LIMIT_CLIENTS).set(count as f64);
}

/// Counts a provisioning attempt by outcome.
pub fn inc_provisions(ok: bool) {
    metrics::counter!(PROVISIONS, OUTCOME => outcome(ok)).increment(1);
}

/// Counts a container replacement by outcome.
pub fn inc_replacements(ok: bool) {
    metrics::counter!(REPLACEMENTS, OUTCOME => outcome(ok)).increment(1);
}

/// Counts an image pull by outcome.
pub fn inc_image_pulls(ok: bool) {
    metrics::counter!(IMAGE_PULLS, OUTCOME => outcome(ok)).increment(1);
}

/// Counts a player listing that degraded to an empty result.
pub fn inc_player_probe_failures() {
    metrics::counter!(PLAYER_PROBE_FAILURES).increment(1);
}

/// Counts a runtime call that exceeded its deadline.
pub fn inc_runtime_timeouts(op: &'static str) {
    metrics::counter!(RUNTIME_TIMEOUTS, "op" => op).increment(1);
}
