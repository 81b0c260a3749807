//! Platform abstraction layer
//!
//! The simulation takes time as a parameter; this is where it comes from.

/// Monotonic-ish seconds for frame timestamps.
///
/// Browser: `performance.now()`, falling back to `Date.now()`.
#[cfg(target_arch = "wasm32")]
pub fn now_seconds() -> f64 {
    let millis = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now);
    millis / 1000.0
}

/// Native: seconds since the first call
#[cfg(not(target_arch = "wasm32"))]
pub fn now_seconds() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Seed for a fresh session
pub fn session_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let a = now_seconds();
        let b = now_seconds();
        assert!(b >= a);
        assert!(session_seed() > 0);
    }
}
