//! Small helpers shared across crates.

/// Substitute `${VAR}` references with environment variable values.
///
/// References to unset variables, and an unterminated `${`, are kept
/// verbatim so the config parser reports them instead of seeing a blank.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        result.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            break;
        };
        let name = &tail[2..close];
        match std::env::var(name) {
            Ok(value) => result.push_str(&value),
            Err(_) => {
                tracing::debug!("environment variable {name} is not set, keeping reference");
                result.push_str(&tail[..=close]);
            }
        }
        rest = &tail[close + 1..];
    }
    // Either nothing left to expand or an unterminated reference.
    result.push_str(rest);
    result
}

/// Current time in unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Convert (possibly fractional) unix seconds to unix milliseconds.
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}
