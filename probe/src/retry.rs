//! Retry utility with a fixed delay between attempts.

use std::time::Duration;
use tracing::warn;

/// Retry a synchronous operation with a fixed delay between attempts.
///
/// Returns `Ok` on first success, or the last `Err` after all attempts are
/// exhausted. No delay follows the final attempt.
pub fn retry_with_fixed_delay<F, T, E>(
    operation_name: &str,
    max_attempts: u32,
    delay: Duration,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        match f() {
            Ok(val) => return Ok(val),
            Err(e) => {
                warn!(
                    "{} failed (attempt {}/{}): {}",
                    operation_name, attempt, max_attempts, e
                );
                last_err = Some(e);
                if attempt < max_attempts {
                    std::thread::sleep(delay);
                }
            }
        }
    }

    Err(last_err.unwrap())
}
