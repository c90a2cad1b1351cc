use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub fn remove_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Run `f` up to `attempts` times in total, sleeping `delay` between failed
/// attempts. The error of the last attempt is returned once they run out.
pub async fn retry<T, E, F, Fut>(attempts: u32, delay: Duration, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                debug!(attempt, attempts, error = %e, "attempt failed, retrying");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
