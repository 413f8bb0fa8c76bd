//! Process spawning helpers shared by the runners and scheduler backends.
use std::{io, time::Duration};

use tracing::trace;

/// Extra spawn attempts allowed when the executable is reported busy.
const BUSY_RETRIES: u32 = 5;

/// Decide whether a failed spawn should be retried, sleeping before returning `true`.
///
/// A freshly written script can still be held open for writing by a process
/// forked concurrently in this program (`ETXTBSY`); that clears up quickly.
pub(crate) async fn retry_spawn(e: &io::Error, attempt: &mut u32) -> bool {
    if !is_text_busy(e) || *attempt >= BUSY_RETRIES {
        return false;
    }
    *attempt += 1;
    trace!(attempt = *attempt, "executable busy; retrying spawn");
    tokio::time::sleep(Duration::from_millis(10 * u64::from(*attempt))).await;
    true
}

#[cfg(unix)]
fn is_text_busy(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::ETXTBSY)
}

#[cfg(not(unix))]
fn is_text_busy(_e: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::retry_spawn;

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let mut attempt = 0;
        let e = io::Error::from(io::ErrorKind::NotFound);
        assert!(!retry_spawn(&e, &mut attempt).await);
        assert_eq!(attempt, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn busy_errors_are_retried_a_bounded_number_of_times() {
        let mut attempt = 0;
        let e = io::Error::from_raw_os_error(libc::ETXTBSY);
        let mut retries = 0;
        while retry_spawn(&e, &mut attempt).await {
            retries += 1;
        }
        assert_eq!(retries, 5);
    }
}
