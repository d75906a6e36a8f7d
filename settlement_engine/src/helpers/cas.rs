//! Bounded retries for compare-and-swap updates.
//!
//! Every optimistic write in the engine follows the same shape: read a value, compute the new one, and write it back
//! only if the stored value is still the one that was read. If another writer got there first, the whole
//! read-compute-write cycle is repeated, up to a fixed number of attempts.
use std::future::Future;

use log::*;

pub const DEFAULT_CAS_ATTEMPTS: usize = 3;

/// The result of a single compare-and-swap attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasAttempt<T> {
    /// The write was applied (or there was nothing to write). The loop stops.
    Done(T),
    /// Another writer changed the value between the read and the write. The attempt is repeated.
    Conflict,
}

/// Runs `attempt` until it returns [`CasAttempt::Done`], an error, or `max_attempts` conflicts have been seen.
///
/// `attempt` receives the 1-based attempt number. Retries are immediate. Returns `Ok(None)` if every attempt
/// conflicted.
pub async fn retry_on_conflict<T, E, F, Fut>(max_attempts: usize, mut attempt: F) -> Result<Option<T>, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<CasAttempt<T>, E>>,
{
    let max_attempts = max_attempts.max(1);
    for n in 1..=max_attempts {
        match attempt(n).await? {
            CasAttempt::Done(v) => return Ok(Some(v)),
            CasAttempt::Conflict => {
                debug!("🔁️ Write conflict on attempt {n}/{max_attempts}");
            },
        }
    }
    warn!("🔁️ Giving up after {max_attempts} conflicting attempts");
    Ok(None)
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn succeeds_after_conflicts() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_conflict::<_, (), _, _>(3, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Ok(CasAttempt::Conflict)
                } else {
                    Ok(CasAttempt::Done(n))
                }
            }
        })
        .await;
        assert_eq!(result, Ok(Some(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_conflict::<i32, (), _, _>(3, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(CasAttempt::Conflict) }
        })
        .await;
        assert_eq!(result, Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_stop_the_loop() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_conflict::<i32, &str, _, _>(5, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("boom") }
        })
        .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let result = retry_on_conflict::<_, (), _, _>(0, |_| async { Ok(CasAttempt::Done("ok")) }).await;
        assert_eq!(result, Ok(Some("ok")));
    }
}
