use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

/// Periodically moves open carts that have been idle longer than `timeout`
/// to `abandoned`.
pub struct CartSweeper<R> {
    repo: R,
    timeout: Duration,
    interval: Duration,
}

impl<R: CartRepository> CartSweeper<R> {
    pub fn new(repo: R, timeout: Duration, interval: Duration) -> Self {
        Self {
            repo,
            timeout,
            interval,
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, DomainError> {
        chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|timeout| now.checked_sub_signed(timeout))
            .ok_or_else(|| {
                DomainError::Internal(format!("cart timeout {:?} is out of range", self.timeout))
            })
    }

    /// One pass. Returns how many carts were abandoned.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let cutoff = self.cutoff(now)?;
        self.repo.abandon_idle_carts(cutoff)
    }

    /// Run on a fixed interval until `token` is cancelled. The first pass
    /// happens immediately. Errors are logged and retried on the next tick.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!(
                "cart sweeper started (timeout {:?}, every {:?})",
                self.timeout,
                self.interval
            );

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        log::info!("cart sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let sweeper = Arc::clone(&self);
                        let result =
                            tokio::task::spawn_blocking(move || sweeper.sweep_once(Utc::now())).await;
                        match result {
                            Ok(Ok(0)) => log::debug!("cart sweep: nothing to abandon"),
                            Ok(Ok(n)) => log::info!("cart sweep: {} carts marked abandoned", n),
                            Ok(Err(e)) => log::error!("cart sweep failed: {}", e),
                            Err(e) => log::error!("cart sweep task panicked: {}", e),
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::infrastructure::cart_repo::DieselCartRepository;
    use crate::infrastructure::test_support::*;

    #[tokio::test]
    async fn sweep_abandons_idle_cart_and_spares_recent_one() {
        let (_container, pool) = setup_db().await;
        let sweeper = CartSweeper::new(
            DieselCartRepository::new(pool.clone()),
            Duration::from_secs(3600),
            Duration::from_secs(600),
        );
        let now = Utc::now();
        let idle = seed_cart(&pool, None, "new", now - ChronoDuration::minutes(61));
        let recent = seed_cart(&pool, None, "new", now - ChronoDuration::seconds(1));

        assert_eq!(sweeper.sweep_once(now).expect("sweep"), 1);
        assert_eq!(cart_status(&pool, idle).as_deref(), Some("abandoned"));
        assert_eq!(cart_status(&pool, recent).as_deref(), Some("new"));

        assert_eq!(sweeper.sweep_once(now).expect("second sweep"), 0);
    }

    #[tokio::test]
    async fn spawned_sweeper_runs_immediately_and_stops_on_cancel() {
        let (_container, pool) = setup_db().await;
        let idle = seed_cart(&pool, None, "new", Utc::now() - ChronoDuration::hours(3));
        let sweeper = Arc::new(CartSweeper::new(
            DieselCartRepository::new(pool.clone()),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        ));
        let token = CancellationToken::new();

        let handle = sweeper.spawn(token.clone());

        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(10);
        while cart_status(&pool, idle).as_deref() != Some("abandoned") {
            assert!(tokio::time::Instant::now() < deadline, "sweeper never ran");
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .expect("sweeper task failed");
    }

    #[test]
    fn cutoff_subtracts_timeout() {
        use diesel::r2d2::{ConnectionManager, Pool};

        // Never connects; cutoff() does not touch the database.
        let pool = Pool::builder().build_unchecked(ConnectionManager::new("postgres://unused"));
        let sweeper = CartSweeper::new(
            DieselCartRepository::new(pool),
            Duration::from_secs(90 * 60),
            Duration::from_secs(1),
        );
        let now = Utc::now();
        assert_eq!(sweeper.cutoff(now).unwrap(), now - ChronoDuration::minutes(90));
    }
}
