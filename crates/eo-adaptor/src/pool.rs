use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::adaptor::AdaptorChannel;
use crate::error::AdaptorError;

struct Slotted {
    channel: Box<dyn AdaptorChannel>,
    inserted_at: Instant,
}

/// A single-slot channel pool (§4.4): at most one idle channel is ever held
/// at a time, aged out by a background task once it has sat longer than
/// `max_age`. Anything beyond the one slot is simply opened fresh by the
/// caller (`Adaptor::open_channel_from_pool` falls back to `open_channel`
/// on a miss) rather than queued, since this ORM core never needs more than
/// one warm connection per logical database handle.
pub struct ChannelPool {
    slot: std::sync::Arc<Mutex<Option<Slotted>>>,
    max_age: Duration,
    sweeper: JoinHandle<()>,
}

impl ChannelPool {
    pub fn new(max_age: Duration) -> Self {
        let slot: std::sync::Arc<Mutex<Option<Slotted>>> = std::sync::Arc::new(Mutex::new(None));
        let sweeper_slot = slot.clone();
        let sweep_interval = max_age.max(Duration::from_millis(1));
        let sweeper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                interval.tick().await;
                let mut guard = sweeper_slot.lock().await;
                if let Some(slotted) = guard.as_ref() {
                    if slotted.inserted_at.elapsed() >= sweep_interval {
                        debug!("evicting expired pooled channel");
                        *guard = None;
                    }
                }
            }
        });
        ChannelPool { slot, max_age, sweeper }
    }

    /// Takes the pooled channel if one is present and not yet expired. An
    /// expired channel is dropped rather than handed back, leaving the slot
    /// empty for the caller to refill with a freshly opened channel.
    pub async fn grab(&self) -> Option<Box<dyn AdaptorChannel>> {
        let mut guard = self.slot.lock().await;
        match guard.take() {
            Some(slotted) if slotted.inserted_at.elapsed() < self.max_age => Some(slotted.channel),
            Some(_expired) => None,
            None => None,
        }
    }

    /// Offers `channel` back to the pool. A channel with an open transaction
    /// is rolled back and discarded instead of pooled: handing out a channel
    /// mid-transaction to an unrelated caller would let it observe or commit
    /// work it never started (§8's pool-safety invariant). If the slot is
    /// already occupied, the existing entry is left in place and `channel` is
    /// discarded rather than overwriting it (§4.4: installed "provided no
    /// channel is already pooled").
    pub async fn add(&self, mut channel: Box<dyn AdaptorChannel>) -> Result<(), AdaptorError> {
        if channel.is_transaction_in_progress() {
            channel.rollback().await?;
            return Ok(());
        }
        let mut guard = self.slot.lock().await;
        if guard.is_some() {
            debug!("pool slot already occupied, discarding offered channel");
            return Ok(());
        }
        *guard = Some(Slotted {
            channel,
            inserted_at: Instant::now(),
        });
        Ok(())
    }
}

impl Drop for ChannelPool {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_sql::SqlExpression;
    use crate::row::Row;
    use crate::operation::{AdaptorOperation, AdaptorOperationResult};
    use eo_sql::ExpressionFactory;

    struct StubChannel {
        transaction_in_progress: bool,
    }

    #[async_trait::async_trait]
    impl AdaptorChannel for StubChannel {
        async fn begin(&mut self) -> Result<(), AdaptorError> {
            self.transaction_in_progress = true;
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), AdaptorError> {
            self.transaction_in_progress = false;
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), AdaptorError> {
            self.transaction_in_progress = false;
            Ok(())
        }

        fn is_transaction_in_progress(&self) -> bool {
            self.transaction_in_progress
        }

        async fn evaluate_query_expression(&mut self, _expression: &SqlExpression) -> Result<Vec<Row>, AdaptorError> {
            Ok(Vec::new())
        }

        async fn perform_adaptor_operation(
            &mut self,
            _factory: &dyn ExpressionFactory,
            _operation: &AdaptorOperation,
        ) -> Result<AdaptorOperationResult, AdaptorError> {
            Ok(AdaptorOperationResult::default())
        }

        async fn query_sql(&mut self, _statement: &str) -> Result<Vec<Row>, AdaptorError> {
            Ok(Vec::new())
        }

        async fn perform_sql(&mut self, _statement: &str) -> Result<u64, AdaptorError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn grab_after_add_returns_same_channel() {
        let pool = ChannelPool::new(Duration::from_secs(60));
        assert!(pool.grab().await.is_none());

        pool.add(Box::new(StubChannel { transaction_in_progress: false })).await.unwrap();
        let channel = pool.grab().await;
        assert!(channel.is_some());
        assert!(pool.grab().await.is_none());
    }

    #[tokio::test]
    async fn add_rolls_back_and_discards_channel_with_open_transaction() {
        let pool = ChannelPool::new(Duration::from_secs(60));
        let channel: Box<dyn AdaptorChannel> = Box::new(StubChannel { transaction_in_progress: true });
        pool.add(channel).await.unwrap();
        assert!(pool.grab().await.is_none());
    }

    #[tokio::test]
    async fn add_discards_offered_channel_when_slot_already_occupied() {
        let pool = ChannelPool::new(Duration::from_secs(60));
        pool.add(Box::new(StubChannel { transaction_in_progress: false })).await.unwrap();
        pool.add(Box::new(StubChannel { transaction_in_progress: false })).await.unwrap();

        assert!(pool.grab().await.is_some());
        assert!(pool.grab().await.is_none(), "only one channel was ever pooled");
    }

    #[tokio::test]
    async fn expired_channel_is_not_returned_by_grab() {
        let pool = ChannelPool::new(Duration::from_millis(10));
        pool.add(Box::new(StubChannel { transaction_in_progress: false })).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(pool.grab().await.is_none());
    }
}
