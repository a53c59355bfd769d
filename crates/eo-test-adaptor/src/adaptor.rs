use std::sync::{Arc, Mutex};

use eo_adaptor::{Adaptor, AdaptorChannel, AdaptorError, ChannelPool};
use eo_model::Model;
use eo_sql::ExpressionFactory;
use tracing::debug;

use crate::channel::TestAdaptorChannel;
use crate::factory::{PlanRegistry, TestExpressionFactory};
use crate::store::Tables;

/// An [`Adaptor`] backed entirely by process memory: no socket, no driver,
/// every channel it opens shares the same `Tables` behind a `Mutex`. Built
/// to exercise `eo-channel`/`eo-database` (and this crate's own pool-safety
/// property) without a real database.
pub struct InProcessAdaptor {
    model: Arc<Model>,
    factory: TestExpressionFactory,
    tables: Arc<Mutex<Tables>>,
    pool: ChannelPool,
}

impl InProcessAdaptor {
    pub fn new(model: Arc<Model>, max_channel_age: std::time::Duration) -> Self {
        let registry = Arc::new(PlanRegistry::default());
        InProcessAdaptor {
            model,
            factory: TestExpressionFactory::new(registry),
            tables: Arc::new(Mutex::new(Tables::new())),
            pool: ChannelPool::new(max_channel_age),
        }
    }

    /// Seeds `table_name` with `rows`, bypassing the adaptor/channel
    /// contract entirely. Test-only convenience for setting up fixtures.
    pub fn seed(&self, table_name: impl Into<String>, rows: Vec<eo_model::Snapshot>) {
        self.tables.lock().expect("test adaptor tables lock poisoned").insert(table_name.into(), rows);
    }

    /// Whether a channel currently sits in this adaptor's pool. Test-only
    /// window into pool occupancy for callers (outside this crate) that want
    /// to assert a channel was returned rather than leaked.
    pub async fn has_pooled_channel(&self) -> bool {
        match self.pool.grab().await {
            Some(channel) => {
                let _ = self.pool.add(channel).await;
                true
            }
            None => false,
        }
    }

    fn new_channel(&self) -> Box<dyn AdaptorChannel> {
        let registry = self.factory_registry();
        Box::new(TestAdaptorChannel::new(self.tables.clone(), registry))
    }

    fn factory_registry(&self) -> Arc<PlanRegistry> {
        // The factory owns the only `Arc<PlanRegistry>` reference besides the
        // ones handed to channels; cloning it here is how every channel this
        // adaptor opens ends up reading plans the same factory wrote.
        self.factory.registry()
    }
}

#[async_trait::async_trait]
impl Adaptor for InProcessAdaptor {
    fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn expression_factory(&self) -> &dyn ExpressionFactory {
        &self.factory
    }

    async fn open_channel(&self) -> Result<Box<dyn AdaptorChannel>, AdaptorError> {
        Ok(self.new_channel())
    }

    async fn open_channel_from_pool(&self) -> Result<Box<dyn AdaptorChannel>, AdaptorError> {
        match self.pool.grab().await {
            Some(channel) => Ok(channel),
            None => {
                debug!("pool miss, opening fresh in-process channel");
                self.open_channel().await
            }
        }
    }

    async fn release_channel(&self, channel: Box<dyn AdaptorChannel>) {
        if let Err(error) = self.pool.add(channel).await {
            debug!(%error, "failed to return channel to pool");
        }
    }
}
