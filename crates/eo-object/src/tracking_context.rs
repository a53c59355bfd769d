use std::collections::HashMap;
use std::sync::Arc;

use eo_model::GlobalId;

/// Object uniquer keyed by [`GlobalId`]: ensures that fetching the same row
/// twice within one scope returns the same object instance rather than two
/// copies that would silently diverge.
///
/// A `TrackingContext` has no opinion on when it should be cleared; that is
/// a policy decision for whatever owns the scope (per-request, per-channel,
/// process-lifetime), made in `eo-channel`/`eo-database`.
#[derive(Debug)]
pub struct TrackingContext<T> {
    objects: HashMap<GlobalId, Arc<T>>,
}

impl<T> Default for TrackingContext<T> {
    fn default() -> Self {
        TrackingContext { objects: HashMap::new() }
    }
}

impl<T> TrackingContext<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, global_id: &GlobalId) -> Option<Arc<T>> {
        self.objects.get(global_id).cloned()
    }

    /// Registers `object` under `global_id` if no object is already
    /// registered there; otherwise returns the existing registrant and
    /// discards `object`. Either way, the returned `Arc` is the one callers
    /// should keep using.
    pub fn register(&mut self, global_id: GlobalId, object: Arc<T>) -> Arc<T> {
        self.objects.entry(global_id).or_insert(object).clone()
    }

    pub fn forget(&mut self, global_id: &GlobalId) {
        self.objects.remove(global_id);
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_for_same_global_id() {
        let mut ctx: TrackingContext<String> = TrackingContext::new();
        let gid = GlobalId::from_keys("Person", vec![("id".into(), eo_value::Value::Int(1))]);

        let first = ctx.register(gid.clone(), Arc::new("first".to_string()));
        let second = ctx.register(gid.clone(), Arc::new("second".to_string()));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, "first".to_string());
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn forget_removes_registration() {
        let mut ctx: TrackingContext<String> = TrackingContext::new();
        let gid = GlobalId::from_keys("Person", vec![("id".into(), eo_value::Value::Int(1))]);
        ctx.register(gid.clone(), Arc::new("value".to_string()));
        ctx.forget(&gid);
        assert!(ctx.lookup(&gid).is_none());
    }
}
