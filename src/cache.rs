use alloc::collections::BTreeMap;
use core::any::TypeId;
use parking_lot::RwLock;

use crate::any::Instance;

/// Singleton instances keyed by the requested type.
///
/// Two requested types bound to the same implementation own independent entries.
#[derive(Default)]
pub(crate) struct SingletonCache {
    map: RwLock<BTreeMap<TypeId, Instance>>,
}

impl SingletonCache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn get(&self, requested: &TypeId) -> Option<Instance> {
        self.map.read().get(requested).cloned()
    }

    /// Caches `instance` unless another one was cached first, returning the cached one
    #[must_use]
    pub(crate) fn insert(&self, requested: TypeId, instance: Instance) -> Instance {
        self.map.write().entry(requested).or_insert(instance).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::SingletonCache;
    use crate::{Instance, Svc};

    use core::any::TypeId;

    struct Cached(u8);

    #[test]
    fn test_first_writer_wins() {
        let cache = SingletonCache::new();
        let key = TypeId::of::<Cached>();

        let first = Instance::new(Svc::new(Cached(1)));
        let second = Instance::new(Svc::new(Cached(2)));

        assert!(cache.insert(key, first.clone()).ptr_eq(&first));
        assert!(cache.insert(key, second).ptr_eq(&first));
        assert_eq!(cache.get(&key).unwrap().downcast::<Cached>().unwrap().0, 1);
    }

    #[test]
    fn test_keyed_by_requested_type() {
        let cache = SingletonCache::new();
        let instance = Instance::new(Svc::new(Cached(1)));

        let _ = cache.insert(TypeId::of::<Cached>(), instance.clone());
        assert!(cache.get(&TypeId::of::<u8>()).is_none());
    }
}
