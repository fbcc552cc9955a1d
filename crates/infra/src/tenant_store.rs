use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use ledgerly_core::TenantId;

/// Tenant-isolated key/value store abstraction.
///
/// Every operation takes the tenant explicitly; keys of one tenant are
/// unreachable from another. Writes are last-write-wins.
pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V>;
    fn upsert(&self, tenant_id: TenantId, key: K, value: V);
    fn list(&self, tenant_id: TenantId) -> Vec<V>;
    /// Remove a single record. Returns whether it existed.
    fn remove(&self, tenant_id: TenantId, key: &K) -> bool;
}

impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    S: TenantStore<K, V> + ?Sized,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        (**self).upsert(tenant_id, key, value)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        (**self).list(tenant_id)
    }

    fn remove(&self, tenant_id: TenantId, key: &K) -> bool {
        (**self).remove(tenant_id, key)
    }
}

/// In-memory tenant-isolated store for dev/tests.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    inner: RwLock<HashMap<(TenantId, K), V>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(tenant_id, key.clone())).cloned()
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((tenant_id, key), value);
        }
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((t, _k), v)| if *t == tenant_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn remove(&self, tenant_id: TenantId, key: &K) -> bool {
        match self.inner.write() {
            Ok(mut map) => map.remove(&(tenant_id, key.clone())).is_some(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_to_their_tenant() {
        let store: InMemoryTenantStore<&str, i64> = InMemoryTenantStore::new();
        let a = TenantId::new();
        let b = TenantId::new();

        store.upsert(a, "balance", 100);
        store.upsert(b, "balance", 200);

        assert_eq!(store.get(a, &"balance"), Some(100));
        assert_eq!(store.get(b, &"balance"), Some(200));
        assert_eq!(store.list(a), vec![100]);
    }

    #[test]
    fn remove_is_tenant_scoped() {
        let store: InMemoryTenantStore<&str, i64> = InMemoryTenantStore::new();
        let a = TenantId::new();
        let b = TenantId::new();

        store.upsert(a, "x", 1);
        store.upsert(b, "x", 2);

        assert!(store.remove(a, &"x"));
        assert!(!store.remove(a, &"x"));
        assert_eq!(store.get(b, &"x"), Some(2));
    }

    #[test]
    fn upsert_is_last_write_wins() {
        let store: InMemoryTenantStore<&str, i64> = InMemoryTenantStore::new();
        let tenant = TenantId::new();

        store.upsert(tenant, "x", 1);
        store.upsert(tenant, "x", 2);

        assert_eq!(store.get(tenant, &"x"), Some(2));
    }
}
