//! In-memory session registry.
//!
//! Maps a session identifier to the conversation handle created for it. Entries
//! live for the whole process; nothing is evicted.

use crate::services::provider::ConversationHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

pub struct SessionRegistry<H = ConversationHandle> {
    sessions: DashMap<String, H>,
}

impl<H: Clone> SessionRegistry<H> {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Look up the handle for `session_id`.
    pub fn get(&self, session_id: &str) -> Option<H> {
        self.sessions.get(session_id).map(|h| h.value().clone())
    }

    /// Return the handle for `session_id`, creating it with `factory` if absent.
    ///
    /// Lookup, creation and insertion happen under the shard lock for the key,
    /// so concurrent first requests on one session still create a single
    /// handle. `factory` must therefore not call back into this registry. When
    /// it fails nothing is stored and the error is returned as-is.
    pub fn get_or_create<F, E>(&self, session_id: &str, factory: F) -> Result<H, E>
    where
        F: FnOnce() -> Result<H, E>,
    {
        if let Some(handle) = self.get(session_id) {
            return Ok(handle);
        }

        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let handle = factory()?;
                entry.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<H: Clone> Default for SessionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_get_absent() {
        let registry: SessionRegistry<u32> = SessionRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_or_create_reuses_handle() {
        let registry = SessionRegistry::new();
        let created = AtomicUsize::new(0);

        let factory = || {
            let n = created.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(Arc::new(n))
        };

        let first = registry.get_or_create("a", factory).unwrap();
        let second = registry
            .get_or_create("a", || -> Result<Arc<usize>, Infallible> {
                panic!("factory must not run for an existing session")
            })
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new();

        let a = registry
            .get_or_create("a", || Ok::<_, Infallible>(Arc::new("a")))
            .unwrap();
        let b = registry
            .get_or_create("b", || Ok::<_, Infallible>(Arc::new("b")))
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*registry.get("a").unwrap(), "a");
        assert_eq!(*registry.get("b").unwrap(), "b");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_failed_factory_stores_nothing() {
        let registry: SessionRegistry<u32> = SessionRegistry::new();

        let result = registry.get_or_create("a", || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(!registry.contains("a"));

        let handle = registry.get_or_create("a", || Ok::<_, &str>(7)).unwrap();
        assert_eq!(handle, 7);
    }

    #[test]
    fn test_concurrent_creation_yields_one_handle() {
        let registry = Arc::new(SessionRegistry::new());
        let created = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let created = created.clone();
                std::thread::spawn(move || {
                    registry
                        .get_or_create("shared", || {
                            std::thread::sleep(std::time::Duration::from_millis(5));
                            Ok::<_, Infallible>(Arc::new(created.fetch_add(1, Ordering::SeqCst)))
                        })
                        .unwrap()
                })
            })
            .collect();

        let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }
}
