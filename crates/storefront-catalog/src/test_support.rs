use std::sync::Arc;
use std::time::Duration;

use storefront_db::MemoryStore;

use crate::{AdminSession, Catalog, SessionGate};

pub(crate) fn catalog() -> (Catalog, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let catalog = Catalog::new(store.clone(), Duration::from_secs(2));
    (catalog, store)
}

pub(crate) fn admin() -> AdminSession {
    let (session, _) = SessionGate::new("test-password", false)
        .login("test-password")
        .expect("login with the configured password");
    session
}
