use std::sync::Arc;

use crate::ledger::BookingLedger;
use crate::store::Store;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ledger: Arc<BookingLedger>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let ledger = Arc::new(BookingLedger::new(Arc::clone(&store)));
        Self { store, ledger }
    }
}
