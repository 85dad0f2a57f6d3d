//! Shared handler state

use std::sync::Arc;
use std::time::Duration;

use medlookup_core::{MedicineAssistant, MedicineStore};

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<MedicineAssistant>,
    /// Read-only catalog access for the listing endpoints
    pub store: Arc<dyn MedicineStore>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        assistant: Arc<MedicineAssistant>,
        store: Arc<dyn MedicineStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            assistant,
            store,
            request_timeout,
        }
    }
}
