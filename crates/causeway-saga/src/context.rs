use std::sync::Arc;

use causeway_core::{ConsistencyProfile, DataStore};

/// Shared context handed to every step of a workflow run.
///
/// Bundles the injected store handle, the consistency profile all
/// operations of the run execute under, and arbitrary caller state. There
/// is no process-wide store client; whoever starts a run decides which
/// store and profile it uses.
pub struct WorkflowContext<C> {
    store: Arc<dyn DataStore>,
    profile: ConsistencyProfile,
    app: C,
}

impl<C> WorkflowContext<C> {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, profile: ConsistencyProfile, app: C) -> Self {
        Self {
            store,
            profile,
            app,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn profile(&self) -> ConsistencyProfile {
        self.profile
    }

    #[must_use]
    pub fn app(&self) -> &C {
        &self.app
    }
}
