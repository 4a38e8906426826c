//! Profile store boundary and reconciliation

pub mod ports;
pub mod reconciler;

pub use ports::ProfileStore;
pub use reconciler::{
    reconcile, ProfileReconciler, ProfileWrite, ReconcileInput, ReconcileOutcome, WriteMode,
};
