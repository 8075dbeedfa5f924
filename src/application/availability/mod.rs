//! Occupancy reconciliation

mod reconciler;

pub use reconciler::AvailabilityReconciler;
