pub mod availability;

pub use availability::AvailabilityReconciler;
