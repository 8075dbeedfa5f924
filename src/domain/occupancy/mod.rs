pub mod model;

pub use model::{
    AppliedEntry, FailedEntry, OccupancySnapshot, OccupancyStatus, ReconcileReport,
    SnapshotEntry, SnapshotMapping,
};
