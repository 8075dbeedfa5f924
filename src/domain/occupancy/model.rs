//! Occupancy snapshots produced by the vision collaborator

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    Free,
    Occupied,
}

impl OccupancyStatus {
    pub fn is_occupied(&self) -> bool {
        matches!(self, Self::Occupied)
    }
}

/// One observed space. `id` is the detector's index for the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotEntry {
    pub id: i64,
    pub status: OccupancyStatus,
}

/// Wire shape: `{ "spaces": [ { "id": 0, "status": "occupied" }, ... ] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OccupancySnapshot {
    pub spaces: Vec<SnapshotEntry>,
}

/// How snapshot entry ids are matched to stored spots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotMapping {
    /// Entry id is a position in the spot list captured at the last sync
    #[default]
    Position,
    /// Entry id is the spot's storage id
    SpotId,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AppliedEntry {
    pub index: i64,
    pub spot_id: i32,
    pub is_reserved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FailedEntry {
    pub index: i64,
    pub reason: String,
}

/// Outcome of applying one snapshot; failures never abort other entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ReconcileReport {
    pub applied: Vec<AppliedEntry>,
    pub failed: Vec<FailedEntry>,
}

impl ReconcileReport {
    pub fn failed_indices(&self) -> Vec<i64> {
        self.failed.iter().map(|f| f.index).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_wire_format() {
        let snapshot: OccupancySnapshot = serde_json::from_str(
            r#"{"spaces":[{"id":0,"status":"occupied"},{"id":3,"status":"free"}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.spaces.len(), 2);
        assert!(snapshot.spaces[0].status.is_occupied());
        assert_eq!(snapshot.spaces[1].id, 3);
        assert!(!snapshot.spaces[1].status.is_occupied());
    }

    #[test]
    fn unknown_status_rejected() {
        let res: Result<OccupancySnapshot, _> =
            serde_json::from_str(r#"{"spaces":[{"id":0,"status":"maybe"}]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn mapping_parses_snake_case() {
        let m: SnapshotMapping = serde_json::from_str(r#""spot_id""#).unwrap();
        assert_eq!(m, SnapshotMapping::SpotId);
        assert_eq!(SnapshotMapping::default(), SnapshotMapping::Position);
    }
}
