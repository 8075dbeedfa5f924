//! Availability Reconciler
//!
//! Applies occupancy snapshots from the vision collaborator to the stored
//! spots and fans the result out to websocket clients.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::domain::occupancy::{
    AppliedEntry, FailedEntry, OccupancySnapshot, ReconcileReport, SnapshotEntry, SnapshotMapping,
};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::notifications::{Event, SharedEventBus, SpacesUpdatedEvent};

pub struct AvailabilityReconciler {
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
    mapping: SnapshotMapping,
    /// Spot ids in ascending order as of the last sync
    positions: RwLock<Option<Vec<i32>>>,
}

impl AvailabilityReconciler {
    pub fn new(repos: Arc<dyn RepositoryProvider>, event_bus: SharedEventBus) -> Self {
        Self {
            repos,
            event_bus,
            mapping: SnapshotMapping::default(),
            positions: RwLock::new(None),
        }
    }

    pub fn with_mapping(mut self, mapping: SnapshotMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn mapping(&self) -> SnapshotMapping {
        self.mapping
    }

    /// Refresh the position index from storage. Returns the number of spots.
    pub async fn sync(&self) -> DomainResult<usize> {
        let ids: Vec<i32> = self
            .repos
            .spots()
            .list_spots()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let count = ids.len();
        *self.positions.write().await = Some(ids);
        info!("Position index synced: {} spot(s)", count);
        Ok(count)
    }

    /// Drop the position index so the next snapshot resyncs.
    ///
    /// Called whenever a spot is added or removed.
    pub async fn invalidate(&self) {
        if self.positions.write().await.take().is_some() {
            debug!("Position index invalidated");
        }
    }

    /// Apply one snapshot, best effort.
    ///
    /// Each entry is an independent write; a failing entry is recorded in
    /// the report and the remaining entries are still applied. Only a
    /// failure to build the position index is returned as an error.
    pub async fn apply_snapshot(&self, snapshot: &OccupancySnapshot) -> DomainResult<ReconcileReport> {
        let positions = match self.mapping {
            SnapshotMapping::Position => Some(self.positions().await?),
            SnapshotMapping::SpotId => None,
        };

        let mut report = ReconcileReport::default();
        for entry in &snapshot.spaces {
            let spot_id = match self.resolve(entry, positions.as_deref()) {
                Ok(id) => id,
                Err(reason) => {
                    debug!("Snapshot entry {} skipped: {}", entry.id, reason);
                    report.failed.push(FailedEntry {
                        index: entry.id,
                        reason,
                    });
                    continue;
                }
            };

            let is_reserved = entry.status.is_occupied();
            match self.repos.spots().set_reserved(spot_id, is_reserved).await {
                Ok(true) => report.applied.push(AppliedEntry {
                    index: entry.id,
                    spot_id,
                    is_reserved,
                }),
                Ok(false) => report.failed.push(FailedEntry {
                    index: entry.id,
                    reason: format!("Parking spot {} no longer exists", spot_id),
                }),
                Err(e) => {
                    warn!("Snapshot entry {} (spot {}) failed: {}", entry.id, spot_id, e);
                    report.failed.push(FailedEntry {
                        index: entry.id,
                        reason: failure_reason(&e),
                    });
                }
            }
        }

        metrics::counter!("occupancy_entries_applied_total").increment(report.applied.len() as u64);
        metrics::counter!("occupancy_entries_failed_total").increment(report.failed.len() as u64);
        info!(
            "Snapshot applied: {} updated, {} failed",
            report.applied.len(),
            report.failed.len()
        );

        self.event_bus.publish(Event::SpacesUpdated(SpacesUpdatedEvent {
            spaces: snapshot.spaces.clone(),
            failed: report.failed_indices(),
            timestamp: Utc::now(),
        }));

        Ok(report)
    }

    async fn positions(&self) -> DomainResult<Vec<i32>> {
        if let Some(ids) = self.positions.read().await.as_ref() {
            return Ok(ids.clone());
        }
        self.sync().await?;
        Ok(self.positions.read().await.clone().unwrap_or_default())
    }

    fn resolve(&self, entry: &SnapshotEntry, positions: Option<&[i32]>) -> Result<i32, String> {
        match positions {
            Some(ids) => usize::try_from(entry.id)
                .ok()
                .and_then(|i| ids.get(i).copied())
                .ok_or_else(|| format!("No parking spot at position {}", entry.id)),
            None => i32::try_from(entry.id)
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| format!("Invalid parking spot id {}", entry.id)),
        }
    }
}

/// Storage details stay in the logs.
fn failure_reason(err: &DomainError) -> String {
    match err {
        DomainError::Storage { operation, .. } => format!("Storage failure during {}", operation),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::occupancy::OccupancyStatus;
    use crate::infrastructure::database::test_support::memory_pool;
    use crate::infrastructure::database::SeaOrmRepositoryProvider;
    use crate::notifications::create_event_bus;

    async fn setup(spots: usize) -> (Arc<dyn RepositoryProvider>, SharedEventBus) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(
            memory_pool(2).await,
            Duration::from_secs(5),
        ));
        for i in 0..spots {
            repos.spots().add_spot(&[i as f64, 0.0], false).await.unwrap();
        }
        (repos, create_event_bus())
    }

    fn snapshot(entries: &[(i64, OccupancyStatus)]) -> OccupancySnapshot {
        OccupancySnapshot {
            spaces: entries
                .iter()
                .map(|&(id, status)| SnapshotEntry { id, status })
                .collect(),
        }
    }

    #[tokio::test]
    async fn unknown_position_does_not_block_others() {
        let (repos, bus) = setup(2).await;
        let reconciler = AvailabilityReconciler::new(repos.clone(), bus);

        let report = reconciler
            .apply_snapshot(&snapshot(&[
                (0, OccupancyStatus::Occupied),
                (99, OccupancyStatus::Free),
            ]))
            .await
            .unwrap();

        assert_eq!(
            report.applied,
            vec![AppliedEntry {
                index: 0,
                spot_id: 1,
                is_reserved: true
            }]
        );
        assert_eq!(report.failed_indices(), vec![99]);

        let spots = repos.spots().list_spots().await.unwrap();
        assert!(spots[0].is_reserved);
        assert!(!spots[1].is_reserved);
    }

    #[tokio::test]
    async fn free_status_clears_flag() {
        let (repos, bus) = setup(1).await;
        repos.spots().set_reserved(1, true).await.unwrap();
        let reconciler = AvailabilityReconciler::new(repos.clone(), bus);

        let report = reconciler
            .apply_snapshot(&snapshot(&[(0, OccupancyStatus::Free), (-1, OccupancyStatus::Free)]))
            .await
            .unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.failed_indices(), vec![-1]);
        assert!(!repos.spots().find_spot(1).await.unwrap().unwrap().is_reserved);
    }

    #[tokio::test]
    async fn spot_id_mapping_uses_storage_ids() {
        let (repos, bus) = setup(3).await;
        repos.spots().delete_spot(1).await.unwrap();
        let reconciler =
            AvailabilityReconciler::new(repos.clone(), bus).with_mapping(SnapshotMapping::SpotId);

        let report = reconciler
            .apply_snapshot(&snapshot(&[
                (3, OccupancyStatus::Occupied),
                (1, OccupancyStatus::Occupied),
                (0, OccupancyStatus::Occupied),
            ]))
            .await
            .unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].spot_id, 3);
        assert_eq!(report.failed_indices(), vec![1, 0]);
    }

    #[tokio::test]
    async fn stale_index_fails_entry_until_resync() {
        let (repos, bus) = setup(2).await;
        let reconciler = AvailabilityReconciler::new(repos.clone(), bus);
        assert_eq!(reconciler.sync().await.unwrap(), 2);

        repos.spots().delete_spot(1).await.unwrap();
        let occupied = snapshot(&[(0, OccupancyStatus::Occupied)]);

        let report = reconciler.apply_snapshot(&occupied).await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.failed_indices(), vec![0]);

        reconciler.sync().await.unwrap();
        let report = reconciler.apply_snapshot(&occupied).await.unwrap();
        assert_eq!(report.applied[0].spot_id, 2);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn spot_added_after_snapshot_is_reachable_once_invalidated() {
        let (repos, bus) = setup(1).await;
        let reconciler = AvailabilityReconciler::new(repos.clone(), bus);

        let report = reconciler
            .apply_snapshot(&snapshot(&[(0, OccupancyStatus::Occupied)]))
            .await
            .unwrap();
        assert!(report.is_complete());

        let added = repos.spots().add_spot(&[5.0, 5.0], false).await.unwrap();
        reconciler.invalidate().await;

        let report = reconciler
            .apply_snapshot(&snapshot(&[(1, OccupancyStatus::Occupied)]))
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.applied[0].spot_id, added);
        assert!(repos.spots().find_spot(added).await.unwrap().unwrap().is_reserved);
    }

    #[tokio::test]
    async fn publishes_spaces_updated() {
        let (repos, bus) = setup(1).await;
        let mut subscriber = bus.subscribe();
        let reconciler = AvailabilityReconciler::new(repos, bus);

        reconciler
            .apply_snapshot(&snapshot(&[(0, OccupancyStatus::Occupied), (5, OccupancyStatus::Free)]))
            .await
            .unwrap();

        let msg = tokio::time::timeout(Duration::from_millis(200), subscriber.recv())
            .await
            .unwrap()
            .unwrap();
        match msg.event {
            Event::SpacesUpdated(e) => {
                assert_eq!(e.spaces.len(), 2);
                assert_eq!(e.failed, vec![5]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_snapshot_is_a_no_op() {
        let (repos, bus) = setup(0).await;
        let reconciler = AvailabilityReconciler::new(repos, bus);
        let report = reconciler.apply_snapshot(&OccupancySnapshot::default()).await.unwrap();
        assert!(report.applied.is_empty() && report.is_complete());
    }
}
