use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncResponse {
    /// Spots in the refreshed position index
    pub spots: usize,
}
