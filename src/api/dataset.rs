//! Dataset status endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::DatasetStatus;
use crate::AppState;

/// GET /api/dataset/status - Locally stored version token and dataset size.
pub async fn get_dataset_status(State(state): State<AppState>) -> ApiResult<DatasetStatus> {
    let (version, dataset_bytes) = state.synchronizer.stored_state().await?;

    success(DatasetStatus {
        version: version.map(|v| v.to_string()),
        dataset_bytes,
    })
}
