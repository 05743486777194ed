//! Query builder and paginated result feed.
//!
//! The engine and the rendering surface are passed per call; the session
//! itself is plain state and can be driven without either.

mod engine;
mod query_builder;
mod scroll;
mod session;

pub use engine::*;
pub use query_builder::*;
pub use scroll::*;
pub use session::*;

use crate::config::Config;
use crate::errors::AppError;
use crate::sync::DatasetSynchronizer;

/// Ensure a fresh dataset, hand it to the engine and open a feed session
/// paging by the configured page size.
pub async fn start_session<E: SearchEngine>(
    synchronizer: &DatasetSynchronizer,
    engine: &mut E,
    config: &Config,
) -> Result<FeedSession, AppError> {
    let dataset = synchronizer.ensure_fresh_dataset().await?;
    tracing::info!("Initializing search engine with {} bytes", dataset.len());
    engine.initialize(dataset)?;
    Ok(FeedSession::new(config.page_size))
}
