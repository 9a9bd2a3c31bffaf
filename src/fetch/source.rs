use async_trait::async_trait;

use crate::error::FetchError;

use super::labels::SwitchLabel;

/// Remote source of the ticker values and the product labels.
///
/// Each call runs in its own spawned task; the coordinator stops waiting
/// after its budget but never cancels the call.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    async fn fetch_price(&self) -> Result<u64, FetchError>;

    async fn fetch_block_height(&self) -> Result<u64, FetchError>;

    /// Product names keyed by switch output.
    async fn fetch_labels(&self) -> Result<Vec<SwitchLabel>, FetchError>;
}
