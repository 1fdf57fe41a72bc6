//! Resource Locator: resolves named datasets against the data context.
//!
//! ```text
//! (datasource name, asset name) → get_datasource → get_asset → build_batch_request
//! ```
//!
//! Nothing is cached; each call reads the context afresh so dynamic
//! partitioning ("latest batch") is always current.

use std::sync::Arc;
use tracing::debug;

use inspect_domain::{BatchRequest, DataAssetName, DatasetId, DatasourceName};

use crate::error::{ActionError, ExecResult, ResourceLookup};
use crate::ports::{ContextError, DataContextPort};

/// A dataset located in the data context, ready for computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDataset {
    /// Stable identifier of the asset
    pub dataset_id: DatasetId,
    /// Request describing the current slice of data
    pub batch_request: BatchRequest,
}

/// Resolves `(datasource, asset)` names into a dataset handle.
pub struct ResourceLocator<C: DataContextPort> {
    context: Arc<C>,
}

impl<C: DataContextPort> ResourceLocator<C> {
    /// Create a locator over a shared data context.
    pub fn new(context: Arc<C>) -> Self {
        Self { context }
    }

    /// Resolve a dataset and build a request for its current data.
    ///
    /// # Errors
    ///
    /// - `ResourceNotFound` if the datasource or asset is not registered
    /// - `ResourceResolution` for any backend failure along the way
    pub async fn resolve(
        &self,
        datasource_name: &DatasourceName,
        data_asset_name: &DataAssetName,
    ) -> ExecResult<ResolvedDataset> {
        let datasource = self
            .context
            .get_datasource(datasource_name)
            .await
            .map_err(map_context_error)?;

        let asset = self
            .context
            .get_asset(&datasource, data_asset_name)
            .await
            .map_err(map_context_error)?;

        let batch_request = self
            .context
            .build_batch_request(&asset)
            .await
            .map_err(map_context_error)?;

        debug!(
            datasource = %datasource_name,
            data_asset = %data_asset_name,
            dataset_id = %asset.id,
            batch_id = batch_request.batch_id().unwrap_or("*"),
            "Resolved dataset"
        );

        Ok(ResolvedDataset {
            dataset_id: asset.id,
            batch_request,
        })
    }
}

fn map_context_error(err: ContextError) -> ActionError {
    match err {
        ContextError::DatasourceNotFound(name) => {
            ActionError::not_found(ResourceLookup::Datasource, name)
        },
        ContextError::AssetNotFound { asset, .. } => {
            ActionError::not_found(ResourceLookup::DataAsset, asset)
        },
        ContextError::Backend(message) => ActionError::ResourceResolution(message),
    }
}

// =============================================================================
// Tests
// =============================================================================
