//! Management API

use std::sync::Arc;

use crate::config::CloudConfig;
use crate::network::{NetworkAdapter, NetworkError, RequestParam, RequestParams, Transfer};
use crate::results::{self, RenameResult};
use crate::uploader::{api_url, sign_request, Signature};
use crate::url::{DeliveryType, ResourceType};

/// Options of a rename request
#[derive(Debug, Clone, Default)]
pub struct RenameParams {
    pub resource_type: ResourceType,
    pub delivery_type: Option<DeliveryType>,
    pub invalidate: Option<bool>,
    pub signature: Option<Signature>,
}

#[derive(Clone)]
pub struct ManagementApi {
    config: Arc<CloudConfig>,
    network: Arc<dyn NetworkAdapter>,
}

impl ManagementApi {
    pub fn new(config: Arc<CloudConfig>, network: Arc<dyn NetworkAdapter>) -> Self {
        Self { config, network }
    }

    fn prepare_rename(
        &self,
        from_public_id: &str,
        to_public_id: &str,
        overwrite: bool,
        options: &RenameParams,
    ) -> Result<(String, RequestParams), NetworkError> {
        if from_public_id.is_empty() || to_public_id.is_empty() {
            return Err(NetworkError::InvalidRequest(
                "rename requires both public ids".to_string(),
            ));
        }

        let mut params = RequestParams::new();
        params.insert("from_public_id".to_string(), from_public_id.into());
        params.insert("to_public_id".to_string(), to_public_id.into());
        params.insert("overwrite".to_string(), RequestParam::Flag(overwrite));
        if let Some(invalidate) = options.invalidate {
            params.insert("invalidate".to_string(), RequestParam::Flag(invalidate));
        }
        if let Some(delivery_type) = &options.delivery_type {
            params.insert("type".to_string(), delivery_type.as_str().into());
        }
        sign_request(&self.config, &mut params, options.signature.as_ref())?;

        Ok((api_url(&self.config, &options.resource_type, "rename"), params))
    }

    /// Rename an asset
    pub fn rename(&self, from_public_id: &str, to_public_id: &str, overwrite: bool) -> Transfer<RenameResult> {
        self.rename_with(from_public_id, to_public_id, overwrite, RenameParams::default())
    }

    pub fn rename_with(
        &self,
        from_public_id: &str,
        to_public_id: &str,
        overwrite: bool,
        options: RenameParams,
    ) -> Transfer<RenameResult> {
        let (url, params) = match self.prepare_rename(from_public_id, to_public_id, overwrite, &options) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(error = %e, "Rename rejected");
                return Transfer::completed(Err(e));
            }
        };

        let network = self.network.clone();
        Transfer::spawn(None, move |ctx| async move {
            let json = network.request(&url, &[], &params, &ctx).await?;
            results::from_json(json)
        })
    }
}
