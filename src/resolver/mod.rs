use serde::Serialize;
use thiserror::Error;

use crate::loader::{Catalog, FetchError, Fetcher, LoadError, Location};
use crate::model::{DetailPayload, DeviceDetail, DeviceSummary};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no device id was provided")]
    MissingId,

    #[error("device not found: {id}")]
    NotFound { id: String },

    #[error(transparent)]
    Catalog(#[from] LoadError),
}

/// Which record a resolved device was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// The summary has no detail reference and is the full record.
    Summary,
    /// The referenced detail record was fetched.
    Detail,
    /// The detail fetch failed and the summary stands in for it.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedDevice {
    pub record: DeviceDetail,
    pub origin: RecordOrigin,
}

impl ResolvedDevice {
    fn from_summary(summary: &DeviceSummary, origin: RecordOrigin) -> Self {
        Self {
            record: DeviceDetail::from(summary.clone()),
            origin,
        }
    }
}

/// Rejects an absent or blank id. A usable id is returned as given;
/// lookups compare it verbatim.
pub fn require_id(id: Option<&str>) -> Result<&str, ResolveError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ResolveError::MissingId),
    }
}

/// Exact id lookup; the first entry wins when ids repeat.
pub fn lookup<'a>(id: &str, catalog: &'a [DeviceSummary]) -> Result<&'a DeviceSummary, ResolveError> {
    catalog
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| ResolveError::NotFound { id: id.to_string() })
}

#[derive(Clone, Debug)]
pub struct Resolver {
    fetcher: Fetcher,
    site_root: Option<Location>,
}

impl Resolver {
    /// Relative detail references resolve against `site_root`, or against
    /// the site the catalog was served from when none is given.
    pub fn new(fetcher: Fetcher, site_root: Option<Location>) -> Self {
        Self { fetcher, site_root }
    }

    pub async fn resolve(
        &self,
        id: Option<&str>,
        catalog: &Catalog,
    ) -> Result<ResolvedDevice, ResolveError> {
        let id = require_id(id)?;
        let summary = lookup(id, catalog.devices())?;

        let data_file = match summary.data_file.as_deref().map(str::trim) {
            Some(reference) if !reference.is_empty() => reference,
            _ => return Ok(ResolvedDevice::from_summary(summary, RecordOrigin::Summary)),
        };

        match self.fetch_detail(data_file, catalog).await {
            Ok(payload) => Ok(ResolvedDevice {
                record: payload.merge(summary),
                origin: RecordOrigin::Detail,
            }),
            Err(e) => {
                tracing::warn!(device = %id, error = %e, "detail record unavailable, using summary");
                Ok(ResolvedDevice::from_summary(summary, RecordOrigin::Fallback))
            }
        }
    }

    async fn fetch_detail(&self, reference: &str, catalog: &Catalog) -> Result<DetailPayload, FetchError> {
        let root = match self.site_root.as_ref() {
            Some(root) => root.clone(),
            None => catalog.location().site_root(),
        };
        let location = root.join(reference)?;
        self.fetcher.fetch_json::<DetailPayload>(&location).await
    }
}
