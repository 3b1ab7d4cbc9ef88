use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::model::DeviceSummary;

/// Folder the site keeps its JSON files in.
const DATA_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid location: '{location}'")]
    InvalidLocation { location: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load catalog from {location}: {source}")]
    NetworkOrParse {
        location: String,
        #[source]
        source: FetchError,
    },
}

/// Where a JSON resource lives: a remote http(s) URL or a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Remote(reqwest::Url),
    Local(PathBuf),
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FetchError::InvalidLocation {
                location: raw.to_string(),
            });
        }
        if let Some(remote) = parse_remote(raw) {
            return Ok(remote);
        }
        if let Ok(url) = reqwest::Url::parse(raw) {
            if url.scheme() == "file" {
                return url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|_| FetchError::InvalidLocation {
                        location: raw.to_string(),
                    });
            }
        }
        Ok(Self::Local(crate::config::expand_tilde(raw)))
    }

    /// Parses a location meant to be used as a base for relative references.
    pub fn parse_root(raw: &str) -> Result<Self, FetchError> {
        match Self::parse(raw)? {
            Self::Remote(mut url) => {
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                Ok(Self::Remote(url))
            }
            local => Ok(local),
        }
    }

    /// The directory this resource sits in.
    pub fn directory(&self) -> Self {
        match self {
            Self::Remote(url) => Self::Remote(url.join("./").unwrap_or_else(|_| url.clone())),
            Self::Local(path) => Self::Local(
                path.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            ),
        }
    }

    /// The site a catalog belongs to: its directory, or that directory's
    /// parent when the catalog sits in the site's `data/` folder.
    pub fn site_root(&self) -> Self {
        match self.directory() {
            Self::Remote(url) if url.path().ends_with(&format!("/{DATA_DIR}/")) => {
                Self::Remote(url.join("../").unwrap_or(url))
            }
            Self::Local(path) if path.file_name().is_some_and(|name| name == DATA_DIR) => {
                Self::Local(
                    path.parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(".")),
                )
            }
            dir => dir,
        }
    }

    /// Resolves `reference` against this location, treated as a directory.
    pub fn join(&self, reference: &str) -> Result<Self, FetchError> {
        let reference = reference.trim();
        let invalid = || FetchError::InvalidLocation {
            location: reference.to_string(),
        };
        if reference.is_empty() {
            return Err(invalid());
        }
        if let Some(remote) = parse_remote(reference) {
            return Ok(remote);
        }
        match self {
            Self::Remote(base) => base.join(reference).map(Self::Remote).map_err(|_| invalid()),
            Self::Local(base) => {
                let candidate = Path::new(reference);
                if candidate.is_absolute() {
                    Ok(Self::Local(candidate.to_path_buf()))
                } else {
                    Ok(Self::Local(base.join(candidate)))
                }
            }
        }
    }
}

fn parse_remote(raw: &str) -> Option<Location> {
    let url = reqwest::Url::parse(raw).ok()?;
    match url.scheme() {
        "http" | "https" => Some(Location::Remote(url)),
        _ => None,
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads JSON resources from remote or local locations.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch_bytes(&self, location: &Location) -> Result<Vec<u8>, FetchError> {
        match location {
            Location::Remote(url) => {
                tracing::debug!(%url, "fetching remote resource");
                let response = self.client.get(url.clone()).send().await.map_err(|source| {
                    FetchError::Transport {
                        url: url.to_string(),
                        source,
                    }
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                let body = response
                    .bytes()
                    .await
                    .map_err(|source| FetchError::Transport {
                        url: url.to_string(),
                        source,
                    })?;
                Ok(body.to_vec())
            }
            Location::Local(path) => {
                tracing::debug!(path = %path.display(), "reading local resource");
                tokio::fs::read(path).await.map_err(|source| FetchError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        location: &Location,
    ) -> Result<T, FetchError> {
        let bytes = self.fetch_bytes(location).await?;
        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
            location: location.to_string(),
            source,
        })
    }
}

// The site has served both shapes over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogPayload {
    Flat(Vec<DeviceSummary>),
    Wrapped { devices: Vec<DeviceSummary> },
}

impl CatalogPayload {
    fn into_devices(self) -> Vec<DeviceSummary> {
        match self {
            Self::Flat(devices) => devices,
            Self::Wrapped { devices } => devices,
        }
    }
}

/// Snapshot of device summaries, in source order.
#[derive(Clone, Debug)]
pub struct Catalog {
    devices: Vec<DeviceSummary>,
    location: Location,
}

impl Catalog {
    pub fn new(devices: Vec<DeviceSummary>, location: Location) -> Self {
        Self { devices, location }
    }

    /// Decodes either payload shape into a catalog.
    pub fn from_slice(bytes: &[u8], location: Location) -> Result<Self, FetchError> {
        let payload: CatalogPayload =
            serde_json::from_slice(bytes).map_err(|source| FetchError::Decode {
                location: location.to_string(),
                source,
            })?;
        Ok(Self::new(payload.into_devices(), location))
    }

    pub fn devices(&self) -> &[DeviceSummary] {
        &self.devices
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut dupes: Vec<&str> = Vec::new();
        for d in self.devices.iter() {
            if !seen.insert(d.id.as_str()) && !dupes.contains(&d.id.as_str()) {
                dupes.push(d.id.as_str());
            }
        }
        dupes
    }
}

#[derive(Clone, Debug)]
pub struct CatalogLoader {
    fetcher: Fetcher,
    source: Location,
}

impl CatalogLoader {
    pub fn new(fetcher: Fetcher, source: Location) -> Self {
        Self { fetcher, source }
    }

    pub fn source(&self) -> &Location {
        &self.source
    }

    /// Fetches and decodes the catalog once. Failures are not retried.
    pub async fn load(&self) -> Result<Catalog, LoadError> {
        let wrap = |source: FetchError| LoadError::NetworkOrParse {
            location: self.source.to_string(),
            source,
        };
        let bytes = self.fetcher.fetch_bytes(&self.source).await.map_err(wrap)?;
        let catalog = Catalog::from_slice(&bytes, self.source.clone()).map_err(wrap)?;

        let dupes = catalog.duplicate_ids();
        if !dupes.is_empty() {
            tracing::warn!(ids = ?dupes, "catalog contains duplicate device ids, first entry wins");
        }
        tracing::debug!(devices = catalog.len(), source = %self.source, "catalog loaded");
        Ok(catalog)
    }
}
