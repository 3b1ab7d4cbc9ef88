use std::time::Duration;

use thiserror::Error;

use crate::debounce::{self, Debounced, Debouncer};
use crate::filter::{self, ViewState};
use crate::loader::{Catalog, CatalogLoader, FetchError, Fetcher, LoadError, Location};
use crate::output::{self, CatalogView, DeviceView, RenderOptions};
use crate::resolver::{self, ResolveError, ResolvedDevice, Resolver};

pub const DEFAULT_CATALOG: &str = "./data/devices.json";
pub const DEFAULT_USER_AGENT: &str = concat!("romcatalog/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct Options {
    pub catalog: String,
    pub site_root: Option<String>,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub user_agent: String,
    pub debounce: Duration,
    pub render: RenderOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.to_string(),
            site_root: None,
            timeout_seconds: 10,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            debounce: debounce::DEFAULT_QUIESCENCE,
            render: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid catalog location: {source}")]
    InvalidCatalog {
        #[source]
        source: FetchError,
    },

    #[error("invalid site root: {source}")]
    InvalidSiteRoot {
        #[source]
        source: FetchError,
    },

    #[error("invalid timeout {value}, expected positive integer")]
    InvalidTimeout { value: usize },

    #[error("invalid debounce interval, expected a positive duration")]
    InvalidDebounce,

    #[error("invalid user agent: {value}")]
    InvalidUserAgent { value: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
    fetcher: Fetcher,
    catalog: Location,
    site_root: Option<Location>,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.timeout_seconds == 0 {
            return Err(RunnerError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        if options.debounce.is_zero() {
            return Err(RunnerError::InvalidDebounce);
        }
        let catalog = Location::parse(&options.catalog)
            .map_err(|source| RunnerError::InvalidCatalog { source })?;
        let site_root = options
            .site_root
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(Location::parse_root)
            .transpose()
            .map_err(|source| RunnerError::InvalidSiteRoot { source })?;
        let client = build_http_client(
            options.proxy.as_deref(),
            options.timeout_seconds,
            &options.user_agent,
        )?;
        Ok(Self {
            options,
            fetcher: Fetcher::new(client),
            catalog,
            site_root,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn catalog_location(&self) -> &Location {
        &self.catalog
    }

    pub fn loader(&self) -> CatalogLoader {
        CatalogLoader::new(self.fetcher.clone(), self.catalog.clone())
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.fetcher.clone(), self.site_root.clone())
    }

    pub async fn load_catalog(&self) -> Result<Catalog, LoadError> {
        self.loader().load().await
    }

    /// List page: one catalog load, then the filtered view.
    pub async fn list(&self, view: &ViewState) -> Result<CatalogView, LoadError> {
        let catalog = self.load_catalog().await?;
        Ok(catalog_view(&catalog, view))
    }

    /// Detail page. A missing id fails before the catalog is requested.
    pub async fn resolve(&self, id: Option<&str>) -> Result<ResolvedDevice, ResolveError> {
        let id = resolver::require_id(id)?;
        let catalog = self.load_catalog().await?;
        self.resolver().resolve(Some(id), &catalog).await
    }

    pub async fn device(&self, id: Option<&str>) -> Result<DeviceView, ResolveError> {
        let resolved = self.resolve(id).await?;
        Ok(output::build_device_view(&resolved, &self.options.render))
    }

    /// Loads the catalog and hands it to an interactive list session.
    pub async fn session(&self, initial: ViewState) -> Result<CatalogSession, LoadError> {
        let catalog = self.load_catalog().await?;
        Ok(CatalogSession::new(catalog, initial, self.options.debounce))
    }
}

pub fn catalog_view(catalog: &Catalog, view: &ViewState) -> CatalogView {
    let visible = view.apply(catalog.devices());
    output::build_catalog_view(&visible, view, filter::brands(catalog.devices()))
}

/// A list page's lifetime: the fetched catalog plus its view state.
/// Filter changes apply at once; query input goes through the debouncer.
pub struct CatalogSession {
    catalog: Catalog,
    view: ViewState,
    debouncer: Debouncer<String>,
    debounced: Debounced<String>,
    awaiting: bool,
}

impl CatalogSession {
    pub fn new(catalog: Catalog, view: ViewState, quiescence: Duration) -> Self {
        let (debouncer, debounced) = debounce::debouncer(quiescence);
        Self {
            catalog,
            view,
            debouncer,
            debounced,
            awaiting: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn current(&self) -> CatalogView {
        catalog_view(&self.catalog, &self.view)
    }

    pub fn set_filter(&mut self, filter: &str) -> CatalogView {
        self.view.set_filter(filter);
        self.current()
    }

    /// Records raw search input; the query applies once input goes quiet.
    pub fn input_query(&mut self, raw: &str) {
        self.debouncer.schedule(raw.to_string());
        self.awaiting = true;
    }

    /// True while a query input has not been applied yet.
    pub fn has_pending_query(&self) -> bool {
        self.awaiting
    }

    /// Waits for the surviving query input and returns the recomputed view.
    pub async fn next_recompute(&mut self) -> Option<CatalogView> {
        let query = self.debounced.recv().await?;
        self.awaiting = false;
        self.view.set_query(&query);
        tracing::debug!(query = %self.view.query, "search applied");
        Some(self.current())
    }
}

fn build_http_client(
    proxy: Option<&str>,
    timeout_seconds: usize,
    user_agent: &str,
) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(user_agent).map_err(|_| {
            RunnerError::InvalidUserAgent {
                value: user_agent.to_string(),
            }
        })?,
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}
