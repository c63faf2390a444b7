//! Storefront configuration: catalog endpoint, paging and cache policy.
//!
//! Defaults mirror the public DummyJSON catalog. Every value can be set with
//! a `with_*` builder method or read from `STOREFRONT_*` environment
//! variables via [`StorefrontConfig::from_env`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheOptions;

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorefrontConfig {
    pub catalog_url: String,
    pub request_timeout: Duration,
    pub page_size: u64,
    pub stale_time: Duration,
    pub search_stale_time: Duration,
    pub categories_stale_time: Duration,
    pub gc_time: Duration,
    pub retries: u32,
    pub bind_addr: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            page_size: 20,
            stale_time: Duration::from_secs(60),
            search_stale_time: Duration::from_secs(30),
            categories_stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(5 * 60),
            retries: 1,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl StorefrontConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, size: u64) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_stale_time(mut self, stale: Duration) -> Self {
        self.stale_time = stale;
        self
    }

    pub fn with_gc_time(mut self, gc: Duration) -> Self {
        self.gc_time = gc;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`; unset variables keep their defaults.
    ///
    /// Recognized names: `STOREFRONT_CATALOG_URL`, `STOREFRONT_TIMEOUT_MS`,
    /// `STOREFRONT_PAGE_SIZE`, `STOREFRONT_STALE_SECS`,
    /// `STOREFRONT_SEARCH_STALE_SECS`, `STOREFRONT_CATEGORIES_STALE_SECS`,
    /// `STOREFRONT_GC_SECS`, `STOREFRONT_RETRIES`, `STOREFRONT_BIND`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("STOREFRONT_CATALOG_URL") {
            config.catalog_url = url;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STOREFRONT_TIMEOUT_MS")? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(size) = parse_var(&lookup, "STOREFRONT_PAGE_SIZE")? {
            config.page_size = size;
        }
        if let Some(secs) = parse_var(&lookup, "STOREFRONT_STALE_SECS")? {
            config.stale_time = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "STOREFRONT_SEARCH_STALE_SECS")? {
            config.search_stale_time = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "STOREFRONT_CATEGORIES_STALE_SECS")? {
            config.categories_stale_time = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "STOREFRONT_GC_SECS")? {
            config.gc_time = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var(&lookup, "STOREFRONT_RETRIES")? {
            config.retries = retries;
        }
        if let Some(addr) = lookup("STOREFRONT_BIND") {
            config.bind_addr = addr;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be greater than zero".into(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "request_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        reqwest::Url::parse(&self.catalog_url).map_err(|e| ConfigError::Invalid {
            field: "catalog_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::default()
            .with_stale_time(self.stale_time)
            .with_gc_time(self.gc_time)
            .with_retries(self.retries)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Parse {
                var: name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unparsable value.
    Parse {
        var: &'static str,
        value: String,
        reason: String,
    },
    /// A setting is out of range.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { var, value, reason } => {
                write!(f, "invalid value {:?} for {}: {}", value, var, reason)
            }
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid configuration for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
