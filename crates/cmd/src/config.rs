// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line configuration shared by every command

use anyhow::{Context, Result};
use bucketfs::BucketFs;
use clap::Args;
use object_store::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Environment variable naming the default bucket
pub const BUCKET_ENV: &str = "BUCKETFS_BUCKET";

/// Environment variable prefixes forwarded to the object store builders
const STORE_ENV_PREFIXES: [&str; 3] = ["GOOGLE_", "AWS_", "AZURE_"];

/// Options selecting the bucket and how to reach it
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Bucket name to use (Google Cloud Storage), or a store URL such as
    /// gs://bucket, s3://bucket, file:///path or memory://
    #[arg(short, long, env = BUCKET_ENV)]
    pub bucket: String,

    /// Disables authentication. Useful to access public buckets
    #[arg(short, long)]
    pub without_authentication: bool,

    /// Only expose objects below this path of the bucket
    #[arg(long)]
    pub prefix: Option<String>,

    /// Deadline for bucket requests, e.g. "30s" or "2m"
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    parse_duration::parse(value).map_err(|e| format!("invalid duration '{value}': {e}"))
}

impl Config {
    /// A configuration for `bucket` with every other option unset
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            without_authentication: false,
            prefix: None,
            timeout: None,
        }
    }

    /// Store URL for the bucket; a bare name means Google Cloud Storage
    pub fn store_url(&self) -> Result<Url> {
        let url = if self.bucket.contains("://") {
            self.bucket.clone()
        } else {
            format!("gs://{}", self.bucket)
        };
        Url::parse(&url).with_context(|| format!("Invalid bucket '{}'", self.bucket))
    }

    /// Builder options from the environment, plus anonymous access when requested
    fn store_options(&self) -> Vec<(String, String)> {
        let mut options: Vec<(String, String)> = std::env::vars()
            .filter(|(key, _)| STORE_ENV_PREFIXES.iter().any(|p| key.starts_with(p)))
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();

        if self.without_authentication {
            options.push(("skip_signature".to_string(), "true".to_string()));
        }
        options
    }

    /// Object store for the bucket and the key prefix named by the URL path
    pub fn build_object_store(&self) -> Result<(Arc<dyn ObjectStore>, String)> {
        let url = self.store_url()?;
        let (store, base) = object_store::parse_url_opts(&url, self.store_options())
            .with_context(|| format!("Failed to open bucket '{url}'"))?;

        let url = url.as_str();
        diagnostics::info!("Opened bucket {url}", url: url);
        Ok((Arc::from(store), base.to_string()))
    }

    /// The filesystem view every command runs against
    pub fn open_fs(&self) -> Result<BucketFs> {
        let (store, base) = self.build_object_store()?;
        self.view(store, &base)
    }

    /// Scope a store to the URL path and `--prefix`
    pub fn view(&self, store: Arc<dyn ObjectStore>, base: &str) -> Result<BucketFs> {
        let mut fs = BucketFs::from_object_store(store);
        for part in [Some(base), self.prefix.as_deref()].into_iter().flatten() {
            let part = bucketfs::path::trim_separators(part);
            if !part.is_empty() {
                fs = fs
                    .sub(part)
                    .with_context(|| format!("Invalid prefix '{part}'"))?;
            }
        }
        Ok(fs)
    }

    /// Apply `--timeout` to a view, starting the clock now
    #[must_use]
    pub fn with_deadline(&self, fs: BucketFs) -> BucketFs {
        match self.timeout {
            Some(timeout) => fs.with_timeout(timeout),
            None => fs,
        }
    }
}
