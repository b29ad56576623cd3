//! HTTP downloads.
//!
//! Archive strategies talk to the network through [`HttpClient`] so the
//! fallback chain can be exercised against canned responses.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// Minimal blocking HTTP interface.
pub trait HttpClient: Send + Sync {
    /// GET `url` and stream the body into `writer`.
    ///
    /// Any non-2xx status or stream error is a failure. Returns the number
    /// of bytes written.
    fn download(&self, url: &Url, writer: &mut dyn Write) -> Result<u64>;
}

/// [`HttpClient`] backed by `reqwest`'s blocking client.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    progress: bool,
}

impl ReqwestClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("isyntax-natives/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        Ok(ReqwestClient {
            client,
            progress: false,
        })
    }

    /// Show a download progress bar on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, url: &Url, len: Option<u64>) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }

        let name = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or("archive")
            .to_string();

        let pb = match len {
            Some(len) => {
                let pb = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}") {
                    pb.set_style(style);
                }
                pb
            }
        };
        pb.set_message(name);
        Some(pb)
    }
}

impl HttpClient for ReqwestClient {
    fn download(&self, url: &Url, writer: &mut dyn Write) -> Result<u64> {
        tracing::debug!("GET {}", url);

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .with_context(|| format!("failed to request {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {}", status);
        }

        let copied = match self.progress_bar(url, response.content_length()) {
            Some(pb) => {
                let mut tracked = pb.wrap_write(writer);
                let n = response.copy_to(&mut tracked);
                pb.finish_and_clear();
                n
            }
            None => response.copy_to(writer),
        };

        copied.with_context(|| format!("failed to read response body from {}", url))
    }
}
