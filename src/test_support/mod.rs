//! Test utilities and mocks for unit tests.
//!
//! This module provides stand-ins for the pipeline's external collaborators:
//! the network ([`MockHttpClient`]), the build system ([`FakeBuildSystem`])
//! and arbitrary fetch strategies ([`FnStrategy`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use isyntax_natives::test_support::{MockHttpClient, MockHttpResponse};
//!
//! #[test]
//! fn test_example() {
//!     let http = Arc::new(MockHttpClient::new());
//!     http.mock_url("https://example.com/a.zip", MockHttpResponse::not_found());
//!
//!     // Hand `http.clone()` to an ArchiveDownload...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{bail, Result};
use url::Url;

use crate::builder::cmake::BuildSystem;
use crate::sources::{FetchStrategy, HttpClient};
use crate::util::errors::ProvisionError;

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockHttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockHttpResponse {
    /// Create a successful response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        MockHttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    /// Create a not found response.
    pub fn not_found() -> Self {
        MockHttpResponse {
            status: 404,
            body: b"Not Found".to_vec(),
        }
    }

    /// Create a server error response.
    pub fn server_error(message: &str) -> Self {
        MockHttpResponse {
            status: 500,
            body: message.as_bytes().to_vec(),
        }
    }

    /// Check if this is a successful response.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Default)]
struct MockHttpState {
    responses: HashMap<String, MockHttpResponse>,
    requests: Vec<String>,
    default_response: Option<MockHttpResponse>,
}

/// Mock HTTP client with canned responses per URL.
///
/// Every request is recorded, so tests can assert on fallback order.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    state: Mutex<MockHttpState>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        MockHttpClient::default()
    }

    /// Add a response for a URL.
    pub fn mock_url(&self, url: &str, response: MockHttpResponse) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(url.to_string(), response);
        self
    }

    /// Set a default response for unmatched URLs.
    pub fn set_default(&self, response: MockHttpResponse) -> &Self {
        self.state.lock().unwrap().default_response = Some(response);
        self
    }

    /// Get all requested URLs, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    fn get(&self, url: &str) -> Result<MockHttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(url.to_string());

        if let Some(response) = state.responses.get(url) {
            return Ok(response.clone());
        }

        if let Some(ref default) = state.default_response {
            return Ok(default.clone());
        }

        bail!("no mock response for URL: {}", url)
    }
}

impl HttpClient for MockHttpClient {
    fn download(&self, url: &Url, writer: &mut dyn Write) -> Result<u64> {
        let response = self.get(url.as_str())?;
        if !response.is_success() {
            bail!("HTTP {}", response.status);
        }
        writer.write_all(&response.body)?;
        Ok(response.body.len() as u64)
    }
}

/// Build system that records its invocations instead of running CMake.
///
/// `build` writes the configured artifact into the build directory, the way
/// a real build would leave a library behind.
#[derive(Debug, Default)]
pub struct FakeBuildSystem {
    artifact: Option<String>,
    fail_build: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeBuildSystem {
    pub fn new() -> Self {
        FakeBuildSystem::default()
    }

    /// Write this path (relative to the build directory) on each build.
    pub fn producing(mut self, relative: &str) -> Self {
        self.artifact = Some(relative.to_string());
        self
    }

    /// Make the build step exit with a failure.
    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    /// Recorded calls, e.g. `configure -DCMAKE_BUILD_TYPE=Release ...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, step: &str, args: &[String]) {
        let mut line = step.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);
    }
}

impl BuildSystem for FakeBuildSystem {
    fn name(&self) -> &str {
        "fake"
    }

    fn configure(&self, _source: &Path, build_dir: &Path, args: &[String]) -> Result<()> {
        self.record("configure", args);
        std::fs::create_dir_all(build_dir)?;
        Ok(())
    }

    fn build(&self, build_dir: &Path, args: &[String]) -> Result<()> {
        self.record("build", args);

        if self.fail_build {
            return Err(ProvisionError::BuildFailed {
                step: "fake build".to_string(),
                code: Some(1),
                stderr: "error: simulated failure".to_string(),
            }
            .into());
        }

        if let Some(relative) = &self.artifact {
            let path = build_dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, b"\x7fELF fake shared object")?;
        }
        Ok(())
    }
}

/// Fetch strategy backed by a closure.
pub struct FnStrategy<F> {
    name: String,
    fetch: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&Path) -> Result<()>,
{
    pub fn new(name: &str, fetch: F) -> Self {
        FnStrategy {
            name: name.to_string(),
            fetch,
        }
    }
}

impl<F> FetchStrategy for FnStrategy<F>
where
    F: Fn(&Path) -> Result<()>,
{
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn requires_network(&self) -> bool {
        false
    }

    fn fetch(&self, dest: &Path) -> Result<()> {
        (self.fetch)(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_http_client() {
        let client = MockHttpClient::new();
        client.mock_url("https://example.com/a.zip", MockHttpResponse::ok("data"));

        let url = Url::parse("https://example.com/a.zip").unwrap();
        let mut body = Vec::<u8>::new();
        let n = client.download(&url, &mut body).unwrap();
        assert_eq!(n, 4);
        assert_eq!(body, b"data");

        let missing = Url::parse("https://example.com/b.zip").unwrap();
        assert!(client.download(&missing, &mut Vec::<u8>::new()).is_err());

        assert_eq!(client.requests().len(), 2);
    }

    #[test]
    fn test_mock_http_error_status() {
        let client = MockHttpClient::new();
        client.set_default(MockHttpResponse::not_found());

        let url = Url::parse("https://example.com/x.zip").unwrap();
        let err = client.download(&url, &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn test_fake_build_system() {
        let tmp = tempfile::TempDir::new().unwrap();
        let fake = FakeBuildSystem::new().producing("lib/libisyntax.so");

        fake.configure(tmp.path(), &tmp.path().join("b"), &["-DX=1".to_string()])
            .unwrap();
        fake.build(&tmp.path().join("b"), &[]).unwrap();

        assert!(tmp.path().join("b/lib/libisyntax.so").exists());
        assert_eq!(fake.calls(), vec!["configure -DX=1", "build"]);
    }
}
