// src/registry/client.rs

//! HTTP client for hosted registries
//!
//! A thin wrapper around the reqwest blocking client. Requests time out
//! after 30 seconds and are never retried. Static hosts commonly answer
//! unknown paths with an HTML page and status 200, so JSON endpoints reject
//! HTML bodies explicitly.

use crate::archive::MAX_ARCHIVE_SIZE;
use crate::error::{Error, Result};
use crate::manifest::{Manifest, ARCHIVE_FILE_NAME, MANIFEST_FILE_NAME};
use crate::progress::ProgressTracker;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::index::{RegistryIndex, INDEX_FILE_NAME};
use super::source::RegistrySource;
use super::store::{Health, HEALTH_FILE_NAME};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Whether a response body is an HTML page rather than the expected payload
pub fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        return true;
    }
    let head: String = body.trim_start().chars().take(16).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out after {}s", HTTP_TIMEOUT.as_secs())
    } else {
        err.to_string()
    }
}

/// Registry served over HTTP(S)
pub struct HttpRegistry {
    base: Url,
    client: Client,
    max_archive_size: u64,
}

impl HttpRegistry {
    /// Create a client for the registry at `base`
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base)
            .map_err(|e| Error::ConfigError(format!("Invalid registry URL {}: {}", base, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("wpsyde/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base,
            client,
            max_archive_size: MAX_ARCHIVE_SIZE,
        })
    }

    /// Refuse archives larger than `limit` bytes
    pub fn with_max_archive_size(mut self, limit: u64) -> Self {
        self.max_archive_size = limit;
        self
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::InvalidInput(format!("Bad registry path {}: {}", path, e)))
    }

    fn component_url(&self, name: &str, version: &str, file: &str) -> Result<Url> {
        crate::component::validate_name(name)?;
        crate::component::validate_version(version)?;
        self.url(&format!("components/{}/{}/{}", name, version, file))
    }

    /// GET a JSON document; any failure is `RegistryUnavailable`
    fn get_json_text(&self, url: &Url) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| {
                Error::RegistryUnavailable(format!("{}: {}", url, describe_send_error(&e)))
            })?;

        if response.status() != StatusCode::OK {
            return Err(Error::RegistryUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .map_err(|e| Error::RegistryUnavailable(format!("Failed to read {}: {}", url, e)))?;

        if looks_like_html(content_type.as_deref(), &body) {
            return Err(Error::RegistryUnavailable(format!(
                "{} returned an HTML page instead of JSON",
                url
            )));
        }
        Ok(body)
    }

    /// Stream an archive body into memory with progress
    fn read_archive_body(
        &self,
        mut response: Response,
        url: &Url,
        progress: &dyn ProgressTracker,
    ) -> Result<Vec<u8>> {
        let total = response.content_length().unwrap_or(0);
        if total > self.max_archive_size {
            return Err(Error::DownloadFailed(format!(
                "{} announces {} bytes, limit is {}",
                url, total, self.max_archive_size
            )));
        }
        progress.set_length(total);

        // Content-Length is only a hint; the streamed size is checked too
        let mut bytes = Vec::with_capacity(total.min(STREAM_BUFFER_SIZE as u64 * 16) as usize);
        let mut buffer = [0u8; STREAM_BUFFER_SIZE];
        loop {
            let n = response
                .read(&mut buffer)
                .map_err(|e| Error::DownloadFailed(format!("Failed to read {}: {}", url, e)))?;
            if n == 0 {
                break;
            }
            if (bytes.len() + n) as u64 > self.max_archive_size {
                return Err(Error::DownloadFailed(format!(
                    "{} is larger than the {} byte limit",
                    url, self.max_archive_size
                )));
            }
            bytes.extend_from_slice(&buffer[..n]);
            progress.set_position(bytes.len() as u64);
        }
        Ok(bytes)
    }
}

impl RegistrySource for HttpRegistry {
    fn location(&self) -> String {
        self.base.to_string()
    }

    fn fetch_index(&self) -> Result<RegistryIndex> {
        let url = self.url(INDEX_FILE_NAME)?;
        let body = self.get_json_text(&url)?;
        let index = RegistryIndex::from_json(&body)
            .map_err(|e| Error::RegistryUnavailable(format!("{}: {}", url, e)))?;
        info!("Fetched index with {} components from {}", index.len(), self.base);
        Ok(index)
    }

    fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest> {
        let url = self.component_url(name, version, MANIFEST_FILE_NAME)?;
        let body = self.get_json_text(&url)?;
        Manifest::from_json(&body)
    }

    fn fetch_archive(
        &self,
        name: &str,
        version: &str,
        progress: &dyn ProgressTracker,
    ) -> Result<Vec<u8>> {
        let url = self.component_url(name, version, ARCHIVE_FILE_NAME)?;
        info!("Downloading {}", url);
        progress.set_message(&format!("{}@{}", name, version));

        let result = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::DownloadFailed(format!("{}: {}", url, describe_send_error(&e))))
            .and_then(|response| {
                if response.status() != StatusCode::OK {
                    return Err(Error::DownloadFailed(format!(
                        "HTTP {} from {}",
                        response.status(),
                        url
                    )));
                }
                self.read_archive_body(response, &url, progress)
            });

        match &result {
            Ok(bytes) => {
                debug!("Downloaded {} bytes from {}", bytes.len(), url);
                progress.finish_with_message("done");
            }
            Err(e) => progress.finish_with_error(&e.to_string()),
        }
        result
    }

    fn fetch_health(&self) -> Result<Health> {
        let url = self.url(HEALTH_FILE_NAME)?;
        let body = self.get_json_text(&url)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::RegistryUnavailable(format!("{}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::build_archive;
    use crate::component::ComponentSource;
    use crate::manifest::ManifestBuilder;
    use crate::progress::SilentProgress;
    use httpmock::prelude::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    /// Answer a single request with a canned raw response, then hang up
    fn serve_raw_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(&response);
                let _ = stream.flush();
            }
        });
        format!("http://{}", addr)
    }

    fn button() -> (Manifest, Vec<u8>) {
        let source =
            ComponentSource::from_files("Button", vec![("component.php", b"<?php".to_vec())])
                .unwrap();
        let mut manifest = ManifestBuilder::new(&source, "1.0.0").build().unwrap();
        let archive = build_archive(&manifest, &source).unwrap();
        manifest.attach_archive(&archive.integrity);
        (manifest, archive.bytes)
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html(None, "<!DOCTYPE html><html></html>"));
        assert!(looks_like_html(None, "  \n<html lang=\"en\">"));
        assert!(looks_like_html(Some("text/html; charset=utf-8"), "{}"));
        assert!(!looks_like_html(Some("application/json"), "{\"components\":{}}"));
    }

    #[test]
    fn test_fetch_index() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/index.json");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"components":{"Button":{"latest":"1.0.0","versions":["1.0.0"]}}}"#);
        });

        let registry = HttpRegistry::new(&server.base_url()).unwrap();
        let index = registry.fetch_index().unwrap();
        mock.assert();
        assert_eq!(index.get("Button").unwrap().latest, "1.0.0");
    }

    #[test]
    fn test_html_instead_of_json_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/index.json");
            then.status(200).body("<!doctype html><title>Not Found</title>");
        });

        let registry = HttpRegistry::new(&server.base_url()).unwrap();
        assert!(matches!(
            registry.fetch_index(),
            Err(Error::RegistryUnavailable(ref m)) if m.contains("HTML")
        ));
    }

    #[test]
    fn test_non_200_index_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/index.json");
            then.status(503);
        });

        let registry = HttpRegistry::new(&server.base_url()).unwrap();
        assert!(matches!(
            registry.fetch_index(),
            Err(Error::RegistryUnavailable(ref m)) if m.contains("503")
        ));
    }

    #[test]
    fn test_fetch_manifest_and_archive() {
        let (manifest, bytes) = button();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/components/Button/1.0.0/manifest.json");
            then.status(200).body(manifest.to_json_pretty().unwrap());
        });
        server.mock(|when, then| {
            when.method(GET).path("/components/Button/1.0.0/component.zip");
            then.status(200)
                .header("content-type", "application/zip")
                .body(bytes.clone());
        });

        let registry = HttpRegistry::new(&server.base_url()).unwrap();
        assert_eq!(registry.fetch_manifest("Button", "1.0.0").unwrap(), manifest);

        let progress = SilentProgress::new();
        let downloaded = registry.fetch_archive("Button", "1.0.0", &progress).unwrap();
        assert_eq!(downloaded, bytes);
        assert_eq!(progress.position(), bytes.len() as u64);
        assert!(progress.is_finished());
    }

    #[test]
    fn test_archive_404_is_download_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/components/Button/2.0.0/component.zip");
            then.status(404);
        });

        let registry = HttpRegistry::new(&server.base_url()).unwrap();
        let progress = SilentProgress::new();
        assert!(matches!(
            registry.fetch_archive("Button", "2.0.0", &progress),
            Err(Error::DownloadFailed(ref m)) if m.contains("404")
        ));
        assert!(progress.is_finished());
    }

    #[test]
    fn test_huge_content_length_is_download_failure() {
        let base = serve_raw_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 9223372036854775807\r\n\r\nabc".to_vec(),
        );

        let registry = HttpRegistry::new(&base).unwrap();
        let progress = SilentProgress::new();
        assert!(matches!(
            registry.fetch_archive("Button", "1.0.0", &progress),
            Err(Error::DownloadFailed(_))
        ));
        assert!(progress.is_finished());
    }

    #[test]
    fn test_streamed_body_over_limit_is_download_failure() {
        let mut response = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(&[b'x'; 64]);
        let base = serve_raw_once(response);

        let registry = HttpRegistry::new(&base).unwrap().with_max_archive_size(16);
        let progress = SilentProgress::new();
        assert!(matches!(
            registry.fetch_archive("Button", "1.0.0", &progress),
            Err(Error::DownloadFailed(ref m)) if m.contains("limit")
        ));
    }

    #[test]
    fn test_connection_refused_is_download_failure() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let registry = HttpRegistry::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        let progress = SilentProgress::new();
        assert!(matches!(
            registry.fetch_archive("Button", "1.0.0", &progress),
            Err(Error::DownloadFailed(_))
        ));
        assert!(progress.is_finished());
    }

    #[test]
    fn test_base_path_is_preserved() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/registry/health.json");
            then.status(200).body(r#"{"status":"ok","ts":"2025-01-01T00:00:00Z"}"#);
        });

        let registry = HttpRegistry::new(&server.url("/registry")).unwrap();
        assert!(registry.fetch_health().unwrap().is_ok());
    }

    #[test]
    fn test_invalid_name_never_hits_network() {
        let registry = HttpRegistry::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            registry.fetch_manifest("../../etc", "1.0.0"),
            Err(Error::InvalidInput(_))
        ));
    }
}
