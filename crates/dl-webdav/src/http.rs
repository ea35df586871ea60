//! `HttpWebDavClient`: the production `WebDavClient` over `reqwest`.

use async_trait::async_trait;
use futures::StreamExt;
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;

use crate::client::{ByteStream, DavEntry, DavStat, EntryKind, WebDavClient};
use crate::config::DavConfig;
use crate::error::{DavError, DavResult};
use crate::multistatus::{self, PropResponse};

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
    <D:getcontentlength/>
    <D:getlastmodified/>
  </D:prop>
</D:propfind>"#;

/// WebDAV client bound to one log root.
pub struct HttpWebDavClient {
    client: reqwest::Client,
    config: DavConfig,
    /// Path component of `config.base_url`, without trailing slash.
    base_path: String,
}

impl HttpWebDavClient {
    pub fn new(config: DavConfig) -> DavResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_path = config.url_for("")?.path().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            config,
            base_path,
        })
    }

    pub fn config(&self) -> &DavConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> DavResult<RequestBuilder> {
        let builder = self.client.request(method, self.config.url_for(path)?);
        Ok(match &self.config.username {
            Some(user) => builder.basic_auth(user, self.config.password.as_deref()),
            None => builder,
        })
    }

    async fn propfind(&self, path: &str, depth: &str) -> DavResult<Vec<PropResponse>> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| DavError::Other(format!("invalid method: {e}")))?;
        let response = self
            .request(method, path)?
            .header("Depth", depth)
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY)
            .send()
            .await?;
        let response = check_status(response, path, &[StatusCode::MULTI_STATUS])?;
        let body = response.text().await?;
        multistatus::parse(&body)
    }

    /// Decoded path of an href relative to the log root, without
    /// surrounding slashes.
    fn relative_path(&self, href: &str) -> String {
        let path = multistatus::href_path(href);
        let relative = path.strip_prefix(&self.base_path).unwrap_or(&path).trim_matches('/');
        percent_decode_str(relative).decode_utf8_lossy().into_owned()
    }
}

#[async_trait]
impl WebDavClient for HttpWebDavClient {
    async fn list_directory(&self, path: &str) -> DavResult<Vec<DavEntry>> {
        let dir = path.trim_matches('/');
        let request_path = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let responses = self.propfind(&request_path, "1").await?;

        let entries: Vec<DavEntry> = responses
            .into_iter()
            .filter_map(|r| {
                let relative = self.relative_path(&r.href);
                if relative == dir {
                    return None;
                }
                let basename = relative.rsplit('/').next().unwrap_or_default().to_string();
                if basename.is_empty() {
                    return None;
                }
                Some(DavEntry {
                    kind: if r.is_collection {
                        EntryKind::Directory
                    } else {
                        EntryKind::File
                    },
                    basename,
                    path: relative,
                    size: r.content_length,
                    lastmod: r.last_modified,
                })
            })
            .collect();

        tracing::debug!(path = %dir, entries = entries.len(), "directory listed");
        Ok(entries)
    }

    async fn stat(&self, path: &str) -> DavResult<DavStat> {
        let responses = self.propfind(path, "0").await?;
        let first = responses
            .into_iter()
            .next()
            .ok_or_else(|| DavError::Parse(format!("empty stat response for {path}")))?;
        Ok(DavStat {
            size: first.content_length,
            lastmod: first.last_modified,
        })
    }

    async fn get_text(&self, path: &str) -> DavResult<String> {
        let response = self.request(Method::GET, path)?.send().await?;
        let response = check_status(response, path, &[StatusCode::OK])?;
        Ok(response.text().await?)
    }

    async fn get_range(&self, path: &str, start: u64, end: u64) -> DavResult<ByteStream> {
        let response = self
            .request(Method::GET, path)?
            .header(RANGE, format!("bytes={start}-{end}"))
            .send()
            .await?;
        // A 200 means the server ignored the range; treat it as a failed range read.
        let response = check_status(response, path, &[StatusCode::PARTIAL_CONTENT])?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DavError::Stream(e.to_string())));
        Ok(Box::pin(stream))
    }
}

fn check_status(response: Response, path: &str, expected: &[StatusCode]) -> DavResult<Response> {
    let status = response.status();
    if expected.contains(&status) {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(DavError::NotFound(path.to_string()));
    }
    Err(DavError::Status {
        status: status.as_u16(),
        path: path.to_string(),
    })
}
