//! Shared test harness for E2E integration tests.
//!
//! Stands up a `wiremock` server that answers PROPFIND listings and stats,
//! full GETs and ranged GETs the way a commerce instance's WebDAV log root
//! does, so the real `HttpWebDavClient` is exercised end to end.

#![allow(dead_code)]

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use dl_webdav::{DavConfig, HttpWebDavClient};

/// Path prefix of the log root on the mock server.
pub const ROOT: &str = "/on/demandware.servlet/webdav/Sites/Logs";

/// Default modification time in listings.
pub const LASTMOD: &str = "Mon, 15 Jan 2024 12:00:00 GMT";

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Name as it appears in the href (already URL-encoded).
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub lastmod: String,
}

impl Entry {
    pub fn file(name: &str, size: u64, lastmod: &str) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
            lastmod: lastmod.into(),
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
            lastmod: LASTMOD.into(),
        }
    }
}

/// Build a 207 multistatus body; `dir` is the listed collection itself.
pub fn multistatus(dir: &str, entries: &[Entry]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><multistatus xmlns="DAV:">"#,
    );
    let self_href = collection_href(dir);
    push_response(&mut body, &self_href, true, None, LASTMOD);
    for entry in entries {
        let href = if entry.is_dir {
            format!("{self_href}{}/", entry.name)
        } else {
            format!("{self_href}{}", entry.name)
        };
        push_response(&mut body, &href, entry.is_dir, entry.size, &entry.lastmod);
    }
    body.push_str("</multistatus>");
    body
}

fn push_response(body: &mut String, href: &str, is_dir: bool, size: Option<u64>, lastmod: &str) {
    body.push_str("<response><href>");
    body.push_str(href);
    body.push_str("</href><propstat><prop>");
    if is_dir {
        body.push_str("<resourcetype><collection/></resourcetype>");
    } else {
        body.push_str("<resourcetype/>");
    }
    if let Some(size) = size {
        body.push_str(&format!("<getcontentlength>{size}</getcontentlength>"));
    }
    body.push_str(&format!("<getlastmodified>{lastmod}</getlastmodified>"));
    body.push_str("</prop><status>HTTP/1.1 200 OK</status></propstat></response>");
}

fn collection_href(dir: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        format!("{ROOT}/")
    } else {
        format!("{ROOT}/{dir}/")
    }
}

/// Serves a file body, honoring `Range: bytes=a-b` with a 206.
struct RangeResponder {
    content: Vec<u8>,
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let range = request
            .headers
            .get("Range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("bytes="))
            .and_then(|v| v.split_once('-'))
            .and_then(|(a, b)| Some((a.parse::<usize>().ok()?, b.parse::<usize>().ok()?)));

        match range {
            None => ResponseTemplate::new(200).set_body_bytes(self.content.clone()),
            Some((start, _)) if start >= self.content.len() => ResponseTemplate::new(416),
            Some((start, end)) => {
                let end = end.min(self.content.len() - 1);
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {start}-{end}/{}", self.content.len()).as_str(),
                    )
                    .set_body_bytes(self.content[start..=end].to_vec())
            }
        }
    }
}

/// A mock WebDAV log root.
pub struct DavFixture {
    pub server: MockServer,
}

impl DavFixture {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}{ROOT}", self.server.uri())
    }

    pub fn client(&self) -> HttpWebDavClient {
        HttpWebDavClient::new(DavConfig::new(self.base_url())).unwrap()
    }

    /// Answer `PROPFIND Depth: 1` on `dir` with `entries`.
    pub async fn directory(&self, dir: &str, entries: &[Entry]) {
        Mock::given(method("PROPFIND"))
            .and(path(collection_href(dir)))
            .and(header("Depth", "1"))
            .respond_with(ResponseTemplate::new(207).set_body_string(multistatus(dir, entries)))
            .mount(&self.server)
            .await;
    }

    /// Serve a file: stat via `PROPFIND Depth: 0`, full and ranged GET.
    pub async fn file(&self, file_path: &str, content: impl Into<Vec<u8>>) {
        let content = content.into();
        let href = format!("{ROOT}/{}", file_path.trim_start_matches('/'));
        let stat = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><multistatus xmlns="DAV:"><response><href>{href}</href><propstat><prop><resourcetype/><getcontentlength>{}</getcontentlength><getlastmodified>{LASTMOD}</getlastmodified></prop><status>HTTP/1.1 200 OK</status></propstat></response></multistatus>"#,
            content.len()
        );

        Mock::given(method("PROPFIND"))
            .and(path(href.clone()))
            .and(header("Depth", "0"))
            .respond_with(ResponseTemplate::new(207).set_body_string(stat))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(href))
            .respond_with(RangeResponder { content })
            .mount(&self.server)
            .await;
    }

    /// Make every `method` request on `url_path` (relative to the root) fail
    /// with `status`, ahead of any other mock.
    pub async fn fail(&self, http_method: &str, url_path: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(format!("{ROOT}/{}", url_path.trim_start_matches('/'))))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Number of received requests carrying a `Range` header.
    pub async fn ranged_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.headers.contains_key("Range"))
            .count()
    }
}
