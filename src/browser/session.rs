use std::sync::Arc;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, Version};
use url::Url;

use super::cookies::CookieJar;
use crate::error::{ReplayError, Result};

/// The most recent successful response: the session's notion of the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    /// The URL the response was fetched from.
    pub url: Url,
    pub status: u16,
    /// Header names lowercased, repeated headers kept in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl PageState {
    pub fn new(url: Url, status: u16, headers: Vec<(String, String)>, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body: body.into(),
        }
    }

    /// First value of a response header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Full textual representation, used for response dumps.
    pub fn dump(&self) -> String {
        let mut out = format!("{} {}\n", self.status, self.url);
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\n", name, value));
        }
        out.push('\n');
        out.push_str(&self.body);
        out
    }
}

/// Whether a fetch replaces the whole page or navigates into a named frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    TopLevel,
    Frame(String),
}

/// Issues requests, carries cookies between them, and owns the current page.
///
/// The session never follows redirects on its own; see [`super::redirect`].
pub struct HttpSession {
    client: reqwest::Client,
    cookies: Arc<CookieJar>,
    page: Option<PageState>,
    active_frame: String,
    dump_responses: bool,
}

impl HttpSession {
    pub fn new(user_agent: &str) -> Result<Self> {
        let cookies = Arc::new(CookieJar::new());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| ReplayError::Transport {
                url: String::new(),
                message: format!("cannot build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            cookies,
            page: None,
            active_frame: String::new(),
            dump_responses: false,
        })
    }

    /// Log every response in full after it is received.
    pub fn set_dump_responses(&mut self, on: bool) {
        self.dump_responses = on;
    }

    pub fn page(&self) -> Option<&PageState> {
        self.page.as_ref()
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|p| &p.url)
    }

    /// Name of the frame last navigated into; empty after a top-level navigation.
    pub fn active_frame(&self) -> &str {
        &self.active_frame
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Replace the session's cookies; the client keeps sending from the same jar.
    pub fn set_cookies(&mut self, jar: CookieJar) {
        self.cookies.replace(jar);
    }

    /// Install a page without fetching it, as if a top-level navigation returned it.
    pub fn load_page(&mut self, page: PageState) {
        self.page = Some(page);
        self.active_frame.clear();
    }

    /// Forget the current page, frame and cookies.
    pub fn reset(&mut self) {
        self.page = None;
        self.active_frame.clear();
        self.cookies.clear();
    }

    /// Issue one request over HTTP/1.0 and make the response the current page.
    ///
    /// 4xx and 5xx answers are failures and leave the current page untouched. 3xx answers
    /// succeed and become the current page so the redirect resolver can inspect them.
    pub async fn fetch(
        &mut self,
        method: Method,
        url: Url,
        body: Option<String>,
        scope: FetchScope,
    ) -> Result<&PageState> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url.clone())
            .version(Version::HTTP_10);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(CONTENT_LENGTH, body.len())
                .body(body);
        }

        let transport = |e: reqwest::Error| ReplayError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(transport)?;

        if status.is_client_error() || status.is_server_error() {
            return Err(ReplayError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let page = PageState::new(url, status.as_u16(), headers, body);
        if self.dump_responses {
            tracing::debug!("Response:\n{}", page.dump());
        }
        match scope {
            FetchScope::TopLevel => self.active_frame.clear(),
            FetchScope::Frame(name) => self.active_frame = name,
        }
        Ok(self.page.insert(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageState {
        PageState::new(
            Url::parse("http://example.com/").unwrap(),
            200,
            vec![("Content-Type".into(), "text/html".into())],
            "<title>x</title>",
        )
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let page = page();
        assert_eq!(page.header("content-type"), Some("text/html"));
        assert_eq!(page.header("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(page.header("location"), None);
    }

    #[test]
    fn test_dump_contains_status_headers_and_body() {
        let dump = page().dump();
        assert!(dump.starts_with("200 http://example.com/"));
        assert!(dump.contains("content-type: text/html"));
        assert!(dump.ends_with("<title>x</title>"));
    }

    #[test]
    fn test_load_page_resets_frame() {
        let mut session = HttpSession::new("test").unwrap();
        session.active_frame = "main".into();
        session.load_page(page());
        assert_eq!(session.active_frame(), "");
        assert_eq!(session.current_url().unwrap().as_str(), "http://example.com/");
    }
}
