use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{MutexGuard, PoisonError};

use cookie_store::{CookieStore, RawCookie};
use reqwest::cookie::CookieStore as _;
use reqwest::header::HeaderValue;
use reqwest_cookie_store::CookieStoreMutex;
use url::Url;

use crate::error::{ReplayError, Result};

/// Cookies collected across the requests of one session.
///
/// Installed as the HTTP client's cookie provider, so every response's `Set-Cookie`
/// headers are stored (error statuses included) and every request carries the
/// matching `Cookie` header. Persists as the `cookie_store` JSON document.
#[derive(Default)]
pub struct CookieJar {
    store: CookieStoreMutex,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a jar from disk. A missing file is an empty jar; expired cookies are dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(ReplayError::CookieStore(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let store = cookie_store::serde::json::load(BufReader::new(file)).map_err(|e| {
            ReplayError::CookieStore(format!("malformed {}: {}", path.display(), e))
        })?;
        Ok(Self {
            store: CookieStoreMutex::new(store),
        })
    }

    /// Write the jar to disk, session cookies included.
    pub fn save(&self, path: &Path) -> Result<()> {
        File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                cookie_store::serde::json::save_incl_expired_and_nonpersistent(
                    &self.lock(),
                    &mut writer,
                )
                .map_err(|e| e.to_string())?;
                writer.flush().map_err(|e| e.to_string())
            })
            .map_err(|e| {
                ReplayError::CookieStore(format!("cannot write {}: {}", path.display(), e))
            })
    }

    /// Take over the cookies of `other`, dropping the current ones.
    pub fn replace(&self, other: CookieJar) {
        let incoming = std::mem::take(&mut *other.lock());
        *self.lock() = incoming;
    }

    /// Record one `Set-Cookie` header received from `url`.
    pub fn store(&self, url: &Url, header: &str) {
        if let Ok(value) = HeaderValue::from_str(header) {
            self.set_cookies(&mut std::iter::once(&value), url);
        }
    }

    /// The `Cookie` header value for a request to `url`, if any cookie applies.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        self.cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Value of the first unexpired cookie called `name`.
    pub fn value(&self, name: &str) -> Option<String> {
        self.lock()
            .iter_unexpired()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, CookieStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl reqwest::cookie::CookieStore for CookieJar {
    fn set_cookies(&self, headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut accepted = headers.filter(|header| {
            let rejected = names_top_level_domain(header, url);
            if rejected {
                tracing::debug!("Ignoring Set-Cookie for a top-level domain from {}", url);
            }
            !rejected
        });
        self.store.set_cookies(&mut accepted, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.store.cookies(url)
    }
}

/// True when the header's `Domain` attribute is a bare top-level label (`Domain=com`)
/// that is not the request host itself.
fn names_top_level_domain(header: &HeaderValue, url: &Url) -> bool {
    let Some(domain) = header
        .to_str()
        .ok()
        .and_then(|text| RawCookie::parse(text).ok())
        .and_then(|cookie| cookie.domain().map(str::to_ascii_lowercase))
    else {
        return false;
    };
    let domain = domain.trim_start_matches('.');
    !domain.is_empty()
        && !domain.contains('.')
        && url.host_str().is_some_and(|host| !host.eq_ignore_ascii_case(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_store_and_send_back() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/login"), "sid=abc123; Path=/; HttpOnly");
        assert_eq!(jar.header_for(&url("http://example.com/account")), Some("sid=abc123".into()));
        assert_eq!(jar.value("sid").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_host_only_cookie_not_sent_to_subdomain() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "a=1");
        assert!(jar.header_for(&url("http://www.example.com/")).is_none());
    }

    #[test]
    fn test_domain_cookie_sent_to_subdomain() {
        let jar = CookieJar::new();
        jar.store(&url("http://login.example.com/"), "a=1; Domain=.example.com");
        assert_eq!(jar.header_for(&url("http://www.example.com/x")), Some("a=1".into()));
        assert!(jar.header_for(&url("http://badexample.com/")).is_none());
    }

    #[test]
    fn test_foreign_domain_rejected() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "a=1; Domain=other.org");
        assert!(jar.is_empty());
    }

    #[test]
    fn test_top_level_domain_rejected() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "a=1; Domain=com");
        jar.store(&url("http://example.com/"), "b=2; Domain=.COM");
        assert!(jar.is_empty());
        assert!(jar.header_for(&url("http://other.com/")).is_none());
    }

    #[test]
    fn test_single_label_host_may_name_itself() {
        let jar = CookieJar::new();
        jar.store(&url("http://intranet/"), "a=1; Domain=intranet");
        assert_eq!(jar.value("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_default_path_scopes_cookie() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/app/login"), "a=1");
        assert!(jar.header_for(&url("http://example.com/app/home")).is_some());
        assert!(jar.header_for(&url("http://example.com/application")).is_none());
        assert!(jar.header_for(&url("http://example.com/")).is_none());
    }

    #[test]
    fn test_replace_same_cookie() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "a=1; Path=/");
        jar.store(&url("http://example.com/"), "a=2; Path=/");
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.value("a").as_deref(), Some("2"));
    }

    #[test]
    fn test_max_age_zero_deletes() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "a=1; Path=/");
        jar.store(&url("http://example.com/"), "a=; Path=/; Max-Age=0");
        assert!(jar.is_empty());
    }

    #[test]
    fn test_past_expires_deletes() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "a=1; Path=/");
        jar.store(
            &url("http://example.com/"),
            "a=1; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        );
        assert!(jar.is_empty());
    }

    #[test]
    fn test_secure_cookie_only_over_https() {
        let jar = CookieJar::new();
        jar.store(&url("https://example.com/"), "s=1; Secure; Path=/");
        assert!(jar.header_for(&url("http://example.com/")).is_none());
        assert!(jar.header_for(&url("https://example.com/")).is_some());
    }

    #[test]
    fn test_malformed_header_ignored() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "novalue");
        assert!(jar.is_empty());
    }

    #[test]
    fn test_replace_swaps_contents() {
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "old=1");
        let other = CookieJar::new();
        other.store(&url("http://example.com/"), "new=2");
        jar.replace(other);
        assert_eq!(jar.value("old"), None);
        assert_eq!(jar.value("new").as_deref(), Some("2"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let jar = CookieJar::new();
        jar.store(&url("http://example.com/"), "sid=xyz; Path=/; Max-Age=3600");
        jar.store(&url("http://example.com/"), "session=1; Path=/");
        jar.save(&path).unwrap();

        let loaded = CookieJar::load(&path).unwrap();
        assert_eq!(loaded.value("sid").as_deref(), Some("xyz"));
        assert_eq!(loaded.value("session").as_deref(), Some("1"));
        assert!(loaded.header_for(&url("http://example.com/")).is_some());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::load(&dir.path().join("absent.json")).unwrap();
        assert!(jar.is_empty());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(CookieJar::load(&path), Err(ReplayError::CookieStore(_))));
    }
}
