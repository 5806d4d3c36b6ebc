use crate::IndexError;
use serde_json::Value;
use std::io::Read;

/// Base URL of the public PyPI JSON API.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// Blocking client for a PyPI-compatible JSON index.
///
/// Expects the standard JSON API layout:
/// - `GET /<module>/json`           — latest-release metadata document
/// - `GET /<module>/<version>/json` — version-specific metadata document
pub struct Client {
    base_url: String,
    agent: ureq::Agent,
}

impl Client {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_INDEX_URL)
    }

    /// Point the client at a different index, e.g. a local mirror.
    pub fn with_base_url(url: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_owned(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    fn module_url(&self, name: &str) -> String {
        format!("{}/{name}/json", self.base_url)
    }

    fn version_url(&self, name: &str, version: &str) -> String {
        format!("{}/{name}/{version}/json", self.base_url)
    }

    /// Fetch the metadata document for `name`.
    ///
    /// With a `version`, the plain document is fetched first to check that the
    /// version exists under `releases`, then the version-specific document is
    /// fetched. Both fetches go through the same code path; a 404 on either
    /// maps to [`IndexError::ModuleNotFound`].
    pub fn fetch_module(&self, name: &str, version: Option<&str>) -> Result<Value, IndexError> {
        let doc = self.fetch_json(&self.module_url(name), name)?;
        let Some(version) = version else {
            return Ok(doc);
        };

        let releases = doc
            .get("releases")
            .ok_or_else(|| IndexError::Malformed("releases".to_owned()))?;
        if releases.get(version).is_none() {
            return Err(IndexError::VersionNotFound {
                module: name.to_owned(),
                version: version.to_owned(),
            });
        }
        self.fetch_json(&self.version_url(name, version), name)
    }

    fn fetch_json(&self, url: &str, module: &str) -> Result<Value, IndexError> {
        tracing::debug!("GET {url}");
        let resp = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(IndexError::ModuleNotFound(module.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(IndexError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(IndexError::Http(e.to_string()));
            }
        };
        let reader = resp.into_body().into_reader();
        Ok(serde_json::from_reader(reader)?)
    }

    /// Open the source archive at `url` as a forward-only byte stream.
    ///
    /// The stream is the raw response body; callers must not seek it.
    pub fn open_source(&self, url: &str) -> Result<Box<dyn Read>, IndexError> {
        tracing::debug!("GET {url}");
        match self.agent.get(url).call() {
            Ok(resp) => Ok(Box::new(resp.into_body().into_reader())),
            Err(ureq::Error::StatusCode(code)) => {
                Err(IndexError::Http(format!("HTTP {code} for {url}")))
            }
            Err(e) => Err(IndexError::Http(e.to_string())),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
