use crate::archive::{self, ArchiveFormat};
use crate::license::{classify_license, find_license_path, LicenseCatalog};
use crate::CoreError;
use pypkgbuild_index::IndexError;
use serde_json::Value;
use std::io::Read;
use tracing::warn;

/// Canonical module record resolved from an index metadata document.
///
/// Immutable once resolved; read-only input to variant derivation and
/// PKGBUILD assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Module name as published on the index.
    pub module: String,
    /// Lowercase identifier used to derive package names.
    pub name: String,
    pub version: String,
    pub description: String,
    pub homepage: String,
    /// Resolved license identifier (catalog id, `custom:<text>`, or `unknown`).
    pub license: String,
    /// Selected source-archive URL; empty when the release has no files.
    pub source_url: String,
    /// SHA-256 of the selected source archive; empty when unavailable.
    pub sha256: String,
    /// License file path relative to the unpacked source folder, if located.
    pub license_path: Option<String>,
    /// Whether the source tree supports the isolated PEP 517 workflow.
    pub pep517: bool,
}

/// Which source-archive inspections to perform during resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectOptions {
    pub find_license: bool,
    pub detect_pep517: bool,
}

impl InspectOptions {
    fn wants_listing(self) -> bool {
        self.find_license || self.detect_pep517
    }
}

/// Opens a readable byte stream for a source-archive URL.
pub trait SourceOpener {
    fn open(&self, url: &str) -> Result<Box<dyn Read>, IndexError>;
}

impl SourceOpener for pypkgbuild_index::Client {
    fn open(&self, url: &str) -> Result<Box<dyn Read>, IndexError> {
        self.open_source(url)
    }
}

/// Build a [`ModuleRecord`] from a raw index metadata document.
///
/// When any inspection is requested the source archive is fetched once and its
/// listing reused for both the license search and the PEP 517 check; a failed
/// fetch is not retried and degrades both to their absent results.
pub fn resolve_module(
    doc: &Value,
    catalog: &LicenseCatalog,
    inspect: InspectOptions,
    source: &dyn SourceOpener,
) -> Result<ModuleRecord, CoreError> {
    let info = require(doc, "info")?;
    let module = require_str(info, "name")?;
    let name = module.to_lowercase();
    let version = require_str(info, "version")?;
    let description = require_text(info, "summary")?;
    let homepage = require_text(info, "home_page")?;

    let license_field = info.get("license").and_then(Value::as_str).unwrap_or("");
    let classifiers: Vec<String> = info
        .get("classifiers")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    let license = classify_license(catalog, license_field, &classifiers);

    let urls = require(doc, "urls")?
        .as_array()
        .ok_or_else(|| CoreError::MalformedMetadata {
            key: "urls".to_owned(),
        })?;
    let (source_url, sha256) = select_source(urls);

    let mut license_path = None;
    let mut pep517 = false;
    if inspect.wants_listing() {
        match fetch_listing(&source_url, source) {
            Some(listing) => {
                if inspect.find_license {
                    license_path = find_license_path(&listing);
                    if license_path.is_none() {
                        warn!("could not find a license file in the source archive");
                    }
                }
                if inspect.detect_pep517 {
                    pep517 = archive::supports_pep517(&listing);
                }
            }
            None if inspect.detect_pep517 => {
                warn!("no source listing; assuming the module does not support PEP 517 builds");
            }
            None => {}
        }
    }

    Ok(ModuleRecord {
        module,
        name,
        version,
        description,
        homepage,
        license,
        source_url,
        sha256,
        license_path,
        pep517,
    })
}

/// Pick the distribution file to build from, in fixed preference order:
/// first source tarball, else first non-wheel, else the first file at all.
fn select_source(urls: &[Value]) -> (String, String) {
    if urls.is_empty() {
        warn!("package source not found; add it manually and regenerate the checksum");
        return (String::new(), String::new());
    }

    let url_of = |entry: &Value| -> String {
        entry
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_owned()
    };
    let preferences: [fn(&str) -> bool; 2] = [
        |url| url.ends_with(".tar.gz"),
        |url| !url.ends_with(".whl"),
    ];
    let chosen = preferences
        .iter()
        .find_map(|pref| urls.iter().find(|entry| pref(&url_of(entry))))
        .unwrap_or(&urls[0]);

    let sha256 = chosen
        .get("digests")
        .and_then(|digests| digests.get("sha256"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned();
    (url_of(chosen), sha256)
}

/// Fetch and list the source archive. Every failure mode degrades to `None`
/// with a warning; callers treat that as "no listing", never as a hard error.
fn fetch_listing(url: &str, source: &dyn SourceOpener) -> Option<Vec<String>> {
    if url.is_empty() {
        warn!("source url is empty; skipping archive inspection");
        return None;
    }
    let Some(format) = ArchiveFormat::from_url(url) else {
        warn!("source url '{url}' does not have a tar or zip extension");
        return None;
    };
    let reader = match source.open(url) {
        Ok(reader) => reader,
        Err(e) => {
            warn!("could not retrieve source archive from {url}: {e}");
            return None;
        }
    };
    match archive::file_listing(format, reader) {
        Ok(listing) => Some(listing),
        Err(e) => {
            warn!("could not read source archive from {url}: {e}");
            None
        }
    }
}

fn require<'a>(doc: &'a Value, key: &str) -> Result<&'a Value, CoreError> {
    doc.get(key).ok_or_else(|| CoreError::MalformedMetadata {
        key: key.to_owned(),
    })
}

fn require_str(obj: &Value, key: &str) -> Result<String, CoreError> {
    require(obj, key)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| CoreError::MalformedMetadata {
            key: key.to_owned(),
        })
}

/// Like [`require_str`], but a JSON `null` value is treated as present and
/// empty — the index routinely nulls out `summary` and `home_page`.
fn require_text(obj: &Value, key: &str) -> Result<String, CoreError> {
    match require(obj, key)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        _ => Err(CoreError::MalformedMetadata {
            key: key.to_owned(),
        }),
    }
}
