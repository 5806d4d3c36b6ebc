use std::fs;
use std::path::Path;
use tracing::warn;

/// System catalog of recognized license identifiers, one per line.
pub const KNOWN_LICENSES_PATH: &str = "/usr/share/licenses/known_spdx_license_identifiers.txt";

/// Ordered catalog of recognized license identifiers.
///
/// Matching is case-insensitive and ignores a trailing `" license"` suffix on
/// either side, but a hit always reports the catalog's own spelling.
#[derive(Debug, Clone, Default)]
pub struct LicenseCatalog {
    identifiers: Vec<String>,
}

impl LicenseCatalog {
    /// Load the catalog shipped with the packaging tools. An unreadable
    /// catalog degrades to an empty one: classification then falls back to
    /// `custom:`/`unknown` results.
    pub fn load_system() -> Self {
        Self::load_from(Path::new(KNOWN_LICENSES_PATH))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_lines(text.lines()),
            Err(e) => {
                warn!("cannot read license catalog {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            identifiers: lines
                .into_iter()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// First identifier equal to `text` under normalization.
    fn match_exact(&self, text: &str) -> Option<&str> {
        let needle = normalize(text);
        self.identifiers
            .iter()
            .find(|id| normalize(id) == needle)
            .map(String::as_str)
    }

    /// First identifier contained in `text` under normalization.
    fn match_within(&self, text: &str) -> Option<&str> {
        let haystack = normalize(text);
        self.identifiers
            .iter()
            .find(|id| haystack.contains(&normalize(id)))
            .map(String::as_str)
    }
}

fn normalize(s: &str) -> String {
    let lower = s.trim().to_lowercase();
    match lower.strip_suffix(" license") {
        Some(stripped) => stripped.to_owned(),
        None => lower,
    }
}

/// Resolve the PKGBUILD `license` value from the free-text metadata field and
/// the trove classifier strings.
///
/// Priority order: exact match on the free-text field; else the tail of the
/// first `License`-prefixed classifier (text after the last `::`), matched by
/// substring against the catalog; else `custom:<tail>`; with no classifier at
/// all, `unknown`.
pub fn classify_license(
    catalog: &LicenseCatalog,
    license_field: &str,
    classifiers: &[String],
) -> String {
    if !license_field.trim().is_empty() {
        if let Some(id) = catalog.match_exact(license_field) {
            return id.to_owned();
        }
    }

    let Some(classifier) = classifiers.iter().find(|c| c.starts_with("License")) else {
        return "unknown".to_owned();
    };
    let tail = classifier
        .rsplit("::")
        .next()
        .unwrap_or(classifier)
        .trim();

    match catalog.match_within(tail) {
        Some(id) => id.to_owned(),
        None => format!("custom:{tail}"),
    }
}

/// Locate the best-candidate license file in an archive listing.
///
/// A candidate's final path segment is `LICENSE` or `LICENSES` (any case),
/// optionally with a `.txt`, `.rst`, or `.md` extension. Candidates closer to
/// the archive root win; equal depths keep the listing order. The returned
/// path is relative to the unpacked top-level source folder (leading archive
/// segment stripped).
pub fn find_license_path(listing: &[String]) -> Option<String> {
    let mut ordered: Vec<&String> = listing.iter().collect();
    ordered.sort_by_key(|path| depth(path));
    ordered
        .into_iter()
        .find(|path| is_license_file(file_name(path)))
        .map(|path| strip_root_segment(path))
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_license_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let stem = lower
        .strip_suffix(".txt")
        .or_else(|| lower.strip_suffix(".rst"))
        .or_else(|| lower.strip_suffix(".md"))
        .unwrap_or(&lower);
    stem == "license" || stem == "licenses"
}

fn strip_root_segment(path: &str) -> String {
    match path.split_once('/') {
        Some((_, rest)) => rest.to_owned(),
        None => path.to_owned(),
    }
}
