//! Core engine for pypkgbuild: module metadata resolution, source-archive
//! classification, and PKGBUILD assembly.
//!
//! The pipeline is: an index metadata document goes through [`resolve_module`]
//! to produce an immutable [`ModuleRecord`] (inspecting the source archive for
//! a license file and a PEP 517 marker when asked to), the requested runtime
//! mode and per-variant overrides are validated into a [`VariantSet`], and
//! [`Packager`] renders both into the final PKGBUILD text.

pub mod archive;
pub mod license;
pub mod pkgbuild;
pub mod resolve;
pub mod variant;

pub use archive::{file_listing, supports_pep517, ArchiveFormat};
pub use license::{classify_license, find_license_path, LicenseCatalog};
pub use pkgbuild::{Maintainer, Packager, PackagerOptions};
pub use resolve::{resolve_module, InspectOptions, ModuleRecord, SourceOpener};
pub use variant::{PyVariant, RuntimeMode, SplitVariant, VariantOverrides, VariantSet};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The index document lacks a key the resolver requires. Soft failure:
    /// the remote data is wrong, not the invocation.
    #[error("missing key '{key}'")]
    MalformedMetadata { key: String },
    /// Contradictory caller-supplied options. Hard failure.
    #[error("{0}")]
    Config(String),
}
