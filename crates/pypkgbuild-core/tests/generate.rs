//! End-to-end pipeline tests: metadata document in, PKGBUILD text out.

use pypkgbuild_core::{
    resolve_module, InspectOptions, LicenseCatalog, Packager, PackagerOptions, RuntimeMode,
    SourceOpener, VariantOverrides, VariantSet,
};
use pypkgbuild_index::IndexError;
use serde_json::json;
use std::io::Read;

struct NoSource;

impl SourceOpener for NoSource {
    fn open(&self, url: &str) -> Result<Box<dyn Read>, IndexError> {
        Err(IndexError::Http(format!("offline test, no fetch of {url}")))
    }
}

fn requests_doc() -> serde_json::Value {
    json!({
        "info": {
            "name": "requests",
            "version": "2.31.0",
            "summary": "Python HTTP for Humans.",
            "home_page": "https://requests.readthedocs.io",
            "license": "Apache-2.0",
            "classifiers": ["License :: OSI Approved :: Apache Software License"]
        },
        "urls": [
            {
                "url": "https://files.example/requests-2.31.0.tar.gz",
                "digests": {"sha256": "4214a6691bcf4c1a7c4a68d3dfa780bb4a92cd01a5b5012eca3994ca6f5f2082"}
            }
        ]
    })
}

fn generate(mode: RuntimeMode) -> String {
    let catalog = LicenseCatalog::from_lines(["MIT", "Apache-2.0"]);
    let record = resolve_module(
        &requests_doc(),
        &catalog,
        InspectOptions::default(),
        &NoSource,
    )
    .unwrap();
    let variants = VariantSet::build(mode, &record.name, &VariantOverrides::default()).unwrap();
    Packager::new(&record, variants, PackagerOptions::default()).generate()
}

#[test]
fn single_default_variant_generates_one_of_each_block() {
    let out = generate(RuntimeMode::Python);

    let pkgname_lines: Vec<&str> = out
        .lines()
        .filter(|line| line.starts_with("pkgname="))
        .collect();
    assert_eq!(pkgname_lines, vec!["pkgname='python-requests'"]);
    assert_eq!(out.matches("build() {").count(), 1);
    assert_eq!(out.matches("package() {").count(), 1);

    let source_line = out
        .lines()
        .find(|line| line.starts_with("source="))
        .expect("source line");
    assert!(source_line.contains("requests"));
    assert!(source_line.contains("${pkgver}"));
}

#[test]
fn split_render_round_trips_variant_count() {
    let out = generate(RuntimeMode::Multi);

    let names_line = out
        .lines()
        .find(|line| line.starts_with("pkgname=("))
        .expect("pkgname=(...) line");
    let rendered_count = names_line
        .trim_start_matches("pkgname=(")
        .trim_end_matches(')')
        .split_whitespace()
        .count();
    assert_eq!(rendered_count, RuntimeMode::Multi.variants().len());

    assert_eq!(out.matches("prepare() {").count(), 1);
    assert_eq!(out.matches("package_").count(), 2);
}

#[test]
fn exact_license_match_flows_into_header() {
    let out = generate(RuntimeMode::Python);
    assert!(out.contains("license=('Apache-2.0')"));
}

#[test]
fn section_order_is_names_header_build_package() {
    let out = generate(RuntimeMode::Python);
    let pkgname = out.find("pkgname=").unwrap();
    let header = out.find("_module=").unwrap();
    let build = out.find("build() {").unwrap();
    let package = out.find("package() {").unwrap();
    assert!(pkgname < header && header < build && build < package);
}
