use crate::resolve::ModuleRecord;
use crate::variant::{SplitVariant, VariantSet};

/// Maintainer identity for the header comment. Construction implies both
/// fields are present; partial identities are rejected upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
}

/// Global packaging options beyond the variant set.
#[derive(Debug, Clone)]
pub struct PackagerOptions {
    /// Extra runtime dependencies for the whole PKGBUILD.
    pub depends: Vec<String>,
    /// Extra build-time dependencies.
    pub mkdepends: Vec<String>,
    /// Declared build backend, e.g. `setuptools`.
    pub backend: String,
    /// Override for `pkgbase`; defaults to the first variant's package name.
    pub pkgbase: Option<String>,
    pub maintainer: Option<Maintainer>,
}

impl Default for PackagerOptions {
    fn default() -> Self {
        Self {
            depends: Vec::new(),
            mkdepends: Vec::new(),
            backend: "setuptools".to_owned(),
            pkgbase: None,
            maintainer: None,
        }
    }
}

/// Assembles the final PKGBUILD text from a resolved module record and a
/// validated variant set.
///
/// Dependency lists are accumulated once at construction; rendering is a pure
/// function of the finished state.
#[derive(Debug)]
pub struct Packager<'a> {
    module: &'a ModuleRecord,
    variants: VariantSet,
    maintainer: Option<Maintainer>,
    pkgbase: String,
    depends: Vec<String>,
    mkdepends: Vec<String>,
}

impl<'a> Packager<'a> {
    pub fn new(module: &'a ModuleRecord, variants: VariantSet, opts: PackagerOptions) -> Self {
        let pkgbase = opts
            .pkgbase
            .unwrap_or_else(|| variants.entries()[0].pkgname.clone());

        let mut backend_modules = vec![opts.backend];
        if module.pep517 {
            // Arch wiki, Python package guidelines: standards-based builds
            // need the build driver, the installer, and wheel.
            backend_modules.extend(["build", "installer", "wheel"].map(str::to_owned));
        }
        let mut mkdepends = Vec::new();
        for backend_module in &backend_modules {
            for variant in variants.mode().variants() {
                mkdepends.push(format!("python{}-{backend_module}", variant.infix()));
            }
        }
        mkdepends.extend(opts.mkdepends);

        // In single mode the sole variant's dependencies go into the header;
        // in split mode each package_*() declares its own and the header only
        // carries the global extras.
        let mut depends = Vec::new();
        if !variants.is_split() {
            depends.extend(variants.entries()[0].depends.iter().cloned());
        }
        depends.extend(opts.depends);

        Self {
            module,
            variants,
            maintainer: opts.maintainer,
            pkgbase,
            depends,
            mkdepends,
        }
    }

    /// Render the PKGBUILD: maintainer line, name declarations, header,
    /// prepare step (split mode only), build step, one packaging step per
    /// variant.
    pub fn generate(&self) -> String {
        let mut parts = Vec::new();

        if let Some(maintainer) = &self.maintainer {
            parts.push(format!(
                "# Maintainer: {} <{}>\n",
                maintainer.name, maintainer.email
            ));
        }

        parts.push(self.name_block());
        parts.push(self.header_block());
        if self.variants.is_split() {
            parts.push(self.prepare_block());
        }
        parts.push(self.build_block());
        for entry in self.variants.entries() {
            parts.push(self.package_block(entry));
        }

        parts.join("\n")
    }

    fn name_block(&self) -> String {
        let names = quoted_list(&self.variants.pkgnames());
        if self.variants.is_split() {
            format!("pkgbase='{}'\npkgname=({names})\n", self.pkgbase)
        } else {
            format!("pkgname={names}")
        }
    }

    fn header_block(&self) -> String {
        format!(
            "_module='{module}'\n\
             _src_folder='{src_folder}'\n\
             pkgver='{version}'\n\
             pkgrel=1\n\
             pkgdesc=\"{description}\"\n\
             url=\"{homepage}\"\n\
             depends=({depends})\n\
             makedepends=({mkdepends})\n\
             license=('{license}')\n\
             arch=('any')\n\
             source=(\"{source}\")\n\
             sha256sums=('{sha256}')\n",
            module = self.module.module,
            src_folder = self.src_folder(),
            version = self.module.version,
            description = self.module.description,
            homepage = self.module.homepage,
            depends = quoted_list(&self.depends),
            mkdepends = quoted_list(&self.mkdepends),
            license = self.module.license,
            source = self.templated_source(),
            sha256 = self.module.sha256,
        )
    }

    /// Unpacked source folder name: the source filename cut after the first
    /// occurrence of the version, falling back to `<name>-<version>`.
    fn src_folder(&self) -> String {
        let filename = self.module.source_url.rsplit('/').next().unwrap_or("");
        match filename.find(&self.module.version) {
            Some(idx) => filename[..idx + self.module.version.len()].to_owned(),
            None => format!("{}-{}", self.module.name, self.module.version),
        }
    }

    /// Source URL with every occurrence of the version replaced by the
    /// `${pkgver}` placeholder, so version bumps only touch `pkgver`.
    fn templated_source(&self) -> String {
        if self.module.source_url.is_empty() {
            return String::new();
        }
        self.module
            .source_url
            .replace(&self.module.version, "${pkgver}")
    }

    fn prepare_block(&self) -> String {
        let mut lines = vec!["prepare() {".to_owned()];
        for entry in self.variants.entries() {
            if !entry.dir_suffix.is_empty() {
                lines.push(format!(
                    "    cp -a \"${{srcdir}}/${{_src_folder}}\"{{,{}}}",
                    entry.dir_suffix
                ));
            }
        }
        lines.push("}\n".to_owned());
        lines.join("\n")
    }

    fn build_block(&self) -> String {
        let chunks: Vec<String> = self
            .variants
            .entries()
            .iter()
            .map(|entry| {
                let step = if self.module.pep517 {
                    format!("    {} -m build --wheel --no-isolation", entry.variant.tag())
                } else {
                    format!("    {} setup.py build", entry.variant.tag())
                };
                format!(
                    "    cd \"${{srcdir}}/${{_src_folder}}{}\"\n{step}",
                    entry.dir_suffix
                )
            })
            .collect();
        format!("build() {{\n{}\n}}\n", chunks.join("\n\n"))
    }

    fn package_block(&self, entry: &SplitVariant) -> String {
        let mut lines = Vec::new();
        if self.variants.is_split() {
            lines.push(format!("package_{}() {{", entry.pkgname));
            lines.push(format!("    depends+=({})", quoted_list(&entry.depends)));
        } else {
            lines.push("package() {".to_owned());
        }
        lines.push(format!(
            "    cd \"${{srcdir}}/${{_src_folder}}{}\"",
            entry.dir_suffix
        ));
        if let Some(license_path) = &self.module.license_path {
            let license_name = license_path.rsplit('/').next().unwrap_or(license_path);
            lines.push(format!(
                "    install -D -m644 {license_path} \"${{pkgdir}}/usr/share/licenses/{}/{license_name}\"",
                entry.pkgname
            ));
        }
        let python = entry.variant.tag();
        if self.module.pep517 {
            lines.push(format!(
                "    {python} -m installer --destdir=\"${{pkgdir}}\" dist/*.whl"
            ));
        } else {
            lines.push(format!(
                "    {python} setup.py install --root=\"${{pkgdir}}\" --optimize=1 --skip-build"
            ));
        }
        lines.push("}\n".to_owned());
        lines.join("\n")
    }
}

fn quoted_list(items: &[impl AsRef<str>]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
