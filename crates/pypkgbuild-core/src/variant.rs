use crate::CoreError;

/// Runtime variant keys understood by the packager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyVariant {
    Python,
    Python2,
}

impl PyVariant {
    /// Interpreter command and runtime package name for this variant.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Python2 => "python2",
        }
    }

    /// Version infix used when tagging makedepends (`python-foo`/`python2-foo`).
    pub fn infix(self) -> &'static str {
        match self {
            Self::Python => "",
            Self::Python2 => "2",
        }
    }
}

/// Which runtime variants the generated PKGBUILD builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Python,
    Python2,
    Multi,
}

impl RuntimeMode {
    /// Present variants in render order; `Python` always precedes `Python2`.
    pub fn variants(self) -> &'static [PyVariant] {
        match self {
            Self::Python => &[PyVariant::Python],
            Self::Python2 => &[PyVariant::Python2],
            Self::Multi => &[PyVariant::Python, PyVariant::Python2],
        }
    }

    pub fn includes(self, variant: PyVariant) -> bool {
        self.variants().contains(&variant)
    }

    pub fn is_split(self) -> bool {
        matches!(self, Self::Multi)
    }
}

/// Packaging attributes for one runtime variant, after defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitVariant {
    pub variant: PyVariant,
    pub pkgname: String,
    /// Runtime dependencies: the variant's own runtime package, then any
    /// caller-supplied extras.
    pub depends: Vec<String>,
    /// Suffix appended to the unpacked source folder this variant builds in.
    pub dir_suffix: String,
}

impl SplitVariant {
    /// Merge caller overrides with variant defaults into a finished value.
    fn derive(
        variant: PyVariant,
        module_name: &str,
        split: bool,
        pkgname: Option<&str>,
        extra_depends: &[String],
    ) -> Self {
        let pkgname = match pkgname {
            Some(name) => name.to_owned(),
            None => format!("{}-{module_name}", variant.tag()),
        };
        let mut depends = vec![variant.tag().to_owned()];
        depends.extend(extra_depends.iter().cloned());
        let dir_suffix = if split && variant == PyVariant::Python2 {
            format!("-{}", variant.tag())
        } else {
            String::new()
        };
        Self {
            variant,
            pkgname,
            depends,
            dir_suffix,
        }
    }
}

/// Caller-supplied per-variant overrides, prior to validation and defaulting.
#[derive(Debug, Clone, Default)]
pub struct VariantOverrides {
    pub python_pkgname: Option<String>,
    pub python2_pkgname: Option<String>,
    pub python_depends: Vec<String>,
    pub python2_depends: Vec<String>,
}

/// The validated, defaulted set of variants to build, in render order.
#[derive(Debug, Clone)]
pub struct VariantSet {
    mode: RuntimeMode,
    entries: Vec<SplitVariant>,
}

impl VariantSet {
    /// Validate `overrides` against `mode`, then derive per-variant defaults.
    ///
    /// An override that targets a variant outside the mode implies intent to
    /// build that variant and is rejected before any defaulting happens.
    pub fn build(
        mode: RuntimeMode,
        module_name: &str,
        overrides: &VariantOverrides,
    ) -> Result<Self, CoreError> {
        if !mode.includes(PyVariant::Python) {
            if overrides.python_pkgname.is_some() {
                return Err(CoreError::Config(
                    "--package-name names the python package, but the python variant is not selected"
                        .to_owned(),
                ));
            }
            if !overrides.python_depends.is_empty() {
                return Err(CoreError::Config(
                    "--python3-depends given, but the python variant is not selected".to_owned(),
                ));
            }
        }
        if !mode.includes(PyVariant::Python2) {
            if overrides.python2_pkgname.is_some() {
                return Err(CoreError::Config(
                    "--python2-package-name given, but the python2 variant is not selected"
                        .to_owned(),
                ));
            }
            if !overrides.python2_depends.is_empty() {
                return Err(CoreError::Config(
                    "--python2-depends given, but the python2 variant is not selected".to_owned(),
                ));
            }
        }

        let entries = mode
            .variants()
            .iter()
            .map(|&variant| {
                let (pkgname, extras) = match variant {
                    PyVariant::Python => {
                        (overrides.python_pkgname.as_deref(), &overrides.python_depends)
                    }
                    PyVariant::Python2 => (
                        overrides.python2_pkgname.as_deref(),
                        &overrides.python2_depends,
                    ),
                };
                SplitVariant::derive(variant, module_name, mode.is_split(), pkgname, extras)
            })
            .collect();

        Ok(Self { mode, entries })
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn entries(&self) -> &[SplitVariant] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_split(&self) -> bool {
        self.mode.is_split()
    }

    pub fn pkgnames(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.pkgname.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_mode_defaults_names_depends_and_suffixes() {
        let set = VariantSet::build(RuntimeMode::Multi, "requests", &VariantOverrides::default())
            .unwrap();
        assert_eq!(set.len(), 2);

        let python = &set.entries()[0];
        assert_eq!(python.pkgname, "python-requests");
        assert_eq!(python.depends, vec!["python"]);
        assert_eq!(python.dir_suffix, "");

        let python2 = &set.entries()[1];
        assert_eq!(python2.pkgname, "python2-requests");
        assert_eq!(python2.depends, vec!["python2"]);
        assert_eq!(python2.dir_suffix, "-python2");
    }

    #[test]
    fn single_mode_has_one_entry_and_no_suffix() {
        let set = VariantSet::build(
            RuntimeMode::Python2,
            "requests",
            &VariantOverrides::default(),
        )
        .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].pkgname, "python2-requests");
        assert_eq!(set.entries()[0].dir_suffix, "");
        assert!(!set.is_split());
    }

    #[test]
    fn override_for_absent_variant_fails_before_defaulting() {
        let overrides = VariantOverrides {
            python2_depends: vec!["python2-six".to_owned()],
            ..VariantOverrides::default()
        };
        let err = VariantSet::build(RuntimeMode::Python, "requests", &overrides).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn name_override_for_absent_variant_fails() {
        let overrides = VariantOverrides {
            python_pkgname: Some("python-requests-git".to_owned()),
            ..VariantOverrides::default()
        };
        assert!(VariantSet::build(RuntimeMode::Python2, "requests", &overrides).is_err());
    }

    #[test]
    fn overrides_extend_rather_than_replace() {
        let overrides = VariantOverrides {
            python_pkgname: Some("python-requests-ng".to_owned()),
            python_depends: vec!["python-urllib3".to_owned(), "python-idna".to_owned()],
            ..VariantOverrides::default()
        };
        let set = VariantSet::build(RuntimeMode::Python, "requests", &overrides).unwrap();
        let entry = &set.entries()[0];
        assert_eq!(entry.pkgname, "python-requests-ng");
        assert_eq!(entry.depends, vec!["python", "python-urllib3", "python-idna"]);
    }

    #[test]
    fn render_order_is_python_then_python2() {
        let set = VariantSet::build(RuntimeMode::Multi, "six", &VariantOverrides::default())
            .unwrap();
        assert_eq!(set.pkgnames(), vec!["python-six", "python2-six"]);
    }
}
