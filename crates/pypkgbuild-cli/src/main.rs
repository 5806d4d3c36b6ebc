use clap::{Parser, ValueEnum};
use pypkgbuild_core::{
    resolve_module, CoreError, InspectOptions, LicenseCatalog, Maintainer, Packager,
    PackagerOptions, RuntimeMode, VariantOverrides, VariantSet,
};
use pypkgbuild_index::{Client, IndexError};
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PythonVersion {
    Python,
    Python2,
    Multi,
}

impl From<PythonVersion> for RuntimeMode {
    fn from(version: PythonVersion) -> Self {
        match version {
            PythonVersion::Python => RuntimeMode::Python,
            PythonVersion::Python2 => RuntimeMode::Python2,
            PythonVersion::Multi => RuntimeMode::Multi,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pypkgbuild",
    version,
    about = "Generate a PKGBUILD for a Python module from the PyPI index"
)]
struct Cli {
    /// The Python module name.
    module: String,

    /// Use the specified version of the Python module.
    #[arg(short = 'v', long = "module-version")]
    module_version: Option<String>,

    /// The Python version on which the PKGBUILD bases.
    #[arg(short = 'p', long = "python-version", value_enum, default_value = "python")]
    python: PythonVersion,

    /// The value for pkgbase. Default: the first value in pkgname.
    #[arg(short = 'b', long = "package-basename")]
    pkgbase: Option<String>,

    /// The value for pkgname. If the package is split, pkgname of the python package.
    #[arg(short = 'n', long = "package-name")]
    pkgname: Option<String>,

    /// The pkgname of the python2 package.
    #[arg(long = "python2-package-name")]
    python2_pkgname: Option<String>,

    /// Dependencies for the whole PKGBUILD.
    #[arg(short = 'd', long = "depends", num_args = 0..)]
    depends: Vec<String>,

    /// Dependencies for the python2 package in a split package.
    #[arg(long = "python2-depends", value_name = "DEPENDS", num_args = 0..)]
    python2_depends: Vec<String>,

    /// Dependencies for the python package in a split package.
    #[arg(long = "python3-depends", value_name = "DEPENDS", num_args = 0..)]
    python3_depends: Vec<String>,

    /// Packages to add to makedepends (needed for build only).
    #[arg(short = 'm', long = "make-depends", num_args = 0..)]
    make_depends: Vec<String>,

    /// Build backend used by the package (default guess: setuptools).
    #[arg(short = 's', long = "build-backend", default_value = "setuptools")]
    backend: String,

    /// Try to find a license file in the source archive.
    #[arg(short = 'l', long = "find-license")]
    find_license: bool,

    /// Inspect the source archive for pyproject.toml and prefer the PEP 517
    /// build workflow when present.
    #[arg(long = "detect-pep517")]
    detect_pep517: bool,

    /// Print to stdout rather than saving to a PKGBUILD file.
    #[arg(short = 'o', long = "print-out")]
    print_out: bool,

    /// Name for the package maintainer line.
    #[arg(long)]
    name: Option<String>,

    /// Email for the package maintainer line.
    #[arg(long)]
    email: Option<String>,

    /// Base URL of the PyPI-compatible JSON index.
    #[arg(long = "index-url", default_value = pypkgbuild_index::DEFAULT_INDEX_URL)]
    index_url: String,

    /// Enable verbose (debug) logging output.
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PYPKGBUILD_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    ExitCode::from(run(cli))
}

fn run(cli: Cli) -> u8 {
    let maintainer = match (cli.name, cli.email) {
        (Some(name), Some(email)) => Some(Maintainer { name, email }),
        (None, None) => None,
        _ => {
            error!("must supply either both --name and --email or neither");
            return EXIT_FAILURE;
        }
    };

    let client = Client::with_base_url(&cli.index_url);
    let doc = match client.fetch_module(&cli.module, cli.module_version.as_deref()) {
        Ok(doc) => doc,
        Err(e @ IndexError::ModuleNotFound(_)) => {
            error!("Python module not found: {e}");
            return EXIT_SUCCESS;
        }
        Err(e @ IndexError::VersionNotFound { .. }) => {
            error!("Python module version not found: {e}");
            return EXIT_SUCCESS;
        }
        Err(e @ IndexError::Malformed(_)) => {
            error!("failed to parse module metadata: {e}");
            return EXIT_SUCCESS;
        }
        Err(e) => {
            error!("failed to query the package index: {e}");
            return EXIT_FAILURE;
        }
    };

    let catalog = LicenseCatalog::load_system();
    let inspect = InspectOptions {
        find_license: cli.find_license,
        detect_pep517: cli.detect_pep517,
    };
    let record = match resolve_module(&doc, &catalog, inspect, &client) {
        Ok(record) => record,
        Err(e @ CoreError::MalformedMetadata { .. }) => {
            error!("failed to parse module metadata: {e}");
            return EXIT_SUCCESS;
        }
        Err(e) => {
            error!("{e}");
            return EXIT_FAILURE;
        }
    };

    let overrides = VariantOverrides {
        python_pkgname: cli.pkgname,
        python2_pkgname: cli.python2_pkgname,
        python_depends: cli.python3_depends,
        python2_depends: cli.python2_depends,
    };
    let variants = match VariantSet::build(cli.python.into(), &record.name, &overrides) {
        Ok(variants) => variants,
        Err(e) => {
            error!("{e}");
            return EXIT_FAILURE;
        }
    };

    let packager = Packager::new(
        &record,
        variants,
        PackagerOptions {
            depends: cli.depends,
            mkdepends: cli.make_depends,
            backend: cli.backend,
            pkgbase: cli.pkgbase,
            maintainer,
        },
    );
    let pkgbuild = packager.generate();

    if cli.print_out {
        print!("{pkgbuild}");
        return EXIT_SUCCESS;
    }

    if let Err(e) = std::fs::write("PKGBUILD", &pkgbuild) {
        error!("failed to write PKGBUILD: {e}");
        return EXIT_FAILURE;
    }
    match std::env::current_dir() {
        Ok(dir) => info!("successfully generated PKGBUILD under {}", dir.display()),
        Err(_) => info!("successfully generated PKGBUILD"),
    }
    EXIT_SUCCESS
}
