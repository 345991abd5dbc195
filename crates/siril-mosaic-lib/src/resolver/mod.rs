//! Locating the Siril executable.
//!
//! Resolution tries, in a fixed order, and stops at the first hit:
//! 1. An explicit path handed in by the caller
//! 2. The `SIRIL_BINARY` environment variable
//! 3. A `siril` command on `PATH`
//! 4. A list of well-known install locations (probed on every host OS)
//!
//! An override (1 or 2) that does not point at an executable file is a hard
//! error; later strategies are not consulted.
//!
//! ```rust,no_run
//! use siril_mosaic::resolver::resolve_siril;
//!
//! let found = resolve_siril(None).unwrap();
//! println!("{} via {}", found.path.display(), found.strategy);
//! ```

mod env;
mod fs;
mod resolve;
mod types;

pub use env::{EnvProvider, SystemEnv};
pub use fs::{FsProvider, SystemFs};
pub use resolve::{
    resolve_siril, resolve_siril_with_deps, Locator, OVERRIDE_ENV_VAR, SIRIL_COMMAND,
    WELL_KNOWN_LOCATIONS,
};
pub use types::{
    Attempt, AttemptOutcome, OverrideOrigin, Platform, Resolution, ResolveError, Strategy,
    WellKnownLocation,
};

#[cfg(any(test, feature = "test-utils"))]
pub use env::MockEnv;
#[cfg(any(test, feature = "test-utils"))]
pub use fs::MockFs;
