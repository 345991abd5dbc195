//! Library entry point for driving Siril's Seestar mosaic preprocessing.
//!
//! The crate locates the external `siril` executable, stores the two mosaic
//! scripts (broadband and narrowband) and runs Siril in script mode against a
//! project directory. All image processing happens inside Siril; this crate
//! only prepares inputs, launches the process and reports back.
//
// Public modules
pub mod config;
pub mod error;
pub mod fetch;
pub mod mosaic;
pub mod process;
pub mod project;
pub mod resolver;
pub mod scripts;
pub mod siril;

// Re‑export primary types for ergonomic use.
pub use config::Settings;
pub use error::{FetchError, SirilError};
pub use fetch::{refresh_scripts, HttpScriptSource, RefreshOutcome, ScriptRefresh, ScriptSource};
pub use mosaic::{run_mosaic, MosaicOptions, MosaicRun, OutputCheck};
pub use process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
pub use project::describe_project;
pub use resolver::{resolve_siril, Locator, Resolution, ResolveError};
pub use scripts::FilterMode;
pub use siril::{Probe, Siril, Validation};
