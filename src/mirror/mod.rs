//! Mirror catalog and per-tool mirror configuration.
//!
//! `catalog` maps the known providers to their endpoint URLs (with external
//! override support), `distro` classifies the running distribution and
//! parses APT source lines, and `configure` rewrites each tool's
//! configuration to point at a selected provider.

pub mod catalog;
pub mod configure;
pub mod distro;

pub use catalog::{CatalogOverride, MirrorProvider, ProviderEndpoints};
pub use configure::{MirrorSelections, MirrorStatus, MirrorTargets};
pub use distro::{DistroKind, SourceEntry};
