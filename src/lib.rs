//! XKB Registry Library
//!
//! Loads the descriptive rules registry of an XKB ruleset (models, layouts
//! and their variants, option groups and their options) from the ruleset's
//! `rules/<name>.xml` file into an in-memory, queryable tree.
//!
//! A [`Context`] owns the parsed tree. Create one, optionally add include
//! paths, parse a ruleset once, then enumerate:
//!
//! ```no_run
//! use xkb_registry::Context;
//!
//! let ctx = Context::new()?;
//! ctx.parse_default_ruleset()?;
//! for layout in ctx.layouts() {
//!     println!("{}", layout.name().unwrap_or("?"));
//! }
//! # Ok::<(), xkb_registry::RegistryError>(())
//! ```
//!
//! Entities are cheap-to-clone handles; a cloned handle keeps its entity
//! alive independently of the context. A context and everything reachable
//! from it is single-threaded; independent contexts share no state.

mod collection;
mod grammar;
mod link;
mod paths;
mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use registry::{Context, Layout, Model, OptionEntry, OptionGroup, Variant};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ruleset parsed by [`Context::parse_default_ruleset`]
pub const DEFAULT_RULESET: &str = "evdev";

/// Compiled-in fallback when `XKB_CONFIG_ROOT` is not set
pub const DEFAULT_XKB_CONFIG_ROOT: &str = "/usr/share/X11/xkb";

/// Errors that can occur in xkb-registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Include path is not a readable directory: {0}")]
    InaccessiblePath(PathBuf),

    #[error("No usable include path")]
    NoIncludePath,

    #[error("No include path contains a parseable ruleset '{0}'")]
    RulesetNotFound(String),

    #[error("Context was already parsed")]
    AlreadyParsed,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
