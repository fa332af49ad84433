//! Per-module build manifests.
//!
//! Every module directory carries a `filelist.json` naming its top-level
//! entity and the ordered list of HDL sources, each relative to the
//! repository root:
//!
//! ```json
//! { "top": "hello", "files": ["part1/sim/hello.sv"] }
//! ```
//!
//! [`resolve_module`] reads that file and returns the top entity together with
//! absolute source paths. Source existence is left to the simulator.

#![warn(missing_docs)]

pub mod error;
pub mod manifest;

pub use error::ManifestError;
pub use manifest::{resolve_module, Manifest, ResolvedManifest, MANIFEST_FILE};
