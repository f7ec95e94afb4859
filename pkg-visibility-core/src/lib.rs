//! This crate models package-level visibility and test-scoping rules:
//! - An immutable module graph of packages and declarations
//! - The visibility decision function over that graph
//! - Selector walking for members reached through leaked types
//! - Leaked-type analysis and build-unit membership
//! - Batch reference checking and a JSON manifest format
//!

mod builder;
mod checker;
mod error;
mod leaks;
mod linkage;
mod manifest;
mod model;
mod resolver;
pub mod sample;
mod selector;

// Re-exports for a small, focused public API
pub use builder::{Declaration, ModuleBuilder, EXTERNAL_TEST_SUFFIX};
pub use checker::{CheckReport, Checker, Diagnostic, Reference};
pub use error::{CheckError, GraphError, GraphResult, ManifestError};
pub use leaks::{find_leaks, LeakedType};
pub use linkage::{linked_symbols, BuildMode};
pub use manifest::{Manifest, PackageManifest, ReferenceManifest, SymbolManifest};
pub use model::{
    Module, Package, PackageId, Provenance, ReferenceContext, Symbol, SymbolId, SymbolKind,
    Visibility,
};
pub use resolver::{Decision, Rule, VisibilityResolver};
pub use selector::Selector;
