//! Error types for graph construction, reference checking and manifest loading.

use crate::model::{Provenance, SymbolKind};
use thiserror::Error;

/// Errors raised while assembling a [`crate::Module`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two packages were given the same import path.
    #[error("package '{0}' is declared more than once")]
    DuplicatePackage(String),

    /// Two declarations collide in one namespace (a package or a type's member set).
    #[error("'{name}' is declared more than once in {scope}")]
    DuplicateSymbol { scope: String, name: String },

    /// A declaration's provenance does not fit the package it lives in.
    #[error("{provenance} declaration '{name}' cannot live in package '{package}'")]
    ProvenanceMismatch {
        package: String,
        name: String,
        provenance: Provenance,
    },

    /// An owner or result type name does not name a type of the package.
    #[error("'{name}' in package '{package}' is not a declared type")]
    UnknownType { package: String, name: String },

    /// A method or field was declared without an owning type.
    #[error("{kind} '{name}' in package '{package}' needs an owning type")]
    MissingOwner {
        package: String,
        name: String,
        kind: SymbolKind,
    },

    /// A function or type was declared with an owning type.
    #[error("{kind} '{name}' in package '{package}' cannot have an owning type")]
    UnexpectedOwner {
        package: String,
        name: String,
        kind: SymbolKind,
    },

    /// An external test package was pointed at something it cannot test.
    #[error("package '{0}' cannot be the target of an external test package")]
    InvalidTestTarget(String),

    /// A package id did not come from this builder.
    #[error("unknown package id {0}")]
    UnknownPackageId(u32),
}

/// Errors raised when a reference found in source cannot be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The resolver denied the reference.
    #[error("{symbol} ({visibility} {provenance} {kind}) is not visible from {from}")]
    VisibilityViolation {
        from: String,
        symbol: String,
        visibility: crate::model::Visibility,
        provenance: Provenance,
        kind: SymbolKind,
    },

    /// The referenced package does not exist in the graph.
    #[error("unknown package '{0}'")]
    UnknownPackage(String),

    /// The root name is not declared in the package namespace.
    #[error("'{name}' is not declared in package '{package}'")]
    UnknownSymbol { package: String, name: String },

    /// The member is not declared on the carrier type.
    #[error("type {owner} has no member '{name}'")]
    UnknownMember { owner: String, name: String },

    /// The selector tried to reach into something without a known type.
    #[error("cannot select '{name}' from {symbol}: no known type")]
    NotSelectable { symbol: String, name: String },
}

/// Errors raised while loading a JSON manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid JSON for the expected shape.
    #[error("failed to parse manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// The declared graph is inconsistent.
    #[error("invalid module graph: {0}")]
    Graph(#[from] GraphError),

    /// A declaration or reference names a package that is not declared.
    #[error("manifest refers to undeclared package '{0}'")]
    UnknownPackage(String),

    /// A package was declared both as an entry point and as an external test package.
    #[error("package '{0}' cannot be both an entry point and an external test package")]
    ConflictingPackageKind(String),

    /// A selector string could not be parsed.
    #[error("invalid selector '{0}': expected 'package:Name[.Member...]'")]
    InvalidSelector(String),
}

/// Result type alias for graph construction.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
