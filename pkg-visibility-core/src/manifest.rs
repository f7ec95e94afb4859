//! JSON interchange format for module graphs and the references to check against them
//!
//! A build tool that has already parsed declarations describes them here; visibility defaults to
//! the naming convention and provenance defaults to what the package implies, so a typical
//! manifest only lists names and kinds.

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::builder::{Declaration, ModuleBuilder};
use crate::checker::Reference;
use crate::error::ManifestError;
use crate::model::{Module, Provenance, ReferenceContext, SymbolKind, Visibility};
use crate::selector::Selector;

/// Top-level manifest document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Module path
    pub module: String,
    #[serde(default)]
    pub packages: Vec<PackageManifest>,
    #[serde(default)]
    pub references: Vec<ReferenceManifest>,
}

/// One package and its declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    pub path: String,
    #[serde(default)]
    pub entry_point: bool,
    /// Path of the package this external test package tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<String>,
    #[serde(default)]
    pub symbols: Vec<SymbolManifest>,
}

/// One declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolManifest {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

/// A reference found in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceManifest {
    /// Package the reference is made from
    pub from: String,
    #[serde(default = "default_provenance")]
    pub provenance: Provenance,
    pub selector: Selector,
}

fn default_provenance() -> Provenance {
    Provenance::Production
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        debug!("Loading manifest from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build the module graph the manifest declares
    pub fn to_module(&self) -> Result<Module, ManifestError> {
        let mut builder = ModuleBuilder::new(self.module.clone());

        // Packages under test must exist before their external test packages.
        let mut ids = Vec::with_capacity(self.packages.len());
        for package in self.packages.iter().filter(|p| p.tests.is_none()) {
            let id = if package.entry_point {
                builder.entry_point(package.path.clone())?
            } else {
                builder.package(package.path.clone())?
            };
            ids.push((package, id));
        }
        for package in &self.packages {
            let Some(target) = &package.tests else {
                continue;
            };
            if package.entry_point {
                return Err(ManifestError::ConflictingPackageKind(package.path.clone()));
            }
            let target_id = ids
                .iter()
                .find(|(candidate, _)| &candidate.path == target)
                .map(|(_, id)| *id)
                .ok_or_else(|| ManifestError::UnknownPackage(target.clone()))?;
            let id = builder.external_test_package_named(target_id, package.path.clone())?;
            ids.push((package, id));
        }

        for (package, id) in ids {
            for symbol in &package.symbols {
                builder.declare(id, symbol.to_declaration());
            }
        }

        Ok(builder.build()?)
    }

    /// The references listed in the manifest, bound to `module`
    pub fn references(&self, module: &Module) -> Result<Vec<Reference>, ManifestError> {
        self.references
            .iter()
            .map(|reference| {
                let package = module
                    .package_by_path(&reference.from)
                    .ok_or_else(|| ManifestError::UnknownPackage(reference.from.clone()))?;
                Ok(Reference::new(
                    ReferenceContext::new(package, reference.provenance),
                    reference.selector.clone(),
                ))
            })
            .collect()
    }
}

impl SymbolManifest {
    fn to_declaration(&self) -> Declaration {
        let mut declaration = Declaration::new(self.kind, self.name.clone());
        if let Some(owner) = &self.owner {
            declaration = declaration.owned_by(owner.clone());
        }
        if let Some(returns) = &self.returns {
            declaration = declaration.returning(returns.clone());
        }
        if let Some(provenance) = self.provenance {
            declaration = declaration.provenance(provenance);
        }
        if let Some(visibility) = self.visibility {
            declaration = declaration.visibility(visibility);
        }
        declaration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;
    use crate::error::{CheckError, GraphError};
    use std::io::Write;

    const MANIFEST: &str = r#"{
        "module": "example.com/visibility",
        "packages": [
            { "path": "foo_test", "tests": "foo", "symbols": [
                { "name": "TestExternal", "kind": "function" }
            ] },
            { "path": "foo", "symbols": [
                { "name": "Bad", "kind": "function", "returns": "private" },
                { "name": "private", "kind": "type" },
                { "name": "PublicField", "kind": "field", "owner": "private" },
                { "name": "privateField", "kind": "field", "owner": "private" },
                { "name": "TestInternal", "kind": "function", "provenance": "test_internal" }
            ] },
            { "path": "bar" },
            { "path": "main", "entry_point": true, "symbols": [
                { "name": "MakeParams", "kind": "function" }
            ] }
        ],
        "references": [
            { "from": "bar", "selector": "foo:Bad.PublicField" },
            { "from": "bar", "selector": "foo:Bad.privateField" },
            { "from": "foo_test", "provenance": "test_external", "selector": "foo:TestInternal" },
            { "from": "bar", "selector": "main:MakeParams" }
        ]
    }"#;

    #[test]
    fn test_manifest_builds_module() {
        let manifest = Manifest::from_json_str(MANIFEST).unwrap();
        let module = manifest.to_module().unwrap();

        assert_eq!(module.path(), "example.com/visibility");
        let foo = module.package_by_path("foo").unwrap();
        let foo_test = module.package_by_path("foo_test").unwrap();
        assert_eq!(module.package(foo_test).unwrap().under_test, Some(foo));
        let main = module.package_by_path("main").unwrap();
        assert!(module.package(main).unwrap().entry_point);

        let internal = module.lookup(foo, "TestInternal").unwrap();
        assert_eq!(
            module.symbol(internal).unwrap().provenance,
            Provenance::TestInternal
        );
        let external = module.lookup(foo_test, "TestExternal").unwrap();
        assert_eq!(
            module.symbol(external).unwrap().provenance,
            Provenance::TestExternal
        );
    }

    #[test]
    fn test_manifest_references_checked() {
        let manifest = Manifest::from_json_str(MANIFEST).unwrap();
        let module = manifest.to_module().unwrap();
        let references = manifest.references(&module).unwrap();
        assert_eq!(references.len(), 4);

        let report = Checker::new(&module).check(&references);
        let rejected: Vec<usize> = report.violations.iter().map(|d| d.index).collect();
        assert_eq!(rejected, vec![1, 3]);
        assert!(report
            .violations
            .iter()
            .all(|d| matches!(d.error, CheckError::VisibilityViolation { .. })));
    }

    #[test]
    fn test_manifest_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = Manifest::from_path(file.path()).unwrap();
        assert_eq!(manifest.packages.len(), 4);
    }

    #[test]
    fn test_manifest_errors() {
        assert!(matches!(
            Manifest::from_json_str("{ not json"),
            Err(ManifestError::Json(_))
        ));
        assert!(matches!(
            Manifest::from_json_str(r#"{ "module": "m", "extra": 1 }"#),
            Err(ManifestError::Json(_))
        ));

        let orphan = Manifest::from_json_str(
            r#"{ "module": "m", "packages": [ { "path": "x_test", "tests": "x" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            orphan.to_module(),
            Err(ManifestError::UnknownPackage(path)) if path == "x"
        ));

        let duplicate = Manifest::from_json_str(
            r#"{ "module": "m", "packages": [ { "path": "x" }, { "path": "x" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            duplicate.to_module(),
            Err(ManifestError::Graph(GraphError::DuplicatePackage(_)))
        ));

        let bad_selector = Manifest::from_json_str(
            r#"{ "module": "m", "references": [ { "from": "x", "selector": "nocolon" } ] }"#,
        );
        assert!(matches!(bad_selector, Err(ManifestError::Json(_))));

        let conflicting = Manifest::from_json_str(
            r#"{ "module": "m", "packages": [ { "path": "x" },
                { "path": "x_test", "tests": "x", "entry_point": true } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            conflicting.to_module(),
            Err(ManifestError::ConflictingPackageKind(_))
        ));
    }

    #[test]
    fn test_reference_from_unknown_package() {
        let manifest = Manifest::from_json_str(
            r#"{ "module": "m", "packages": [ { "path": "x" } ],
                 "references": [ { "from": "y", "selector": "x:A" } ] }"#,
        )
        .unwrap();
        let module = manifest.to_module().unwrap();
        assert!(matches!(
            manifest.references(&module),
            Err(ManifestError::UnknownPackage(path)) if path == "y"
        ));
    }
}
