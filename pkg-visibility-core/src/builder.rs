//! Construction of the immutable [`Module`] graph
//!
//! Packages are registered eagerly; symbols are queued as [`Declaration`]s and only resolved in
//! [`ModuleBuilder::build`], so owners and result types may be declared in any order.

use log::debug;
use std::collections::HashMap;

use crate::error::{GraphError, GraphResult};
use crate::model::{
    Module, Package, PackageId, Provenance, Symbol, SymbolId, SymbolKind, Visibility,
};

/// Suffix of the synthetic sibling package holding external tests
pub const EXTERNAL_TEST_SUFFIX: &str = "_test";

/// A symbol waiting to be placed in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    kind: SymbolKind,
    owner: Option<String>,
    returns: Option<String>,
    provenance: Option<Provenance>,
    visibility: Option<Visibility>,
}

impl Declaration {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: None,
            returns: None,
            provenance: None,
            visibility: None,
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Function, name)
    }

    pub fn type_def(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Type, name)
    }

    pub fn method(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Method, name).owned_by(owner)
    }

    pub fn field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Field, name).owned_by(owner)
    }

    /// Attach the declaration to a type of the same package
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Declared result type (or field type) naming a type of the same package
    #[must_use]
    pub fn returning(mut self, type_name: impl Into<String>) -> Self {
        self.returns = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Override the tag otherwise derived from the name
    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for a [`Module`]
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    path: String,
    packages: Vec<Package>,
    package_index: HashMap<String, PackageId>,
    pending: Vec<(PackageId, Declaration)>,
}

impl ModuleBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            packages: Vec::new(),
            package_index: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Register an ordinary importable package
    pub fn package(&mut self, path: impl Into<String>) -> GraphResult<PackageId> {
        self.add_package(path.into(), false, None)
    }

    /// Register an entry-point package, which nothing else may reference
    pub fn entry_point(&mut self, path: impl Into<String>) -> GraphResult<PackageId> {
        self.add_package(path.into(), true, None)
    }

    /// Register the conventional `<path>_test` sibling of `under_test`
    pub fn external_test_package(&mut self, under_test: PackageId) -> GraphResult<PackageId> {
        let target = self
            .packages
            .get(under_test.0 as usize)
            .ok_or(GraphError::UnknownPackageId(under_test.0))?;
        let path = format!("{}{}", target.path, EXTERNAL_TEST_SUFFIX);
        self.external_test_package_named(under_test, path)
    }

    /// Register an external test package of `under_test` under an explicit path
    pub fn external_test_package_named(
        &mut self,
        under_test: PackageId,
        path: impl Into<String>,
    ) -> GraphResult<PackageId> {
        let target = self
            .packages
            .get(under_test.0 as usize)
            .ok_or(GraphError::UnknownPackageId(under_test.0))?;
        if target.is_external_test() {
            return Err(GraphError::InvalidTestTarget(target.path.clone()));
        }
        self.add_package(path.into(), false, Some(under_test))
    }

    /// Queue a declaration in `package`
    pub fn declare(&mut self, package: PackageId, declaration: Declaration) -> &mut Self {
        self.pending.push((package, declaration));
        self
    }

    fn add_package(
        &mut self,
        path: String,
        entry_point: bool,
        under_test: Option<PackageId>,
    ) -> GraphResult<PackageId> {
        if self.package_index.contains_key(&path) {
            return Err(GraphError::DuplicatePackage(path));
        }
        let id = PackageId(dense_index(self.packages.len()));
        self.package_index.insert(path.clone(), id);
        self.packages.push(Package {
            id,
            path,
            entry_point,
            under_test,
        });
        Ok(id)
    }

    /// Resolve every queued declaration and freeze the graph
    pub fn build(self) -> GraphResult<Module> {
        let Self {
            path,
            packages,
            package_index,
            pending,
        } = self;

        let package_of = |id: PackageId| {
            packages
                .get(id.0 as usize)
                .ok_or(GraphError::UnknownPackageId(id.0))
        };

        // Top-level names first: owners and result types are looked up here.
        let mut namespace: HashMap<(PackageId, String), SymbolId> = HashMap::new();
        for (index, (package_id, declaration)) in pending.iter().enumerate() {
            let package = package_of(*package_id)?;
            if declaration.kind.is_member() {
                continue;
            }
            if declaration.owner.is_some() {
                return Err(GraphError::UnexpectedOwner {
                    package: package.path.clone(),
                    name: declaration.name.clone(),
                    kind: declaration.kind,
                });
            }
            let key = (*package_id, declaration.name.clone());
            if namespace
                .insert(key, SymbolId(dense_index(index)))
                .is_some()
            {
                return Err(GraphError::DuplicateSymbol {
                    scope: format!("package '{}'", package.path),
                    name: declaration.name.clone(),
                });
            }
        }

        let resolve_type = |package: &Package, name: &str| -> GraphResult<SymbolId> {
            namespace
                .get(&(package.id, name.to_string()))
                .copied()
                .filter(|id| pending[id.0 as usize].1.kind == SymbolKind::Type)
                .ok_or_else(|| GraphError::UnknownType {
                    package: package.path.clone(),
                    name: name.to_string(),
                })
        };

        let mut symbols = Vec::with_capacity(pending.len());
        let mut members: HashMap<(SymbolId, String), SymbolId> = HashMap::new();
        for (index, (package_id, declaration)) in pending.iter().enumerate() {
            let id = SymbolId(dense_index(index));
            let package = package_of(*package_id)?;

            let owner = match (&declaration.owner, declaration.kind.is_member()) {
                (Some(owner), true) => Some(resolve_type(package, owner.as_str())?),
                (None, true) => {
                    return Err(GraphError::MissingOwner {
                        package: package.path.clone(),
                        name: declaration.name.clone(),
                        kind: declaration.kind,
                    })
                }
                (_, false) => None,
            };
            let returns = declaration
                .returns
                .as_deref()
                .map(|name| resolve_type(package, name))
                .transpose()?;

            let owner_provenance =
                owner.map(|owner| effective_provenance(package, &pending[owner.0 as usize].1));
            let provenance = declaration
                .provenance
                .or(owner_provenance)
                .unwrap_or_else(|| default_provenance(package));
            let returns_provenance =
                returns.map(|ty| effective_provenance(package, &pending[ty.0 as usize].1));
            check_provenance(
                package,
                declaration,
                provenance,
                [owner_provenance, returns_provenance],
            )?;

            if let Some(owner) = owner {
                if members
                    .insert((owner, declaration.name.clone()), id)
                    .is_some()
                {
                    let owner_name = &pending[owner.0 as usize].1.name;
                    return Err(GraphError::DuplicateSymbol {
                        scope: format!("type '{}.{}'", package.path, owner_name),
                        name: declaration.name.clone(),
                    });
                }
            }

            symbols.push(Symbol {
                id,
                name: declaration.name.clone(),
                package: *package_id,
                visibility: declaration
                    .visibility
                    .unwrap_or_else(|| Visibility::from_name(&declaration.name)),
                kind: declaration.kind,
                provenance,
                owner,
                returns,
            });
        }

        debug!(
            "Built module '{}': {} packages, {} symbols",
            path,
            packages.len(),
            symbols.len()
        );

        Ok(Module {
            path,
            packages,
            symbols,
            package_index,
            namespace,
            members,
        })
    }
}

fn default_provenance(package: &Package) -> Provenance {
    if package.is_external_test() {
        Provenance::TestExternal
    } else {
        Provenance::Production
    }
}

fn effective_provenance(package: &Package, declaration: &Declaration) -> Provenance {
    declaration
        .provenance
        .unwrap_or_else(|| default_provenance(package))
}

fn check_provenance(
    package: &Package,
    declaration: &Declaration,
    provenance: Provenance,
    dependencies: [Option<Provenance>; 2],
) -> GraphResult<()> {
    let fits_package = if package.is_external_test() {
        provenance == Provenance::TestExternal
    } else {
        provenance != Provenance::TestExternal
    };
    // Production code can neither hang off nor return a type that only exists in test builds.
    let fits_dependencies = provenance != Provenance::Production
        || dependencies.into_iter().flatten().all(|dep| !dep.is_test());
    if fits_package && fits_dependencies {
        Ok(())
    } else {
        Err(GraphError::ProvenanceMismatch {
            package: package.path.clone(),
            name: declaration.name.clone(),
            provenance,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn dense_index(len: usize) -> u32 {
    len as u32
}
