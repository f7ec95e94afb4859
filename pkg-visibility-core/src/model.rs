//! Immutable build graph: modules, packages and the symbols they declare
//!
//! Everything in here is fixed once [`crate::ModuleBuilder::build`] returns. The resolver and
//! the analyses only read from it, so a `&Module` can be shared freely across threads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Index of a package inside its [`Module`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(pub u32);

/// Index of a symbol inside its [`Module`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Visibility tag of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Exported: referenceable from other packages
    Public,
    /// Unexported: referenceable only from the declaring package
    Private,
}

impl Visibility {
    /// Derive the tag from the naming convention: a leading uppercase letter exports.
    ///
    /// Examples:
    /// - "Public" -> Public
    /// - "privateMethod" -> Private
    /// - "_Hidden" -> Private
    pub fn from_name(name: &str) -> Self {
        match name.chars().next() {
            Some(first) if first.is_uppercase() => Self::Public,
            _ => Self::Private,
        }
    }

    pub fn is_public(self) -> bool {
        self == Self::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// What a symbol declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Type,
    Method,
    Field,
}

impl SymbolKind {
    /// Methods and fields hang off a type rather than the package namespace
    pub fn is_member(self) -> bool {
        matches!(self, Self::Method | Self::Field)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Function => "function",
            Self::Type => "type",
            Self::Method => "method",
            Self::Field => "field",
        };
        write!(f, "{}", name)
    }
}

/// Which compilation context a declaration (or a reference) comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Ordinary package code, always linked
    Production,
    /// Test code compiled into the package itself, sharing its namespace
    TestInternal,
    /// Test code compiled into the synthetic `<pkg>_test` sibling package
    TestExternal,
}

impl Provenance {
    pub fn is_test(self) -> bool {
        !matches!(self, Self::Production)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Production => "production",
            Self::TestInternal => "test_internal",
            Self::TestExternal => "test_external",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Self::Production),
            "test_internal" | "internal" => Ok(Self::TestInternal),
            "test_external" | "external" => Ok(Self::TestExternal),
            other => Err(format!("unknown provenance '{}'", other)),
        }
    }
}

/// A package of the module graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub id: PackageId,
    /// Import path, e.g. "foo" or "foo_test"
    pub path: String,
    /// Entry-point packages cannot be imported by anything
    pub entry_point: bool,
    /// Set on synthetic external test packages: the package they test
    pub under_test: Option<PackageId>,
}

impl Package {
    pub fn is_external_test(&self) -> bool {
        self.under_test.is_some()
    }
}

/// A declared identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    /// Declaring package; for members this is the owning type's package
    pub package: PackageId,
    pub visibility: Visibility,
    pub kind: SymbolKind,
    pub provenance: Provenance,
    /// Owning type of a method or field
    pub owner: Option<SymbolId>,
    /// Declared result type (functions, methods) or field type, when it is a graph type
    pub returns: Option<SymbolId>,
}

/// The compilation context a lookup is attempted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ReferenceContext {
    pub package: PackageId,
    pub provenance: Provenance,
}

impl ReferenceContext {
    pub fn new(package: PackageId, provenance: Provenance) -> Self {
        Self {
            package,
            provenance,
        }
    }

    pub fn production(package: PackageId) -> Self {
        Self::new(package, Provenance::Production)
    }

    pub fn internal_test(package: PackageId) -> Self {
        Self::new(package, Provenance::TestInternal)
    }

    pub fn external_test(package: PackageId) -> Self {
        Self::new(package, Provenance::TestExternal)
    }
}

/// A named collection of packages and every symbol they declare
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub(crate) path: String,
    pub(crate) packages: Vec<Package>,
    pub(crate) symbols: Vec<Symbol>,
    #[serde(skip)]
    pub(crate) package_index: HashMap<String, PackageId>,
    #[serde(skip)]
    pub(crate) namespace: HashMap<(PackageId, String), SymbolId>,
    #[serde(skip)]
    pub(crate) members: HashMap<(SymbolId, String), SymbolId>,
}

impl Module {
    /// Module path, e.g. "github.com/example/visibility"
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.0 as usize)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn package_by_path(&self, path: &str) -> Option<PackageId> {
        self.package_index.get(path).copied()
    }

    /// Look up a top-level (non-member) name in a package namespace.
    ///
    /// Production and internal test declarations share the namespace, so either can be returned.
    pub fn lookup(&self, package: PackageId, name: &str) -> Option<SymbolId> {
        self.namespace.get(&(package, name.to_string())).copied()
    }

    /// Look up a method or field declared on `owner`
    pub fn member(&self, owner: SymbolId, name: &str) -> Option<SymbolId> {
        self.members.get(&(owner, name.to_string())).copied()
    }

    /// All members declared on `owner`, in declaration order
    pub fn members_of(&self, owner: SymbolId) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols
            .iter()
            .filter(move |symbol| symbol.owner == Some(owner))
    }

    /// All symbols declared in `package`, members included
    pub fn symbols_in(&self, package: PackageId) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols
            .iter()
            .filter(move |symbol| symbol.package == package)
    }

    /// External test packages whose package under test is `package`
    pub fn external_tests_of(&self, package: PackageId) -> impl Iterator<Item = &Package> + '_ {
        self.packages
            .iter()
            .filter(move |candidate| candidate.under_test == Some(package))
    }

    /// Human-readable `pkg.Name` or `pkg.Type.Member` for diagnostics
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let Some(symbol) = self.symbol(id) else {
            return format!("<unknown symbol {}>", id.0);
        };
        let package = self
            .package(symbol.package)
            .map_or("<unknown>", |package| package.path.as_str());
        match symbol.owner.and_then(|owner| self.symbol(owner)) {
            Some(owner) => format!("{}.{}.{}", package, owner.name, symbol.name),
            None => format!("{}.{}", package, symbol.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_name() {
        assert_eq!(Visibility::from_name("Public"), Visibility::Public);
        assert_eq!(Visibility::from_name("PublicMethod"), Visibility::Public);
        assert_eq!(Visibility::from_name("privateField"), Visibility::Private);
        assert_eq!(Visibility::from_name("_Hidden"), Visibility::Private);
        assert_eq!(Visibility::from_name("1abc"), Visibility::Private);
        assert_eq!(Visibility::from_name(""), Visibility::Private);
    }

    #[test]
    fn test_visibility_from_name_unicode() {
        assert_eq!(Visibility::from_name("Ärger"), Visibility::Public);
        assert_eq!(Visibility::from_name("über"), Visibility::Private);
    }

    #[test]
    fn test_provenance_parsing() {
        assert_eq!("production".parse::<Provenance>(), Ok(Provenance::Production));
        assert_eq!("internal".parse::<Provenance>(), Ok(Provenance::TestInternal));
        assert_eq!("test_external".parse::<Provenance>(), Ok(Provenance::TestExternal));
        assert!("bogus".parse::<Provenance>().is_err());
    }

    #[test]
    fn test_member_kinds() {
        assert!(SymbolKind::Method.is_member());
        assert!(SymbolKind::Field.is_member());
        assert!(!SymbolKind::Function.is_member());
        assert!(!SymbolKind::Type.is_member());
    }
}
