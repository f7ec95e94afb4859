//! Which declarations end up in a package's build units

use serde::{Deserialize, Serialize};

use crate::model::{Module, PackageId, Provenance, SymbolId};

/// Kind of build a package participates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Ordinary library or binary build
    Production,
    /// The package's test binary
    Test,
}

/// Symbols linked when building `package` in `mode`.
///
/// Internal test declarations only appear in the test binary, together with the package's
/// external test packages.
pub fn linked_symbols(module: &Module, package: PackageId, mode: BuildMode) -> Vec<SymbolId> {
    let own = module.symbols_in(package).filter(|symbol| match mode {
        BuildMode::Production => symbol.provenance == Provenance::Production,
        BuildMode::Test => symbol.provenance != Provenance::TestExternal,
    });

    let mut linked: Vec<SymbolId> = own.map(|symbol| symbol.id).collect();
    if mode == BuildMode::Test {
        for test_package in module.external_tests_of(package) {
            linked.extend(module.symbols_in(test_package.id).map(|symbol| symbol.id));
        }
    }
    linked
}
