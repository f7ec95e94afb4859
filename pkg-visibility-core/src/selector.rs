//! Selector expressions such as `foo:Bad.PublicMethod`
//!
//! A selector names a root declaration in a package followed by member selections. Walking it
//! checks every step with the resolver: reaching an instance of a private type through a public
//! function does not change the visibility of that type's members, each member is judged on its
//! own tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CheckError, ManifestError};
use crate::model::{ReferenceContext, SymbolId, SymbolKind};
use crate::resolver::VisibilityResolver;

/// A path from a package-level declaration through members
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    pub package: String,
    pub root: String,
    pub members: Vec<String>,
}

impl Selector {
    pub fn new(package: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            root: root.into(),
            members: Vec::new(),
        }
    }

    /// Append a member selection
    #[must_use]
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(name.into());
        self
    }

    /// Resolve the selector from `from`, checking visibility at every step.
    ///
    /// Returns the symbol named by the last segment.
    pub fn walk(
        &self,
        resolver: &VisibilityResolver<'_>,
        from: ReferenceContext,
    ) -> Result<SymbolId, CheckError> {
        let module = resolver.module();
        let package = module
            .package_by_path(&self.package)
            .ok_or_else(|| CheckError::UnknownPackage(self.package.clone()))?;
        let mut current =
            module
                .lookup(package, &self.root)
                .ok_or_else(|| CheckError::UnknownSymbol {
                    package: self.package.clone(),
                    name: self.root.clone(),
                })?;
        ensure_visible(resolver, from, current)?;

        for name in &self.members {
            let carrier = carrier_type(resolver, current).ok_or_else(|| {
                CheckError::NotSelectable {
                    symbol: module.qualified_name(current),
                    name: name.clone(),
                }
            })?;
            current = module
                .member(carrier, name)
                .ok_or_else(|| CheckError::UnknownMember {
                    owner: module.qualified_name(carrier),
                    name: name.clone(),
                })?;
            ensure_visible(resolver, from, current)?;
        }

        Ok(current)
    }
}

/// The type whose members a selection on `id` reaches
fn carrier_type(resolver: &VisibilityResolver<'_>, id: SymbolId) -> Option<SymbolId> {
    let symbol = resolver.module().symbol(id)?;
    match symbol.kind {
        SymbolKind::Type => Some(symbol.id),
        SymbolKind::Function | SymbolKind::Method | SymbolKind::Field => symbol.returns,
    }
}

fn ensure_visible(
    resolver: &VisibilityResolver<'_>,
    from: ReferenceContext,
    id: SymbolId,
) -> Result<(), CheckError> {
    let module = resolver.module();
    let Some(symbol) = module.symbol(id) else {
        return Err(CheckError::UnknownSymbol {
            package: String::new(),
            name: format!("#{}", id.0),
        });
    };
    if resolver.can_reference(from, symbol) {
        Ok(())
    } else {
        Err(CheckError::VisibilityViolation {
            from: resolver.describe_context(from),
            symbol: module.qualified_name(id),
            visibility: symbol.visibility,
            provenance: symbol.provenance,
            kind: symbol.kind,
        })
    }
}

impl FromStr for Selector {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ManifestError::InvalidSelector(s.to_string());
        // Package paths may contain dots, so the last ':' separates package from the chain.
        let (package, chain) = s.rsplit_once(':').ok_or_else(invalid)?;
        let mut segments = chain.split('.').map(str::trim);
        let root = segments.next().filter(|root| !root.is_empty()).ok_or_else(invalid)?;
        let members: Vec<String> = segments.map(String::from).collect();
        if package.trim().is_empty() || members.iter().any(String::is_empty) {
            return Err(invalid());
        }
        Ok(Self {
            package: package.trim().to_string(),
            root: root.to_string(),
            members,
        })
    }
}

impl TryFrom<String> for Selector {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.root)?;
        for member in &self.members {
            write!(f, ".{}", member)?;
        }
        Ok(())
    }
}
