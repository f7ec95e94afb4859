//! Detection of private types leaked through a package's public surface
//!
//! Returning an unexported type from an exported function makes instances of it reachable from
//! other packages. The type's own member tags still apply, so this is reported as advice only and
//! never influences [`crate::VisibilityResolver`].

use log::warn;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use crate::model::{Module, Provenance, SymbolId, SymbolKind};

/// A private type reachable from outside its package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakedType {
    /// The private type
    pub leaked: SymbolId,
    /// The public declaration whose result exposes it
    pub exposed_by: SymbolId,
    /// Public production members of the leaked type, now usable by other packages
    pub public_members: Vec<SymbolId>,
}

/// Find every private type reachable through the public production surface of importable packages.
///
/// Leaks are followed transitively: a public method of a leaked type returning another private
/// type leaks that type as well. Each type is reported once, in discovery order.
pub fn find_leaks(module: &Module) -> Vec<LeakedType> {
    let mut queue: VecDeque<(SymbolId, Option<SymbolId>)> = VecDeque::new();

    for symbol in module.symbols() {
        let importable = module
            .package(symbol.package)
            .is_some_and(|package| !package.entry_point && !package.is_external_test());
        if !importable
            || symbol.owner.is_some()
            || symbol.provenance != Provenance::Production
            || !symbol.visibility.is_public()
        {
            continue;
        }
        if symbol.kind == SymbolKind::Type {
            queue.push_back((symbol.id, None));
        } else if let Some(returns) = symbol.returns {
            queue.push_back((returns, Some(symbol.id)));
        }
    }

    let mut seen = HashSet::new();
    let mut leaks = Vec::new();
    while let Some((type_id, exposed_by)) = queue.pop_front() {
        if !seen.insert(type_id) {
            continue;
        }
        let Some(ty) = module.symbol(type_id) else {
            continue;
        };

        // Test-only members stay hidden from other packages even on a leaked type.
        let public_members: Vec<_> = module
            .members_of(type_id)
            .filter(|member| {
                member.visibility.is_public() && member.provenance == Provenance::Production
            })
            .collect();
        for member in &public_members {
            if let Some(returns) = member.returns {
                queue.push_back((returns, Some(member.id)));
            }
        }

        if let (false, Some(exposed_by)) = (ty.visibility.is_public(), exposed_by) {
            warn!(
                "{} leaks unexported type {}",
                module.qualified_name(exposed_by),
                module.qualified_name(type_id)
            );
            leaks.push(LeakedType {
                leaked: type_id,
                exposed_by,
                public_members: public_members.iter().map(|member| member.id).collect(),
            });
        }
    }

    leaks
}
