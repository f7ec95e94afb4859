//! The visibility decision function
//!
//! Given the context a reference is made from and the symbol it names, decide whether the
//! reference is legal. Rules are evaluated in order and the first one that applies decides:
//!
//! 1. Entry-point packages export nothing.
//! 2. Test declarations are only visible to test code of the right compilation unit; an external
//!    test package additionally sees the public internal-test declarations of the package it tests.
//! 3. Code sees everything declared in its own package.
//! 4. Across packages, only public production declarations are visible.
//!
//! The resolver answers with a boolean and never fails: turning a denial into a diagnostic is the
//! job of [`crate::Checker`].

use log::trace;
use serde::Serialize;
use std::fmt;

use crate::model::{Module, Provenance, ReferenceContext, Symbol, SymbolId};

/// The rule that decided a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Target lives in an entry-point package and the reference comes from elsewhere
    EntryPoint,
    /// Target is internal test code; only internal tests of the same package see it
    InternalTest,
    /// Target is public internal test code of the package an external test package tests
    ExternalTestOfPackage,
    /// Target is external test code; only its own external test package sees it
    ExternalTest,
    /// Reference from the declaring package
    SamePackage,
    /// Reference from another package to production code
    CrossPackage,
    /// Target id is not part of the module
    UnknownSymbol,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EntryPoint => "entry-point packages cannot be referenced",
            Self::InternalTest => "internal test code is visible to internal tests of its package",
            Self::ExternalTestOfPackage => {
                "external tests see public internal test code of the package they test"
            }
            Self::ExternalTest => "external test code is visible only inside its test package",
            Self::SamePackage => "same-package code sees every declaration",
            Self::CrossPackage => "other packages see public production declarations",
            Self::UnknownSymbol => "symbol is not part of the module",
        };
        write!(f, "{}", text)
    }
}

/// Outcome of a query together with the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub rule: Rule,
}

impl Decision {
    fn new(allowed: bool, rule: Rule) -> Self {
        Self { allowed, rule }
    }
}

/// Stateless visibility checker over a borrowed module graph
#[derive(Debug, Clone, Copy)]
pub struct VisibilityResolver<'m> {
    module: &'m Module,
}

impl<'m> VisibilityResolver<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    /// Whether code in `from` may name `target`
    pub fn can_reference(&self, from: ReferenceContext, target: &Symbol) -> bool {
        self.explain(from, target).allowed
    }

    /// Like [`Self::can_reference`], for a symbol id; unknown ids are never referenceable
    pub fn can_reference_id(&self, from: ReferenceContext, target: SymbolId) -> bool {
        self.module
            .symbol(target)
            .is_some_and(|symbol| self.can_reference(from, symbol))
    }

    /// Decide a query and report which rule decided it
    pub fn explain(&self, from: ReferenceContext, target: &Symbol) -> Decision {
        let decision = self.decide(from, target);
        trace!(
            "{} -> {}: {} ({:?})",
            self.describe_context(from),
            self.module.qualified_name(target.id),
            if decision.allowed { "allowed" } else { "denied" },
            decision.rule
        );
        decision
    }

    fn decide(&self, from: ReferenceContext, target: &Symbol) -> Decision {
        let Some(target_package) = self.module.package(target.package) else {
            return Decision::new(false, Rule::UnknownSymbol);
        };
        let same_package = from.package == target.package;

        if target_package.entry_point && !same_package {
            return Decision::new(false, Rule::EntryPoint);
        }

        match target.provenance {
            Provenance::TestInternal => {
                if same_package {
                    return Decision::new(
                        from.provenance == Provenance::TestInternal,
                        Rule::InternalTest,
                    );
                }
                let tests_target = from.provenance == Provenance::TestExternal
                    && self
                        .module
                        .package(from.package)
                        .is_some_and(|package| package.under_test == Some(target.package));
                if tests_target {
                    Decision::new(
                        target.visibility.is_public(),
                        Rule::ExternalTestOfPackage,
                    )
                } else {
                    Decision::new(false, Rule::InternalTest)
                }
            }
            Provenance::TestExternal => Decision::new(
                same_package && from.provenance == Provenance::TestExternal,
                Rule::ExternalTest,
            ),
            Provenance::Production if same_package => Decision::new(true, Rule::SamePackage),
            Provenance::Production => {
                Decision::new(target.visibility.is_public(), Rule::CrossPackage)
            }
        }
    }

    /// `pkg (provenance)` for log lines and diagnostics
    pub fn describe_context(&self, from: ReferenceContext) -> String {
        let package = self
            .module
            .package(from.package)
            .map_or("<unknown>", |package| package.path.as_str());
        format!("{} ({})", package, from.provenance)
    }
}
