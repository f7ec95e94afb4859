//! Batch checking of the references a build tool found in source
//!
//! This is the embedding side of the resolver: a denied reference becomes a
//! [`CheckError::VisibilityViolation`] diagnostic instead of a bare `false`.

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

use crate::error::CheckError;
use crate::model::{Module, Provenance, ReferenceContext, SymbolId};
use crate::resolver::VisibilityResolver;
use crate::selector::Selector;

/// A reference occurring in source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub from: ReferenceContext,
    pub selector: Selector,
}

impl Reference {
    pub fn new(from: ReferenceContext, selector: Selector) -> Self {
        Self { from, selector }
    }
}

/// A reference that could not be honoured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Index of the reference in the checked batch
    pub index: usize,
    pub from_package: String,
    pub from_provenance: Provenance,
    pub selector: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: CheckError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}: {}",
            self.from_package, self.from_provenance, self.selector, self.error
        )
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &CheckError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Outcome of checking a batch of references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub violations: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Resolves references against a module graph
#[derive(Debug, Clone, Copy)]
pub struct Checker<'m> {
    resolver: VisibilityResolver<'m>,
}

impl<'m> Checker<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            resolver: VisibilityResolver::new(module),
        }
    }

    pub fn resolver(&self) -> &VisibilityResolver<'m> {
        &self.resolver
    }

    /// Resolve a single reference to the symbol it names
    pub fn check_one(&self, reference: &Reference) -> Result<SymbolId, CheckError> {
        reference.selector.walk(&self.resolver, reference.from)
    }

    /// Check every reference; queries are independent and run in parallel.
    ///
    /// Violations are reported in input order.
    pub fn check(&self, references: &[Reference]) -> CheckReport {
        let violations: Vec<Diagnostic> = references
            .par_iter()
            .enumerate()
            .filter_map(|(index, reference)| {
                let error = self.check_one(reference).err()?;
                debug!("Reference {} rejected: {}", index, error);
                Some(self.diagnostic(index, reference, error))
            })
            .collect();

        info!(
            "Checked {} references: {} violations",
            references.len(),
            violations.len()
        );

        CheckReport {
            checked: references.len(),
            violations,
        }
    }

    fn diagnostic(&self, index: usize, reference: &Reference, error: CheckError) -> Diagnostic {
        let from_package = self
            .resolver
            .module()
            .package(reference.from.package)
            .map_or_else(|| "<unknown>".to_string(), |package| package.path.clone());
        Diagnostic {
            index,
            from_package,
            from_provenance: reference.from.provenance,
            selector: reference.selector.to_string(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Declaration, ModuleBuilder};

    #[test_log::test]
    fn test_report_keeps_input_order() {
        let mut builder = ModuleBuilder::new("example.com/m");
        let foo = builder.package("foo").unwrap();
        let bar = builder.package("bar").unwrap();
        builder
            .declare(foo, Declaration::function("Public"))
            .declare(foo, Declaration::function("private"));
        let module = builder.build().unwrap();
        let checker = Checker::new(&module);

        let from = ReferenceContext::production(bar);
        let references: Vec<Reference> = (0..64)
            .map(|i| {
                let name = if i % 2 == 0 { "Public" } else { "private" };
                Reference::new(from, Selector::new("foo", name))
            })
            .collect();

        let report = checker.check(&references);
        assert_eq!(report.checked, 64);
        assert_eq!(report.violations.len(), 32);
        assert!(report
            .violations
            .windows(2)
            .all(|pair| pair[0].index < pair[1].index));
        assert!(report.violations.iter().all(|d| d.index % 2 == 1));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_diagnostic_rendering() {
        let mut builder = ModuleBuilder::new("example.com/m");
        let foo = builder.package("foo").unwrap();
        let bar = builder.package("bar").unwrap();
        builder.declare(foo, Declaration::function("private"));
        let module = builder.build().unwrap();
        let checker = Checker::new(&module);

        let report = checker.check(&[Reference::new(
            ReferenceContext::production(bar),
            Selector::new("foo", "private"),
        )]);
        let line = report.violations[0].to_string();
        assert_eq!(
            line,
            "bar (production): foo:private: foo.private (private production function) is not visible from bar (production)"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["violations"][0]["from_provenance"], "production");
        assert!(json["violations"][0]["error"]
            .as_str()
            .unwrap()
            .contains("is not visible"));
    }
}
