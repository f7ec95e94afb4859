//! A small demonstration module exercising every rule
//!
//! `foo` is an ordinary package with a leaked private type and internal tests, `foo_test` its
//! external tests, `bar` a client package with its own external tests, and `main` an entry point.
//! [`references`] lists the references each compilation unit makes (or would like to make)
//! together with the outcome the resolver must produce.

use crate::builder::{Declaration, ModuleBuilder};
use crate::checker::Reference;
use crate::error::{CheckError, GraphResult};
use crate::model::{Module, Provenance, ReferenceContext};
use crate::selector::Selector;

/// Module path of the demonstration graph
pub const MODULE_PATH: &str = "example.com/visibility";

/// A reference with its expected outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReference {
    pub reference: Reference,
    pub allowed: bool,
    pub note: &'static str,
}

impl SampleReference {
    fn new(
        from: ReferenceContext,
        selector: Selector,
        allowed: bool,
        note: &'static str,
    ) -> Self {
        Self {
            reference: Reference::new(from, selector),
            allowed,
            note,
        }
    }
}

/// Build the demonstration graph
pub fn module() -> GraphResult<Module> {
    let mut builder = ModuleBuilder::new(MODULE_PATH);

    let foo = builder.package("foo")?;
    let foo_test = builder.external_test_package(foo)?;
    let bar = builder.package("bar")?;
    let bar_test = builder.external_test_package(bar)?;
    let main = builder.entry_point("main")?;
    let main_test = builder.external_test_package(main)?;

    let internal = |declaration: Declaration| declaration.provenance(Provenance::TestInternal);

    builder
        .declare(foo, Declaration::function("Public"))
        .declare(foo, Declaration::type_def("private"))
        .declare(foo, Declaration::field("private", "privateField"))
        .declare(foo, Declaration::field("private", "PublicField"))
        .declare(foo, Declaration::method("private", "PublicMethod"))
        .declare(foo, Declaration::method("private", "privateMethod"))
        .declare(foo, Declaration::function("Bad").returning("private"))
        .declare(foo, internal(Declaration::function("TestInternal")))
        .declare(foo, internal(Declaration::type_def("TestExported")))
        .declare(foo, Declaration::field("TestExported", "Field1"));

    builder
        .declare(foo_test, Declaration::function("TestExternal"))
        .declare(foo_test, Declaration::type_def("Exported"))
        .declare(foo_test, Declaration::function("surprise"));

    builder
        .declare(bar, Declaration::function("bar"))
        .declare(bar_test, Declaration::function("TestInternal"));

    builder
        .declare(main, Declaration::function("main"))
        .declare(main, Declaration::function("MakeParams").returning("Params"))
        .declare(main, Declaration::type_def("Params"))
        .declare(main, Declaration::field("Params", "P1"))
        .declare(main, Declaration::field("Params", "P2"))
        .declare(main, internal(Declaration::function("TestInternal")))
        .declare(main_test, Declaration::function("TestExternal"));

    builder.build()
}

/// Every reference the demonstration makes, legal or not
pub fn references(module: &Module) -> Result<Vec<SampleReference>, CheckError> {
    let package = |path: &str| {
        module
            .package_by_path(path)
            .ok_or_else(|| CheckError::UnknownPackage(path.to_string()))
    };
    let foo = package("foo")?;
    let foo_test = package("foo_test")?;
    let bar = package("bar")?;
    let bar_test = package("bar_test")?;
    let main = package("main")?;
    let main_test = package("main_test")?;

    Ok(vec![
        // foo sees all of itself.
        SampleReference::new(
            ReferenceContext::production(foo),
            selector("foo", "private", &[]),
            true,
            "production code can instantiate its own private type",
        ),
        SampleReference::new(
            ReferenceContext::production(foo),
            selector("foo", "private", &["privateMethod"]),
            true,
            "a type can use its own private methods",
        ),
        SampleReference::new(
            ReferenceContext::production(foo),
            selector("foo", "private", &["privateField"]),
            true,
            "a type can use its own private fields",
        ),
        SampleReference::new(
            ReferenceContext::production(foo),
            selector("foo", "TestInternal", &[]),
            false,
            "production code never sees test code",
        ),
        SampleReference::new(
            ReferenceContext::internal_test(foo),
            selector("foo", "Bad", &[]),
            true,
            "internal tests see everything in the package",
        ),
        SampleReference::new(
            ReferenceContext::internal_test(foo),
            selector("foo", "private", &["privateField"]),
            true,
            "internal tests see private members",
        ),
        SampleReference::new(
            ReferenceContext::internal_test(foo),
            selector("foo", "TestExported", &["Field1"]),
            true,
            "internal tests see other internal test code",
        ),
        // External tests only see the exported surface.
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo", "Public", &[]),
            true,
            "external tests see exported identifiers",
        ),
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo", "Bad", &["PublicField"]),
            true,
            "exported members of a leaked type are reachable",
        ),
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo", "Bad", &["privateField"]),
            false,
            "unexported members of a leaked type stay hidden",
        ),
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo", "private", &[]),
            false,
            "external tests cannot name an unexported type",
        ),
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo", "TestInternal", &[]),
            true,
            "external tests see exported internal test code of their package",
        ),
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo", "TestExported", &["Field1"]),
            true,
            "external tests see exported internal test types",
        ),
        SampleReference::new(
            ReferenceContext::external_test(foo_test),
            selector("foo_test", "surprise", &[]),
            true,
            "external test package sees its own unexported code",
        ),
        // Other packages see only exported production code.
        SampleReference::new(
            ReferenceContext::production(bar),
            selector("foo", "Public", &[]),
            true,
            "exported identifiers are importable",
        ),
        SampleReference::new(
            ReferenceContext::production(bar),
            selector("foo", "Bad", &["PublicMethod"]),
            true,
            "exported methods of a leaked type are reachable",
        ),
        SampleReference::new(
            ReferenceContext::production(bar),
            selector("foo", "Bad", &["privateMethod"]),
            false,
            "unexported methods of a leaked type stay hidden",
        ),
        SampleReference::new(
            ReferenceContext::production(bar),
            selector("foo", "TestExported", &[]),
            false,
            "test code is not importable",
        ),
        SampleReference::new(
            ReferenceContext::production(bar),
            selector("foo_test", "TestExternal", &[]),
            false,
            "external test packages are not importable",
        ),
        SampleReference::new(
            ReferenceContext::production(bar),
            selector("main", "MakeParams", &[]),
            false,
            "entry-point packages cannot be imported",
        ),
        SampleReference::new(
            ReferenceContext::external_test(bar_test),
            selector("foo", "Bad", &["PublicMethod"]),
            true,
            "tests of another package see the exported surface",
        ),
        SampleReference::new(
            ReferenceContext::external_test(bar_test),
            selector("foo", "TestInternal", &[]),
            false,
            "tests of another package never see foo's tests",
        ),
        SampleReference::new(
            ReferenceContext::external_test(bar_test),
            selector("foo_test", "TestExternal", &[]),
            false,
            "tests of another package cannot import foo_test",
        ),
        // Entry point.
        SampleReference::new(
            ReferenceContext::internal_test(main),
            selector("main", "main", &[]),
            true,
            "internal tests of main see everything in main",
        ),
        SampleReference::new(
            ReferenceContext::internal_test(main),
            selector("main", "MakeParams", &["P1"]),
            true,
            "internal tests of main see exported fields",
        ),
        SampleReference::new(
            ReferenceContext::external_test(main_test),
            selector("main", "MakeParams", &[]),
            false,
            "external tests of main cannot reach main at all",
        ),
    ])
}

fn selector(package: &str, root: &str, members: &[&str]) -> Selector {
    members
        .iter()
        .fold(Selector::new(package, root), |selector, member| {
            selector.member(*member)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;

    #[test]
    fn test_sample_matrix_matches_expectations() {
        let module = module().unwrap();
        let checker = Checker::new(&module);
        for case in references(&module).unwrap() {
            let outcome = checker.check_one(&case.reference);
            assert_eq!(
                outcome.is_ok(),
                case.allowed,
                "{} ({}): {:?}",
                case.reference.selector,
                case.note,
                outcome
            );
        }
    }

    #[test]
    fn test_sample_references_need_sample_packages() {
        let module = ModuleBuilder::new("m").build().unwrap();
        assert_eq!(
            references(&module),
            Err(CheckError::UnknownPackage("foo".to_string()))
        );
    }
}
