//! Property tests for the visibility decision function over randomly generated module graphs

use pkg_visibility_core::{
    Declaration, Module, ModuleBuilder, Provenance, ReferenceContext, VisibilityResolver,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct PackageSpec {
    entry_point: bool,
    with_external_tests: bool,
}

#[derive(Debug, Clone)]
struct SymbolSpec {
    package: usize,
    public: bool,
    test_code: bool,
    in_external_tests: bool,
}

fn package_spec() -> impl Strategy<Value = PackageSpec> {
    (any::<bool>(), any::<bool>()).prop_map(|(entry_point, with_external_tests)| PackageSpec {
        entry_point,
        with_external_tests,
    })
}

fn symbol_spec() -> impl Strategy<Value = SymbolSpec> {
    (0usize..8, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(package, public, test_code, in_external_tests)| SymbolSpec {
            package,
            public,
            test_code,
            in_external_tests,
        },
    )
}

/// Build a graph plus every valid reference context into it
fn build(packages: &[PackageSpec], symbols: &[SymbolSpec]) -> (Module, Vec<ReferenceContext>) {
    let mut builder = ModuleBuilder::new("example.com/generated");
    let mut units = Vec::new();
    let mut contexts = Vec::new();

    for (index, spec) in packages.iter().enumerate() {
        let path = format!("p{}", index);
        let base = if spec.entry_point {
            builder.entry_point(path).unwrap()
        } else {
            builder.package(path).unwrap()
        };
        contexts.push(ReferenceContext::production(base));
        contexts.push(ReferenceContext::internal_test(base));

        let tests = spec
            .with_external_tests
            .then(|| builder.external_test_package(base).unwrap());
        if let Some(tests) = tests {
            contexts.push(ReferenceContext::external_test(tests));
        }
        units.push((base, tests));
    }

    for (index, spec) in symbols.iter().enumerate() {
        let name = if spec.public {
            format!("Sym{}", index)
        } else {
            format!("sym{}", index)
        };
        let (base, tests) = units[spec.package % units.len()];
        match (spec.in_external_tests, tests) {
            (true, Some(tests)) => {
                builder.declare(tests, Declaration::function(name));
            }
            _ => {
                let provenance = if spec.test_code {
                    Provenance::TestInternal
                } else {
                    Provenance::Production
                };
                builder.declare(base, Declaration::function(name).provenance(provenance));
            }
        }
    }

    (builder.build().unwrap(), contexts)
}

fn graph() -> impl Strategy<Value = (Vec<PackageSpec>, Vec<SymbolSpec>)> {
    (
        prop::collection::vec(package_spec(), 1..5),
        prop::collection::vec(symbol_spec(), 0..24),
    )
}

proptest! {
    #[test]
    fn public_production_visible_from_other_importable_packages((packages, symbols) in graph()) {
        let (module, contexts) = build(&packages, &symbols);
        let resolver = VisibilityResolver::new(&module);
        for symbol in module.symbols() {
            let target_package = module.package(symbol.package).unwrap();
            if !symbol.visibility.is_public()
                || symbol.provenance != Provenance::Production
                || target_package.entry_point
            {
                continue;
            }
            for from in &contexts {
                let from_package = module.package(from.package).unwrap();
                if from.package != symbol.package && !from_package.entry_point {
                    prop_assert!(resolver.can_reference(*from, symbol));
                }
            }
        }
    }

    #[test]
    fn private_never_visible_across_packages((packages, symbols) in graph()) {
        let (module, contexts) = build(&packages, &symbols);
        let resolver = VisibilityResolver::new(&module);
        for symbol in module.symbols().iter().filter(|s| !s.visibility.is_public()) {
            for from in contexts.iter().filter(|c| c.package != symbol.package) {
                prop_assert!(!resolver.can_reference(*from, symbol));
            }
        }
    }

    #[test]
    fn internal_test_code_visibility((packages, symbols) in graph()) {
        let (module, contexts) = build(&packages, &symbols);
        let resolver = VisibilityResolver::new(&module);
        for symbol in module
            .symbols()
            .iter()
            .filter(|s| s.provenance == Provenance::TestInternal)
        {
            let entry_point = module.package(symbol.package).unwrap().entry_point;
            for from in &contexts {
                let same_unit =
                    from.package == symbol.package && from.provenance == Provenance::TestInternal;
                let tests_package = from.provenance == Provenance::TestExternal
                    && module.package(from.package).unwrap().under_test == Some(symbol.package);
                let expected =
                    same_unit || (symbol.visibility.is_public() && tests_package && !entry_point);
                prop_assert_eq!(resolver.can_reference(*from, symbol), expected);
            }
        }
    }

    #[test]
    fn entry_points_export_nothing((packages, symbols) in graph()) {
        let (module, contexts) = build(&packages, &symbols);
        let resolver = VisibilityResolver::new(&module);
        for symbol in module.symbols() {
            if !module.package(symbol.package).unwrap().entry_point {
                continue;
            }
            for from in contexts.iter().filter(|c| c.package != symbol.package) {
                prop_assert!(!resolver.can_reference(*from, symbol));
            }
        }
    }

    #[test]
    fn external_test_code_stays_in_its_package((packages, symbols) in graph()) {
        let (module, contexts) = build(&packages, &symbols);
        let resolver = VisibilityResolver::new(&module);
        for symbol in module
            .symbols()
            .iter()
            .filter(|s| s.provenance == Provenance::TestExternal)
        {
            for from in &contexts {
                prop_assert_eq!(
                    resolver.can_reference(*from, symbol),
                    from.package == symbol.package
                );
            }
        }
    }

    #[test]
    fn queries_are_idempotent((packages, symbols) in graph()) {
        let (module, contexts) = build(&packages, &symbols);
        let resolver = VisibilityResolver::new(&module);
        for symbol in module.symbols() {
            for from in &contexts {
                let first = resolver.explain(*from, symbol);
                let second = resolver.explain(*from, symbol);
                prop_assert_eq!(first, second);
            }
        }
    }
}
