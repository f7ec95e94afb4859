//! Subcommand implementations

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;
use pkg_visibility_core::{
    find_leaks, sample, Checker, Manifest, Module, Provenance, Reference, ReferenceContext,
    Selector,
};
use serde_json::json;

use crate::{OutputFormat, Outcome};

/// Load a manifest from a file, or from stdin when the path is '-'
fn load_manifest(path: &Path) -> Result<Manifest> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read manifest from stdin")?;
        return Manifest::from_json_str(&content).context("Failed to parse manifest from stdin");
    }
    Manifest::from_path(path)
        .with_context(|| format!("Failed to load manifest: {}", path.display()))
}

fn load_module(manifest: &Manifest) -> Result<Module> {
    let module = manifest
        .to_module()
        .context("Manifest does not describe a valid module graph")?;
    info!(
        "Loaded module '{}' with {} packages",
        module.path(),
        module.packages().len()
    );
    Ok(module)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

pub(crate) fn check(path: &Path, format: OutputFormat) -> Result<Outcome> {
    let manifest = load_manifest(path)?;
    let module = load_module(&manifest)?;
    let references = manifest
        .references(&module)
        .context("Manifest references could not be bound to the module")?;

    let report = Checker::new(&module).check(&references);
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            for diagnostic in &report.violations {
                println!("{}", diagnostic);
            }
            println!(
                "checked {} references: {} violations",
                report.checked,
                report.violations.len()
            );
        }
    }

    Ok(if report.is_clean() {
        Outcome::Clean
    } else {
        Outcome::Denied
    })
}

pub(crate) fn query(
    path: &Path,
    from: &str,
    provenance: Provenance,
    selector: &str,
    format: OutputFormat,
) -> Result<Outcome> {
    let manifest = load_manifest(path)?;
    let module = load_module(&manifest)?;
    let package = module
        .package_by_path(from)
        .ok_or_else(|| anyhow!("Unknown package '{}'", from))?;
    let selector: Selector = selector.parse().context("Invalid selector")?;

    let reference = Reference::new(ReferenceContext::new(package, provenance), selector);
    let outcome = Checker::new(&module).check_one(&reference);

    match (&outcome, format) {
        (Ok(symbol), OutputFormat::Text) => {
            println!("allowed: {}", module.qualified_name(*symbol));
        }
        (Err(error), OutputFormat::Text) => println!("denied: {}", error),
        (Ok(symbol), OutputFormat::Json) => print_json(&json!({
            "allowed": true,
            "selector": reference.selector.to_string(),
            "symbol": module.qualified_name(*symbol),
        }))?,
        (Err(error), OutputFormat::Json) => print_json(&json!({
            "allowed": false,
            "selector": reference.selector.to_string(),
            "error": error.to_string(),
        }))?,
    }

    Ok(if outcome.is_ok() {
        Outcome::Clean
    } else {
        Outcome::Denied
    })
}

pub(crate) fn leaks(path: &Path, format: OutputFormat) -> Result<Outcome> {
    let manifest = load_manifest(path)?;
    let module = load_module(&manifest)?;
    let leaks = find_leaks(&module);

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = leaks
                .iter()
                .map(|leak| {
                    json!({
                        "leaked": module.qualified_name(leak.leaked),
                        "exposed_by": module.qualified_name(leak.exposed_by),
                        "public_members": leak
                            .public_members
                            .iter()
                            .map(|id| module.qualified_name(*id))
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Text => {
            for leak in &leaks {
                let members: Vec<_> = leak
                    .public_members
                    .iter()
                    .map(|id| module.qualified_name(*id))
                    .collect();
                println!(
                    "{} exposes unexported type {} (reachable members: {})",
                    module.qualified_name(leak.exposed_by),
                    module.qualified_name(leak.leaked),
                    if members.is_empty() {
                        "none".to_string()
                    } else {
                        members.join(", ")
                    }
                );
            }
            println!("{} leaked types", leaks.len());
        }
    }

    Ok(Outcome::Clean)
}

pub(crate) fn demo(format: OutputFormat) -> Result<Outcome> {
    let module = sample::module().context("Failed to build the demonstration module")?;
    let cases = sample::references(&module).context("Failed to list demonstration references")?;
    let checker = Checker::new(&module);

    let mut rows = Vec::with_capacity(cases.len());
    let mut mismatches = 0;
    for case in &cases {
        let outcome = checker.check_one(&case.reference);
        if outcome.is_ok() != case.allowed {
            mismatches += 1;
        }
        rows.push((case, outcome));
    }

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = rows
                .iter()
                .map(|(case, outcome)| {
                    json!({
                        "from": checker.resolver().describe_context(case.reference.from),
                        "selector": case.reference.selector.to_string(),
                        "allowed": outcome.is_ok(),
                        "expected": case.allowed,
                        "note": case.note,
                    })
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Text => {
            for (case, outcome) in &rows {
                println!(
                    "{:<8} {:<28} {:<28} {}",
                    if outcome.is_ok() { "allowed" } else { "denied" },
                    checker.resolver().describe_context(case.reference.from),
                    case.reference.selector.to_string(),
                    case.note
                );
            }
        }
    }

    if mismatches > 0 {
        return Err(anyhow!(
            "{} demonstration references did not match their expected outcome",
            mismatches
        ));
    }
    Ok(Outcome::Clean)
}
