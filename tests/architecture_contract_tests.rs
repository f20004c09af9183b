//! Architecture contract tests.

mod support;

use support::architecture::{migrations, references, Reference};

fn report(found: &[Reference]) -> String {
    found.iter().map(|r| format!("\n  {r}")).collect()
}

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let found = references(
        "src/domain",
        &[
            "crate::adapter",
            "crate::application",
            "crate::port",
            "tokio::",
            "diesel::",
            "tracing::",
        ],
    );

    assert!(
        found.is_empty(),
        "forbidden imports in domain layer:{}",
        report(&found)
    );
}

#[test]
fn application_depends_on_ports_not_adapters() {
    let found = references(
        "src/application",
        &["crate::adapter", "diesel::", "clap::", "owo_colors::"],
    );

    assert!(
        found.is_empty(),
        "adapter imports in application layer:{}",
        report(&found)
    );
}

#[test]
fn cli_goes_through_services() {
    let found = references(
        "src/adapter/cli",
        &["diesel::", "crate::application::accounting", ".commit("],
    );

    assert!(
        found.is_empty(),
        "direct store or engine access in CLI:{}",
        report(&found)
    );
}

#[test]
fn every_migration_can_be_reverted() {
    let dirs = migrations();
    let names: Vec<String> = dirs
        .iter()
        .filter_map(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(
        names,
        [
            "2024-05-01-000000_create_journal",
            "2024-05-02-000000_unique_account_names"
        ]
    );
    for dir in &dirs {
        assert!(dir.join("up.sql").is_file(), "{} lacks up.sql", dir.display());
        assert!(dir.join("down.sql").is_file(), "{} lacks down.sql", dir.display());
    }
}
