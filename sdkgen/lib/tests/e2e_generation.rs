//! End-to-end tests: generate a client crate, then build and test it.
//!
//! These invoke cargo on the emitted crate and are ignored by default.

use std::process::Command;

use tempfile::TempDir;

use sdkgen_lib::config::GeneratorConfig;
use sdkgen_lib::document::SchemaDocument;
use sdkgen_lib::loader::load_locations;
use sdkgen_lib::output::generate;

const SAMPLE: &str = include_str!("fixtures/solcast_sample.json");

fn write_sample_crate(dir: &TempDir) {
    let locations_path = dir.path().join("locations.json");
    std::fs::write(
        &locations_path,
        r#"[
  {"name": "Sydney Opera House", "latitude": -33.856784, "longitude": 151.215297, "resourceId": "ba75-e17a-7374-95ed"},
  {"name": "Grand Canyon", "latitude": 36.099763, "longitude": -112.112485, "resourceId": "e13a-6ab2-7b3c-2bde"}
]"#,
    )
    .expect("Failed to write locations");

    let document = SchemaDocument::parse(SAMPLE).expect("Failed to parse sample");
    let locations = load_locations(&locations_path).expect("Failed to load locations");
    let output = generate(&document, &GeneratorConfig::default(), &locations).expect("Failed to generate");
    output.write(&dir.path().join("solcast")).expect("Failed to write crate");
}

#[test]
fn writes_complete_crate() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    write_sample_crate(&dir);

    let root = dir.path().join("solcast");
    for path in [
        "Cargo.toml",
        "src/lib.rs",
        "src/clients/mod.rs",
        "src/clients/aggregation_client.rs",
        "src/models/requests/mod.rs",
        "src/locations.rs",
    ] {
        assert!(root.join(path).is_file(), "missing {}", path);
    }

    let locations = std::fs::read_to_string(root.join("src/locations.rs")).unwrap();
    assert!(locations.contains("name: \"Sydney Opera House\""));
    assert!(locations.contains("longitude: -112.112485,"));
}

/// Runs `cargo test` on the emitted crate, which also runs its own
/// `utilities` tests.
#[test]
#[ignore = "slow: compiles generated code"]
fn generated_crate_passes_its_tests() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    write_sample_crate(&dir);

    let output = Command::new("cargo")
        .args(["test", "--manifest-path"])
        .arg(dir.path().join("solcast/Cargo.toml"))
        .output()
        .expect("Failed to run cargo test");

    if !output.status.success() {
        panic!(
            "Generated crate failed its tests:\n\nSTDOUT:\n{}\n\nSTDERR:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}
