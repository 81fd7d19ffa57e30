// tests/settings_and_variables.rs

mod common;
use crate::common::fake_backend::{FakeBackend, FAKE_BACKEND};
use crate::common::init_tracing;

use std::error::Error;
use std::io::Write;

use tempfile::{tempdir, NamedTempFile};

use infra_backend::backend::BackendRegistry;
use infra_backend::config::{default_settings_path, load_and_validate, parse_settings};
use infra_backend::operation::variables;
use infra_backend::ui::NonInteractive;
use infra_backend::{ConfigError, Value};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn settings_file_selects_and_configures_the_backend() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[backend]
type = "fake"

[backend.config]
lineage = "from-file"
parallelism = 4

[variables]
region = "eu-west-1"
replicas = 3
"#
    )?;

    let settings = load_and_validate(file.path())?;
    assert_eq!(settings.backend_type(), FAKE_BACKEND);
    assert_eq!(settings.backend_config().get_str("lineage"), Some("from-file"));
    assert_eq!(settings.variables().get("replicas"), Some(&Value::Number(3.0)));

    let mut registry = BackendRegistry::new();
    registry.register(FAKE_BACKEND, FakeBackend::factory);
    let backend = registry.init_from_settings(&settings, &NonInteractive)?;

    let store = backend.state()?;
    store.refresh_state()?;
    assert_eq!(store.state().map(|s| s.lineage), Some("from-file".to_string()));
    Ok(())
}

#[test]
fn backend_config_section_is_optional() -> TestResult {
    init_tracing();

    let raw = parse_settings("[backend]\ntype = \"minimal\"\n")?;

    assert_eq!(raw.backend.backend_type, "minimal");
    assert!(raw.backend.config.is_empty());
    assert!(raw.variables.is_empty());
    Ok(())
}

#[test]
fn invalid_backend_type_is_a_config_error() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(file, "[backend]\ntype = \"Remote Thing\"\n")?;

    match load_and_validate(file.path()) {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("Remote Thing")),
        Err(e) => panic!("Expected Invalid error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn empty_backend_type_is_rejected() {
    init_tracing();

    let raw = parse_settings("[backend]\ntype = \"\"\n").expect("parses");
    let result = infra_backend::config::SettingsFile::try_from(raw);

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn malformed_toml_is_reported() {
    init_tracing();

    let result = parse_settings("[backend\ntype = ");

    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn missing_settings_file_is_an_io_error() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let result = load_and_validate(dir.path().join("absent.toml"));

    assert!(matches!(result, Err(ConfigError::Io(_))));
    Ok(())
}

#[test]
fn default_settings_path_is_backend_toml() {
    assert_eq!(default_settings_path().to_str(), Some("backend.toml"));
}

#[test]
fn variable_files_are_merged_in_order() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let base = dir.path().join("base.tfvars.toml");
    let prod = dir.path().join("prod.tfvars.toml");
    std::fs::write(
        &base,
        "region = \"us-east-1\"\nreplicas = 1\ntags = { team = \"infra\", env = \"dev\" }\n",
    )?;
    std::fs::write(&prod, "replicas = 5\ntags = { env = \"prod\" }\n")?;

    let vars = variables::load_all(&[&base, &prod])?;

    assert_eq!(vars.get("region"), Some(&Value::from("us-east-1")));
    assert_eq!(vars.get("replicas"), Some(&Value::Number(5.0)));

    // Maps are replaced, not deep-merged.
    let tags = vars.get("tags").and_then(Value::as_map).ok_or("tags is a map")?;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags.get("env"), Some(&Value::from("prod")));
    Ok(())
}

#[test]
fn variables_keep_their_types() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(
        file,
        "enabled = true\nzones = [\"a\", \"b\"]\nratio = 0.5\nname = \"web\"\n"
    )?;

    let vars = variables::load_from_path(file.path())?;

    assert_eq!(vars.get("enabled").and_then(Value::as_bool), Some(true));
    assert_eq!(vars.get("zones").and_then(Value::as_list).map(|l| l.len()), Some(2));
    assert_eq!(vars.get("ratio").and_then(Value::as_number), Some(0.5));
    assert_eq!(vars.get("name").and_then(Value::as_str), Some("web"));
    Ok(())
}
