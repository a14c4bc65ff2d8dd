use fleetwatch_service::{ServiceConfig, ServiceError};
use std::io::Write;
use std::path::PathBuf;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn full_config_loads() {
    let (_dir, path) = write_config(
        r#"
database:
  path: /var/lib/fleetwatch/agents.db
remote:
  base_url: https://manager.internal:55000
  username: fleet-reader
  password: hunter2
sync_interval_secs: 60
"#,
    );

    let config = ServiceConfig::load(&path).unwrap();
    assert_eq!(
        config.database.path,
        PathBuf::from("/var/lib/fleetwatch/agents.db")
    );
    assert_eq!(config.remote.base_url, "https://manager.internal:55000");
    assert_eq!(config.remote.username, "fleet-reader");
    assert_eq!(config.sync_interval_secs, 60);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let (_dir, path) = write_config(
        r#"
remote:
  base_url: https://manager.internal:55000
"#,
    );

    let config = ServiceConfig::load(&path).unwrap();
    assert_eq!(config.remote.base_url, "https://manager.internal:55000");
    assert_eq!(config.remote.username, "fleetwatch");
    assert_eq!(config.sync_interval_secs, 300);
    assert_eq!(config.database.path, PathBuf::from("fleetwatch.db"));
}

#[test]
fn missing_file_is_io_error() {
    let err = ServiceConfig::load(std::path::Path::new("/nonexistent/config.yaml")).unwrap_err();
    assert!(matches!(err, ServiceError::Io(_)));
}

#[test]
fn malformed_yaml_is_config_error() {
    let (_dir, path) = write_config("remote: [not, a, mapping]");
    let err = ServiceConfig::load(&path).unwrap_err();
    assert!(matches!(err, ServiceError::Config(_)));
}
