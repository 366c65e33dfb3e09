//! Configuration file round-trips and overrides

use joint_temperature::config::{Config, EXAMPLE_CONFIG};
use joint_temperature::topology::Topology;
use joint_temperature::{Error, Result};
use std::fs;

#[test]
fn test_config_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.yaml");

    let mut config = Config::default();
    config.extraction.confidence_threshold = 0.25;
    config.grouping.min_joint_count = 5;
    config.selection.max_center_distance = Some(310.0);
    config.sampling.half_window = 4;
    config.to_file(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.extraction.confidence_threshold, 0.25);
    assert_eq!(loaded.grouping.min_joint_count, 5);
    assert_eq!(loaded.selection.max_center_distance, Some(310.0));
    assert_eq!(loaded.sampling.half_window, 4);
    assert_eq!(loaded.topology, Topology::coco18());
    loaded.validate()?;

    Ok(())
}

#[test]
fn test_example_config_file_loads() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("example.yaml");
    fs::write(&path, EXAMPLE_CONFIG)?;

    let config = Config::from_file(&path)?;
    config.validate()?;
    assert_eq!(config.camera.width, 640);
    assert_eq!(config.grouping.sample_points, 10);

    Ok(())
}

#[test]
fn test_custom_topology_from_yaml() -> Result<()> {
    let yaml = r#"
topology:
  joint_names: ["head", "neck", "hip"]
  limbs:
    - { from: 1, to: 0, field_x: 0, field_y: 1 }
    - { from: 1, to: 2, field_x: 2, field_y: 3 }
  heatmap_channels: 4
  field_channels: 4
grouping:
  min_joint_count: 2
"#;
    let config: Config = serde_yaml::from_str(yaml).map_err(|e| Error::ConfigError(e.to_string()))?;
    config.validate()?;
    assert_eq!(config.topology.num_joints(), 3);
    assert_eq!(config.topology.joint_index("hip"), Some(2));

    Ok(())
}

#[test]
fn test_topology_with_bad_limb_rejected() {
    let yaml = r#"
topology:
  joint_names: ["head", "neck"]
  limbs:
    - { from: 1, to: 5, field_x: 0, field_y: 1 }
  heatmap_channels: 2
  field_channels: 2
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
}

#[test]
fn test_malformed_file_is_config_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "extraction: [not, a, map")?;

    assert!(matches!(Config::from_file(&path), Err(Error::ConfigError(_))));
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    assert!(matches!(
        Config::from_file("/nonexistent/config.yaml"),
        Err(Error::Io(_))
    ));
}
