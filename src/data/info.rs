use crate::data::{DataError, DataResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

enum InfoFormat {
    Json,
    Yaml,
}

impl InfoFormat {
    fn from_path(path: &Path) -> DataResult<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" | "info" => Ok(InfoFormat::Json),
            "yaml" | "yml" => Ok(InfoFormat::Yaml),
            _ => Err(DataError::UnknownFormat(ext)),
        }
    }
}

/// Save experiment parameters. The format follows the extension:
/// `.json`/`.info` for JSON, `.yaml`/`.yml` for YAML.
pub fn save_info<T: Serialize, P: AsRef<Path>>(path: P, info: &T) -> DataResult<()> {
    let path = path.as_ref();
    let content = match InfoFormat::from_path(path)? {
        InfoFormat::Json => serde_json::to_string_pretty(info)?,
        InfoFormat::Yaml => serde_yaml::to_string(info)?,
    };
    std::fs::write(path, content)?;
    tracing::debug!("Saved info to {:?}", path);
    Ok(())
}

/// Load experiment parameters saved by [`save_info`]
pub fn load_info<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> DataResult<T> {
    let path = path.as_ref();
    let format = InfoFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok(match format {
        InfoFormat::Json => serde_json::from_str(&content)?,
        InfoFormat::Yaml => serde_yaml::from_str(&content)?,
    })
}

/// Local date and time as `d.m.Y H.M.S`, without zero padding
pub fn date_time_stamp() -> String {
    chrono::Local::now()
        .format("%-d.%-m.%Y %-H.%-M.%-S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Protocol {
        holding_mv: f64,
        pulse_ms: Vec<f64>,
        electrode: String,
    }

    fn protocol() -> Protocol {
        Protocol {
            holding_mv: -70.0,
            pulse_ms: vec![50.0, 10.0, 50.0],
            electrode: "left".to_string(),
        }
    }

    #[test]
    fn test_json_and_yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        for name in ["params.json", "params.yaml", "params.info"] {
            let path = dir.path().join(name);
            save_info(&path, &protocol()).unwrap();
            let loaded: Protocol = load_info(&path).unwrap();
            assert_eq!(loaded, protocol(), "round trip through {}", name);
        }
    }

    #[test]
    fn test_untyped_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"dt": 0.0001, "gain": 10}"#).unwrap();

        let loaded: BTreeMap<String, f64> = load_info(&path).unwrap();
        assert_eq!(loaded["gain"], 10.0);
    }

    #[test]
    fn test_unknown_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.csv");
        assert!(matches!(
            save_info(&path, &protocol()),
            Err(DataError::UnknownFormat(ext)) if ext == "csv"
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_date_time_stamp_shape() {
        let stamp = date_time_stamp();
        let (date, time) = stamp.split_once(' ').unwrap();
        assert_eq!(date.split('.').count(), 3);
        assert_eq!(time.split('.').count(), 3);
        assert!(stamp.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ' '));
    }
}
