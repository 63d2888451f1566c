//! On-disk record encodings used by `FileStorageAdapter`.

use super::{StorageError, StorageResult};
use crate::codec::yaml::{parse_yaml, to_yaml};
use crate::model::minion::Minion;
use serde_json::Value;
use std::path::Path;

/// Text encoding of one minion record.
pub trait RecordFormat {
    /// Extension used for new files.
    const EXTENSION: &'static str;
    /// Extensions accepted when reading; includes `EXTENSION`.
    const READ_EXTENSIONS: &'static [&'static str];

    fn encode(minion: &Minion) -> StorageResult<String>;
    fn decode(text: &str, path: &Path) -> StorageResult<Minion>;
}

/// Pretty-printed JSON, two-space indent.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl RecordFormat for JsonFormat {
    const EXTENSION: &'static str = "json";
    const READ_EXTENSIONS: &'static [&'static str] = &["json"];

    fn encode(minion: &Minion) -> StorageResult<String> {
        serde_json::to_string_pretty(minion).map_err(|err| StorageError::Encode {
            id: minion.id,
            message: err.to_string(),
        })
    }

    fn decode(text: &str, path: &Path) -> StorageResult<Minion> {
        serde_json::from_str(text).map_err(|err| decode_error(path, err))
    }
}

/// Block YAML via `crate::codec::yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl RecordFormat for YamlFormat {
    const EXTENSION: &'static str = "yaml";
    const READ_EXTENSIONS: &'static [&'static str] = &["yaml", "yml"];

    fn encode(minion: &Minion) -> StorageResult<String> {
        let encode_error = |message: String| StorageError::Encode {
            id: minion.id,
            message,
        };
        match serde_json::to_value(minion).map_err(|err| encode_error(err.to_string()))? {
            Value::Object(map) => Ok(to_yaml(&map)),
            _ => Err(encode_error("record is not an object".to_string())),
        }
    }

    fn decode(text: &str, path: &Path) -> StorageResult<Minion> {
        let map = parse_yaml(text).map_err(|err| decode_error(path, err))?;
        serde_json::from_value(Value::Object(map)).map_err(|err| decode_error(path, err))
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> StorageError {
    StorageError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
