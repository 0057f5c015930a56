use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::SurveyError;

pub type Document = Map<String, Value>;

/// Anything that can hand out the full set of survey documents.
pub trait RecordSource {
    fn name(&self) -> String;
    fn fetch_all(&self) -> Result<Vec<Document>, SurveyError>;
}

/// Reads a document store export, either a JSON array or one document per line.
#[derive(Debug)]
pub struct JsonDocumentSource {
    path: PathBuf,
}

impl JsonDocumentSource {
    pub fn open(path: PathBuf) -> Result<Self, SurveyError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SurveyError::FileNotFound,
            ErrorKind::PermissionDenied => SurveyError::PermissionDenied,
            _ => SurveyError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(SurveyError::LoadingFailed(format!(
                "{} is not a file!",
                path.display()
            )));
        }
        debug!("Opened record source {} ({} bytes)", path.display(), metadata.len());
        Ok(Self { path })
    }

    fn parse(content: &str) -> Result<Vec<Value>, SurveyError> {
        if content.trim_start().starts_with('[') {
            let values: Vec<Value> = serde_json::from_str(content)?;
            return Ok(values);
        }
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<Value>(l).map_err(SurveyError::from))
            .collect()
    }
}

impl RecordSource for JsonDocumentSource {
    fn name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string()
    }

    fn fetch_all(&self) -> Result<Vec<Document>, SurveyError> {
        let start_time = Instant::now();
        let content = fs::read_to_string(&self.path)?;
        let values = Self::parse(&content)?;

        let total = values.len();
        let documents: Vec<Document> = values
            .into_iter()
            .enumerate()
            .filter_map(|(idx, v)| match v {
                Value::Object(map) => Some(map),
                other => {
                    warn!("Skipping entry {idx}, not a document: {other}");
                    None
                }
            })
            .collect();

        info!(
            "Fetched {}/{} documents from {} in {}ms",
            documents.len(),
            total,
            self.path.display(),
            start_time.elapsed().as_millis()
        );
        Ok(documents)
    }
}

/// Stringify a document id. Extended JSON `{"$oid": ".."}` is unwrapped.
pub fn stringify_id(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => match map.get("$oid") {
            Some(Value::String(oid)) => oid.clone(),
            _ => Value::Object(map.clone()).to_string(),
        },
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_fixture(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("survey-dash-source-tests");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_json_array() {
        let path = write_fixture(
            "array.json",
            r#"[{"_id": {"$oid": "65f0"}, "Name": "Asha"}, {"Name": "Ravi"}]"#,
        );
        let source = JsonDocumentSource::open(path).unwrap();
        let docs = source.fetch_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["Name"], json!("Ravi"));
        assert_eq!(source.name(), "array.json");
    }

    #[test]
    fn reads_one_document_per_line_and_skips_non_objects() {
        let path = write_fixture(
            "lines.json",
            "{\"Name\": \"Asha\"}\n\n42\n{\"Name\": \"Ravi\"}\n",
        );
        let docs = JsonDocumentSource::open(path).unwrap().fetch_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["Name"], json!("Asha"));
    }

    #[test]
    fn malformed_content_is_an_error() {
        let path = write_fixture("broken.json", "{\"Name\": ");
        let res = JsonDocumentSource::open(path).unwrap().fetch_all();
        assert!(matches!(res, Err(SurveyError::JsonError(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let res = JsonDocumentSource::open(PathBuf::from("/definitely/not/here.json"));
        assert!(matches!(res, Err(SurveyError::FileNotFound)));
    }

    #[test]
    fn directories_are_rejected() {
        let res = JsonDocumentSource::open(std::env::temp_dir());
        assert!(matches!(res, Err(SurveyError::LoadingFailed(_))));
    }

    #[test]
    fn ids_are_stringified() {
        assert_eq!(stringify_id(Some(&json!({"$oid": "abc123"}))), "abc123");
        assert_eq!(stringify_id(Some(&json!("plain"))), "plain");
        assert_eq!(stringify_id(Some(&json!(17))), "17");
        assert_eq!(stringify_id(None), "");
    }
}
