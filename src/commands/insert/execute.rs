use std::error::Error;
use std::fs;

use serde::Serialize;
use serde_json::Value;

use super::InsertCmd;
use crate::commands::{parse_json_arg, Execute};
use crate::db::documents_from_value;
use crate::store::Driver;

/// Result of the insert command execution
#[derive(Debug, Default, Serialize)]
pub struct InsertResult {
    pub collection: String,
    pub inserted: u64,
    pub ids: Vec<String>,
}

impl InsertCmd {
    fn read_source(&self) -> Result<(String, String), Box<dyn Error>> {
        match (&self.document, &self.file) {
            (Some(text), _) => Ok(("--document".to_string(), text.clone())),
            (None, Some(path)) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
                Ok((path.display().to_string(), text))
            }
            (None, None) => Err("Either --document or --file is required".into()),
        }
    }
}

impl Execute for InsertCmd {
    type Output = InsertResult;

    fn execute(self, driver: &Driver) -> Result<Self::Output, Box<dyn Error>> {
        let (source, text) = self.read_source()?;
        let mut documents = documents_from_value(parse_json_arg(&source, &text)?)?;

        let inserted = driver.insert_many(&self.collection, &mut documents)?;
        let ids = documents
            .iter()
            .filter_map(|document| match document.get("_id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .collect();

        Ok(InsertResult {
            collection: self.collection,
            inserted,
            ids,
        })
    }
}
