use std::error::Error;

use serde::Serialize;

use super::RemoveCmd;
use crate::commands::{parse_filter_arg, Execute};
use crate::store::Driver;

/// Result of the remove command execution
#[derive(Debug, Serialize)]
pub struct RemoveResult {
    pub collection: String,
    pub removed: u64,
}

impl Execute for RemoveCmd {
    type Output = RemoveResult;

    fn execute(self, driver: &Driver) -> Result<Self::Output, Box<dyn Error>> {
        let filter = parse_filter_arg(&self.filter)?;
        let removed = driver.remove(&self.collection, &filter)?;
        Ok(RemoveResult {
            collection: self.collection,
            removed,
        })
    }
}
