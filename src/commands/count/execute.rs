use std::error::Error;

use serde::Serialize;

use super::CountCmd;
use crate::commands::{parse_filter_arg, Execute};
use crate::store::Driver;

/// Result of the count command execution
#[derive(Debug, Serialize)]
pub struct CountResult {
    pub collection: String,
    pub count: u64,
}

impl Execute for CountCmd {
    type Output = CountResult;

    fn execute(self, driver: &Driver) -> Result<Self::Output, Box<dyn Error>> {
        let filter = parse_filter_arg(&self.filter)?;
        let count = driver.count(&self.collection, &filter)?;
        Ok(CountResult {
            collection: self.collection,
            count,
        })
    }
}
