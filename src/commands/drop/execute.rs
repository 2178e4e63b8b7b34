use std::error::Error;

use serde::Serialize;

use super::DropCmd;
use crate::commands::Execute;
use crate::store::Driver;

/// Result of the drop command execution
#[derive(Debug, Serialize)]
pub struct DropResult {
    pub collection: String,
    pub dropped: bool,
}

impl Execute for DropCmd {
    type Output = DropResult;

    fn execute(self, driver: &Driver) -> Result<Self::Output, Box<dyn Error>> {
        driver.drop_collection(&self.collection)?;
        Ok(DropResult {
            collection: self.collection,
            dropped: true,
        })
    }
}
