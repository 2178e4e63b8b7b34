use std::error::Error;

use serde::Serialize;

use super::FindCmd;
use crate::commands::{parse_filter_arg, parse_object_arg, parse_sort_arg, Execute};
use crate::db::Document;
use crate::queries::FindQuery;
use crate::store::Driver;

/// Result of the find command execution
#[derive(Debug, Default, Serialize)]
pub struct FindResult {
    pub collection: String,
    pub count: usize,
    pub documents: Vec<Document>,
}

impl Execute for FindCmd {
    type Output = FindResult;

    fn execute(self, driver: &Driver) -> Result<Self::Output, Box<dyn Error>> {
        let mut query = FindQuery::new(parse_filter_arg(&self.filter)?);
        query.fields = self
            .fields
            .as_deref()
            .map(|text| parse_object_arg("--fields", text))
            .transpose()?;
        query.sort = parse_sort_arg(self.sort.as_deref())?;
        query.limit = Some(self.limit);
        query.skip = Some(self.skip);

        let documents = driver.find(&self.collection, query)?;
        Ok(FindResult {
            collection: self.collection,
            count: documents.len(),
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::builder::compilers::Dialect;
    use crate::test_utils::fixture_driver;
    use rstest::rstest;
    use serde_json::json;

    fn find_cmd(filter: &str) -> FindCmd {
        FindCmd {
            collection: "posts".to_string(),
            filter: filter.to_string(),
            fields: None,
            sort: None,
            limit: 0,
            skip: 0,
        }
    }

    crate::execute_test! {
        test_name: test_find_all,
        dialect: Postgres,
        cmd: find_cmd("{}"),
        assertions: |result| {
            assert_eq!(result.collection, "posts");
            assert_eq!(result.count, 2);
            assert_eq!(result.documents[0]["content"], json!("Lorem ipsum"));
        },
    }

    crate::execute_test! {
        test_name: test_find_with_projection,
        dialect: Mysql,
        cmd: FindCmd {
            fields: Some(r#"{"_o": 1, "_id": 0}"#.to_string()),
            ..find_cmd("{}")
        },
        assertions: |result| {
            assert_eq!(result.documents[0], crate::test_utils::doc(json!({"_o": 1})));
        },
    }

    crate::execute_error_test! {
        test_name: test_find_rejects_unknown_operator,
        dialect: Postgres,
        cmd: find_cmd(r#"{"a": {"$near": 1}}"#),
    }

    crate::execute_error_test! {
        test_name: test_find_rejects_invalid_json,
        dialect: Mysql,
        cmd: find_cmd("{"),
    }

    #[rstest]
    fn test_find_compiles_filter_sort_and_limit() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let cmd = FindCmd {
            sort: Some(r#"{"_o": -1}"#.to_string()),
            limit: 5,
            skip: 1,
            ..find_cmd(r#"{"content": {"$regex": "lorem"}}"#)
        };
        cmd.execute(&driver).unwrap();

        assert!(stub.statements().contains(
            &"SELECT `document` FROM `posts` \
              WHERE REGEXP_LIKE(`document` ->> '$.content', 'lorem', 'i') \
              ORDER BY `document` -> '$._o' DESC LIMIT 5 OFFSET 1"
                .to_string()
        ));
    }
}
