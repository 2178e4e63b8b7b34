//! A named set of documents stored in one table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde_json::Value;
use tracing::{debug, info};

use super::cursor::Cursor;
use super::Store;
use crate::db::{encode_document, DbError, Document};
use crate::queries::filter::{Filter, FindOptions};

/// Notified when a collection's table goes away or changes name, so handle
/// caches can stay consistent.
pub trait CollectionObserver: Send + Sync {
    fn collection_dropped(&self, id: &str);
    fn collection_renamed(&self, from: &str, to: &str);
}

/// Handle to one collection.
///
/// Handles are shared (`Arc<Collection>`) and cached by the driver. After
/// `drop` every operation on the handle fails with
/// `DbError::CollectionDropped`.
pub struct Collection {
    id: RwLock<String>,
    store: Arc<Store>,
    observer: Weak<dyn CollectionObserver>,
    dropped: AtomicBool,
}

/// The `_id` of a document as it appears in SQL, if it has a usable one.
pub(crate) fn document_id(document: &Document) -> Option<String> {
    match document.get("_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Rebuild `document` with `_id` as its first key.
fn with_leading_id(mut document: Document, id: Value) -> Document {
    document.shift_remove("_id");
    let mut rebuilt = Document::new();
    rebuilt.insert("_id".to_string(), id);
    rebuilt.extend(document);
    rebuilt
}

impl Collection {
    pub(crate) fn new(id: String, store: Arc<Store>, observer: Weak<dyn CollectionObserver>) -> Self {
        Self {
            id: RwLock::new(id),
            store,
            observer,
            dropped: AtomicBool::new(false),
        }
    }

    /// The collection id, which is also its table name.
    pub fn id(&self) -> String {
        self.id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::Acquire)
    }

    fn table(&self) -> Result<String, DbError> {
        let id = self.id();
        if self.is_dropped() {
            return Err(DbError::CollectionDropped { collection: id });
        }
        Ok(id)
    }

    /// Compile `filter` now and return a cursor that runs it on first use.
    pub fn find(&self, filter: Filter, options: FindOptions) -> Result<Cursor, DbError> {
        let table = self.table()?;
        let sql = self.store.builder().build_select(&table, &filter, &options)?;
        Ok(Cursor::new(Arc::clone(&self.store), sql, filter, &options))
    }

    /// First matching document, if any.
    pub fn find_one(
        &self,
        filter: Filter,
        projection: Option<Document>,
    ) -> Result<Option<Document>, DbError> {
        let mut options = FindOptions::new().limit(1);
        options.projection = projection;
        self.find(filter, options)?.next().transpose()
    }

    /// Number of matching documents.
    ///
    /// Criteria filters count in SQL; predicate filters scan and count matches.
    pub fn count(&self, filter: &Filter) -> Result<u64, DbError> {
        if filter.is_predicate() {
            let mut matched = 0;
            for document in self.find(filter.clone(), FindOptions::new())? {
                document?;
                matched += 1;
            }
            return Ok(matched);
        }

        let table = self.table()?;
        let sql = self.store.builder().build_count(&table, filter)?;
        let count = self.store.query_scalar(&sql)?.unwrap_or_default();
        count.trim().parse().map_err(|_| DbError::QueryFailed {
            message: format!("COUNT(*) returned {:?}", count),
        })
    }

    /// Insert one document, assigning `_id` when it has none.
    pub fn insert_one(&self, document: &mut Document) -> Result<(), DbError> {
        let table = self.table()?;
        if document_id(document).is_none() {
            let id = Value::String(self.store.next_id());
            *document = with_leading_id(std::mem::take(document), id);
        }

        let encoded = encode_document(document)?;
        self.store
            .execute(&self.store.builder().build_insert(&table), &[&encoded])?;
        Ok(())
    }

    /// Insert documents one at a time; stops at the first failure.
    pub fn insert_many(&self, documents: &mut [Document]) -> Result<u64, DbError> {
        let mut inserted = 0;
        for document in documents.iter_mut() {
            self.insert_one(document)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Rewrite every matching document.
    ///
    /// With `merge`, top-level fields of `data` overwrite the stored ones;
    /// otherwise `data` replaces the document. `_id` never changes. Returns the
    /// number of documents rewritten.
    pub fn update_many(&self, filter: Filter, data: &Document, merge: bool) -> Result<u64, DbError> {
        let documents = self.find(filter, FindOptions::new())?.to_array()?;
        let mut updated = 0;

        for mut document in documents {
            let Some(id) = document_id(&document) else {
                continue;
            };
            let original_id = document.get("_id").cloned().unwrap_or(Value::Null);

            if merge {
                for (key, value) in data {
                    document.insert(key.clone(), value.clone());
                }
                document.insert("_id".to_string(), original_id);
            } else {
                document = with_leading_id(data.clone(), original_id);
            }

            updated += self.overwrite(&id, &document)?;
        }

        debug!(collection = %self.id(), updated, "update_many");
        Ok(updated)
    }

    /// Insert the document, or overwrite the stored one with the same `_id`.
    pub fn save(&self, document: &mut Document) -> Result<(), DbError> {
        let Some(id) = document_id(document) else {
            return self.insert_one(document);
        };

        let table = self.table()?;
        let exists = !self
            .store
            .query(&self.store.builder().build_exists_by_id(&table, &id))?
            .is_empty();

        if exists {
            self.overwrite(&id, document)?;
            Ok(())
        } else {
            self.insert_one(document)
        }
    }

    /// Replace the stored document whose `_id` is `id`.
    pub(crate) fn overwrite(&self, id: &str, document: &Document) -> Result<u64, DbError> {
        let table = self.table()?;
        let encoded = encode_document(document)?;
        self.store
            .execute(&self.store.builder().build_update_by_id(&table, id), &[&encoded])
    }

    /// Delete every matching document, returning how many went away.
    pub fn delete_many(&self, filter: &Filter) -> Result<u64, DbError> {
        let table = self.table()?;

        if !filter.is_predicate() {
            let sql = self.store.builder().build_delete(&table, filter)?;
            return self.store.execute(&sql, &[]);
        }

        let mut deleted = 0;
        for document in self.find(filter.clone(), FindOptions::new())?.to_array()? {
            if let Some(id) = document_id(&document) {
                deleted += self
                    .store
                    .execute(&self.store.builder().build_delete_by_id(&table, &id), &[])?;
            }
        }
        Ok(deleted)
    }

    /// Drop the backing table. The handle is unusable afterwards.
    pub fn drop_collection(&self) -> Result<(), DbError> {
        let table = self.table()?;
        self.store.drop_table(&table)?;
        self.dropped.store(true, Ordering::Release);

        if let Some(observer) = self.observer.upgrade() {
            observer.collection_dropped(&table);
        }
        Ok(())
    }

    /// Rename the backing table; the handle follows the new id.
    pub fn rename(&self, new_id: &str) -> Result<(), DbError> {
        let old_id = self.table()?;
        if old_id == new_id {
            return Ok(());
        }

        self.store.rename_table(&old_id, new_id)?;
        *self.id.write()? = new_id.to_string();
        info!(from = %old_id, to = new_id, "Renamed collection");

        if let Some(observer) = self.observer.upgrade() {
            observer.collection_renamed(&old_id, new_id);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id())
            .field("dropped", &self.is_dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::builder::compilers::Dialect;
    use crate::test_utils::{doc, fixture_driver};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Dialect::Mysql)]
    #[case(Dialect::Postgres)]
    fn test_insert_one_assigns_id_first(#[case] dialect: Dialect) {
        let (driver, stub) = fixture_driver(dialect, "posts");
        let collection = driver.collection("posts").unwrap();

        let mut document = doc(json!({"content": "new"}));
        collection.insert_one(&mut document).unwrap();

        let id = document["_id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);
        assert_eq!(document.keys().next().map(String::as_str), Some("_id"));
        assert!(stub.documents("posts").iter().any(|d| d["_id"] == json!(id)));
    }

    #[test]
    fn test_insert_one_keeps_given_id() {
        let (driver, stub) = fixture_driver(Dialect::Postgres, "posts");
        let collection = driver.collection("posts").unwrap();

        let mut document = doc(json!({"_id": "given", "content": "new"}));
        collection.insert_one(&mut document).unwrap();

        let recorded = stub.recorded();
        let insert = recorded.iter().find(|r| r.sql.starts_with("INSERT")).unwrap();
        assert_eq!(
            insert.sql,
            "INSERT INTO \"posts\" (\"document\") VALUES ($1::text::jsonb)"
        );
        assert_eq!(insert.params, vec![r#"{"_id":"given","content":"new"}"#.to_string()]);
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let (driver, _stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        let mut document = doc(json!({"_id": "000000000000000000000001"}));
        assert!(matches!(
            collection.insert_one(&mut document),
            Err(DbError::QueryFailed { .. })
        ));
    }

    #[test]
    fn test_insert_many_counts() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        let mut documents = vec![doc(json!({"n": 1})), doc(json!({"n": 2}))];
        assert_eq!(collection.insert_many(&mut documents).unwrap(), 2);
        assert_eq!(stub.documents("posts").len(), 4);
        assert_ne!(documents[0]["_id"], documents[1]["_id"]);
    }

    #[rstest]
    #[case(Dialect::Mysql)]
    #[case(Dialect::Postgres)]
    fn test_count_criteria_uses_sql(#[case] dialect: Dialect) {
        let (driver, stub) = fixture_driver(dialect, "posts");
        let collection = driver.collection("posts").unwrap();
        assert_eq!(collection.count(&Filter::all()).unwrap(), 2);
        assert_eq!(stub.count_starting_with("SELECT COUNT(*)"), 1);
    }

    #[test]
    fn test_count_predicate_scans() {
        let (driver, stub) = fixture_driver(Dialect::Postgres, "posts");
        let collection = driver.collection("posts").unwrap();
        let filter = Filter::predicate(|d| d["_o"] == json!(2));
        assert_eq!(collection.count(&filter).unwrap(), 1);
        assert_eq!(stub.count_starting_with("SELECT COUNT(*)"), 0);
    }

    #[test]
    fn test_find_one_projects() {
        let (driver, _stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        let found = collection
            .find_one(Filter::all(), Some(doc(json!({"content": 1}))))
            .unwrap();
        assert_eq!(
            found,
            Some(doc(json!({"_id": "000000000000000000000001", "content": "Lorem ipsum"})))
        );
    }

    #[test]
    fn test_update_many_merges_and_keeps_id() {
        let (driver, stub) = fixture_driver(Dialect::Postgres, "posts");
        let collection = driver.collection("posts").unwrap();

        let data = doc(json!({"_id": "hijack", "content": "changed", "extra": true}));
        let updated = collection
            .update_many(Filter::predicate(|d| d["_o"] == json!(1)), &data, true)
            .unwrap();
        assert_eq!(updated, 1);

        let stored = stub.documents("posts");
        assert_eq!(
            stored[0],
            doc(json!({
                "_id": "000000000000000000000001",
                "content": "changed",
                "array": ["foo"],
                "_o": 1,
                "extra": true
            }))
        );
        assert_eq!(stored[1]["content"], json!("Etiam tempor"));
    }

    #[test]
    fn test_update_many_replace() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();

        let data = doc(json!({"content": "only"}));
        collection
            .update_many(Filter::predicate(|d| d["_o"] == json!(2)), &data, false)
            .unwrap();

        assert_eq!(
            stub.documents("posts")[1],
            doc(json!({"_id": "000000000000000000000002", "content": "only"}))
        );
    }

    #[test]
    fn test_save_without_id_inserts() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        let mut document = doc(json!({"content": "fresh"}));
        collection.save(&mut document).unwrap();
        assert!(document.contains_key("_id"));
        assert_eq!(stub.count_starting_with("SELECT 1 "), 0);
        assert_eq!(stub.documents("posts").len(), 3);
    }

    #[test]
    fn test_save_existing_id_overwrites() {
        let (driver, stub) = fixture_driver(Dialect::Postgres, "posts");
        let collection = driver.collection("posts").unwrap();
        let mut document = doc(json!({"_id": "000000000000000000000002", "content": "saved"}));
        collection.save(&mut document).unwrap();

        assert_eq!(stub.count_starting_with("UPDATE"), 1);
        assert_eq!(stub.count_starting_with("INSERT"), 0);
        assert_eq!(stub.documents("posts")[1], document);
        assert_eq!(stub.documents("posts").len(), 2);
    }

    #[test]
    fn test_save_unknown_id_inserts_with_that_id() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        let mut document = doc(json!({"_id": "custom", "content": "saved"}));
        collection.save(&mut document).unwrap();

        assert_eq!(stub.count_starting_with("INSERT"), 1);
        assert!(stub.documents("posts").iter().any(|d| d["_id"] == json!("custom")));
    }

    #[test]
    fn test_delete_many_criteria_is_one_statement() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        stub.clear_log();
        assert_eq!(collection.delete_many(&Filter::all()).unwrap(), 2);
        assert_eq!(stub.statements(), vec!["DELETE FROM `posts`".to_string()]);
    }

    #[test]
    fn test_delete_many_predicate_deletes_by_id() {
        let (driver, stub) = fixture_driver(Dialect::Postgres, "posts");
        let collection = driver.collection("posts").unwrap();
        let deleted = collection
            .delete_many(&Filter::predicate(|d| d["_o"] == json!(1)))
            .unwrap();
        assert_eq!(deleted, 1);
        let remaining = stub.documents("posts");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["_o"], json!(2));
    }

    #[test]
    fn test_dropped_handle_rejects_operations() {
        let (driver, stub) = fixture_driver(Dialect::Mysql, "posts");
        let collection = driver.collection("posts").unwrap();
        collection.drop_collection().unwrap();

        assert!(collection.is_dropped());
        assert!(!stub.has_table("posts"));
        assert!(matches!(
            collection.count(&Filter::all()),
            Err(DbError::CollectionDropped { collection }) if collection == "posts"
        ));
        assert!(matches!(
            collection.find(Filter::all(), FindOptions::new()),
            Err(DbError::CollectionDropped { .. })
        ));
    }

    #[test]
    fn test_rename_follows_new_id() {
        let (driver, stub) = fixture_driver(Dialect::Postgres, "posts");
        let collection = driver.collection("posts").unwrap();
        collection.rename("articles").unwrap();

        assert_eq!(collection.id(), "articles");
        assert!(stub.has_table("articles"));
        assert_eq!(collection.count(&Filter::all()).unwrap(), 2);
    }
}
