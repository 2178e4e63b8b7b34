//! Connection-level entry point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info, warn};

use super::collection::{document_id, Collection, CollectionObserver};
use super::id::{IdGenerator, ObjectIdGenerator};
use super::Store;
use crate::db::{open_connection, Connection, DatabaseConfig, DbError, Document, SchemaManager};
use crate::queries::builder::compilers::{grammar_for, parse_server_version, Dialect};
use crate::queries::builder::QueryBuilder;
use crate::queries::filter::{Filter, FindOptions, FindQuery};

/// Collection handles keyed by id.
#[derive(Default)]
struct CollectionCache {
    collections: Mutex<HashMap<String, Arc<Collection>>>,
}

impl CollectionObserver for CollectionCache {
    fn collection_dropped(&self, id: &str) {
        if let Ok(mut collections) = self.collections.lock() {
            collections.remove(id);
        }
    }

    fn collection_renamed(&self, from: &str, to: &str) {
        if let Ok(mut collections) = self.collections.lock() {
            if let Some(collection) = collections.remove(from) {
                collections.insert(to.to_string(), collection);
            }
        }
    }
}

/// Entry point: owns the connection, the dialect and the handle cache.
///
/// ```ignore
/// let driver = Driver::connect(&DatabaseConfig::from_url("postgres://localhost/app")?)?;
/// let posts = driver.get_collection("posts", Some("blog"))?;
/// let recent = posts.find(Filter::from_value(json!({"_o": {"$gt": 1}}))?, FindOptions::new())?;
/// ```
pub struct Driver {
    dialect: Dialect,
    store: Arc<Store>,
    cache: Arc<CollectionCache>,
}

impl Driver {
    /// Wrap an open connection, using ObjectId-style `_id` generation.
    ///
    /// # Errors
    /// `DbError::UnsupportedServer` when the server is older than the dialect
    /// supports (MySQL 8.0.4, PostgreSQL 9.4) or is MariaDB.
    pub fn new(connection: Box<dyn Connection>, dialect: Dialect) -> Result<Self, DbError> {
        Self::with_id_generator(connection, dialect, Box::new(ObjectIdGenerator::new()))
    }

    pub fn with_id_generator(
        mut connection: Box<dyn Connection>,
        dialect: Dialect,
        ids: Box<dyn IdGenerator>,
    ) -> Result<Self, DbError> {
        let grammar = grammar_for(dialect);
        check_server_version(connection.as_mut(), dialect)?;

        for statement in grammar.session_init_sql() {
            connection.execute(&statement, &[])?;
        }

        info!(dialect = %dialect, backend = connection.backend_name(), "Connected");
        let store = Store::new(
            connection,
            QueryBuilder::new(Arc::clone(&grammar)),
            SchemaManager::new(grammar),
            ids,
        );

        Ok(Self {
            dialect,
            store: Arc::new(store),
            cache: Arc::new(CollectionCache::default()),
        })
    }

    /// Open a connection described by `config` and wrap it.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let connection = open_connection(config)?;
        Self::new(connection, config.dialect)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Compile `filter` up front so a bad filter fails before any SQL is sent.
    fn validate(&self, filter: &Filter) -> Result<(), DbError> {
        self.store.builder().build_where(filter).map(|_| ())
    }

    /// Cached handle for `id` without touching the schema.
    fn handle(&self, id: &str) -> Result<Arc<Collection>, DbError> {
        let mut collections = self.cache.collections.lock()?;
        if let Some(collection) = collections.get(id) {
            return Ok(Arc::clone(collection));
        }

        let weak: Weak<CollectionCache> = Arc::downgrade(&self.cache);
        let observer: Weak<dyn CollectionObserver> = weak;
        let collection = Arc::new(Collection::new(
            id.to_string(),
            Arc::clone(&self.store),
            observer,
        ));
        collections.insert(id.to_string(), Arc::clone(&collection));
        Ok(collection)
    }

    /// Get or create the collection with the full id `id`.
    ///
    /// The table's existence is checked on every call and it is created when
    /// missing, so a table dropped behind the driver's back comes back empty.
    pub fn collection(&self, id: &str) -> Result<Arc<Collection>, DbError> {
        let collection = self.handle(id)?;
        if self.store.ensure_table(id)? {
            debug!(collection = id, "Bootstrapped collection");
        }
        Ok(collection)
    }

    /// Get or create `name`, namespaced as `db/name` when `db` is given.
    pub fn get_collection(&self, name: &str, db: Option<&str>) -> Result<Arc<Collection>, DbError> {
        match db {
            Some(db) => self.collection(&format!("{}/{}", db, name)),
            None => self.collection(name),
        }
    }

    pub fn drop_collection(&self, id: &str) -> Result<(), DbError> {
        self.handle(id)?.drop_collection()
    }

    pub fn rename_collection(&self, id: &str, new_id: &str) -> Result<(), DbError> {
        self.handle(id)?.rename(new_id)
    }

    pub fn find(&self, id: &str, query: FindQuery) -> Result<Vec<Document>, DbError> {
        let (filter, options) = query.into_parts();
        self.validate(&filter)?;
        self.collection(id)?.find(filter, options)?.to_array()
    }

    pub fn find_one(
        &self,
        id: &str,
        filter: Filter,
        projection: Option<Document>,
    ) -> Result<Option<Document>, DbError> {
        self.validate(&filter)?;
        self.collection(id)?.find_one(filter, projection)
    }

    pub fn find_one_by_id(&self, id: &str, doc_id: &str) -> Result<Option<Document>, DbError> {
        self.find_one(id, Filter::by_id(doc_id), None)
    }

    pub fn insert(&self, id: &str, document: &mut Document) -> Result<(), DbError> {
        self.collection(id)?.insert_one(document)
    }

    pub fn insert_many(&self, id: &str, documents: &mut [Document]) -> Result<u64, DbError> {
        self.collection(id)?.insert_many(documents)
    }

    pub fn save(&self, id: &str, document: &mut Document) -> Result<(), DbError> {
        self.collection(id)?.save(document)
    }

    /// Merge `data` into every matching document.
    pub fn update(&self, id: &str, filter: Filter, data: &Document) -> Result<u64, DbError> {
        self.validate(&filter)?;
        self.collection(id)?.update_many(filter, data, true)
    }

    pub fn remove(&self, id: &str, filter: &Filter) -> Result<u64, DbError> {
        self.validate(filter)?;
        self.collection(id)?.delete_many(filter)
    }

    pub fn count(&self, id: &str, filter: &Filter) -> Result<u64, DbError> {
        self.validate(filter)?;
        self.collection(id)?.count(filter)
    }

    /// Remove top-level `field` from every matching document that has it.
    pub fn remove_field(&self, id: &str, field: &str, filter: Filter) -> Result<u64, DbError> {
        self.rewrite_matching(id, filter, |document| {
            document.shift_remove(field).is_some()
        })
    }

    /// Rename top-level `field` to `new_field` in every matching document that has it.
    ///
    /// An existing `new_field` is overwritten.
    pub fn rename_field(
        &self,
        id: &str,
        field: &str,
        new_field: &str,
        filter: Filter,
    ) -> Result<u64, DbError> {
        self.rewrite_matching(id, filter, |document| match document.shift_remove(field) {
            Some(value) => {
                document.insert(new_field.to_string(), value);
                true
            }
            None => false,
        })
    }

    fn rewrite_matching<F>(&self, id: &str, filter: Filter, mut rewrite: F) -> Result<u64, DbError>
    where
        F: FnMut(&mut Document) -> bool,
    {
        self.validate(&filter)?;
        let collection = self.collection(id)?;
        let mut rewritten = 0;

        for mut document in collection.find(filter, FindOptions::new())?.to_array()? {
            let Some(doc_id) = document_id(&document) else {
                continue;
            };
            if rewrite(&mut document) {
                rewritten += collection.overwrite(&doc_id, &document)?;
            }
        }
        Ok(rewritten)
    }
}

fn check_server_version(connection: &mut dyn Connection, dialect: Dialect) -> Result<(), DbError> {
    let grammar = grammar_for(dialect);
    let reported = connection
        .query_scalar(grammar.server_version_sql())?
        .ok_or_else(|| DbError::UnsupportedServer {
            message: "server did not report a version".to_string(),
        })?;

    if dialect == Dialect::Mysql && reported.to_ascii_lowercase().contains("mariadb") {
        warn!(version = %reported, "MariaDB is not supported");
        return Err(DbError::UnsupportedServer {
            message: format!("MariaDB is not supported (server reports {})", reported),
        });
    }

    let version = parse_server_version(&reported).ok_or_else(|| DbError::UnsupportedServer {
        message: format!("unrecognised server version {:?}", reported),
    })?;
    let (major, minor, patch) = grammar.min_server_version();
    if version < (major, minor, patch) {
        warn!(version = %reported, "Server version below minimum");
        return Err(DbError::UnsupportedServer {
            message: format!(
                "{} {}.{}.{} or newer is required, server reports {}",
                dialect, major, minor, patch, reported
            ),
        });
    }
    Ok(())
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("dialect", &self.dialect).finish()
    }
}
