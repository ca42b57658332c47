use crate::error::StoreError;
use crate::facade::{Document, DocumentStore, Filter, ID_FIELD, StoreInspector};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params, params_from_iter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use uuid::Uuid;

pub fn open(db_path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
          id TEXT PRIMARY KEY,
          collection TEXT NOT NULL,
          body_json TEXT NOT NULL,
          created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
        "#,
    )?;
    Ok(())
}

/// Location and logical name of the SQLite database backing the site.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    name: String,
}

impl Database {
    /// `url` is a filesystem path, optionally prefixed with `sqlite://` or
    /// `sqlite:`. Without an explicit `name` the file stem is used.
    pub fn new(url: &str, name: Option<&str>) -> Self {
        let raw = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        let path = PathBuf::from(raw);
        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| raw.to_string()),
        };
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        open(&self.path)
    }

    /// Opens the database for reading without creating the file or schema.
    /// `None` means nothing has been written yet.
    fn connect_existing(&self) -> Result<Option<Connection>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let has_table = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
                [],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(has_table.then_some(conn))
    }
}

/// Document store over SQLite. Each operation opens its own connection, so
/// nothing is shared between requests. Without a configured [`Database`] every
/// call fails with [`StoreError::NotConfigured`].
#[derive(Debug, Clone, Default)]
pub struct SqliteDocuments {
    database: Option<Database>,
}

impl SqliteDocuments {
    pub fn new(database: Option<Database>) -> Self {
        Self { database }
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    fn configured(&self) -> Result<&Database, StoreError> {
        self.database.as_ref().ok_or(StoreError::NotConfigured)
    }
}

impl DocumentStore for SqliteDocuments {
    fn get_documents(
        &self,
        collection: &str,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        let Some(conn) = self.configured()?.connect_existing()? else {
            return Ok(Vec::new());
        };

        let mut sql = String::from("SELECT id, body_json FROM documents WHERE collection = ?");
        let mut args: Vec<SqlValue> = vec![SqlValue::Text(collection.to_string())];
        for (key, value) in filter {
            push_condition(&mut sql, &mut args, key, value)?;
        }
        sql.push_str(" ORDER BY created_at, rowid LIMIT ?");
        args.push(SqlValue::Integer(i64::from(limit)));

        debug!("querying `{collection}` with {} filter terms", filter.len());

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for r in rows {
            let (id, body_json) = r?;
            let mut doc = match serde_json::from_str::<Value>(&body_json)? {
                Value::Object(map) => map,
                _ => return Err(StoreError::MalformedDocument(id)),
            };
            doc.insert(ID_FIELD.to_string(), Value::String(id));
            docs.push(doc);
        }
        Ok(docs)
    }

    fn create_document(&self, collection: &str, mut record: Document) -> Result<String, StoreError> {
        let conn = self.configured()?.connect()?;

        record.remove(ID_FIELD);
        let id = Uuid::new_v4().to_string();
        let body_json = serde_json::to_string(&record)?;
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO documents (id, collection, body_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![id, collection, body_json, created_at],
        )?;

        debug!("stored document `{id}` in `{collection}`");
        Ok(id)
    }
}

impl StoreInspector for SqliteDocuments {
    fn database_name(&self) -> Result<Option<String>, StoreError> {
        Ok(self.database.as_ref().map(|db| db.name().to_string()))
    }

    fn list_collection_names(&self) -> Result<Vec<String>, StoreError> {
        let Some(conn) = self.configured()?.connect_existing()? else {
            return Ok(Vec::new());
        };
        let mut stmt =
            conn.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Appends one equality term. Keys become JSON paths, so only plain
/// identifiers are accepted.
fn push_condition(
    sql: &mut String,
    args: &mut Vec<SqlValue>,
    key: &str,
    value: &Value,
) -> Result<(), StoreError> {
    let valid_key =
        !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_key {
        return Err(StoreError::InvalidFilterKey(key.to_string()));
    }

    let column = format!("json_extract(body_json, '$.{key}')");
    match value {
        Value::Null => {
            sql.push_str(&format!(" AND {column} IS NULL"));
        }
        // json_extract yields 1/0 for JSON booleans
        Value::Bool(b) => {
            sql.push_str(&format!(" AND {column} = ?"));
            args.push(SqlValue::Integer(i64::from(*b)));
        }
        Value::Number(n) => {
            sql.push_str(&format!(" AND {column} = ?"));
            if let Some(i) = n.as_i64() {
                args.push(SqlValue::Integer(i));
            } else if let Some(f) = n.as_f64() {
                args.push(SqlValue::Real(f));
            } else {
                return Err(StoreError::UnsupportedFilterValue(key.to_string()));
            }
        }
        Value::String(s) => {
            sql.push_str(&format!(" AND {column} = ?"));
            args.push(SqlValue::Text(s.clone()));
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::UnsupportedFilterValue(key.to_string()));
        }
    }
    Ok(())
}
