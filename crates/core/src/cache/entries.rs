//! Entry CRUD operations.
//!
//! Entries are whole response snapshots. Writes replace an existing entry for
//! the same key (last write wins); nothing is ever patched in place.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::hash::request_key;
use crate::{Error, Request, Response};
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use tokio_rusqlite::params;

/// Owned column values for one entry, ready to move into a database call.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            key_hash: request_key(request),
            method: request.method.clone(),
            url: request.url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM stores WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

fn upsert(conn: &rusqlite::Connection, store_id: i64, row: &EntryRow, stored_at: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (
            store_id, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store_id, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store_id,
            &row.key_hash,
            &row.method,
            &row.url,
            row.status,
            &row.status_text,
            &row.headers_json,
            &row.body,
            stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response for a request, creating the store if needed.
    pub async fn put_entry(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let row = EntryRow::new(request, response)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let store_id = ensure_store(conn, &store)?;
                upsert(conn, store_id, &row, &chrono::Utc::now().to_rfc3339())
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of entries atomically.
    ///
    /// The store is created inside the same transaction, so a failed batch
    /// leaves neither the entries nor a newly created store behind.
    pub async fn put_entries(&self, store: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let store = store.to_string();
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::new(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let stored_at = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &store)?;
                for row in &rows {
                    upsert(&tx, store_id, row, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up.
    ///
    /// With `store = None` every store is searched in creation order and the
    /// first hit wins.
    pub async fn match_entry(&self, request: &Request, store: Option<&str>) -> Result<Option<Response>, Error> {
        let key_hash = request_key(request);
        let store = store.map(str::to_string);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.status_text, e.headers_json, e.body
                    FROM entries e JOIN stores s ON s.id = e.store_id
                    WHERE e.key_hash = ?1 AND (?2 IS NULL OR s.name = ?2)
                    ORDER BY s.id ASC
                    LIMIT 1",
                )?;

                let row = stmt
                    .query_row(params![key_hash, store], |row| {
                        Ok((
                            row.get::<_, u16>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Vec<u8>>(3)?,
                        ))
                    })
                    .optional()?;

                let Some((status, status_text, headers_json, body)) = row else {
                    return Ok(None);
                };
                let headers: BTreeMap<String, String> = serde_json::from_str(&headers_json)?;

                Ok(Some(Response { status, status_text, headers, body: body.into() }))
            })
            .await
            .map_err(Error::from)
    }
}
