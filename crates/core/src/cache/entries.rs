//! Store and entry operations on the SQLite backend.
//!
//! Stores are created on demand by writes, listed in creation order and
//! deleted together with their entries.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use super::response::HttpResponse;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

type EntryRow = (String, i64, String, Vec<u8>);

fn decode_entry((url, status, headers_json, body): EntryRow) -> Result<HttpResponse, Error> {
    let status =
        u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} out of range for {url}")))?;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(HttpResponse::new(url, status, headers, body))
}

fn read_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (store, key_hash, url, status, headers_json, body, stored_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(store, key_hash) DO UPDATE SET
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

const ENSURE_STORE: &str = "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)";

/// An entry ready to be written: request URL, key and encoded response.
struct EncodedEntry {
    request_url: String,
    key_hash: String,
    url: String,
    status: i64,
    headers_json: String,
    body: bytes::Bytes,
}

impl EncodedEntry {
    fn encode(request_url: &str, response: &HttpResponse) -> Result<Self, Error> {
        Ok(Self {
            request_url: request_url.to_string(),
            key_hash: compute_request_key(request_url),
            url: response.url.clone(),
            status: i64::from(response.status),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.clone(),
        })
    }

    fn write(&self, conn: &rusqlite::Connection, store: &str, now: &str) -> Result<(), Error> {
        conn.execute(
            UPSERT_ENTRY,
            params![store, &self.key_hash, &self.url, self.status, &self.headers_json, &self.body[..], now],
        )?;
        tracing::trace!(store, url = %self.request_url, "entry written");
        Ok(())
    }
}

impl CacheDb {
    /// Create a store if it does not exist yet.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(ENSURE_STORE, params![name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List store names in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false if the store did not exist.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for a GET of `url` in one store.
    pub async fn get_entry(&self, store: &str, url: &str) -> Result<Option<HttpResponse>, Error> {
        let store = store.to_string();
        let key_hash = compute_request_key(url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT url, status, headers_json, body FROM entries WHERE store = ?1 AND key_hash = ?2",
                        params![store, key_hash],
                        read_entry_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }

    /// Look up the entry for a GET of `url` in every store, oldest store first.
    pub async fn find_entry(&self, url: &str) -> Result<Option<HttpResponse>, Error> {
        let key_hash = compute_request_key(url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.url, e.status, e.headers_json, e.body
                         FROM entries e JOIN stores s ON s.name = e.store
                         WHERE e.key_hash = ?1
                         ORDER BY s.rowid
                         LIMIT 1",
                        params![key_hash],
                        read_entry_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }

    /// Insert or overwrite the entry for a GET of `url`, creating the store if needed.
    pub async fn put_entry(&self, store: &str, url: &str, response: &HttpResponse) -> Result<(), Error> {
        let store = store.to_string();
        let entry = EncodedEntry::encode(url, response)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(ENSURE_STORE, params![&store, &now])?;
                entry.write(&tx, &store, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries in a single transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_entries(&self, store: &str, entries: &[(String, HttpResponse)]) -> Result<(), Error> {
        let store = store.to_string();
        let encoded = entries
            .iter()
            .map(|(url, response)| EncodedEntry::encode(url, response))
            .collect::<Result<Vec<_>, _>>()?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(ENSURE_STORE, params![&store, &now])?;
                for entry in &encoded {
                    entry.write(&tx, &store, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store (0 for a missing store).
    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
