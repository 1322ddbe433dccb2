//! MySQL row store over a single short-lived connection.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError};
use sqlx::{Connection, Row};
use tracing::debug;

use super::{RowStore, StoreConnector, StoreError};
use crate::config::ServiceConfig;
use crate::models::{ReservationRecord, TableName};

/// ER_TABLE_EXISTS_ERROR
const ER_TABLE_EXISTS: u16 = 1050;
/// ER_NO_SUCH_TABLE
const ER_NO_SUCH_TABLE: u16 = 1146;

const DATA_COLUMNS: &str =
    "reservationid, startdatetime, enddatetime, pickuplocation, reservationtitle, accesscode";

/// Opens one `MySqlStore` per invocation from discrete credential fields.
#[derive(Clone)]
pub struct MySqlConnector {
    options: MySqlConnectOptions,
    target: String,
    connect_timeout: Duration,
}

impl MySqlConnector {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.mysql_host)
            .port(config.mysql_port)
            .username(&config.mysql_user)
            .password(&config.mysql_pass)
            .database(&config.mysql_db);

        Self {
            options,
            target: config.redacted_dsn(),
            connect_timeout: config.connect_timeout,
        }
    }
}

#[async_trait]
impl StoreConnector for MySqlConnector {
    type Store = MySqlStore;

    async fn open(&self) -> Result<MySqlStore, StoreError> {
        debug!(target_db = %self.target, "opening store connection");
        MySqlStore::connect_with(&self.options, &self.target, self.connect_timeout).await
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

/// Row store backed by one MySQL connection.
pub struct MySqlStore {
    conn: MySqlConnection,
}

impl MySqlStore {
    /// Connect from a `mysql://` URL.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let options: MySqlConnectOptions = url.parse().map_err(|source| StoreError::Connect {
            target: "mysql url".to_string(),
            source,
        })?;
        Self::connect_with(&options, "mysql url", timeout).await
    }

    async fn connect_with(
        options: &MySqlConnectOptions,
        target: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let conn = tokio::time::timeout(timeout, MySqlConnection::connect_with(options))
            .await
            .map_err(|_| StoreError::ConnectTimeout {
                target: target.to_owned(),
                seconds: timeout.as_secs(),
            })?
            .map_err(|source| StoreError::Connect {
                target: target.to_owned(),
                source,
            })?;

        Ok(Self { conn })
    }
}

/// Map MySQL's "no such table" and "table exists" errors to typed variants.
fn classify(err: sqlx::Error, table: &TableName) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
            match mysql.number() {
                ER_NO_SUCH_TABLE => {
                    return StoreError::TableMissing {
                        table: table.to_string(),
                    }
                }
                ER_TABLE_EXISTS => {
                    return StoreError::TableExists {
                        table: table.to_string(),
                    }
                }
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE {} (\
         id INT(11) NOT NULL PRIMARY KEY AUTO_INCREMENT, \
         reservationid VARCHAR(255), \
         startdatetime VARCHAR(255), \
         enddatetime VARCHAR(255), \
         pickuplocation VARCHAR(255), \
         reservationtitle VARCHAR(255), \
         accesscode VARCHAR(255), \
         INDEX idx_reservationid (reservationid))",
        table.quoted()
    )
}

#[async_trait]
impl RowStore for MySqlStore {
    async fn count_rows(&mut self, table: &TableName) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {} AS CNT", table.quoted());
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| classify(e, table))
    }

    async fn create_table(&mut self, table: &TableName) -> Result<(), StoreError> {
        let sql = create_table_sql(table);
        sqlx::query(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| classify(e, table))?;
        Ok(())
    }

    async fn insert_record(
        &mut self,
        table: &TableName,
        record: &ReservationRecord,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?)",
            table.quoted(),
            DATA_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&record.reservation_id)
            .bind(&record.start)
            .bind(&record.end)
            .bind(&record.pickup_location)
            .bind(&record.title)
            .bind(&record.access_code)
            .execute(&mut self.conn)
            .await
            .map_err(|e| classify(e, table))?;
        Ok(())
    }

    async fn find_latest(
        &mut self,
        table: &TableName,
        reservation_id: &str,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        // The indexed comparison follows the column collation; BINARY makes
        // the match exact.
        let sql = format!(
            "SELECT {} FROM {} WHERE reservationid = ? AND BINARY reservationid = ? \
             ORDER BY id DESC LIMIT 1",
            DATA_COLUMNS,
            table.quoted()
        );
        let row = sqlx::query(&sql)
            .bind(reservation_id)
            .bind(reservation_id)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| classify(e, table))?;

        let Some(row) = row else {
            return Ok(None);
        };

        // Columns are nullable in the schema; a NULL reads as "".
        let text = |name: &str| -> Result<String, StoreError> {
            Ok(row.try_get::<Option<String>, _>(name)?.unwrap_or_default())
        };

        Ok(Some(ReservationRecord {
            reservation_id: text("reservationid")?,
            start: text("startdatetime")?,
            end: text("enddatetime")?,
            pickup_location: text("pickuplocation")?,
            title: text("reservationtitle")?,
            access_code: text("accesscode")?,
        }))
    }

    async fn drop_table(&mut self, table: &TableName) -> Result<(), StoreError> {
        let sql = format!("DROP TABLE {}", table.quoted());
        sqlx::query(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| classify(e, table))?;
        Ok(())
    }

    async fn delete_all(&mut self, table: &TableName) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {}", table.quoted());
        let result = sqlx::query(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| classify(e, table))?;
        Ok(result.rows_affected())
    }

    async fn close(self) -> Result<(), StoreError> {
        self.conn.close().await?;
        Ok(())
    }
}
