use crate::infrastructure::error::InfraError;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable per-install flags. Currently a single row: the last calendar day
/// the privacy notice was shown, so it appears at most once per day.
pub trait ClientStateRepository: Send + Sync {
    fn last_privacy_notice_date(&self) -> Result<Option<NaiveDate>, InfraError>;
    fn record_privacy_notice_shown(&self, date: NaiveDate) -> Result<(), InfraError>;
}

pub struct SqliteClientStateRepository {
    connection: Mutex<Connection>,
}

impl SqliteClientStateRepository {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, InfraError> {
        self.connection
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("state lock poisoned: {error}")))
    }
}

impl ClientStateRepository for SqliteClientStateRepository {
    fn last_privacy_notice_date(&self) -> Result<Option<NaiveDate>, InfraError> {
        let connection = self.lock()?;
        let stored: Option<Option<String>> = connection
            .query_row(
                "SELECT last_privacy_notice_date FROM client_state WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(Some(text)) = stored else {
            return Ok(None);
        };
        let date = NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|error| {
            InfraError::InvalidConfig(format!("corrupt privacy notice date {text:?}: {error}"))
        })?;
        Ok(Some(date))
    }

    fn record_privacy_notice_shown(&self, date: NaiveDate) -> Result<(), InfraError> {
        let connection = self.lock()?;
        connection.execute(
            "INSERT INTO client_state (id, last_privacy_notice_date) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET last_privacy_notice_date = excluded.last_privacy_notice_date",
            params![date.format(DATE_FORMAT).to_string()],
        )?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryClientStateRepository {
    date: Mutex<Option<NaiveDate>>,
}

impl ClientStateRepository for InMemoryClientStateRepository {
    fn last_privacy_notice_date(&self) -> Result<Option<NaiveDate>, InfraError> {
        let guard = self
            .date
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("state lock poisoned: {error}")))?;
        Ok(*guard)
    }

    fn record_privacy_notice_shown(&self, date: NaiveDate) -> Result<(), InfraError> {
        let mut guard = self
            .date
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("state lock poisoned: {error}")))?;
        *guard = Some(date);
        Ok(())
    }
}

/// The notice is due once per calendar day, local to whatever clock the
/// caller passes in.
pub fn privacy_notice_due(last_shown: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_shown {
        Some(date) => date < today,
        None => true,
    }
}
