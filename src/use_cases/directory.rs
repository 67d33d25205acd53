use std::sync::Arc;

use crate::domain::access_code::AccessCode;
use crate::domain::errors::{DirectoryError, LookupOutcome};
use crate::domain::ports::SheetReader;
use crate::domain::reservation::{DirectorySnapshot, ReservationRecord};

/// Range read when none is configured: Name, Adult Seats, Kid Seats, Guest Code.
pub const DEFAULT_RANGE: &str = "Sheet1!A:D";

/// Guest lookups over the remote sheet.
///
/// Every lookup re-reads the whole range and scans it linearly; nothing is
/// cached between calls.
#[derive(Clone)]
pub struct GuestDirectory {
    reader: Arc<dyn SheetReader>,
    range: String,
    has_header_row: bool,
}

impl GuestDirectory {
    pub fn new(reader: Arc<dyn SheetReader>) -> Self {
        Self {
            reader,
            range: DEFAULT_RANGE.to_string(),
            has_header_row: true,
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    /// When false, the first row is treated as data instead of a header.
    pub fn with_header_row(mut self, has_header_row: bool) -> Self {
        self.has_header_row = has_header_row;
        self
    }

    pub async fn fetch_all(&self) -> Result<DirectorySnapshot, DirectoryError> {
        let rows = self.reader.read_range(&self.range).await?;
        let skip = usize::from(self.has_header_row);

        Ok(rows
            .iter()
            .skip(skip)
            .map(|row| ReservationRecord::from_row(row))
            .collect())
    }

    /// First record whose code equals `code` exactly.
    pub async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ReservationRecord>, DirectoryError> {
        let snapshot = self.fetch_all().await?;
        Ok(snapshot.into_iter().find(|record| record.guest_code == code))
    }

    /// First record whose name or code contains `term`, ignoring case.
    pub async fn find_by_name(
        &self,
        term: &str,
    ) -> Result<Option<ReservationRecord>, DirectoryError> {
        let needle = term.to_lowercase();
        let snapshot = self.fetch_all().await?;

        Ok(snapshot.into_iter().find(|record| {
            record.name.to_lowercase().contains(&needle)
                || record.guest_code.to_lowercase().contains(&needle)
        }))
    }

    pub async fn lookup(&self, code: &AccessCode) -> LookupOutcome {
        self.find_by_code(code.as_str()).await.into()
    }
}
