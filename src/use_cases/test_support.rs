use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use crate::domain::errors::{DirectoryError, TransportError};
use crate::domain::ports::{Navigator, SheetReader};

pub(crate) fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

pub(crate) fn guest_sheet() -> Vec<Vec<String>> {
    grid(&[
        &["Name", "Adult Seats", "Kid Seats", "Guest Code"],
        &["Jane Doe", "2", "1", "AAAAA"],
        &["John Smith", "1", "0", "BBBBB"],
        &["Jane Doe Duplicate", "4", "4", "AAAAA"],
    ])
}

// Canned sheet reader that counts how often it was asked for data.
#[derive(Clone)]
pub(crate) struct FakeReader {
    response: Result<Vec<Vec<String>>, DirectoryError>,
    pub(crate) calls: Arc<AtomicUsize>,
    pub(crate) ranges: Arc<Mutex<Vec<String>>>,
}

impl FakeReader {
    pub(crate) fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            response: Ok(rows),
            calls: Arc::new(AtomicUsize::new(0)),
            ranges: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing(err: DirectoryError) -> Self {
        Self {
            response: Err(err),
            calls: Arc::new(AtomicUsize::new(0)),
            ranges: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_status(status: u16) -> Self {
        Self::failing(DirectoryError::Transport(TransportError::Upstream {
            status,
            message: None,
        }))
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SheetReader for FakeReader {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ranges
            .lock()
            .expect("ranges mutex poisoned")
            .push(range.to_string());
        self.response.clone()
    }
}

// Reader that never answers, for unmount-during-lookup scenarios.
pub(crate) struct PendingReader;

#[async_trait]
impl SheetReader for PendingReader {
    async fn read_range(&self, _range: &str) -> Result<Vec<Vec<String>>, DirectoryError> {
        std::future::pending().await
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingNavigator {
    pub(crate) targets: Arc<Mutex<Vec<Url>>>,
}

impl RecordingNavigator {
    pub(crate) fn targets(&self) -> Vec<Url> {
        self.targets
            .lock()
            .expect("targets mutex poisoned")
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &Url) {
        self.targets
            .lock()
            .expect("targets mutex poisoned")
            .push(target.clone());
    }
}
