use async_trait::async_trait;
use url::Url;

use crate::domain::errors::DirectoryError;

// Port for reading a cell range from the guest spreadsheet.
// Implementations return the raw grid, header row included.
#[async_trait]
pub trait SheetReader: Send + Sync {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, DirectoryError>;
}

// Port for leaving the personalized view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &Url);
}
