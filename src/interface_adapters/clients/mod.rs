// reqwest clients for the external services this server reads from.

pub mod sheets;

pub use sheets::{ApiKeySheetsClient, OAuthSheetsClient, SheetsClientConfig, UnconfiguredReader};
