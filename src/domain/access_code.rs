use std::fmt;
use url::Url;

/// Query parameter carrying the guest code in invitation links.
pub const ACCESS_CODE_PARAM: &str = "GuestID";

const ACCESS_CODE_LEN: usize = 5;

/// A validated guest code: exactly five ASCII letters, stored uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccessCode(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAccessCode {
    pub raw: String,
}

impl fmt::Display for InvalidAccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid guest code {:?}: expected 5 letters", self.raw)
    }
}

impl std::error::Error for InvalidAccessCode {}

/// Shared format check used by both the page shell and the access controller.
pub fn is_valid_format(raw: &str) -> bool {
    raw.len() == ACCESS_CODE_LEN && raw.chars().all(|c| c.is_ascii_alphabetic())
}

impl AccessCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidAccessCode> {
        if !is_valid_format(raw) {
            return Err(InvalidAccessCode {
                raw: raw.to_string(),
            });
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads the first `GuestID` query value from an address.
///
/// Surrounding whitespace is dropped and a blank value counts as absent, so a
/// bare `?GuestID=` behaves like a link without a code.
pub fn access_code_param(address: &Url) -> Option<String> {
    address
        .query_pairs()
        .find(|(key, _)| key == ACCESS_CODE_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
