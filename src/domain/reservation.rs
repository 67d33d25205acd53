// One spreadsheet row per guest: Name, Adult Seats, Kid Seats, Guest Code.

const NAME_COLUMN: usize = 0;
const ADULT_SEATS_COLUMN: usize = 1;
const CHILD_SEATS_COLUMN: usize = 2;
const GUEST_CODE_COLUMN: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationRecord {
    pub name: String,
    pub guest_code: String,
    pub adult_seats: u32,
    pub child_seats: u32,
}

/// Every record produced by one read of the guest sheet.
pub type DirectorySnapshot = Vec<ReservationRecord>;

impl ReservationRecord {
    /// Maps a raw row positionally. Never fails: missing cells become empty
    /// strings and unreadable seat counts become zero.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");

        Self {
            name: cell(NAME_COLUMN).to_string(),
            adult_seats: parse_seats(cell(ADULT_SEATS_COLUMN)),
            child_seats: parse_seats(cell(CHILD_SEATS_COLUMN)),
            guest_code: cell(GUEST_CODE_COLUMN).trim().to_ascii_uppercase(),
        }
    }
}

// Reads the leading integer of a cell the way spreadsheet exports usually
// look ("2", " 3", "2 seats"). Negative, empty or non-numeric cells are 0.
fn parse_seats(cell: &str) -> u32 {
    let trimmed = cell.trim_start();
    let unsigned = match trimmed.strip_prefix('-') {
        Some(_) => return 0,
        None => trimmed.strip_prefix('+').unwrap_or(trimmed),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    unsigned[..digits_end].parse().unwrap_or(0)
}
