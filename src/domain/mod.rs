// Domain layer: guest codes, reservation records and the ports the use cases depend on.

pub mod access_code;
pub mod errors;
pub mod ports;
pub mod reservation;

pub use access_code::{ACCESS_CODE_PARAM, AccessCode, InvalidAccessCode, access_code_param};
pub use errors::{DirectoryError, FailureKind, LookupOutcome, TransportError};
pub use ports::{Navigator, SheetReader};
pub use reservation::{DirectorySnapshot, ReservationRecord};
