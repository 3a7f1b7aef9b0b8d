pub use self::code::{CodeDescriber, CodeInfo, DiagnosticCode, InvalidCode, System, FALLBACK_CODES};
pub use self::position::{normalize_heading, normalize_longitude, Position, EARTH_RADIUS};
pub use self::reading::{round_fuel, Reading};
pub use self::summary::{Statistic, Summary};

mod code;
mod position;
mod reading;
mod summary;
