//! Column names of the accident dataset.
//! The source codes (`p2a`, `p13a`, ...) follow the police data dictionary.

/// Region code (e.g. `PHA`).
pub const REGION: &str = "region";
/// Accident date as text, `YYYY-MM-DD`.
pub const SOURCE_DATE: &str = "p2a";
/// Derived date column added by the loader.
pub const DATE: &str = "date";
/// Number of deaths.
pub const DEATHS: &str = "p13a";
/// Number of severely injured persons.
pub const SEVERE_INJURIES: &str = "p13b";
/// Number of lightly injured persons.
pub const LIGHT_INJURIES: &str = "p13c";
/// Main cause of the accident (100-699).
pub const CAUSE: &str = "p12";
/// Total material damage in hundreds of CZK.
pub const DAMAGE: &str = "p53";
/// Road surface condition (0-9).
pub const SURFACE: &str = "p16";

/// Columns every accident table must carry.
pub const REQUIRED: [&str; 8] = [
    REGION,
    SOURCE_DATE,
    DEATHS,
    SEVERE_INJURIES,
    LIGHT_INJURIES,
    CAUSE,
    DAMAGE,
    SURFACE,
];

/// Severity counters, summed per region.
pub const SEVERITY_COUNTERS: [&str; 3] = [DEATHS, SEVERE_INJURIES, LIGHT_INJURIES];
