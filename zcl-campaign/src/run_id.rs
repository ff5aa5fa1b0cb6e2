// zcl-campaign/src/run_id.rs
// ============================================================================
// Module: Run Identifier Generation
// Description: Builds the `<utcTimestamp>-<6hexRandom>` run id (§3 DATA MODEL).
// Purpose: Give every fresh run a sortable, collision-resistant identifier
//          derived from the host-supplied clock rather than the wall clock
//          sampled inside this crate.
// Dependencies: rand, zcl-core
// ============================================================================

//! ## Overview
//! The civil-calendar conversion below is Howard Hinnant's `civil_from_days`
//! algorithm, done entirely in `i64` with `div_euclid`/`rem_euclid` so it
//! never needs an `as` cast that could truncate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use zcl_core::Timestamp;
use zcl_core::ids::IdError;
use zcl_core::ids::RunId;

// ============================================================================
// SECTION: Civil Calendar
// ============================================================================

/// Converts a day count since the Unix epoch (1970-01-01) into a
/// `(year, month, day)` civil date, per Howard Hinnant's algorithm.
fn civil_from_days(days_since_epoch: i64) -> (i64, i64, i64) {
    let z = days_since_epoch + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Formats `unix_millis` as a compact UTC timestamp, `YYYYMMDDTHHMMSSZ`.
fn format_utc_compact(unix_millis: i64) -> String {
    let total_seconds = unix_millis.div_euclid(1000);
    let days = total_seconds.div_euclid(86_400);
    let seconds_of_day = total_seconds.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour = seconds_of_day.div_euclid(3600);
    let minute = seconds_of_day.rem_euclid(3600).div_euclid(60);
    let second = seconds_of_day.rem_euclid(60);
    format!("{year:04}{month:02}{day:02}T{hour:02}{minute:02}{second:02}Z")
}

// ============================================================================
// SECTION: Run Id
// ============================================================================

/// Generates a fresh run id from `now`: `<utcTimestamp>-<6hexRandom>`.
///
/// # Errors
///
/// Returns [`IdError`] only if the composed string somehow exceeds
/// [`zcl_core::ids::MAX_ID_LEN`], which the fixed-width format never does.
pub fn generate_run_id(now: Timestamp) -> Result<RunId, IdError> {
    let timestamp = format_utc_compact(now.as_unix_millis());
    let suffix: [u8; 3] = rand::thread_rng().r#gen();
    let hex = suffix.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
    RunId::new(format!("{timestamp}-{hex}"))
}
