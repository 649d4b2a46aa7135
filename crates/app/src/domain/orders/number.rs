//! Human-readable order numbers.

use jiff::Timestamp;

/// `ORD-<YYYYMMDD>-<8 uppercase hex>`, dated in UTC.
pub(crate) fn generate(now: Timestamp) -> String {
    format_number(now, rand::random::<u32>())
}

fn format_number(now: Timestamp, suffix: u32) -> String {
    format!("ORD-{}-{suffix:08X}", now.strftime("%Y%m%d"))
}
