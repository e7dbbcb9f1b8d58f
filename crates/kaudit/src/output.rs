//! Event printing
//!
//! One line per event: `<stage timestamp> <json>`.

use std::io::{self, Write};

use chrono::SecondsFormat;
use kaudit_protocol::EventBatch;

/// Write every event of a batch, returning how many were written
pub fn write_batch<W: Write>(out: &mut W, batch: &EventBatch) -> io::Result<u64> {
    let mut written = 0;
    for slot in batch {
        let timestamp = slot.timestamp().to_rfc3339_opts(SecondsFormat::Nanos, true);
        out.write_all(timestamp.as_bytes())?;
        out.write_all(b" ")?;
        out.write_all(slot.data())?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}
