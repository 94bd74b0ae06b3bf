//! Lease listing output
//!
//! Rows are printed one per line as
//! `expiry_time mac_address ip_address client_hostname client_id`, the order
//! dnsmasq expects from `init`. Unset fields are already `*` in a
//! [`LeaseRow`].

use std::io::Write;

use tokio_stream::StreamExt;

use crate::error::Result;
use crate::record::LeaseRow;
use crate::traits::LeaseStream;

impl std::fmt::Display for LeaseRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.expiry_time, self.mac_address, self.ip_address, self.client_hostname, self.client_id
        )
    }
}

/// Write every row of `rows` to `out`, returning the number of rows written
pub async fn write_rows<W: Write>(mut rows: LeaseStream, out: &mut W) -> Result<usize> {
    let mut count = 0;
    while let Some(row) = rows.next().await {
        writeln!(out, "{}", row)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
