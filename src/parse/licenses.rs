// scontrol show lic --json

use prometheus::IntCounter;
use serde::Deserialize;

use super::{Envelope, TaggedNumber, decode_rows};
use crate::error::ParseError;
use crate::models::LicenseRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LicenseRow {
    license_name: String,
    #[serde(default)]
    total: TaggedNumber,
    #[serde(default)]
    used: TaggedNumber,
    #[serde(default)]
    free: TaggedNumber,
    #[serde(default)]
    reserved: TaggedNumber,
    #[serde(default)]
    remote: bool,
}

pub fn parse_license_json(bytes: &[u8], errors: &IntCounter) -> Result<Vec<LicenseRecord>, ParseError> {
    let mut envelope = Envelope::decode(bytes)?;
    let rows: Vec<LicenseRow> = decode_rows(envelope.take("licenses")?, "licenses", errors)?;
    Ok(rows
        .into_iter()
        .map(|r| LicenseRecord {
            name: r.license_name,
            total: r.total.or_zero(),
            used: r.used.or_zero(),
            free: r.free.or_zero(),
            reserved: r.reserved.or_zero(),
            remote: r.remote,
        })
        .collect())
}
