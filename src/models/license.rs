// Cluster license counts

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LicenseRecord {
    pub name: String,
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub reserved: f64,
    pub remote: bool,
}
