// slurm_lic_*

use super::{Sample, duration_sample};
use crate::fetcher::Fetcher;
use crate::models::LicenseRecord;
use crate::scraper::ByteScraper;

pub fn samples(licenses: &[LicenseRecord]) -> Vec<Sample> {
    let mut out = Vec::with_capacity(licenses.len() * 4);
    for lic in licenses {
        let series = [
            ("slurm_lic_total", "slurm license total", lic.total),
            ("slurm_lic_used", "slurm license used", lic.used),
            ("slurm_lic_free", "slurm license free", lic.free),
            ("slurm_lic_reserved", "slurm license reserved", lic.reserved),
        ];
        for (name, help, v) in series.into_iter().filter(|(_, _, v)| *v > 0.0) {
            out.push(Sample::gauge(name, help, v).label("name", lic.name.as_str()));
        }
    }
    out
}

pub async fn collect<S: ByteScraper>(fetcher: &Fetcher<LicenseRecord, S>) -> Vec<Sample> {
    let result = fetcher.fetch_metrics().await;
    let mut out = vec![duration_sample(
        "slurm_lic_scrape_duration",
        "how long the license cmd took (ms)",
        fetcher.scrape_duration(),
    )];
    if let Ok(licenses) = result {
        out.extend(samples(&licenses));
    }
    out
}
