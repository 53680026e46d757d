// slurm_account_{cpu,mem}_limit

use super::{Sample, duration_sample};
use crate::fetcher::Fetcher;
use crate::models::AccountLimitRecord;
use crate::scraper::ByteScraper;

pub fn samples(accounts: &[AccountLimitRecord]) -> Vec<Sample> {
    let mut out = Vec::new();
    for a in accounts {
        if a.alloc_mem > 0.0 {
            out.push(
                Sample::gauge("slurm_account_mem_limit", "slurm account mem limit (in bytes)", a.alloc_mem)
                    .label("account", a.account.as_str()),
            );
        }
        if a.alloc_cpu > 0.0 {
            out.push(
                Sample::gauge("slurm_account_cpu_limit", "slurm account cpu limit", a.alloc_cpu)
                    .label("account", a.account.as_str()),
            );
        }
    }
    out
}

pub async fn collect<S: ByteScraper>(fetcher: &Fetcher<AccountLimitRecord, S>) -> Vec<Sample> {
    let result = fetcher.fetch_metrics().await;
    let mut out = vec![duration_sample(
        "slurm_limit_scrape_duration",
        "slurm sacctmgr scrape duration (ms)",
        fetcher.scrape_duration(),
    )];
    if let Ok(accounts) = result {
        out.extend(samples(&accounts));
    }
    out
}
