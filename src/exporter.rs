// Composition root: one fetcher per enabled domain plus the trace store

use std::sync::Arc;

use prometheus::IntCounter;

use crate::collectors::{self, Sample};
use crate::config::AppConfig;
use crate::fetcher::Fetcher;
use crate::models::{AccountLimitRecord, DiagnosticRecord, JobRecord, LicenseRecord, NodeRecord};
use crate::parse::{self, ParseFn};
use crate::scraper::CliScraper;
use crate::trace::TraceStore;

pub struct Exporter {
    nodes: Fetcher<NodeRecord>,
    /// Shared by the job rollups and the trace correlation.
    jobs: Fetcher<JobRecord>,
    accounts: Option<Fetcher<AccountLimitRecord>>,
    licenses: Option<Fetcher<LicenseRecord>>,
    diags: Option<Fetcher<DiagnosticRecord>>,
    traces: Option<Arc<TraceStore>>,
}

impl Exporter {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let scrape = &config.scrape;
        let limit = scrape.poll_limit_secs;
        let cli = |args: Vec<String>| CliScraper::with_timeout(args, scrape.timeout());

        let (node_parse, job_parse): (ParseFn<NodeRecord>, ParseFn<JobRecord>) = if scrape.fallback {
            tracing::info!("using compact sinfo/squeue output");
            (
                parse::nodes::parse_node_fallback as ParseFn<NodeRecord>,
                parse::jobs::parse_job_fallback as ParseFn<JobRecord>,
            )
        } else {
            (
                parse::nodes::parse_node_json as ParseFn<NodeRecord>,
                parse::jobs::parse_job_json as ParseFn<JobRecord>,
            )
        };

        let nodes = Fetcher::new(
            "nodes",
            cli(scrape.sinfo_args()),
            node_parse,
            limit,
            IntCounter::new("slurm_node_scrape_error", "slurm node info scrape errors")?,
        );
        let jobs = Fetcher::new(
            "jobs",
            cli(scrape.squeue_args()),
            job_parse,
            limit,
            IntCounter::new("slurm_job_scrape_error", "slurm job scrape error")?,
        );
        let accounts = if scrape.accounts {
            tracing::info!("account limit collection enabled");
            Some(Fetcher::new(
                "accounts",
                cli(scrape.sacctmgr_args()),
                parse::accounts::parse_account_limits as ParseFn<AccountLimitRecord>,
                limit,
                IntCounter::new("slurm_account_scrape_error", "slurm sacctmgr scrape error")?,
            ))
        } else {
            None
        };
        let licenses = if scrape.licenses {
            tracing::info!("license collection enabled");
            Some(Fetcher::new(
                "licenses",
                cli(scrape.lic_args()),
                parse::licenses::parse_license_json as ParseFn<LicenseRecord>,
                limit,
                IntCounter::new("slurm_lic_scrape_error", "slurm license scrape error")?,
            ))
        } else {
            None
        };
        let diags = if scrape.diagnostics {
            tracing::info!("daemon diagnostic collection enabled");
            Some(Fetcher::new(
                "diagnostics",
                cli(scrape.sdiag_args()),
                parse::diags::parse_diag_json as ParseFn<DiagnosticRecord>,
                limit,
                IntCounter::new("slurm_diag_scrape_error", "slurm diag scrape error")?,
            ))
        } else {
            None
        };
        let traces = config.trace.enabled.then(|| {
            tracing::info!(path = %config.trace.path, "trace path enabled");
            Arc::new(TraceStore::new(config.trace.sample_rate()))
        });

        Ok(Self {
            nodes,
            jobs,
            accounts,
            licenses,
            diags,
            traces,
        })
    }

    pub fn traces(&self) -> Option<&Arc<TraceStore>> {
        self.traces.as_ref()
    }

    /// Error counters of every enabled domain.
    pub fn counters(&self) -> Vec<IntCounter> {
        let mut counters = vec![
            self.nodes.scrape_error().clone(),
            self.jobs.scrape_error().clone(),
        ];
        counters.extend(self.accounts.iter().map(|f| f.scrape_error().clone()));
        counters.extend(self.licenses.iter().map(|f| f.scrape_error().clone()));
        counters.extend(self.diags.iter().map(|f| f.scrape_error().clone()));
        counters
    }

    /// Runs every enabled collector concurrently. A failing domain only loses
    /// its own samples.
    pub async fn collect(&self) -> Vec<Sample> {
        let (nodes, jobs, accounts, licenses, diags) = futures_util::join!(
            collectors::nodes::collect(&self.nodes),
            collectors::jobs::collect(&self.jobs, self.traces.as_deref()),
            async {
                match &self.accounts {
                    Some(f) => collectors::accounts::collect(f).await,
                    None => Vec::new(),
                }
            },
            async {
                match &self.licenses {
                    Some(f) => collectors::licenses::collect(f).await,
                    None => Vec::new(),
                }
            },
            async {
                match &self.diags {
                    Some(f) => collectors::diags::collect(f).await,
                    None => Vec::new(),
                }
            },
        );
        [nodes, jobs, accounts, licenses, diags].concat()
    }

    /// One pull in the prometheus text format.
    pub async fn render(&self) -> Result<String, prometheus::Error> {
        let samples = self.collect().await;
        collectors::render(&samples, &self.counters())
    }
}
