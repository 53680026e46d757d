// sacctmgr association limits (`--noheader --parsable2`)

use prometheus::IntCounter;

use super::lines;
use crate::error::ParseError;
use crate::models::AccountLimitRecord;

const COLUMNS: usize = 6;

/// Parses one optional limit cell. Empty means no limit; garbage is counted and read as 0.
fn limit(cell: &str, column: &'static str, errors: &IntCounter) -> f64 {
    if cell.is_empty() {
        return 0.0;
    }
    match cell.parse::<f64>() {
        Ok(v) => v,
        Err(e) => {
            errors.inc();
            tracing::error!(error = %e, column, cell, "failed to scrape account limit");
            0.0
        }
    }
}

/// Rows are `User|Account|GrpCPU|GrpMem|GrpJobs|GrpSubmit`. Only rows with an
/// empty user describe the account itself; the rest are user associations.
pub fn parse_account_limits(
    bytes: &[u8],
    errors: &IntCounter,
) -> Result<Vec<AccountLimitRecord>, ParseError> {
    let mut accounts = Vec::new();
    for (i, line) in lines(bytes) {
        let line = String::from_utf8_lossy(line);
        let cells: Vec<&str> = line.split('|').map(str::trim).collect();
        let [user, account, cpu, mem, running_jobs, total_jobs] = cells[..] else {
            errors.inc();
            tracing::error!(line = i, columns = cells.len(), expected = COLUMNS, "failed to scrape account metric row");
            continue;
        };
        if !user.is_empty() {
            continue;
        }
        accounts.push(AccountLimitRecord {
            account: account.to_string(),
            alloc_mem: limit(mem, "GrpMem", errors) * 1e6,
            alloc_cpu: limit(cpu, "GrpCPU", errors),
            alloc_jobs: limit(running_jobs, "GrpJobs", errors),
            total_jobs: limit(total_jobs, "GrpSubmit", errors),
        });
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_cell_is_counted_and_zeroed() {
        let errors = IntCounter::new("t", "t").unwrap();
        let got = parse_account_limits(b"|ops|abc|100||\n|ops|1|\n", &errors).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].alloc_cpu, 0.0);
        assert_eq!(got[0].alloc_mem, 1e8);
        assert_eq!(errors.get(), 2);
    }
}
