#![deny(missing_docs)]

//! # Check Command
//!
//! Asserts recorded exchanges against a contract document and reports one line
//! per exchange.

use crate::error::{CliError, CliResult};
use crate::exchange::Exchange;
use contract_assert_core::{Assertions, Specification};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Swagger 2.0 document (JSON or YAML): a local path, `file://` or `http(s)://` URI.
    #[clap(long, env = "CONTRACT_ASSERT_SPEC")]
    pub spec: String,

    /// Exchange files, or directories searched for `.json`/`.yaml`/`.yml` files.
    #[clap(required = true)]
    pub exchanges: Vec<PathBuf>,
}

/// Verdict for one exchange file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// The exchange file.
    pub path: PathBuf,
    /// `None` when both sides conform; otherwise the first failure.
    pub failure: Option<String>,
}

/// Executes the check and fails when any exchange does not conform.
pub fn execute(args: &CheckArgs) -> CliResult<()> {
    let spec = Specification::from_uri(&args.spec)?;
    let assertions = Assertions::from_specification(spec);

    let files = collect_files(&args.exchanges);
    if files.is_empty() {
        return Err(CliError::General("No exchange files found.".into()));
    }

    let mut failed = 0;
    for path in &files {
        let verdict = check_file(&assertions, path)?;
        match &verdict.failure {
            None => println!("ok    {}", verdict.path.display()),
            Some(message) => {
                failed += 1;
                println!("FAIL  {}: {}", verdict.path.display(), message);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::General(format!(
            "{} of {} exchanges do not conform to the contract",
            failed,
            files.len()
        )));
    }
    Ok(())
}

/// Runs request and response assertions for one exchange file.
pub fn check_file(assertions: &Assertions, path: &Path) -> CliResult<Verdict> {
    let exchange = Exchange::from_path(path)?;
    tracing::debug!(path = %path.display(), "checking exchange");

    let mut request = exchange.to_request();
    let mut failure = assertions
        .assert_request(&mut request)
        .err()
        .map(|e| format!("request: {}", e));

    if failure.is_none() {
        if let Some(mut response) = exchange.to_response() {
            failure = assertions
                .assert_response(&mut response)
                .err()
                .map(|e| format!("response: {}", e));
        }
    }

    Ok(Verdict {
        path: path.to_path_buf(),
        failure,
    })
}

fn collect_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| matches!(ext, "json" | "yaml" | "yml"))
            })
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}
