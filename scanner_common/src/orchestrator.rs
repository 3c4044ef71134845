//! Scan orchestration.
//!
//! One call to [`ScanOrchestrator::execute`] runs a whole scan request, strictly in
//! order, and stops at the first unrecoverable failure:
//!
//! config loaded -> logged in -> certificate activated -> usage checked -> scanned
//!
//! The usage check is the only step allowed to fail without failing the request; the
//! outcome then carries no usage snapshot. The session is opened inside the request
//! scope and logs out when that scope ends, whichever step returned.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::broker::{BrokerConnector, Session};
use crate::config::Config;
use crate::observer::{ScanEvent, ScanObserver};
use crate::record::ScanRecord;
use crate::request::{DEFAULT_TIMEOUT_MS, ScanParams};
use crate::result::Result;
use crate::usage::UsageSnapshot;

/// Result of a successful scan request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Rows in the order the scanner returned them.
    pub records: Vec<ScanRecord>,
    /// Wall time from request start to scan completion.
    pub execution_time: Duration,
    /// Quota snapshot taken before the scan, if the brokerage reported one.
    pub usage: Option<UsageSnapshot>,
}

impl ScanOutcome {
    /// Execution time in fractional seconds.
    pub fn execution_time_secs(&self) -> f64 {
        self.execution_time.as_secs_f64()
    }
}

/// Runs scan requests against a brokerage.
#[derive(Clone)]
pub struct ScanOrchestrator {
    connector: Arc<dyn BrokerConnector>,
    config_path: PathBuf,
    timeout_ms: u64,
}

impl ScanOrchestrator {
    /// Orchestrator opening sessions through `connector` with credentials from `config_path`.
    pub fn new(connector: Arc<dyn BrokerConnector>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            connector,
            config_path: config_path.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Override the scan budget handed to the brokerage.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Credentials file read by every request.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Run one scan request, reporting progress to `observer`.
    pub fn execute(&self, params: &ScanParams, observer: &dyn ScanObserver) -> Result<ScanOutcome> {
        let started = Instant::now();
        observer.notify(&ScanEvent::Started {
            scanner_type: params.scanner_type,
            date: params.date,
            count: params.count,
            ascending: params.ascending,
            simulation: params.simulation,
        });

        let result = self.run(params, observer, started);
        match &result {
            Ok(outcome) => observer.notify(&ScanEvent::Finished {
                records: outcome.records.len(),
                elapsed: outcome.execution_time,
            }),
            Err(err) => observer.notify(&ScanEvent::Failed(err)),
        }
        result
    }

    fn run(
        &self,
        params: &ScanParams,
        observer: &dyn ScanObserver,
        started: Instant,
    ) -> Result<ScanOutcome> {
        let config = Config::load(&self.config_path)?;
        let mut session = Session::new(
            self.connector.connect(params.simulation),
            config,
            params.simulation,
            observer,
        );

        session.login()?;
        session.activate_certificate()?;
        let usage = session.usage();
        let records = session.scan(
            params.scanner_type,
            params.date,
            params.count,
            params.ascending,
            self.timeout_ms,
        )?;

        Ok(ScanOutcome {
            records,
            execution_time: started.elapsed(),
            usage,
        })
    }
}
