//! # Propagation Run
//!
//! One pass over the configured targets: resolve the address once, patch
//! every file in order, collect the outcomes.

use std::fmt;
use std::path::PathBuf;

use ipsync_common::config::{Config, ConfigError, MatchPolicy};
use ipsync_common::network::{Address, Endpoint};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::patcher::{FilePatcher, PatchResult};
use crate::pattern::EndpointPattern;
use crate::resolver::{AddressResolver, Resolution};

#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub policy: MatchPolicy,
    pub result: PatchResult,
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.result)
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub address: Address,
    pub endpoint: Endpoint,
    /// True when discovery failed and the loopback fallback was announced.
    pub fallback: bool,
    pub dry_run: bool,
    /// One entry per target, in configured order.
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.files.iter().filter(|f| f.result.is_processed()).count()
    }

    pub fn updated(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.result, PatchResult::Updated { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.result.is_failure())
    }

    /// No target could be handled at all.
    pub fn is_total_failure(&self) -> bool {
        self.processed() == 0
    }

    pub fn announcement(&self) -> String {
        format!("Server running on {}", self.endpoint)
    }
}

pub struct PropagationRunner<R> {
    config: Config,
    resolver: R,
    dry_run: bool,
}

impl<R: AddressResolver> PropagationRunner<R> {
    pub fn new(config: Config, resolver: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            resolver,
            dry_run: false,
        })
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self) -> RunReport {
        let Resolution { address, fallback } = self.resolver.resolve();
        let endpoint = Endpoint::new(address, self.config.port);
        let span = info_span!("propagation", %address, dry_run = self.dry_run);
        let _guard = span.enter();

        if fallback {
            warn!("No outbound route found, announcing {endpoint}");
        } else {
            info!("Resolved local address {address}");
        }

        let files: Vec<FileOutcome> = self
            .config
            .targets
            .iter()
            .map(|target| {
                let policy = self.config.policy_for(target);
                let patcher = FilePatcher::new(EndpointPattern::new(policy, self.config.port))
                    .dry_run(self.dry_run);
                debug!("Patching {} ({policy})", target.path.display());
                let outcome = FileOutcome {
                    path: target.path.clone(),
                    policy,
                    result: patcher.apply(&target.path, address),
                };
                debug!("{outcome}");
                outcome
            })
            .collect();

        RunReport {
            address,
            endpoint,
            fallback,
            dry_run: self.dry_run,
            files,
        }
    }
}
