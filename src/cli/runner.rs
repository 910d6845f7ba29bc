//! Runner wiring configuration, clients and engine together

use crate::catalog::QuayCatalogClient;
use crate::cli::args::Args;
use crate::config::{MirrorConfig, RegistryEndpoint};
use crate::engine::{SyncEngine, VerifyPolicy};
use crate::error::Result;
use crate::logging::{EventCategory, Logger};
use crate::report::{OperationReport, RunStatus};
use crate::transfer::DockerTransferClient;
use std::path::Path;
use std::sync::atomic::Ordering;

pub struct Runner {
    args: Args,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let logger = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };
        Self { args, logger }
    }

    /// Run the full mirror operation and return the process exit status
    pub async fn run(&self) -> Result<i32> {
        self.logger.section("Registry Mirror");

        let config = self.load_config()?;
        config.validate()?;
        self.logger.info(&format!(
            "Mirroring {}/{} -> {}/{}",
            config.source.host,
            config.source.namespace,
            config.destination.host,
            config.destination.namespace
        ));

        // Credential acquisition is external; both registry sessions are
        // assumed valid for the whole run
        self.logger.event(
            EventCategory::Login,
            "LOGIN_ASSUMED",
            "Using pre-established registry sessions (no re-authentication mid-run)",
        );

        let source_catalog = QuayCatalogClient::builder(config.source.clone())
            .with_retry(config.retry.clone())
            .with_timeout(config.api_timeout())
            .with_logger(self.logger.clone())
            .build()?;
        let dest_catalog = QuayCatalogClient::builder(config.destination.clone())
            .with_retry(config.retry.clone())
            .with_timeout(config.api_timeout())
            .with_logger(self.logger.clone())
            .build()?;
        let transfer = DockerTransferClient::new(
            config.retry.clone(),
            config.transfer_timeout(),
            self.logger.clone(),
        );

        let engine = SyncEngine::new(
            config.source.clone(),
            config.destination.clone(),
            source_catalog,
            dest_catalog,
            transfer,
            self.logger.clone(),
        )
        .with_verify_policy(VerifyPolicy {
            retries: config.verify_retries,
            delay: config.verify_delay(),
        });

        let cancel = engine.cancel_flag();
        let interrupt_logger = self.logger.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt_logger
                    .warning("Interrupt received; finishing in-flight task cleanup before exit");
                cancel.store(true, Ordering::SeqCst);
            }
        });

        match engine.run().await {
            Ok(report) => {
                report.emit(&self.logger);
                Ok(report.exit_status())
            }
            Err(e) => {
                // Whatever already synced or failed still gets reported
                OperationReport::new(engine.progress(), RunStatus::Aborted).emit(&self.logger);
                Err(e)
            }
        }
    }

    /// Layered configuration: file (when given) or CLI flags, CLI flags
    /// overriding file values, then environment overrides on top
    fn load_config(&self) -> Result<MirrorConfig> {
        let mut config = match &self.args.config {
            Some(path) => MirrorConfig::from_file(Path::new(path))?,
            None => MirrorConfig::new(
                RegistryEndpoint::new("", ""),
                RegistryEndpoint::new("", ""),
            ),
        };

        if let Some(host) = &self.args.source_host {
            config.source.host = host.clone();
        }
        if let Some(namespace) = &self.args.source_namespace {
            config.source.namespace = namespace.clone();
        }
        if let Some(token) = &self.args.source_token {
            config.source.api_token = Some(token.clone());
        }
        if let Some(host) = &self.args.dest_host {
            config.destination.host = host.clone();
        }
        if let Some(namespace) = &self.args.dest_namespace {
            config.destination.namespace = namespace.clone();
        }
        if let Some(token) = &self.args.dest_token {
            config.destination.api_token = Some(token.clone());
        }
        if let Some(retry) = self.args.retry {
            config.retry.max_attempts = retry;
        }
        if let Some(delay) = self.args.retry_delay {
            config.retry.delay_secs = delay;
        }
        config.verbose = config.verbose || self.args.verbose;

        Ok(config.apply_env())
    }
}
