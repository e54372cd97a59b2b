//! Conversion orchestration
//!
//! Splits raw user input into lines, sends subscription URLs to the
//! resolver and share links to the parsers, and hands the collected
//! outbounds to the assembler. A bad line never aborts the run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SingBoxConfig;
use crate::config::outbound::Outbound;
use crate::error::{ConvertError, Result};
use crate::parser::{ProtocolRegistry, is_subscription_url};

// Sub-modules
pub mod assembler;
pub mod generator_config;
pub mod helpers;
pub mod subscription;

// Re-exports
pub use assembler::{AssemblyProfile, ConfigAssembler, assemble};
pub use generator_config::Settings;
pub use helpers::{choose_config_name, default_config_name, expand_tilde, prompt_config_name};
pub use subscription::{
    FetchMode, FetchResponse, HttpFetcher, SubscriptionFetcher, SubscriptionResolver,
};

// ============================================================================
// Results
// ============================================================================

/// An input line that produced nothing
#[derive(Debug)]
pub struct LineFailure {
    pub line: String,
    pub error: ConvertError,
}

/// Outbounds collected from one input, plus the lines that failed
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub outbounds: Vec<Outbound>,
    pub failures: Vec<LineFailure>,
}

/// Finished conversion
#[derive(Debug)]
pub struct Conversion {
    pub config: SingBoxConfig,
    pub failures: Vec<LineFailure>,
}

// ============================================================================
// Converter
// ============================================================================

/// Converter that orchestrates one conversion run at a time
pub struct Converter<F> {
    registry: Arc<ProtocolRegistry>,
    resolver: SubscriptionResolver<F>,
    assembler: ConfigAssembler,
}

impl<F: SubscriptionFetcher> Converter<F> {
    /// Converter with the built-in parsers and the default profile
    pub fn new(fetcher: F) -> Self {
        Self::with_profile(fetcher, AssemblyProfile::default())
    }

    pub fn with_profile(fetcher: F, profile: AssemblyProfile) -> Self {
        let registry = Arc::new(ProtocolRegistry::with_builtin_parsers());
        Self {
            resolver: SubscriptionResolver::new(fetcher, Arc::clone(&registry)),
            registry,
            assembler: ConfigAssembler::new(profile),
        }
    }

    /// Collects outbounds from every line of `raw`, in input order.
    ///
    /// Only whitespace-only input is an error; per-line failures are logged
    /// and reported in [`ConversionReport::failures`].
    pub async fn collect(&self, raw: &str) -> Result<ConversionReport> {
        if raw.trim().is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        info!("Processing {} input lines", lines.len());

        let mut report = ConversionReport::default();
        for line in lines {
            let result = if is_subscription_url(line) {
                self.resolver.resolve(line).await
            } else {
                self.registry.parse_link(line).map(|o| vec![o])
            };

            match result {
                Ok(outbounds) => {
                    debug!("Line produced {} outbounds", outbounds.len());
                    report.outbounds.extend(outbounds);
                }
                Err(e) => {
                    warn!("Skipping line: {}", e);
                    report.failures.push(LineFailure {
                        line: line.to_string(),
                        error: e,
                    });
                }
            }
        }

        info!(
            "Collected {} outbounds, {} lines failed",
            report.outbounds.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Converts `raw` into a complete configuration document
    pub async fn convert(&self, raw: &str) -> Result<Conversion> {
        let report = self.collect(raw).await?;
        if report.outbounds.is_empty() {
            return Err(ConvertError::NothingConvertible);
        }

        let config = self.assembler.assemble(report.outbounds);
        Ok(Conversion {
            config,
            failures: report.failures,
        })
    }
}
