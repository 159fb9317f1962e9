// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ProcessorError;
use std::env;

/// The Firehose transformation response must stay under 6 MiB. The default
/// budget stops short of that to leave headroom for the response framing and
/// per-record protocol overhead the projected size does not account for.
pub const DEFAULT_MAX_PROJECTED_PAYLOAD_BYTES: usize = 6_000_000;

/// Default ceiling on batch submission attempts before the invocation fails.
pub const DEFAULT_MAX_SUBMIT_ATTEMPTS: u32 = 20;

/// Configuration for the Firehose record processor
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Size budget for the transformed batch returned to Firehose, in bytes
    pub max_projected_payload_bytes: usize,
    /// Maximum number of batch submission attempts per re-ingestion chunk
    pub max_submit_attempts: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_projected_payload_bytes: DEFAULT_MAX_PROJECTED_PAYLOAD_BYTES,
            max_submit_attempts: DEFAULT_MAX_SUBMIT_ATTEMPTS,
        }
    }
}

impl ProcessorConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ProcessorError> {
        let max_projected_payload_bytes = env::var("DD_FIREHOSE_MAX_PAYLOAD_BYTES")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_PROJECTED_PAYLOAD_BYTES);
        let max_submit_attempts = env::var("DD_FIREHOSE_MAX_SUBMIT_ATTEMPTS")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_SUBMIT_ATTEMPTS);

        let config = Self {
            max_projected_payload_bytes,
            max_submit_attempts,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ProcessorError> {
        if self.max_projected_payload_bytes == 0 {
            return Err(ProcessorError::InvalidConfig(
                "Payload size budget must be greater than 0".to_string(),
            ));
        }

        if self.max_submit_attempts == 0 {
            return Err(ProcessorError::InvalidConfig(
                "Submission attempt ceiling must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
