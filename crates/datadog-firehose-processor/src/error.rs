// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur while processing a Firehose transformation event
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode record data: {0}")]
    RecordDecode(String),

    #[error("Failed to decompress record payload: {0}")]
    Decompress(String),

    #[error("Failed to parse log envelope: {0}")]
    EnvelopeParse(String),

    #[error("Failed to serialize log event: {0}")]
    EventSerialize(String),

    #[error("Event missing both sourceKinesisStreamArn and deliveryStreamArn")]
    MissingStreamArn,

    #[error("Malformed stream ARN: {0}")]
    MalformedStreamArn(String),

    #[error("Record batch submission failed: {0}")]
    Submit(String),

    #[error("Could not put records after {attempts} attempts, individual errors: {error_codes:?}")]
    RetriesExhausted {
        attempts: u32,
        error_codes: Vec<String>,
    },
}
