// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batch submission of re-ingestion records with bounded retries.
//!
//! Both PutRecords (Kinesis) and PutRecordBatch (Firehose) report partial
//! failure per item rather than failing the call. The retry loop resubmits
//! only the failed subset, so the candidate set shrinks (or stays the same)
//! each round until it drains or the attempt ceiling is reached.

use crate::error::ProcessorError;
use crate::splitter::ReingestionRecord;
use crate::stream::{StreamKind, StreamTarget};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, warn};

/// Per-item result of a batch write. A non-empty error code marks the item
/// as failed; anything else is success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemOutcome {
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl ItemOutcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(code: &str, message: &str) -> Self {
        Self {
            error_code: Some(code.to_string()),
            error_message: Some(message.to_string()),
        }
    }
}

/// A batch-write capability against an append-only stream. Implementations
/// must return one [`ItemOutcome`] per submitted record, in order, and may
/// fail the call outright.
#[async_trait]
pub trait RecordBatchClient: Send + Sync {
    async fn put_record_batch(
        &self,
        stream_name: &str,
        records: &[ReingestionRecord],
    ) -> Result<Vec<ItemOutcome>, ProcessorError>;
}

/// Submit one chunk, retrying the failed subset until it drains.
///
/// A whole-call failure counts every pending record as failed. Once
/// `max_attempts` calls have been made with failures remaining, the
/// invocation aborts with [`ProcessorError::RetriesExhausted`] naming the
/// distinct error codes last observed.
pub async fn submit_with_retry(
    client: &dyn RecordBatchClient,
    stream_name: &str,
    chunk: Vec<ReingestionRecord>,
    max_attempts: u32,
) -> Result<(), ProcessorError> {
    let total = chunk.len();
    let mut pending = chunk;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let result = client.put_record_batch(stream_name, &pending).await;
        let (failed, error_codes) = match result {
            Ok(outcomes) => {
                let mut failed = Vec::new();
                let mut error_codes: Vec<String> = Vec::new();
                for (record, outcome) in pending.into_iter().zip(outcomes) {
                    match outcome.error_code {
                        Some(code) if !code.is_empty() => {
                            if !error_codes.contains(&code) {
                                error_codes.push(code);
                            }
                            failed.push(record);
                        }
                        _ => {}
                    }
                }
                (failed, error_codes)
            }
            Err(e) => {
                warn!("Batch write to {stream_name} failed outright: {e}");
                (pending, vec![e.to_string()])
            }
        };

        if failed.is_empty() {
            debug!("Reingested {total} records into {stream_name} after {attempts} attempt(s)");
            return Ok(());
        }

        if attempts >= max_attempts {
            return Err(ProcessorError::RetriesExhausted {
                attempts,
                error_codes,
            });
        }

        warn!(
            "{} of {total} records failed batch write to {stream_name} (attempt {attempts}/{max_attempts}), retrying failed subset: {error_codes:?}",
            failed.len()
        );
        pending = failed;
    }
}

/// Build the batch-write client matching the target stream, against its
/// regional endpoint.
pub async fn client_for_target(target: &StreamTarget) -> Box<dyn RecordBatchClient> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(target.region.clone()))
        .load()
        .await;

    match target.kind {
        StreamKind::Kinesis => Box::new(KinesisBatchClient::new(&sdk_config)),
        StreamKind::DeliveryStream => Box::new(FirehoseBatchClient::new(&sdk_config)),
    }
}

/// PutRecords against a Kinesis data stream. Every record must carry the
/// partition key captured from its source metadata.
pub struct KinesisBatchClient {
    client: aws_sdk_kinesis::Client,
}

impl KinesisBatchClient {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_kinesis::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl RecordBatchClient for KinesisBatchClient {
    async fn put_record_batch(
        &self,
        stream_name: &str,
        records: &[ReingestionRecord],
    ) -> Result<Vec<ItemOutcome>, ProcessorError> {
        use aws_sdk_kinesis::error::DisplayErrorContext;
        use aws_sdk_kinesis::primitives::Blob;
        use aws_sdk_kinesis::types::PutRecordsRequestEntry;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let partition_key = record.partition_key.as_deref().ok_or_else(|| {
                ProcessorError::Submit(
                    "re-ingestion record for a Kinesis stream is missing its partition key"
                        .to_string(),
                )
            })?;
            let entry = PutRecordsRequestEntry::builder()
                .data(Blob::new(record.data.clone()))
                .partition_key(partition_key)
                .build()
                .map_err(|e| ProcessorError::Submit(e.to_string()))?;
            entries.push(entry);
        }

        let output = self
            .client
            .put_records()
            .stream_name(stream_name)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(|e| ProcessorError::Submit(format!("{}", DisplayErrorContext(&e))))?;

        Ok(output
            .records()
            .iter()
            .map(|entry| ItemOutcome {
                error_code: entry.error_code().map(str::to_string),
                error_message: entry.error_message().map(str::to_string),
            })
            .collect())
    }
}

/// PutRecordBatch against a Firehose delivery stream. Records carry only
/// their payload.
pub struct FirehoseBatchClient {
    client: aws_sdk_firehose::Client,
}

impl FirehoseBatchClient {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_firehose::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl RecordBatchClient for FirehoseBatchClient {
    async fn put_record_batch(
        &self,
        stream_name: &str,
        records: &[ReingestionRecord],
    ) -> Result<Vec<ItemOutcome>, ProcessorError> {
        use aws_sdk_firehose::error::DisplayErrorContext;
        use aws_sdk_firehose::primitives::Blob;
        use aws_sdk_firehose::types::Record;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let entry = Record::builder()
                .data(Blob::new(record.data.clone()))
                .build()
                .map_err(|e| ProcessorError::Submit(e.to_string()))?;
            entries.push(entry);
        }

        let output = self
            .client
            .put_record_batch()
            .delivery_stream_name(stream_name)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(|e| ProcessorError::Submit(format!("{}", DisplayErrorContext(&e))))?;

        Ok(output
            .request_responses()
            .iter()
            .map(|entry| ItemOutcome {
                error_code: entry.error_code().map(str::to_string),
                error_message: entry.error_message().map(str::to_string),
            })
            .collect())
    }
}
