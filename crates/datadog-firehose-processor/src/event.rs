// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire models for the Firehose data-transformation invocation.

use serde::{Deserialize, Serialize};

/// One invocation's worth of records from Firehose.
///
/// `source_kinesis_stream_arn` is only present when the delivery stream reads
/// from a Kinesis data stream; its presence selects the partition-keyed
/// re-ingestion mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationEvent {
    pub invocation_id: Option<String>,
    pub delivery_stream_arn: Option<String>,
    pub source_kinesis_stream_arn: Option<String>,
    pub region: Option<String>,
    pub records: Vec<InputRecord>,
}

/// A single record as delivered by Firehose, payload still base64-encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub record_id: String,
    pub approximate_arrival_timestamp: Option<i64>,
    pub data: String,
    pub kinesis_record_metadata: Option<KinesisRecordMetadata>,
}

/// Metadata attached to records that originated from a Kinesis data stream.
/// Only the partition key participates in re-ingestion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisRecordMetadata {
    pub sequence_number: Option<String>,
    pub subsequence_number: Option<u64>,
    pub partition_key: String,
    pub shard_id: Option<String>,
    pub approximate_arrival_timestamp: Option<i64>,
}

/// Per-record disposition reported back to Firehose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordResult {
    Ok,
    Dropped,
    ProcessingFailed,
}

/// One transformed record. Exactly one is returned per input record, in the
/// original order and under the original record id. `data` is base64-encoded
/// and present only when `result` is `Ok`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub record_id: String,
    pub result: RecordResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// The transformed batch returned to the calling pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationResponse {
    pub records: Vec<OutputRecord>,
}
