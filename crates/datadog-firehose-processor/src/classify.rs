// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-record classification of decoded envelopes.

use crate::envelope::{LogEnvelope, MessageType};
use crate::error::ProcessorError;
use crate::event::{OutputRecord, RecordResult};
use crate::transform::EventTransformer;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::warn;

/// Classify one decoded record into its output disposition.
///
/// Control messages are connectivity checks from CloudWatch Logs and carry no
/// events; they are dropped. Data messages are transformed event by event and
/// concatenated. Anything else is surfaced as `ProcessingFailed` so the
/// pipeline's error path can route the record for inspection.
pub fn classify_record(
    record_id: &str,
    envelope: &LogEnvelope,
    transformer: &dyn EventTransformer,
) -> OutputRecord {
    match envelope.message_type {
        MessageType::ControlMessage => OutputRecord {
            record_id: record_id.to_string(),
            result: RecordResult::Dropped,
            data: None,
        },
        MessageType::DataMessage => match transform_events(envelope, transformer) {
            Ok(payload) => OutputRecord {
                record_id: record_id.to_string(),
                result: RecordResult::Ok,
                data: Some(STANDARD.encode(payload)),
            },
            Err(e) => {
                warn!("Failed to transform events for record {record_id}: {e}");
                OutputRecord {
                    record_id: record_id.to_string(),
                    result: RecordResult::ProcessingFailed,
                    data: None,
                }
            }
        },
        MessageType::Unrecognized => OutputRecord {
            record_id: record_id.to_string(),
            result: RecordResult::ProcessingFailed,
            data: None,
        },
    }
}

fn transform_events(
    envelope: &LogEnvelope,
    transformer: &dyn EventTransformer,
) -> Result<String, ProcessorError> {
    let source = envelope.source();
    let mut payload = String::new();
    for event in &envelope.log_events {
        payload.push_str(&transformer.transform(event, &source)?);
    }
    Ok(payload)
}
