// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Orchestration of one transformation invocation.
//!
//! Decode and classify every record, split the batch if the transformed
//! payload would overflow the response limit, then submit each re-ingestion
//! chunk before returning the per-record results. Chunks are submitted
//! sequentially so a retry-exhaustion abort happens before later chunks
//! waste work.

use crate::classify::classify_record;
use crate::config::ProcessorConfig;
use crate::envelope::{decode_envelope, decode_record_data};
use crate::error::ProcessorError;
use crate::event::{RecordResult, TransformationEvent, TransformationResponse};
use crate::splitter::{split_oversized_batch, ReingestionRecord};
use crate::stream::StreamTarget;
use crate::submit::{client_for_target, submit_with_retry, RecordBatchClient};
use crate::transform::{DefaultTransformer, EventTransformer};
use tracing::{debug, info};

/// Process one invocation's worth of records against an already-built
/// batch-write client.
pub async fn process_event(
    event: TransformationEvent,
    target: &StreamTarget,
    transformer: &dyn EventTransformer,
    client: &dyn RecordBatchClient,
    config: &ProcessorConfig,
) -> Result<TransformationResponse, ProcessorError> {
    let record_count = event.records.len();
    debug!(
        "Processing {record_count} records for {} stream {}",
        target.region, target.stream_name
    );

    let keyed = target.is_keyed();
    let mut outputs = Vec::with_capacity(record_count);
    let mut sources = Vec::with_capacity(record_count);

    for record in &event.records {
        let raw = decode_record_data(&record.data)?;
        let envelope = decode_envelope(&raw)?;
        outputs.push(classify_record(&record.record_id, &envelope, transformer));

        // Re-ingestion resends the original compressed bytes, not the
        // transformed payload, so a later invocation reprocesses from scratch.
        let partition_key = if keyed {
            record
                .kinesis_record_metadata
                .as_ref()
                .map(|metadata| metadata.partition_key.clone())
        } else {
            None
        };
        sources.push(ReingestionRecord {
            data: raw,
            partition_key,
        });
    }

    let chunks = split_oversized_batch(&mut outputs, sources, config.max_projected_payload_bytes);
    let reingested: usize = chunks.iter().map(Vec::len).sum();

    for chunk in chunks {
        submit_with_retry(
            client,
            &target.stream_name,
            chunk,
            config.max_submit_attempts,
        )
        .await?;
    }

    let delivered = count(&outputs, RecordResult::Ok);
    let dropped = count(&outputs, RecordResult::Dropped);
    let failed = count(&outputs, RecordResult::ProcessingFailed);
    info!(
        "Processing complete: {delivered} delivered, {dropped} dropped ({reingested} reingested), {failed} failed of {record_count} records"
    );

    Ok(TransformationResponse { records: outputs })
}

/// Resolve the re-ingestion target from the event, build the matching
/// regional client, and process with the default transform.
pub async fn handle_event(
    event: TransformationEvent,
    config: &ProcessorConfig,
) -> Result<TransformationResponse, ProcessorError> {
    let target = StreamTarget::from_event(&event)?;
    let client = client_for_target(&target).await;
    process_event(event, &target, &DefaultTransformer, client.as_ref(), config).await
}

fn count(outputs: &[crate::event::OutputRecord], result: RecordResult) -> usize {
    outputs.iter().filter(|o| o.result == result).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::tests::{envelope_json, gzip};
    use crate::event::InputRecord;
    use crate::stream::StreamKind;
    use crate::submit::tests::ScriptedClient;
    use crate::submit::ItemOutcome;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn input_record(id: &str, envelope: &str) -> InputRecord {
        InputRecord {
            record_id: id.to_string(),
            approximate_arrival_timestamp: None,
            data: STANDARD.encode(gzip(envelope)),
            kinesis_record_metadata: None,
        }
    }

    fn delivery_event(records: Vec<InputRecord>) -> (TransformationEvent, StreamTarget) {
        let event = TransformationEvent {
            invocation_id: Some("inv-1".to_string()),
            delivery_stream_arn: Some(
                "arn:aws:firehose:us-east-1:123456789012:deliverystream/delivery".to_string(),
            ),
            source_kinesis_stream_arn: None,
            region: Some("us-east-1".to_string()),
            records,
        };
        let target = StreamTarget {
            kind: StreamKind::DeliveryStream,
            region: "us-east-1".to_string(),
            stream_name: "delivery".to_string(),
        };
        (event, target)
    }

    #[tokio::test]
    async fn test_control_and_data_records() {
        let control = envelope_json("CONTROL_MESSAGE", &[]);
        let data = envelope_json(
            "DATA_MESSAGE",
            &[("e1", 1730000000000, "first"), ("e2", 1730000000001, "second")],
        );
        let (event, target) = delivery_event(vec![
            input_record("rec-1", &control),
            input_record("rec-2", &data),
        ]);
        let client = ScriptedClient::new(Vec::new());

        let response = process_event(
            event,
            &target,
            &DefaultTransformer,
            &client,
            &ProcessorConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(response.records.len(), 2);
        assert_eq!(response.records[0].record_id, "rec-1");
        assert_eq!(response.records[0].result, RecordResult::Dropped);
        assert!(response.records[0].data.is_none());

        assert_eq!(response.records[1].record_id, "rec-2");
        assert_eq!(response.records[1].result, RecordResult::Ok);
        let payload = STANDARD
            .decode(response.records[1].data.as_ref().unwrap())
            .unwrap();
        let payload = String::from_utf8(payload).unwrap();
        assert_eq!(payload.lines().count(), 2);

        // Nothing was oversized, so nothing was reingested.
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_kind_does_not_abort() {
        let unknown = envelope_json("MYSTERY_MESSAGE", &[]);
        let data = envelope_json("DATA_MESSAGE", &[("e1", 1730000000000, "hello")]);
        let (event, target) = delivery_event(vec![
            input_record("rec-1", &unknown),
            input_record("rec-2", &data),
        ]);
        let client = ScriptedClient::new(Vec::new());

        let response = process_event(
            event,
            &target,
            &DefaultTransformer,
            &client,
            &ProcessorConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(response.records[0].result, RecordResult::ProcessingFailed);
        assert_eq!(response.records[1].result, RecordResult::Ok);
    }

    #[tokio::test]
    async fn test_malformed_record_aborts_invocation() {
        let (event, target) = delivery_event(vec![InputRecord {
            record_id: "rec-1".to_string(),
            approximate_arrival_timestamp: None,
            data: STANDARD.encode(b"not gzip"),
            kinesis_record_metadata: None,
        }]);
        let client = ScriptedClient::new(Vec::new());

        let err = process_event(
            event,
            &target,
            &DefaultTransformer,
            &client,
            &ProcessorConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessorError::Decompress(_)));
    }

    #[tokio::test]
    async fn test_oversized_batch_reingests_original_bytes() {
        let data = envelope_json("DATA_MESSAGE", &[("e1", 1730000000000, "hello")]);
        let records: Vec<InputRecord> = (0..3)
            .map(|i| input_record(&format!("rec-{i}"), &data))
            .collect();
        let original: Vec<Vec<u8>> = records
            .iter()
            .map(|r| STANDARD.decode(&r.data).unwrap())
            .collect();
        let (event, target) = delivery_event(records);
        let client = ScriptedClient::new(Vec::new());

        // Budget of one byte: every Ok record crosses and gets diverted.
        let config = ProcessorConfig {
            max_projected_payload_bytes: 1,
            ..Default::default()
        };
        let response = process_event(event, &target, &DefaultTransformer, &client, &config)
            .await
            .unwrap();

        assert!(response
            .records
            .iter()
            .all(|r| r.result == RecordResult::Dropped && r.data.is_none()));

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 3);
        for (submitted, original) in calls[0].iter().zip(&original) {
            assert_eq!(&submitted.data, original);
            assert!(submitted.partition_key.is_none());
        }
    }

    #[tokio::test]
    async fn test_keyed_mode_carries_partition_keys() {
        let data = envelope_json("DATA_MESSAGE", &[("e1", 1730000000000, "hello")]);
        let mut record = input_record("rec-0", &data);
        record.kinesis_record_metadata = Some(crate::event::KinesisRecordMetadata {
            sequence_number: Some("4964".to_string()),
            subsequence_number: Some(0),
            partition_key: "pk-0".to_string(),
            shard_id: Some("shardId-000000000000".to_string()),
            approximate_arrival_timestamp: None,
        });
        let event = TransformationEvent {
            invocation_id: Some("inv-1".to_string()),
            delivery_stream_arn: Some(
                "arn:aws:firehose:us-east-1:123456789012:deliverystream/delivery".to_string(),
            ),
            source_kinesis_stream_arn: Some(
                "arn:aws:kinesis:us-east-1:123456789012:stream/source".to_string(),
            ),
            region: Some("us-east-1".to_string()),
            records: vec![record],
        };
        let target = StreamTarget::from_event(&event).unwrap();
        assert_eq!(target.stream_name, "source");

        let client = ScriptedClient::new(Vec::new());
        let config = ProcessorConfig {
            max_projected_payload_bytes: 1,
            ..Default::default()
        };
        process_event(event, &target, &DefaultTransformer, &client, &config)
            .await
            .unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].partition_key.as_deref(), Some("pk-0"));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_aborts() {
        let data = envelope_json("DATA_MESSAGE", &[("e1", 1730000000000, "hello")]);
        let (event, target) = delivery_event(vec![input_record("rec-0", &data)]);
        let client = ScriptedClient::new(
            (0..2)
                .map(|_| Ok(vec![ItemOutcome::failure("InternalFailure", "oops")]))
                .collect(),
        );
        let config = ProcessorConfig {
            max_projected_payload_bytes: 1,
            max_submit_attempts: 2,
        };

        let err = process_event(event, &target, &DefaultTransformer, &client, &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::RetriesExhausted { attempts: 2, .. }
        ));
    }
}
