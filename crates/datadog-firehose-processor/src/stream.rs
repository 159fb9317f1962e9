// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Identity of the stream that re-ingested records are submitted to.

use crate::error::ProcessorError;
use crate::event::TransformationEvent;

/// The two supported re-ingestion targets. A delivery stream fed directly by
/// a Kinesis data stream re-ingests into that stream with per-record
/// partition keys; otherwise records go back into the delivery stream itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Kinesis,
    DeliveryStream,
}

/// Re-ingestion target resolved from the invocation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub kind: StreamKind,
    pub region: String,
    pub stream_name: String,
}

impl StreamTarget {
    /// Resolve the target from the invocation event. The presence of
    /// `sourceKinesisStreamArn` selects the partition-keyed mode.
    pub fn from_event(event: &TransformationEvent) -> Result<Self, ProcessorError> {
        let (kind, arn) = match (
            event.source_kinesis_stream_arn.as_deref(),
            event.delivery_stream_arn.as_deref(),
        ) {
            (Some(arn), _) => (StreamKind::Kinesis, arn),
            (None, Some(arn)) => (StreamKind::DeliveryStream, arn),
            (None, None) => return Err(ProcessorError::MissingStreamArn),
        };

        let (region, stream_name) = parse_stream_arn(arn)?;
        Ok(Self {
            kind,
            region,
            stream_name,
        })
    }

    /// Whether re-ingested records must carry a partition key.
    pub fn is_keyed(&self) -> bool {
        self.kind == StreamKind::Kinesis
    }
}

/// Split a stream ARN into its region and short stream name. The region is
/// the fourth colon-delimited segment and the name follows the first slash,
/// e.g. `arn:aws:kinesis:us-east-1:123456789012:stream/my-stream`.
fn parse_stream_arn(arn: &str) -> Result<(String, String), ProcessorError> {
    let region = arn
        .split(':')
        .nth(3)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ProcessorError::MalformedStreamArn(arn.to_string()))?;
    let stream_name = arn
        .split('/')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ProcessorError::MalformedStreamArn(arn.to_string()))?;

    Ok((region.to_string(), stream_name.to_string()))
}
