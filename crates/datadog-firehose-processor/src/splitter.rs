// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Oversized-batch splitting.
//!
//! The transformed batch handed back to Firehose must stay under the
//! invocation response limit. Records past the point where the projected
//! size crosses the budget are downgraded to `Dropped` and their original
//! untransformed payloads are queued for re-ingestion into the source
//! stream, chunked to the submission API's batch ceiling.

use crate::event::{OutputRecord, RecordResult};
use tracing::info;

/// Batch-size ceiling of the PutRecords / PutRecordBatch APIs.
pub const MAX_CHUNK_RECORDS: usize = 500;

/// A record queued for re-submission to the originating stream. Carries the
/// original pre-transform bytes so a later invocation can reprocess the
/// record from scratch. The partition key is present only in keyed mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReingestionRecord {
    pub data: Vec<u8>,
    pub partition_key: Option<String>,
}

/// Walk the classified records in order, accumulating the projected response
/// size of every `Ok` record. Once the running total crosses `budget`, that
/// record and every later `Ok` record is downgraded to `Dropped`, its data
/// cleared, and its original payload diverted into the returned chunk list.
///
/// `sources` must hold one entry per output record, in the same order.
pub fn split_oversized_batch(
    outputs: &mut [OutputRecord],
    sources: Vec<ReingestionRecord>,
    budget: usize,
) -> Vec<Vec<ReingestionRecord>> {
    debug_assert_eq!(outputs.len(), sources.len());

    let mut chunks: Vec<Vec<ReingestionRecord>> = Vec::new();
    let mut pending: Vec<ReingestionRecord> = Vec::new();
    let mut projected = 0usize;
    let mut diverted = 0usize;

    for (output, source) in outputs.iter_mut().zip(sources) {
        if output.result != RecordResult::Ok {
            continue;
        }

        projected += output.data.as_ref().map_or(0, String::len) + output.record_id.len();
        if projected > budget {
            output.result = RecordResult::Dropped;
            output.data = None;
            diverted += 1;

            pending.push(source);
            if pending.len() == MAX_CHUNK_RECORDS {
                chunks.push(std::mem::take(&mut pending));
            }
        }
    }

    if !pending.is_empty() {
        chunks.push(pending);
    }

    if diverted > 0 {
        info!(
            "Transformed batch over size budget, diverting {diverted} records for re-ingestion in {} chunks",
            chunks.len()
        );
    }

    chunks
}
