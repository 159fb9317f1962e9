// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mapping of one log event into its target ingestion representation.

use crate::envelope::LogEvent;
use crate::error::ProcessorError;
use serde::Serialize;

/// Maps one log event plus its source identifier into a serialized unit of
/// the target ingestion format.
///
/// This is the customization point of the processor. Implementations may
/// expand one event into several units or filter it out entirely, as long as
/// the returned string is self-delimited: concatenating N outputs must yield
/// N well-formed units with no external delimiter logic.
pub trait EventTransformer: Send + Sync {
    fn transform(&self, event: &LogEvent, source: &str) -> Result<String, ProcessorError>;
}

#[derive(Debug, Serialize)]
struct TargetUnit<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    source: &'a str,
    message: &'a str,
}

/// Default transform: a small JSON envelope binding a fixed category tag, the
/// `group:stream` source identifier, and the original message text, terminated
/// by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformer;

impl EventTransformer for DefaultTransformer {
    fn transform(&self, event: &LogEvent, source: &str) -> Result<String, ProcessorError> {
        let unit = TargetUnit {
            kind: "log",
            source,
            message: &event.message,
        };
        let mut serialized = serde_json::to_string(&unit)
            .map_err(|e| ProcessorError::EventSerialize(e.to_string()))?;
        serialized.push('\n');
        Ok(serialized)
    }
}
