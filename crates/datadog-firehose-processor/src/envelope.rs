// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of a single Firehose record into a CloudWatch Logs envelope.
//!
//! Records arrive base64-encoded and gzip-compressed. A record that fails to
//! decode is an input contract violation and aborts the whole invocation;
//! there is no per-record recovery for a malformed envelope.

use crate::error::ProcessorError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;

/// Kind of message carried by a CloudWatch Logs subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MessageType {
    #[serde(rename = "CONTROL_MESSAGE")]
    ControlMessage,
    #[serde(rename = "DATA_MESSAGE")]
    DataMessage,
    #[serde(other)]
    Unrecognized,
}

/// A single log event, carried verbatim from the source.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    pub id: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub message: String,
}

/// Decoded structural representation of one CloudWatch Logs subscription
/// record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEnvelope {
    pub message_type: MessageType,
    pub owner: Option<String>,
    pub log_group: String,
    pub log_stream: String,
    pub subscription_filters: Option<Vec<String>>,
    pub log_events: Vec<LogEvent>,
}

impl LogEnvelope {
    /// Source identifier binding the transformed events to where they came
    /// from, in `group:stream` form.
    pub fn source(&self) -> String {
        format!("{}:{}", self.log_group, self.log_stream)
    }
}

/// Decode the base64 payload of an incoming record into its raw compressed
/// bytes.
pub fn decode_record_data(data: &str) -> Result<Vec<u8>, ProcessorError> {
    STANDARD
        .decode(data)
        .map_err(|e| ProcessorError::RecordDecode(e.to_string()))
}

/// Decompress and parse raw record bytes into a [`LogEnvelope`].
pub fn decode_envelope(raw: &[u8]) -> Result<LogEnvelope, ProcessorError> {
    let mut decoder = GzDecoder::new(raw);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| ProcessorError::Decompress(e.to_string()))?;

    serde_json::from_slice(&decompressed).map_err(|e| ProcessorError::EnvelopeParse(e.to_string()))
}
