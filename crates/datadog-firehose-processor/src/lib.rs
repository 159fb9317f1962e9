// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Inline transformation of CloudWatch Logs records delivered through a
//! Kinesis Data Firehose delivery stream.
//!
//! The processor receives one invocation's worth of compressed log records,
//! decodes and reshapes them into newline-delimited target events, and hands
//! the transformed batch back to Firehose. When the transformed batch would
//! overflow the invocation response limit, the overflow records are put back
//! onto the originating stream so a later invocation can process them from
//! scratch.

pub mod classify;
pub mod config;
pub mod envelope;
pub mod error;
pub mod event;
pub mod processor;
pub mod splitter;
pub mod stream;
pub mod submit;
pub mod transform;

pub use config::ProcessorConfig;
pub use error::ProcessorError;
pub use event::{OutputRecord, RecordResult, TransformationEvent, TransformationResponse};
pub use processor::{handle_event, process_event};
pub use transform::{DefaultTransformer, EventTransformer};
