// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use datadog_firehose_processor::{
    handle_event, ProcessorConfig, TransformationEvent, TransformationResponse,
};

#[tokio::main]
pub async fn main() -> Result<(), Error> {
    let log_level = env::var("DD_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match ProcessorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating config on processor startup: {e}");
            return Err(e.into());
        }
    };

    run(service_fn(|request: LambdaEvent<TransformationEvent>| {
        handler(request, &config)
    }))
    .await
}

async fn handler(
    request: LambdaEvent<TransformationEvent>,
    config: &ProcessorConfig,
) -> Result<TransformationResponse, Error> {
    let (event, context) = request.into_parts();
    debug!(
        "Handling invocation {} with {} records",
        context.request_id,
        event.records.len()
    );
    Ok(handle_event(event, config).await?)
}
