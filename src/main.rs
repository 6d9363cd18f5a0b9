use std::{path::Path, process::ExitCode, sync::Arc};

use handler::{Handler, InvocationOutcome};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;

mod aws;
mod cli;
mod error;
mod event;
mod handler;
mod policy;
mod ports;
mod remediation;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init();

    let args = cli::get_cli_args();
    let sdk_config = aws::get_sdk_config().await;

    let handler = Handler::new(
        Arc::new(aws::StsIdentityResolver::new(sdk_config)),
        Arc::new(aws::EcsClusterClient::new(sdk_config)),
        Arc::new(aws::SnsNotificationSink::new(sdk_config)),
        args.handler_settings(),
    );

    match &args.event_file {
        Some(path) => replay(&handler, path).await,
        None => serve(&handler).await,
    }
}

async fn serve(handler: &Handler) -> ExitCode {
    log::info!("Waiting for task state change events");

    let result = lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| async move {
        log::debug!("Handling invocation {}", event.context.request_id);
        match handler.handle(event.payload).await {
            Ok(_) => Ok(()),
            Err(e) => {
                log::error!("{e}");
                Err(lambda_runtime::Error::from(e))
            }
        }
    }))
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Lambda runtime stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn replay(handler: &Handler, path: &Path) -> ExitCode {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Unable to read event file {path:?}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match event::decode_slice(&bytes) {
        Ok(event) => handler.handle_event(&event).await,
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(InvocationOutcome::Compliant) => log::info!("Task is compliant"),
        Ok(InvocationOutcome::NoTarget) => log::info!("Task is not compliant, no service to remediate"),
        Ok(InvocationOutcome::Remediated(report) | InvocationOutcome::DryRun(report)) => {
            for (step, outcome) in &report.steps {
                log::info!("{step}: {outcome:?}");
            }
        }
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
