use std::{path::PathBuf, sync::OnceLock, time::Duration};

use clap::Parser;

use crate::{
    handler::HandlerSettings, policy::DEFAULT_REGISTRY_TEMPLATE,
    remediation::RemediationSettings,
};

/// Stops ECS tasks that run images from outside the account's private registry.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Region of the approved registry.
    #[arg(long, env = "AWS_REGION")]
    pub region: String,

    /// SNS topic that receives remediation notices.
    #[arg(long, env = "SNS_TOPIC_ARN")]
    pub topic_arn: String,

    /// Template for the approved image prefix. `${ account }` and
    /// `${ region }` are substituted.
    #[arg(long, env = "REGISTRY_PREFIX_TEMPLATE", default_value = DEFAULT_REGISTRY_TEMPLATE)]
    pub registry_template: String,

    /// Reason recorded on stopped tasks.
    #[arg(
        long,
        env = "STOP_REASON",
        default_value = "image provenance policy violation"
    )]
    pub stop_reason: String,

    /// Seconds to wait on each AWS call. 0 disables the limit.
    #[arg(long, env = "REMEDIATION_STEP_TIMEOUT_SECS", default_value_t = 30)]
    pub step_timeout_secs: u64,

    /// Evaluate and resolve only, without touching any resource.
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Process a single event read from this file instead of serving Lambda
    /// invocations.
    #[arg(short, long)]
    pub event_file: Option<PathBuf>,
}

impl Args {
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }

    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            region: self.region.clone(),
            registry_template: self.registry_template.clone(),
            remediation: RemediationSettings {
                topic_arn: self.topic_arn.clone(),
                stop_reason: self.stop_reason.clone(),
                step_timeout: self.step_timeout(),
                dry_run: self.dry_run,
            },
        }
    }
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "ecs-provenance-guard",
            "--region",
            "us-east-1",
            "--topic-arn",
            "arn:aws:sns:us-east-1:111111111111:alerts",
        ])
        .expect("Failed to parse args");

        assert_eq!(args.registry_template, DEFAULT_REGISTRY_TEMPLATE);
        assert_eq!(args.step_timeout(), Some(Duration::from_secs(30)));
        assert!(args.event_file.is_none());

        let settings = args.handler_settings();
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(
            settings.remediation.topic_arn,
            "arn:aws:sns:us-east-1:111111111111:alerts"
        );
        assert_eq!(
            settings.remediation.stop_reason,
            "image provenance policy violation"
        );
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let args = Args::try_parse_from([
            "ecs-provenance-guard",
            "--region",
            "eu-west-1",
            "--topic-arn",
            "topic",
            "--step-timeout-secs",
            "0",
            "--dry-run",
            "--event-file",
            "event.json",
        ])
        .unwrap();

        assert_eq!(args.step_timeout(), None);
        assert!(args.handler_settings().remediation.dry_run);
        assert_eq!(args.event_file, Some(PathBuf::from("event.json")));
    }
}
