use minijinja::Environment;
use serde::Serialize;

use crate::event::Container;

/// Images must come from the private ECR registry of the running account.
pub const DEFAULT_REGISTRY_TEMPLATE: &str = "${ account }.dkr.ecr.${ region }.amazonaws.com";

/// Identity and region the policy is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ComplianceContext {
    pub account: String,
    pub region: String,
}

impl ComplianceContext {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceDecision {
    Compliant,
    NonCompliant,
}

impl ComplianceDecision {
    pub fn is_compliant(self) -> bool {
        matches!(self, ComplianceDecision::Compliant)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Templating error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Registry prefix rendered empty")]
    EmptyPrefix,
    #[error("Registry prefix '{0}' must not contain whitespace or '/'")]
    InvalidPrefix(String),
}

/// Default-deny allow rule: a task is allowed only when every container
/// image starts with the approved registry prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPolicy {
    registry_prefix: String,
}

impl CompiledPolicy {
    pub fn compile(context: &ComplianceContext, template: &str) -> Result<Self, PolicyError> {
        let registry_prefix = render_prefix(template, context)?;
        let registry_prefix = registry_prefix.trim();

        if registry_prefix.is_empty() {
            return Err(PolicyError::EmptyPrefix);
        }
        if registry_prefix.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(PolicyError::InvalidPrefix(registry_prefix.to_string()));
        }

        Ok(Self {
            registry_prefix: registry_prefix.to_string(),
        })
    }

    pub fn registry_prefix(&self) -> &str {
        &self.registry_prefix
    }

    /// A container without an image reference can never match.
    pub fn is_approved(&self, container: &Container) -> bool {
        container
            .image
            .as_deref()
            .is_some_and(|image| image.starts_with(&self.registry_prefix))
    }

    pub fn violations<'a>(
        &'a self,
        containers: &'a [Container],
    ) -> impl Iterator<Item = &'a Container> + 'a {
        containers.iter().filter(|c| !self.is_approved(c))
    }

    pub fn evaluate(&self, containers: &[Container]) -> ComplianceDecision {
        match self.violations(containers).next() {
            None => ComplianceDecision::Compliant,
            Some(_) => ComplianceDecision::NonCompliant,
        }
    }
}

/// Compile the default rule for `account`/`region` and evaluate it once.
#[cfg(test)]
fn evaluate(
    containers: &[Container],
    account: &str,
    region: &str,
) -> Result<ComplianceDecision, PolicyError> {
    let context = ComplianceContext::new(account, region);
    Ok(CompiledPolicy::compile(&context, DEFAULT_REGISTRY_TEMPLATE)?.evaluate(containers))
}

fn render_prefix(template: &str, context: &ComplianceContext) -> Result<String, PolicyError> {
    let mut env = Environment::new();

    let syntax = minijinja::syntax::SyntaxConfig::builder()
        .variable_delimiters("${", "}")
        .build()?;

    env.set_syntax(syntax);
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

    let template = env.template_from_str(template)?;
    Ok(template.render(context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "111111111111";
    const REGION: &str = "us-east-1";

    fn images(refs: &[&str]) -> Vec<Container> {
        refs.iter().map(|r| Container::with_image(*r)).collect()
    }

    fn policy() -> CompiledPolicy {
        CompiledPolicy::compile(
            &ComplianceContext::new(ACCOUNT, REGION),
            DEFAULT_REGISTRY_TEMPLATE,
        )
        .expect("Default template must compile")
    }

    #[test]
    fn test_default_prefix() {
        assert_eq!(
            policy().registry_prefix(),
            "111111111111.dkr.ecr.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_private_registry_images_are_compliant() {
        let containers = images(&[
            "111111111111.dkr.ecr.us-east-1.amazonaws.com/app:1",
            "111111111111.dkr.ecr.us-east-1.amazonaws.com/sidecar@sha256:abcd",
        ]);
        let first = evaluate(&containers, ACCOUNT, REGION).unwrap();
        let second = evaluate(&containers, ACCOUNT, REGION).unwrap();
        assert_eq!(first, ComplianceDecision::Compliant);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_container_list_is_compliant() {
        assert!(evaluate(&[], ACCOUNT, REGION).unwrap().is_compliant());
    }

    #[test]
    fn test_single_violation_suffices() {
        let containers = images(&[
            "111111111111.dkr.ecr.us-east-1.amazonaws.com/app:1",
            "docker.io/library/app:1",
            "111111111111.dkr.ecr.us-east-1.amazonaws.com/worker:2",
        ]);
        let policy = policy();
        assert_eq!(policy.evaluate(&containers), ComplianceDecision::NonCompliant);

        let offending: Vec<_> = policy
            .violations(&containers)
            .filter_map(|c| c.image.as_deref())
            .collect();
        assert_eq!(offending, vec!["docker.io/library/app:1"]);
    }

    #[test]
    fn test_other_account_or_region_is_rejected() {
        let containers = images(&["222222222222.dkr.ecr.us-east-1.amazonaws.com/app:1"]);
        assert!(!evaluate(&containers, ACCOUNT, REGION).unwrap().is_compliant());

        let containers = images(&["111111111111.dkr.ecr.eu-west-1.amazonaws.com/app:1"]);
        assert!(!evaluate(&containers, ACCOUNT, REGION).unwrap().is_compliant());
    }

    #[test]
    fn test_container_without_image_is_rejected() {
        let containers = vec![Container::default()];
        assert_eq!(policy().evaluate(&containers), ComplianceDecision::NonCompliant);
    }

    #[test]
    fn test_custom_template() {
        let policy = CompiledPolicy::compile(
            &ComplianceContext::new(ACCOUNT, "cn-north-1"),
            "${ account }.dkr.ecr.${ region }.amazonaws.com.cn",
        )
        .unwrap();
        assert_eq!(
            policy.registry_prefix(),
            "111111111111.dkr.ecr.cn-north-1.amazonaws.com.cn"
        );
    }

    #[test]
    fn test_template_failure() {
        let context = ComplianceContext::new(ACCOUNT, REGION);

        let res = CompiledPolicy::compile(&context, "${ acount }.dkr.ecr");
        assert!(matches!(res, Err(PolicyError::Template(_))), "{:?}", res);

        let res = CompiledPolicy::compile(&context, "${ account ");
        assert!(matches!(res, Err(PolicyError::Template(_))), "{:?}", res);

        let res = CompiledPolicy::compile(&context, "   ");
        assert!(matches!(res, Err(PolicyError::EmptyPrefix)), "{:?}", res);

        let res = CompiledPolicy::compile(&context, "${ account }/images");
        assert!(matches!(res, Err(PolicyError::InvalidPrefix(_))), "{:?}", res);
    }
}
