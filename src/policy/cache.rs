use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::rule::{CompiledPolicy, ComplianceContext, PolicyError};

/// Compiled policies keyed by account and region, reused across warm
/// invocations of the same process.
#[derive(Debug)]
pub struct PolicyCache {
    template: String,
    compiled: Mutex<HashMap<ComplianceContext, Arc<CompiledPolicy>>>,
}

impl PolicyCache {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            compiled: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_compile(
        &self,
        context: &ComplianceContext,
    ) -> Result<Arc<CompiledPolicy>, PolicyError> {
        let mut compiled = self
            .compiled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(policy) = compiled.get(context) {
            return Ok(Arc::clone(policy));
        }

        log::debug!(
            "Compiling registry policy for account {} in {}",
            context.account,
            context.region
        );
        let policy = Arc::new(CompiledPolicy::compile(context, &self.template)?);
        compiled.insert(context.clone(), Arc::clone(&policy));
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DEFAULT_REGISTRY_TEMPLATE;

    #[test]
    fn test_reuses_compiled_policy() {
        let cache = PolicyCache::new(DEFAULT_REGISTRY_TEMPLATE);
        let context = ComplianceContext::new("111111111111", "us-east-1");

        let first = cache.get_or_compile(&context).unwrap();
        let second = cache.get_or_compile(&context).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_keys_by_account_and_region() {
        let cache = PolicyCache::new(DEFAULT_REGISTRY_TEMPLATE);
        let east = cache
            .get_or_compile(&ComplianceContext::new("111111111111", "us-east-1"))
            .unwrap();
        let west = cache
            .get_or_compile(&ComplianceContext::new("111111111111", "us-west-2"))
            .unwrap();
        assert_eq!(
            west.registry_prefix(),
            "111111111111.dkr.ecr.us-west-2.amazonaws.com"
        );
        assert_ne!(east.registry_prefix(), west.registry_prefix());
    }

    #[test]
    fn test_failed_compilation_is_not_cached() {
        let cache = PolicyCache::new("${ nope }");
        let context = ComplianceContext::new("111111111111", "us-east-1");
        assert!(cache.get_or_compile(&context).is_err());
        assert!(cache.get_or_compile(&context).is_err());
    }
}
