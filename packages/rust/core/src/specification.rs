//! Derived state over the specification curve.
//!
//! A specification is active unless the user switched it off or its
//! refutation failed. Follow-up requests (significance tests) only ever
//! target active specifications.

use std::collections::HashSet;

use causespec_shared::{
    NodeResponseStatus, RefutationType, RunSummary, SignificanceTestResult, Specification,
    SpecificationCurveConfig,
};

/// Specifications that are neither inactive nor failed, in input order.
pub fn active_specifications<'a>(
    specifications: &'a [Specification],
    config: &SpecificationCurveConfig,
    failed_refutation_ids: &[String],
) -> impl Iterator<Item = &'a Specification> {
    let excluded: HashSet<String> = config
        .inactive_specifications
        .iter()
        .chain(failed_refutation_ids)
        .cloned()
        .collect();

    specifications
        .iter()
        .filter(move |spec| !excluded.contains(&spec.id))
}

/// Estimated effects of the active specifications.
pub fn active_values(
    specifications: &[Specification],
    config: &SpecificationCurveConfig,
    failed_refutation_ids: &[String],
) -> Vec<f64> {
    active_specifications(specifications, config, failed_refutation_ids)
        .map(|spec| spec.estimated_effect)
        .collect()
}

/// Task ids of the active specifications.
pub fn active_task_ids(
    specifications: &[Specification],
    config: &SpecificationCurveConfig,
    failed_refutation_ids: &[String],
) -> Vec<String> {
    active_specifications(specifications, config, failed_refutation_ids)
        .map(|spec| spec.task_id.clone())
        .collect()
}

/// The refutation a follow-up should use: the default run's, if it recorded one.
pub fn resolve_refutation_type(
    default_run: Option<&RunSummary>,
    configured: RefutationType,
) -> RefutationType {
    default_run
        .and_then(|run| run.refutation_type)
        .unwrap_or(configured)
}

/// Whether the service reported the significance test as failed.
pub fn significance_failed(result: Option<&SignificanceTestResult>) -> bool {
    result
        .and_then(|r| r.status.as_deref())
        .is_some_and(|status| status.to_lowercase() == NodeResponseStatus::Failed.as_str())
}
