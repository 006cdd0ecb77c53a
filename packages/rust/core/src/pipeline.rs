//! End-to-end request assembly: analysis document → specs → node request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use causespec_shared::{
    AlternativeModels, BuildOptions, CauseSpecError, ElementDefinition, Estimator, Node,
    NodeRequest, NodeType, RefutationType, Result, RunSummary, Specification,
    SpecificationCurveConfig,
};

use crate::builders;
use crate::specification;

/// An analysis document as exported by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Dataframe the population is drawn from; falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataframe: Option<String>,
    #[serde(default)]
    pub population: Vec<ElementDefinition>,
    #[serde(default)]
    pub exposure: Vec<ElementDefinition>,
    #[serde(default)]
    pub outcome: Vec<ElementDefinition>,
    #[serde(default)]
    pub alternative_models: AlternativeModels,
    #[serde(default)]
    pub estimators: Vec<Estimator>,
    /// Refutation chosen for this analysis, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refutation: Option<RefutationType>,
    /// Earlier run this analysis repeats; its refutation applies when none is chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_run: Option<RunSummary>,
}

/// Build the estimate-and-refute request for an analysis.
///
/// Produces an `EstimateEffects` node followed by a `RefuteEstimate` node.
#[instrument(skip_all, fields(estimators = analysis.estimators.len()))]
pub fn build_estimate_request(
    analysis: &AnalysisConfig,
    options: &BuildOptions,
) -> Result<NodeRequest> {
    let dataframe = analysis
        .dataframe
        .as_deref()
        .unwrap_or(options.dataframe.as_str());
    if dataframe.trim().is_empty() {
        return Err(CauseSpecError::validation("dataframe name must not be blank"));
    }
    if analysis.estimators.is_empty() {
        return Err(CauseSpecError::validation(
            "at least one estimator must be selected",
        ));
    }
    if analysis.population.is_empty() {
        warn!("analysis has no population definitions");
    }

    let specs = builders::build_specs(
        dataframe,
        &analysis.population,
        &analysis.exposure,
        &analysis.outcome,
    );
    let models = &analysis.alternative_models;
    let model_specs = builders::models(
        &models.maximum,
        &models.minimum,
        &models.intermediate,
        &models.unadjusted,
    );
    let estimator_specs = builders::build_estimators(&analysis.estimators);

    let refutation = analysis.refutation.unwrap_or_else(|| {
        specification::resolve_refutation_type(analysis.default_run.as_ref(), options.refutation)
    });
    let refutation_specs = builders::build_refutation_specs(refutation);

    let estimate = Node::new(NodeType::EstimateEffects)
        .with("population_specs", to_value(&specs.population_specs)?)
        .with("treatment_specs", to_value(&specs.treatment_specs)?)
        .with("outcome_specs", to_value(&specs.outcome_specs)?)
        .with("model_specs", to_value(&model_specs)?)
        .with("estimator_specs", to_value(&estimator_specs)?);
    let refute =
        Node::new(NodeType::RefuteEstimate).with("refutation_specs", to_value(&refutation_specs)?);

    info!(
        dataframe,
        models = model_specs.len(),
        refutation = %refutation,
        "estimate request assembled"
    );

    Ok(builders::build_nodes(&[estimate, refute]))
}

/// Input for a significance-test run over the specification curve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificanceInput {
    #[serde(default)]
    pub specifications: Vec<Specification>,
    #[serde(default)]
    pub curve: SpecificationCurveConfig,
    #[serde(default)]
    pub failed_refutation_ids: Vec<String>,
}

/// Build the significance-test request for every active specification.
#[instrument(skip_all, fields(specifications = input.specifications.len()))]
pub fn build_significance_request(input: &SignificanceInput) -> Result<NodeRequest> {
    let task_ids = specification::active_task_ids(
        &input.specifications,
        &input.curve,
        &input.failed_refutation_ids,
    );
    if task_ids.is_empty() {
        return Err(CauseSpecError::validation(
            "no active specifications to test",
        ));
    }

    info!(active = task_ids.len(), "significance request assembled");
    Ok(builders::build_significance_tests_node(&task_ids))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CauseSpecError::Serialization(e.to_string()))
}
