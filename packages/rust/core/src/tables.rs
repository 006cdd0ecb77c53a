//! Static lookup tables translating front-end enumerations into the
//! vocabulary of the execution service.
//!
//! Every table is an exhaustive `match`: adding a member to one of the
//! enumerations without extending the matching table does not compile.

use serde_json::{Map, Value, json};

use causespec_shared::{EstimatorGroup, EstimatorType, NodeType, RefutationType};

/// Namespace prefixed to every estimator method name.
pub const METHOD_NAMESPACE: &str = "backdoor";

/// Estimator method name understood by the backend, without namespace.
pub fn model_name_for_estimator(estimator: EstimatorType) -> &'static str {
    match estimator {
        EstimatorType::InversePropensityWeighting => "propensity_score_weighting",
        EstimatorType::PropensityScoreMatching => "propensity_score_matching",
        EstimatorType::PropensityScoreStratification => "propensity_score_stratification",
        EstimatorType::LinearDoubleMachineLearning => "econml.dml.LinearDML",
        EstimatorType::ForestDoubleMachineLearning => "econml.dml.CausalForestDML",
        EstimatorType::LinearDoublyRobustLearner => "econml.dr.LinearDRLearner",
        EstimatorType::ForestDoublyRobustLearner => "econml.dr.ForestDRLearner",
        EstimatorType::LinearRegression => "linear_regression",
    }
}

/// Model type sent for an estimator family.
pub fn model_type_for_group(group: EstimatorGroup) -> &'static str {
    match group {
        EstimatorGroup::Exposure => "Treatment Assignment Model",
        EstimatorGroup::Outcome => "Outcome Model",
    }
}

/// Number of simulations each refuter runs.
pub fn simulation_count(refutation: RefutationType) -> u32 {
    match refutation {
        RefutationType::Quick => 10,
        RefutationType::Full => 100,
    }
}

/// Default properties registered for a node type.
///
/// Unregistered types get an empty map.
pub fn node_properties(node_type: &NodeType) -> Map<String, Value> {
    let defaults = match node_type.normalized() {
        NodeType::IdentifyEstimand => json!({
            "estimand_type": "nonparametric-ate",
        }),
        NodeType::EstimateEffects => json!({
            "population_specs": [],
            "treatment_specs": [],
            "outcome_specs": [],
            "model_specs": [],
            "estimator_specs": [],
        }),
        NodeType::RefuteEstimate => json!({
            "refutation_specs": { "num_simulations": simulation_count(RefutationType::Quick) },
        }),
        NodeType::SignificanceTest => json!({
            "spec_ids": [],
        }),
        NodeType::CreateCausalGraph | NodeType::Other(_) => return Map::new(),
    };

    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
