//! Request-payload builders.
//!
//! Pure translations from causal-model configuration into the node-graph
//! request schema of the execution service. Inputs are borrowed and never
//! mutated; every call returns freshly allocated values.

use serde_json::Value;
use tracing::{debug, instrument};

use causespec_shared::{
    AlternativeModel, ElementDefinition, ElementSpecs, Estimator, EstimatorSpec, EstimatorType,
    ModelSpec, Node, NodeRequest, NodeType, PopulationSpec, RefutationSpec, RefutationType,
    VariableSpec,
};

use crate::tables;

/// Name of the baseline model, emitted even when it adjusts for nothing.
pub const UNADJUSTED: &str = "Unadjusted";

/// Build a request from tagged nodes.
///
/// Each output node starts from the defaults registered for its type,
/// overlaid by the node's own properties. The original `type` is kept
/// regardless of what the defaults contain; an `Other` naming a known
/// type is resolved to it.
#[instrument(skip_all, fields(node_count = nodes.len()))]
pub fn build_nodes(nodes: &[Node]) -> NodeRequest {
    let nodes = nodes
        .iter()
        .map(|node| {
            let node_type = node.node_type.normalized();
            let mut properties = tables::node_properties(&node_type);
            for (key, value) in &node.properties {
                properties.insert(key.clone(), value.clone());
            }
            properties.remove("type");
            Node {
                node_type,
                properties,
            }
        })
        .collect();

    NodeRequest { nodes }
}

/// Build the population, treatment and outcome specs.
#[instrument(skip_all, fields(dataframe = %dataframe))]
pub fn build_specs(
    dataframe: &str,
    population: &[ElementDefinition],
    exposure: &[ElementDefinition],
    outcome: &[ElementDefinition],
) -> ElementSpecs {
    let population_specs = population
        .iter()
        .map(|p| PopulationSpec {
            spec_type: p.level.clone(),
            label: p.variable.clone().unwrap_or_default(),
            dataframe: dataframe.to_string(),
            population_id: p.column.clone(),
        })
        .collect();

    debug!(
        population = population.len(),
        exposure = exposure.len(),
        outcome = outcome.len(),
        "building element specs"
    );

    ElementSpecs {
        population_specs,
        treatment_specs: exposure.iter().map(variable_spec).collect(),
        outcome_specs: outcome.iter().map(variable_spec).collect(),
    }
}

fn variable_spec(definition: &ElementDefinition) -> VariableSpec {
    VariableSpec {
        spec_type: definition.level.clone(),
        label: definition.variable.clone(),
        variable: definition.column.clone(),
    }
}

/// Build the spec for one named adjustment level.
///
/// Returns `None` for an empty model unless it is the [`UNADJUSTED`] baseline.
pub fn build_model_level(model_name: &str, model: &AlternativeModel) -> Option<ModelSpec> {
    if model.is_empty() && model_name != UNADJUSTED {
        return None;
    }

    let name = format!("{model_name} Model");
    Some(ModelSpec {
        spec_type: name.clone(),
        label: name,
        confounders: model.confounders.clone(),
        outcome_determinants: model.outcome_determinants.clone(),
    })
}

/// Build the ordered model list: Maximum, Minimum, then Unadjusted.
///
/// The backend ranks adjustment sets by position. `_interm` is accepted
/// for call-site compatibility; no intermediate level is sent.
pub fn models(
    max: &AlternativeModel,
    min: &AlternativeModel,
    _interm: &AlternativeModel,
    unadju: &AlternativeModel,
) -> Vec<ModelSpec> {
    let mut list: Vec<ModelSpec> = [("Maximum", max), ("Minimum", min)]
        .into_iter()
        .filter_map(|(name, model)| build_model_level(name, model))
        .collect();

    list.extend(build_model_level(UNADJUSTED, unadju));
    list
}

/// Build estimator specs, one per selection, in input order.
#[instrument(skip_all, fields(estimator_count = estimators.len()))]
pub fn build_estimators(estimators: &[Estimator]) -> Vec<EstimatorSpec> {
    estimators
        .iter()
        .map(|estimator| {
            let estimator_type = estimator.estimator_type.unwrap_or(EstimatorType::FALLBACK);
            EstimatorSpec {
                spec_type: tables::model_type_for_group(estimator.group).to_string(),
                label: estimator_type.as_str().to_string(),
                require_propensity_score: estimator_type != EstimatorType::LinearRegression,
                method_name: format!(
                    "{}.{}",
                    tables::METHOD_NAMESPACE,
                    tables::model_name_for_estimator(estimator_type)
                ),
            }
        })
        .collect()
}

/// Build the refutation parameters for a refutation type.
pub fn build_refutation_specs(refutation: RefutationType) -> RefutationSpec {
    RefutationSpec {
        num_simulations: tables::simulation_count(refutation),
    }
}

/// Build a significance-test request over the given estimate tasks.
pub fn build_significance_tests_node(task_ids: &[String]) -> NodeRequest {
    let ids: Vec<Value> = task_ids.iter().cloned().map(Value::String).collect();
    build_nodes(&[Node::new(NodeType::SignificanceTest).with("spec_ids", ids)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use causespec_shared::EstimatorGroup;
    use serde_json::json;

    fn model(confounders: &[&str], determinants: &[&str]) -> AlternativeModel {
        AlternativeModel {
            confounders: confounders.iter().map(|s| s.to_string()).collect(),
            outcome_determinants: determinants.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn element(level: &str, variable: Option<&str>, column: &str) -> ElementDefinition {
        ElementDefinition {
            level: level.into(),
            variable: variable.map(String::from),
            column: column.into(),
        }
    }

    // -- build_nodes --------------------------------------------------------

    #[test]
    fn caller_properties_override_defaults() {
        let node = Node::new(NodeType::EstimateEffects)
            .with("model_specs", json!([{ "type": "Maximum Model" }]))
            .with("extra", json!(1));
        let request = build_nodes(&[node]);

        let value = serde_json::to_value(&request).expect("serialize");
        let out = &value["nodes"][0];
        assert_eq!(out["type"], "EstimateEffects");
        assert_eq!(out["model_specs"], json!([{ "type": "Maximum Model" }]));
        assert_eq!(out["population_specs"], json!([]));
        assert_eq!(out["extra"], 1);
    }

    #[test]
    fn unknown_node_type_gets_no_defaults() {
        let node = Node::new(NodeType::Other("Custom".into())).with("a", "b");
        let request = build_nodes(&[node.clone()]);
        assert_eq!(request.nodes, vec![node]);
    }

    #[test]
    fn output_type_always_matches_input() {
        let mut node = Node::new(NodeType::RefuteEstimate);
        node.properties.insert("type".into(), json!("SomethingElse"));
        let request = build_nodes(&[node, Node::new(NodeType::IdentifyEstimand)]);

        assert_eq!(request.nodes[0].node_type, NodeType::RefuteEstimate);
        assert!(!request.nodes[0].properties.contains_key("type"));
        assert_eq!(request.nodes[1].node_type, NodeType::IdentifyEstimand);

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["nodes"][0]["type"], "RefuteEstimate");
    }

    #[test]
    fn other_naming_known_type_gets_its_defaults() {
        let spelled_out = Node::new(NodeType::Other("EstimateEffects".into()));
        let request = build_nodes(&[spelled_out, Node::new(NodeType::EstimateEffects)]);

        assert_eq!(request.nodes[0], request.nodes[1]);
        assert_eq!(request.nodes[0].node_type, NodeType::EstimateEffects);
        assert!(request.nodes[0].properties.contains_key("model_specs"));
    }

    #[test]
    fn empty_node_list() {
        assert!(build_nodes(&[]).nodes.is_empty());
    }

    // -- build_specs --------------------------------------------------------

    #[test]
    fn single_population_spec() {
        let specs = build_specs("df", &[element("binary", Some("Age"), "age")], &[], &[]);
        let value = serde_json::to_value(&specs).expect("serialize");
        assert_eq!(
            value,
            json!({
                "population_specs": [
                    { "type": "binary", "label": "Age", "dataframe": "df", "population_id": "age" }
                ],
                "treatment_specs": [],
                "outcome_specs": []
            })
        );
    }

    #[test]
    fn population_label_defaults_to_empty_but_others_are_omitted() {
        let specs = build_specs(
            "df",
            &[element("continuous", None, "income")],
            &[element("binary", None, "treated")],
            &[element("binary", Some("Recovered"), "recovered")],
        );
        assert_eq!(specs.population_specs[0].label, "");

        let value = serde_json::to_value(&specs).expect("serialize");
        assert_eq!(value["treatment_specs"][0], json!({ "type": "binary", "variable": "treated" }));
        assert_eq!(value["outcome_specs"][0]["label"], "Recovered");
    }

    #[test]
    fn specs_preserve_order_and_count() {
        let population = vec![
            element("a", Some("A"), "x"),
            element("b", Some("B"), "x"),
            element("c", Some("C"), "y"),
        ];
        let exposure = vec![element("e1", None, "t1"), element("e2", None, "t2")];
        let specs = build_specs("df", &population, &exposure, &[]);

        assert_eq!(specs.population_specs.len(), population.len());
        assert_eq!(specs.treatment_specs.len(), exposure.len());
        assert!(specs.outcome_specs.is_empty());
        let types: Vec<_> = specs.population_specs.iter().map(|p| p.spec_type.as_str()).collect();
        assert_eq!(types, ["a", "b", "c"]);
        assert_eq!(specs.treatment_specs[1].variable, "t2");
    }

    // -- models -------------------------------------------------------------

    #[test]
    fn unadjusted_level_is_never_dropped() {
        let spec = build_model_level(UNADJUSTED, &AlternativeModel::default())
            .expect("unadjusted always present");
        assert_eq!(spec.spec_type, "Unadjusted Model");
        assert_eq!(spec.label, "Unadjusted Model");
        assert!(spec.confounders.is_empty());
        assert!(spec.outcome_determinants.is_empty());
    }

    #[test]
    fn other_empty_levels_are_dropped() {
        for name in ["Maximum", "Minimum", "Intermediate", "unadjusted", ""] {
            assert_eq!(build_model_level(name, &AlternativeModel::default()), None);
        }
        assert!(build_model_level("Minimum", &model(&[], &["bmi"])).is_some());
    }

    #[test]
    fn model_level_copies_lists() {
        let mut input = model(&["age"], &["bmi"]);
        let spec = build_model_level("Maximum", &input).expect("non-empty");
        input.confounders.push("sex".into());
        assert_eq!(spec.confounders, vec!["age"]);
        assert_eq!(spec.outcome_determinants, vec!["bmi"]);
    }

    #[test]
    fn models_are_ordered_and_filtered() {
        let max = model(&["age", "sex"], &["bmi"]);
        let min = model(&["age"], &[]);
        let interm = model(&["ignored"], &[]);
        let unadju = AlternativeModel::default();

        let list = models(&max, &min, &interm, &unadju);
        let labels: Vec<_> = list.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Maximum Model", "Minimum Model", "Unadjusted Model"]);

        let list = models(&AlternativeModel::default(), &min, &interm, &unadju);
        let labels: Vec<_> = list.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Minimum Model", "Unadjusted Model"]);

        let empty = AlternativeModel::default();
        let list = models(&empty, &empty, &interm, &empty);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label, "Unadjusted Model");
    }

    // -- estimators ---------------------------------------------------------

    #[test]
    fn estimator_without_type_falls_back_to_weighting() {
        let specs = build_estimators(&[Estimator {
            group: EstimatorGroup::Exposure,
            estimator_type: None,
        }]);
        assert_eq!(
            serde_json::to_value(&specs).expect("serialize"),
            json!([{
                "type": "Treatment Assignment Model",
                "label": "Inverse Propensity Weighting",
                "require_propensity_score": true,
                "method_name": "backdoor.propensity_score_weighting"
            }])
        );
    }

    #[test]
    fn linear_regression_needs_no_propensity_score() {
        let specs = build_estimators(&[
            Estimator {
                group: EstimatorGroup::Outcome,
                estimator_type: Some(EstimatorType::LinearRegression),
            },
            Estimator {
                group: EstimatorGroup::Outcome,
                estimator_type: Some(EstimatorType::ForestDoubleMachineLearning),
            },
        ]);
        assert!(!specs[0].require_propensity_score);
        assert_eq!(specs[0].method_name, "backdoor.linear_regression");
        assert_eq!(specs[0].spec_type, "Outcome Model");
        assert!(specs[1].require_propensity_score);
        assert_eq!(specs[1].method_name, "backdoor.econml.dml.CausalForestDML");
    }

    #[test]
    fn every_estimator_method_is_namespaced() {
        for estimator_type in EstimatorType::ALL {
            let specs = build_estimators(&[Estimator {
                group: EstimatorGroup::Exposure,
                estimator_type: Some(*estimator_type),
            }]);
            assert!(specs[0].method_name.starts_with("backdoor."));
            assert_eq!(specs[0].label, estimator_type.as_str());
        }
    }

    // -- refutation / significance -----------------------------------------

    #[test]
    fn refutation_specs_cover_every_type() {
        for refutation in RefutationType::ALL {
            let spec = build_refutation_specs(*refutation);
            assert_eq!(spec, build_refutation_specs(*refutation));
            assert!(spec.num_simulations > 0);
        }
        assert_eq!(
            serde_json::to_value(build_refutation_specs(RefutationType::Quick)).expect("serialize"),
            json!({ "num_simulations": 10 })
        );
    }

    #[test]
    fn significance_node_carries_task_ids() {
        let request = build_significance_tests_node(&["t1".to_string(), "t2".to_string()]);
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({ "nodes": [{ "type": "SignificanceTest", "spec_ids": ["t1", "t2"] }] })
        );
    }
}
