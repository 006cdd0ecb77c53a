//! Core domain types for causespec request building.
//!
//! Inputs (factor definitions, alternative models, estimators) mirror the
//! documents produced by the analysis front end. Outputs (`*Spec`,
//! [`NodeRequest`]) mirror the JSON schema expected by the execution service.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{CauseSpecError, Result};

/// Declares a closed string enumeration whose wire form is its label.
///
/// Parsing an unknown label fails with [`CauseSpecError::UnmappedEnum`].
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire label for this member.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CauseSpecError;

            fn from_str(s: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.as_str() == s)
                    .ok_or_else(|| CauseSpecError::unmapped($kind, s))
            }
        }

        impl TryFrom<String> for $name {
            type Error = CauseSpecError;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

closed_enum! {
    /// Family an estimator belongs to; selects the model type sent to the backend.
    pub enum EstimatorGroup as "estimator group" {
        /// Models the treatment assignment (propensity-score family).
        Exposure => "Exposure",
        /// Models the outcome directly.
        Outcome => "Outcome",
    }
}

closed_enum! {
    /// Causal-effect estimation method.
    pub enum EstimatorType as "estimator type" {
        InversePropensityWeighting => "Inverse Propensity Weighting",
        PropensityScoreMatching => "Propensity Score Matching",
        PropensityScoreStratification => "Propensity Score Stratification",
        LinearDoubleMachineLearning => "Linear Double Machine Learning",
        ForestDoubleMachineLearning => "Forest Double Machine Learning",
        LinearDoublyRobustLearner => "Linear Doubly Robust Learner",
        ForestDoublyRobustLearner => "Forest Doubly Robust Learner",
        LinearRegression => "Linear Regression",
    }
}

impl EstimatorType {
    /// Used wherever an estimator is selected without an explicit type.
    pub const FALLBACK: Self = Self::InversePropensityWeighting;
}

closed_enum! {
    /// Robustness-test family run against an estimated effect.
    pub enum RefutationType as "refutation type" {
        /// Few simulations, fast feedback.
        Quick => "quick_refutation",
        /// Full simulation count.
        Full => "full_refutation",
    }
}

impl Default for RefutationType {
    fn default() -> Self {
        Self::Quick
    }
}

closed_enum! {
    /// Lifecycle status reported by the execution service for a node.
    pub enum NodeResponseStatus as "node response status" {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// Discriminator of an executable node.
///
/// Unlike the closed enumerations above, unknown discriminators are kept
/// verbatim in [`NodeType::Other`] so they pass through the builder untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    CreateCausalGraph,
    IdentifyEstimand,
    EstimateEffects,
    RefuteEstimate,
    SignificanceTest,
    Other(String),
}

impl NodeType {
    /// The wire discriminator.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateCausalGraph => "CreateCausalGraph",
            Self::IdentifyEstimand => "IdentifyEstimand",
            Self::EstimateEffects => "EstimateEffects",
            Self::RefuteEstimate => "RefuteEstimate",
            Self::SignificanceTest => "SignificanceTest",
            Self::Other(name) => name,
        }
    }

    /// Resolve an `Other` whose name matches a known member to that member.
    pub fn normalized(&self) -> Self {
        match self {
            Self::Other(name) => Self::from(name.clone()),
            known => known.clone(),
        }
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CreateCausalGraph" => Self::CreateCausalGraph,
            "IdentifyEstimand" => Self::IdentifyEstimand,
            "EstimateEffects" => Self::EstimateEffects,
            "RefuteEstimate" => Self::RefuteEstimate,
            "SignificanceTest" => Self::SignificanceTest,
            _ => Self::Other(s),
        }
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        match value {
            NodeType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One population, exposure or outcome factor reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// Categorical/continuous role of the factor.
    pub level: String,
    /// Human-readable variable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// Source data field; unique per definition.
    pub column: String,
}

/// A named adjustment-set configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeModel {
    #[serde(default)]
    pub confounders: Vec<String>,
    #[serde(default)]
    pub outcome_determinants: Vec<String>,
}

impl AlternativeModel {
    /// True when neither list holds anything.
    pub fn is_empty(&self) -> bool {
        self.confounders.is_empty() && self.outcome_determinants.is_empty()
    }
}

/// The four adjustment levels a causal model is evaluated under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeModels {
    #[serde(default)]
    pub maximum: AlternativeModel,
    #[serde(default)]
    pub minimum: AlternativeModel,
    /// Carried for completeness; not emitted to the backend.
    #[serde(default)]
    pub intermediate: AlternativeModel,
    #[serde(default)]
    pub unadjusted: AlternativeModel,
}

/// A selected estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimator {
    pub group: EstimatorGroup,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub estimator_type: Option<EstimatorType>,
}

// ---------------------------------------------------------------------------
// Node request
// ---------------------------------------------------------------------------

/// A tagged unit of backend work: a `type` plus arbitrary properties.
///
/// `type` is always written from `node_type`; a property under that key is
/// never emitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Node {
    /// A node of the given type with no properties.
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            properties: Map::new(),
        }
    }

    /// Set a property, replacing any previous value under the same key.
    ///
    /// A `"type"` key is ignored; the discriminator comes from `node_type`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "type" {
            self.properties.insert(key, value.into());
        }
        self
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.node_type.as_str())?;
        for (key, value) in &self.properties {
            if key != "type" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// The request body accepted by the execution service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRequest {
    pub nodes: Vec<Node>,
}

// ---------------------------------------------------------------------------
// Output specs
// ---------------------------------------------------------------------------

/// Population entry of an estimate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub label: String,
    pub dataframe: String,
    pub population_id: String,
}

/// Treatment or outcome entry of an estimate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub variable: String,
}

/// The population/treatment/outcome triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpecs {
    pub population_specs: Vec<PopulationSpec>,
    pub treatment_specs: Vec<VariableSpec>,
    pub outcome_specs: Vec<VariableSpec>,
}

/// One alternative adjustment-set model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub label: String,
    pub confounders: Vec<String>,
    pub outcome_determinants: Vec<String>,
}

/// One estimator selection as understood by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub label: String,
    pub require_propensity_score: bool,
    pub method_name: String,
}

/// Refutation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefutationSpec {
    pub num_simulations: u32,
}

// ---------------------------------------------------------------------------
// Specification curve
// ---------------------------------------------------------------------------

/// One estimate on the specification curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    pub id: String,
    /// Execution-service task that produced the estimate.
    pub task_id: String,
    pub estimated_effect: f64,
}

/// User-controlled specification curve settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationCurveConfig {
    /// Ids of specifications the user switched off.
    #[serde(default)]
    pub inactive_specifications: Vec<String>,
}

/// The parts of a past run that influence follow-up requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refutation_type: Option<RefutationType>,
}

/// Result of a significance-test node as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTestResult {
    /// Free-form status; compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<String>,
}
