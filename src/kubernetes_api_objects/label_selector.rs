// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Rendered form of a selector that is absent or selects nothing.
pub const NONE_SELECTOR: &str = "<none>";
/// Rendered form of a selector that cannot be converted to a query.
pub const ERROR_SELECTOR: &str = "<error>";

// LabelSelector is used to select objects that are relevant by matching the labels.
// Labels are key/value pairs that are attached to objects such as Pods.
//
// This definition is a wrapper of LabelSelector defined at
// https://github.com/Arnavion/k8s-openapi/blob/v0.22.0/src/v1_30/apimachinery/pkg/apis/meta/v1/label_selector.rs.
//
// More detailed information: https://kubernetes.io/docs/concepts/overview/working-with-objects/labels/#label-selectors.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSelector {
    inner: metav1::LabelSelector,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("label selector is empty")]
    Empty,
    #[error("label selector has an empty key")]
    EmptyKey,
    #[error("unknown operator {operator:?} for key {key:?}")]
    UnknownOperator { key: String, operator: String },
    #[error("operator {operator} for key {key:?} requires at least one value")]
    MissingValues { key: String, operator: Operator },
    #[error("operator {operator} for key {key:?} does not take values")]
    UnexpectedValues { key: String, operator: Operator },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Operator {
    Equals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equals => "Equals",
            Operator::In => "In",
            Operator::NotIn => "NotIn",
            Operator::Exists => "Exists",
            Operator::DoesNotExist => "DoesNotExist",
        };
        f.write_str(s)
    }
}

/// A single validated requirement of a selector.
/// Values are kept as a set, so their declaration order never matters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: BTreeSet<String>,
}

impl Requirement {
    fn new(key: &str, operator: &str, values: &[String]) -> Result<Requirement, SelectorError> {
        if key.is_empty() {
            return Err(SelectorError::EmptyKey);
        }
        let operator = match operator {
            "In" => Operator::In,
            "NotIn" => Operator::NotIn,
            "Exists" => Operator::Exists,
            "DoesNotExist" => Operator::DoesNotExist,
            other => {
                return Err(SelectorError::UnknownOperator {
                    key: key.to_string(),
                    operator: other.to_string(),
                })
            }
        };
        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                return Err(SelectorError::MissingValues {
                    key: key.to_string(),
                    operator,
                })
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                return Err(SelectorError::UnexpectedValues {
                    key: key.to_string(),
                    operator,
                })
            }
            _ => {}
        }
        Ok(Requirement {
            key: key.to_string(),
            operator,
            values: values.iter().cloned().collect(),
        })
    }

    fn equals(key: &str, value: &str) -> Result<Requirement, SelectorError> {
        if key.is_empty() {
            return Err(SelectorError::EmptyKey);
        }
        Ok(Requirement {
            key: key.to_string(),
            operator: Operator::Equals,
            values: BTreeSet::from([value.to_string()]),
        })
    }

    /// `key=value` and `key In (value)` select exactly the same objects.
    fn normalized(mut self) -> Requirement {
        if self.operator == Operator::Equals {
            self.operator = Operator::In;
        }
        self
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            Operator::Equals => write!(f, "{}={}", self.key, joined()),
            Operator::In => write!(f, "{} in ({})", self.key, joined()),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, joined()),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// Order-independent form of a selector, used as fingerprint input.
/// A selector that fails validation still needs a stable identity, so it falls back to
/// its raw serialized form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "form", content = "value", rename_all = "camelCase")]
pub enum CanonicalSelector {
    Requirements(Vec<Requirement>),
    Malformed(String),
}

impl LabelSelector {
    /// All requirements of the selector, with matchLabels and matchExpressions merged and
    /// sorted by key the way the API server orders them.
    pub fn requirements(&self) -> Result<Vec<Requirement>, SelectorError> {
        let mut requirements = Vec::new();
        if let Some(match_labels) = &self.inner.match_labels {
            for (key, value) in match_labels {
                requirements.push(Requirement::equals(key, value)?);
            }
        }
        if let Some(match_expressions) = &self.inner.match_expressions {
            for expr in match_expressions {
                let values = expr.values.as_deref().unwrap_or_default();
                requirements.push(Requirement::new(&expr.key, &expr.operator, values)?);
            }
        }
        requirements.sort();
        Ok(requirements)
    }

    /// Renders the selector in label-selector query syntax, e.g. `app=foo,tier in (a,b)`.
    /// An empty selector is an error since it cannot narrow a pod query.
    pub fn to_query_string(&self) -> Result<String, SelectorError> {
        let requirements = self.requirements()?;
        if requirements.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(requirements
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(","))
    }

    pub fn canonical(&self) -> CanonicalSelector {
        match self.requirements() {
            Ok(requirements) => {
                let set: BTreeSet<Requirement> =
                    requirements.into_iter().map(Requirement::normalized).collect();
                CanonicalSelector::Requirements(set.into_iter().collect())
            }
            Err(_) => CanonicalSelector::Malformed(
                serde_json::to_string(&self.inner).unwrap_or_else(|_| format!("{:?}", self.inner)),
            ),
        }
    }
}

/// Renders an optional selector for display: `<none>` when absent or empty,
/// `<error>` when it cannot be converted.
pub fn format_label_selector(selector: Option<&LabelSelector>) -> String {
    match selector.map(LabelSelector::to_query_string) {
        None | Some(Err(SelectorError::Empty)) => NONE_SELECTOR.to_string(),
        Some(Err(_)) => ERROR_SELECTOR.to_string(),
        Some(Ok(query)) => query,
    }
}

crate::implement_resource_wrapper_trait!(LabelSelector, metav1::LabelSelector);
