//! Draft state of the visual rule builder and its serialisation
//!
//! The builder edits its own draft, never the form value. Only [`RuleBuilder::commit`]
//! produces the string written back into the `rule` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::matcher::{MatcherType, RuleDialect};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("Unknown rule group: {0}")]
    UnknownGroup(String),

    #[error("Unknown condition {condition} in group {group}")]
    UnknownCondition { group: String, condition: String },

    #[error("Matcher {matcher} is not available for {dialect} rules")]
    UnsupportedMatcher { matcher: MatcherType, dialect: RuleDialect },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }

    fn joiner(&self) -> String {
        format!(" {} ", self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub id: String,
    pub matcher: MatcherType,
    pub value: String,
    /// Header or query parameter name for key/value matchers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_value: Option<String>,
    #[serde(default)]
    pub negate: bool,
}

impl RuleCondition {
    fn new(matcher: MatcherType) -> Self {
        Self {
            id: new_id(),
            matcher,
            value: String::new(),
            secondary_value: None,
            negate: false,
        }
    }

    /// `None` when the condition has nothing usable to emit
    pub fn to_expression(&self) -> Option<String> {
        if self.value.trim().is_empty() {
            return None;
        }

        let args = if self.matcher.is_multi_value() {
            let values: Vec<&str> = self
                .value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return None;
            }
            values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        } else if self.matcher.takes_key() {
            let key = self.secondary_value.as_deref().unwrap_or_default();
            if key.trim().is_empty() {
                return None;
            }
            format!("{}, {}", quote(key), quote(&self.value))
        } else {
            quote(&self.value)
        };

        let negation = if self.negate { "!" } else { "" };
        Some(format!("{}{}({})", negation, self.matcher.name(), args))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub id: String,
    pub operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
}

impl RuleGroup {
    fn new() -> Self {
        Self {
            id: new_id(),
            operator: LogicalOperator::Or,
            conditions: Vec::new(),
        }
    }

    /// Single condition bare, several parenthesised, none omitted
    pub fn to_expression(&self) -> Option<String> {
        let parts: Vec<String> = self
            .conditions
            .iter()
            .filter_map(RuleCondition::to_expression)
            .collect();
        match parts.len() {
            0 => None,
            1 => parts.into_iter().next(),
            _ => Some(format!("({})", parts.join(&self.operator.joiner()))),
        }
    }
}

/// One field of a condition being edited
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ConditionUpdate {
    Matcher(MatcherType),
    Value(String),
    SecondaryValue(Option<String>),
    Negate(bool),
}

/// Draft of a rule: groups of conditions joined by a top-level operator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBuilder {
    dialect: RuleDialect,
    operator: LogicalOperator,
    groups: Vec<RuleGroup>,
}

impl RuleBuilder {
    pub fn new(dialect: RuleDialect) -> Self {
        Self {
            dialect,
            operator: LogicalOperator::And,
            groups: vec![RuleGroup::new()],
        }
    }

    /// Check a restored draft: every matcher must belong to the dialect.
    /// A draft without groups gets one empty group back.
    pub fn restore(mut self) -> Result<Self, RuleError> {
        for condition in self.groups.iter().flat_map(|g| g.conditions.iter()) {
            if !self.dialect.supports(condition.matcher) {
                return Err(RuleError::UnsupportedMatcher {
                    matcher: condition.matcher,
                    dialect: self.dialect,
                });
            }
        }
        if self.groups.is_empty() {
            self.groups.push(RuleGroup::new());
        }
        Ok(self)
    }

    pub fn dialect(&self) -> RuleDialect {
        self.dialect
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn add_group(&mut self) -> String {
        let group = RuleGroup::new();
        let id = group.id.clone();
        self.groups.push(group);
        id
    }

    /// Removing the last remaining group is a no-op
    pub fn remove_group(&mut self, group_id: &str) -> Result<(), RuleError> {
        let idx = self.group_index(group_id)?;
        if self.groups.len() > 1 {
            self.groups.remove(idx);
        }
        Ok(())
    }

    pub fn add_condition(&mut self, group_id: &str) -> Result<String, RuleError> {
        let matcher = self.dialect.default_matcher();
        let group = self.group_mut(group_id)?;
        let condition = RuleCondition::new(matcher);
        let id = condition.id.clone();
        group.conditions.push(condition);
        Ok(id)
    }

    pub fn update_condition(
        &mut self,
        group_id: &str,
        condition_id: &str,
        update: ConditionUpdate,
    ) -> Result<(), RuleError> {
        if let ConditionUpdate::Matcher(matcher) = &update {
            if !self.dialect.supports(*matcher) {
                return Err(RuleError::UnsupportedMatcher {
                    matcher: *matcher,
                    dialect: self.dialect,
                });
            }
        }

        let group = self.group_mut(group_id)?;
        let condition = group
            .conditions
            .iter_mut()
            .find(|c| c.id == condition_id)
            .ok_or_else(|| RuleError::UnknownCondition {
                group: group_id.to_string(),
                condition: condition_id.to_string(),
            })?;

        match update {
            ConditionUpdate::Matcher(matcher) => condition.matcher = matcher,
            ConditionUpdate::Value(value) => condition.value = value,
            ConditionUpdate::SecondaryValue(value) => condition.secondary_value = value,
            ConditionUpdate::Negate(negate) => condition.negate = negate,
        }
        Ok(())
    }

    pub fn remove_condition(&mut self, group_id: &str, condition_id: &str) -> Result<(), RuleError> {
        let group = self.group_mut(group_id)?;
        let before = group.conditions.len();
        group.conditions.retain(|c| c.id != condition_id);
        if group.conditions.len() == before {
            return Err(RuleError::UnknownCondition {
                group: group_id.to_string(),
                condition: condition_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_group_operator(&mut self, group_id: &str, operator: LogicalOperator) -> Result<(), RuleError> {
        self.group_mut(group_id)?.operator = operator;
        Ok(())
    }

    pub fn set_top_operator(&mut self, operator: LogicalOperator) {
        self.operator = operator;
    }

    /// Serialise the draft. Empty conditions and groups are skipped.
    pub fn build_expression(&self) -> String {
        let parts: Vec<String> = self.groups.iter().filter_map(RuleGroup::to_expression).collect();
        parts.join(&self.operator.joiner())
    }

    /// Expression to write into the form, or `None` when there is nothing to apply
    pub fn commit(&self) -> Option<String> {
        let expression = self.build_expression();
        if expression.is_empty() {
            return None;
        }
        info!("Committing {} rule: {}", self.dialect, expression);
        Some(expression)
    }

    fn group_index(&self, group_id: &str) -> Result<usize, RuleError> {
        self.groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or_else(|| RuleError::UnknownGroup(group_id.to_string()))
    }

    fn group_mut(&mut self, group_id: &str) -> Result<&mut RuleGroup, RuleError> {
        let idx = self.group_index(group_id)?;
        Ok(&mut self.groups[idx])
    }
}

fn quote(value: &str) -> String {
    format!("`{}`", value)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_group(builder: &RuleBuilder) -> String {
        builder.groups()[0].id.clone()
    }

    fn condition(builder: &mut RuleBuilder, group: &str, matcher: MatcherType, value: &str) -> String {
        let id = builder.add_condition(group).unwrap();
        builder.update_condition(group, &id, ConditionUpdate::Matcher(matcher)).unwrap();
        builder.update_condition(group, &id, ConditionUpdate::Value(value.to_string())).unwrap();
        id
    }

    #[test]
    fn test_new_builder_defaults() {
        let builder = RuleBuilder::new(RuleDialect::Http);
        assert_eq!(builder.groups().len(), 1);
        assert_eq!(builder.groups()[0].operator, LogicalOperator::Or);
        assert_eq!(builder.operator(), LogicalOperator::And);
        assert_eq!(builder.build_expression(), "");
        assert_eq!(builder.commit(), None);
    }

    #[test]
    fn test_new_condition_uses_dialect_default() {
        let mut builder = RuleBuilder::new(RuleDialect::Tcp);
        let group = first_group(&builder);
        builder.add_condition(&group).unwrap();
        assert_eq!(builder.groups()[0].conditions[0].matcher, MatcherType::HostSni);
        assert_eq!(builder.groups()[0].conditions[0].value, "");
    }

    #[test]
    fn test_empty_conditions_are_skipped() {
        let mut builder = RuleBuilder::new(RuleDialect::Http);
        let group = first_group(&builder);
        builder.add_condition(&group).unwrap();
        condition(&mut builder, &group, MatcherType::Host, "example.com");
        assert_eq!(builder.build_expression(), "Host(`example.com`)");
        assert_eq!(builder.groups()[0].conditions.len(), 2);
    }

    #[test]
    fn test_key_value_matcher() {
        let mut builder = RuleBuilder::new(RuleDialect::Http);
        let group = first_group(&builder);
        let id = condition(&mut builder, &group, MatcherType::Header, "application/json");
        assert_eq!(builder.build_expression(), "");

        builder
            .update_condition(&group, &id, ConditionUpdate::SecondaryValue(Some("Content-Type".to_string())))
            .unwrap();
        assert_eq!(builder.build_expression(), "Header(`Content-Type`, `application/json`)");
    }

    #[test]
    fn test_method_with_only_commas_is_skipped() {
        let mut builder = RuleBuilder::new(RuleDialect::Http);
        let group = first_group(&builder);
        condition(&mut builder, &group, MatcherType::Method, " , ,");
        assert_eq!(builder.build_expression(), "");
    }

    #[test]
    fn test_remove_last_group_is_noop() {
        let mut builder = RuleBuilder::new(RuleDialect::Http);
        let group = first_group(&builder);
        builder.remove_group(&group).unwrap();
        assert_eq!(builder.groups().len(), 1);

        let second = builder.add_group();
        builder.remove_group(&group).unwrap();
        assert_eq!(builder.groups().len(), 1);
        assert_eq!(builder.groups()[0].id, second);
    }

    #[test]
    fn test_unknown_ids() {
        let mut builder = RuleBuilder::new(RuleDialect::Http);
        assert_eq!(builder.add_condition("nope").unwrap_err(), RuleError::UnknownGroup("nope".to_string()));

        let group = first_group(&builder);
        let err = builder.remove_condition(&group, "missing").unwrap_err();
        assert!(matches!(err, RuleError::UnknownCondition { .. }));
    }

    #[test]
    fn test_matcher_must_match_dialect() {
        let mut builder = RuleBuilder::new(RuleDialect::Tcp);
        let group = first_group(&builder);
        let id = builder.add_condition(&group).unwrap();
        let err = builder
            .update_condition(&group, &id, ConditionUpdate::Matcher(MatcherType::PathPrefix))
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::UnsupportedMatcher { matcher: MatcherType::PathPrefix, dialect: RuleDialect::Tcp }
        );
    }

    #[test]
    fn test_draft_round_trip_and_restore() {
        let mut builder = RuleBuilder::new(RuleDialect::Http);
        let group = first_group(&builder);
        condition(&mut builder, &group, MatcherType::PathPrefix, "/api");

        let draft = serde_json::to_value(&builder).unwrap();
        assert_eq!(draft["operator"], "AND");
        assert_eq!(draft["groups"][0]["operator"], "OR");

        let restored: RuleBuilder = serde_json::from_value(draft).unwrap();
        let restored = restored.restore().unwrap();
        assert_eq!(restored.build_expression(), "PathPrefix(`/api`)");
    }

    #[test]
    fn test_restore_adds_group_and_rejects_foreign_matchers() {
        let empty: RuleBuilder =
            serde_json::from_str(r#"{ "dialect": "tcp", "operator": "OR", "groups": [] }"#).unwrap();
        assert_eq!(empty.restore().unwrap().groups().len(), 1);

        let foreign: RuleBuilder = serde_json::from_str(
            r#"{ "dialect": "tcp", "operator": "AND", "groups": [
                { "id": "g", "operator": "OR", "conditions": [ { "id": "c", "matcher": "Host", "value": "a" } ] }
            ] }"#,
        )
        .unwrap();
        assert!(foreign.restore().is_err());
    }
}
