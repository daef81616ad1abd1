//! Visual rule-expression builder for router `rule` fields

pub mod builder;
pub mod matcher;

pub use builder::{ConditionUpdate, LogicalOperator, RuleBuilder, RuleCondition, RuleError, RuleGroup};
pub use matcher::{MatcherType, RuleDialect};
