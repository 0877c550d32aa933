//! Declarative per-argument validation.
//!
//! A [`RuleSet`] maps argument indexes to [`Rule`]s and checks them in
//! ascending index order. It is usable on its own (`RuleSet::check`) or
//! wrapped in [`ValidationMiddleware`](crate::ValidationMiddleware) inside
//! a dispatch chain.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{KernelError, KernelResult};

/// Expected JSON type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ArgType {
    fn matches(self, value: &Value) -> bool {
        match self {
            ArgType::String => value.is_string(),
            ArgType::Number => value.is_number(),
            ArgType::Boolean => value.is_boolean(),
            ArgType::Array => value.is_array(),
            ArgType::Object => value.is_object(),
            ArgType::Null => value.is_null(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
            ArgType::Array => "array",
            ArgType::Object => "object",
            ArgType::Null => "null",
        }
    }
}

type CustomValidator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Checks applied to one argument position.
///
/// Checks run in a fixed order: presence, then type, then the custom
/// validator. An absent optional argument passes; `null` does not satisfy
/// `required`.
#[derive(Clone, Default)]
pub struct Rule {
    required: bool,
    expected: Option<ArgType>,
    custom: Option<CustomValidator>,
}

impl Rule {
    /// Creates an empty rule that accepts anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the argument to be present and non-null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Requires the argument, when present, to have the given type.
    pub fn of_type(mut self, expected: ArgType) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Adds a custom check returning `Err(reason)` on failure.
    pub fn custom<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(validator));
        self
    }

    fn check(&self, index: usize, value: Option<&Value>) -> KernelResult<()> {
        let value = match value {
            Some(v) if !v.is_null() => v,
            Some(_) | None => {
                if self.required {
                    return Err(KernelError::Validation {
                        index,
                        reason: "required argument missing".to_string(),
                    });
                }
                return Ok(());
            }
        };

        if let Some(expected) = self.expected {
            if !expected.matches(value) {
                return Err(KernelError::Validation {
                    index,
                    reason: format!("expected {}", expected.name()),
                });
            }
        }

        if let Some(custom) = &self.custom {
            if let Err(reason) = custom(value) {
                return Err(KernelError::Validation { index, reason });
            }
        }

        Ok(())
    }
}

/// Ordered map of argument index to [`Rule`].
///
/// # Examples
///
/// ```rust
/// use launchkit::{ArgType, Rule, RuleSet};
/// use serde_json::json;
///
/// let rules = RuleSet::new()
///     .rule(0, Rule::new().required().of_type(ArgType::String))
///     .rule(1, Rule::new().of_type(ArgType::Number).custom(|v| {
///         if v.as_u64().is_some() {
///             Ok(())
///         } else {
///             Err("must be a non-negative integer".to_string())
///         }
///     }));
///
/// assert!(rules.check(&[json!("plugin-id"), json!(3)]).is_ok());
/// assert!(rules.check(&[json!("plugin-id")]).is_ok()); // arg 1 optional
/// assert!(rules.check(&[]).is_err()); // arg 0 required
/// ```
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<usize, Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for the argument at `index`.
    pub fn rule(mut self, index: usize, rule: Rule) -> Self {
        self.rules.insert(index, rule);
        self
    }

    /// Checks `args` against every rule in ascending index order, returning
    /// the first failure.
    pub fn check(&self, args: &[Value]) -> KernelResult<()> {
        for (&index, rule) in &self.rules {
            rule.check(index, args.get(index))?;
        }
        Ok(())
    }

    /// True if the set contains no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_rejects_missing_and_null() {
        let rules = RuleSet::new().rule(0, Rule::new().required());
        assert!(rules.check(&[]).is_err());
        assert!(rules.check(&[json!(null)]).is_err());
        assert!(rules.check(&[json!("x")]).is_ok());
    }

    #[test]
    fn test_type_mismatch_reports_expected_type() {
        let rules = RuleSet::new().rule(0, Rule::new().of_type(ArgType::Number));
        match rules.check(&[json!("two")]) {
            Err(KernelError::Validation { index, reason }) => {
                assert_eq!(index, 0);
                assert_eq!(reason, "expected number");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_lowest_failing_index_wins() {
        let rules = RuleSet::new()
            .rule(2, Rule::new().required())
            .rule(0, Rule::new().required());
        match rules.check(&[]) {
            Err(KernelError::Validation { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_absent_argument_passes() {
        let rules = RuleSet::new().rule(1, Rule::new().of_type(ArgType::String));
        assert!(rules.check(&[json!(1)]).is_ok());
    }

    #[test]
    fn test_custom_validator_reason_surfaces() {
        let rules = RuleSet::new().rule(
            0,
            Rule::new().custom(|v| {
                if v.as_str().map(|s| s.len() <= 8).unwrap_or(false) {
                    Ok(())
                } else {
                    Err("too long".to_string())
                }
            }),
        );
        match rules.check(&[json!("far-too-long-name")]) {
            Err(KernelError::Validation { reason, .. }) => assert_eq!(reason, "too long"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
