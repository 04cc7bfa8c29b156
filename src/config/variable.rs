use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Scalar type recorded for each template variable.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    #[default]
    String,
    Bool,
    Int,
    Float,
    List,
    Null,
}

impl TypeTag {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => TypeTag::Bool,
            Value::Number(n) if n.is_f64() => TypeTag::Float,
            Value::Number(_) => TypeTag::Int,
            Value::Sequence(_) => TypeTag::List,
            Value::Null => TypeTag::Null,
            _ => TypeTag::String,
        }
    }

    /// Whether the placeholder must be emitted without quotes so the
    /// rendered value keeps its YAML type.
    pub fn is_unquoted(self) -> bool {
        matches!(
            self,
            TypeTag::Bool | TypeTag::Int | TypeTag::Float | TypeTag::Null
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", TypeTag::Bool)]
    #[case("12", TypeTag::Int)]
    #[case("-3", TypeTag::Int)]
    #[case("0.5", TypeTag::Float)]
    #[case("hello", TypeTag::String)]
    #[case("'12'", TypeTag::String)]
    #[case("[a, b]", TypeTag::List)]
    #[case("~", TypeTag::Null)]
    fn tags_yaml_values(#[case] yaml: &str, #[case] expected: TypeTag) {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(TypeTag::of(&value), expected);
    }

    #[test]
    fn only_strings_and_lists_stay_quoted() {
        assert!(TypeTag::Bool.is_unquoted());
        assert!(TypeTag::Null.is_unquoted());
        assert!(!TypeTag::String.is_unquoted());
        assert!(!TypeTag::List.is_unquoted());
    }
}
