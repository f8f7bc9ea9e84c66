//! Listener decoders.
//!
//! A [`DecoderSpec`] is a small expression tree describing how to turn a raw
//! event payload into the message delivered to the application. It travels
//! inside listener instructions, so it is plain data: comparable, serializable,
//! and evaluated by [`DecoderSpec::run`] on the executor side.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeFailure;

/// A decoder expression over JSON-shaped event payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecoderSpec {
    /// Accept a JSON boolean.
    Bool,
    /// Accept a JSON number with no fractional part.
    Int,
    /// Accept any JSON number.
    Float,
    /// Accept a JSON string.
    String,
    /// Accept anything, unchanged.
    Value,
    /// Decode the named field of an object.
    Field {
        name: String,
        decoder: Box<DecoderSpec>,
    },
    /// Decode one element of an array.
    Index {
        index: u32,
        decoder: Box<DecoderSpec>,
    },
    /// Run every entry on the same input and collect the results into an object.
    Record { fields: Vec<(String, DecoderSpec)> },
    /// Run every entry on the identically named field of the input.
    Form { fields: Vec<(String, DecoderSpec)> },
    /// First alternative that succeeds.
    Either { options: Vec<DecoderSpec> },
    /// Success passes through; failure becomes `null`.
    Maybe { decoder: Box<DecoderSpec> },
    /// Like `Field`, but an absent or `null` field decodes to `null`.
    Optional {
        name: String,
        decoder: Box<DecoderSpec>,
    },
    /// Input must equal the literal exactly.
    Match { literal: Value },
    /// Both decoders must succeed; the second result is kept.
    And {
        first: Box<DecoderSpec>,
        second: Box<DecoderSpec>,
    },
    /// Always succeed with a constant.
    Ok { value: Value },
    /// Always fail with a message.
    Error { message: String },
}

impl DecoderSpec {
    pub fn field(name: impl Into<String>, decoder: DecoderSpec) -> Self {
        Self::Field {
            name: name.into(),
            decoder: Box::new(decoder),
        }
    }

    /// Nested field access: `at(["target", "value"], String)`.
    pub fn at<I, S>(path: I, decoder: DecoderSpec) -> Self
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<String>,
    {
        path.into_iter()
            .rev()
            .fold(decoder, |inner, name| Self::field(name, inner))
    }

    pub fn index(index: u32, decoder: DecoderSpec) -> Self {
        Self::Index {
            index,
            decoder: Box::new(decoder),
        }
    }

    pub fn maybe(decoder: DecoderSpec) -> Self {
        Self::Maybe {
            decoder: Box::new(decoder),
        }
    }

    pub fn optional(name: impl Into<String>, decoder: DecoderSpec) -> Self {
        Self::Optional {
            name: name.into(),
            decoder: Box::new(decoder),
        }
    }

    pub fn and(first: DecoderSpec, second: DecoderSpec) -> Self {
        Self::And {
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    pub fn succeed(value: Value) -> Self {
        Self::Ok { value }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Evaluate the decoder against an event payload.
    pub fn run(&self, input: &Value) -> Result<Value, DecodeFailure> {
        match self {
            Self::Bool => match input {
                Value::Bool(_) => Ok(input.clone()),
                other => Err(expecting("a BOOL", other)),
            },
            Self::Int => match input {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(input.clone()),
                Value::Number(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => {
                    Ok(input.clone())
                }
                other => Err(expecting("an INT", other)),
            },
            Self::Float => match input {
                Value::Number(_) => Ok(input.clone()),
                other => Err(expecting("a FLOAT", other)),
            },
            Self::String => match input {
                Value::String(_) => Ok(input.clone()),
                other => Err(expecting("a STRING", other)),
            },
            Self::Value => Ok(input.clone()),
            Self::Field { name, decoder } => {
                let object = input
                    .as_object()
                    .ok_or_else(|| expecting("an OBJECT", input))?;
                let value = object.get(name).ok_or_else(|| DecodeFailure::MissingField {
                    field: name.clone(),
                })?;
                decoder.run(value).map_err(|e| in_field(name, e))
            }
            Self::Index { index, decoder } => {
                let array = input
                    .as_array()
                    .ok_or_else(|| expecting("an ARRAY", input))?;
                let value = array.get(*index as usize).ok_or(DecodeFailure::IndexOutOfRange {
                    index: *index,
                    len: array.len(),
                })?;
                decoder.run(value).map_err(|e| DecodeFailure::AtIndex {
                    index: *index,
                    source: Box::new(e),
                })
            }
            Self::Record { fields } => {
                let mut out = Map::new();
                for (name, decoder) in fields {
                    out.insert(name.clone(), decoder.run(input)?);
                }
                Ok(Value::Object(out))
            }
            Self::Form { fields } => {
                let object = input
                    .as_object()
                    .ok_or_else(|| expecting("an OBJECT", input))?;
                let mut out = Map::new();
                for (name, decoder) in fields {
                    let value = object.get(name).ok_or_else(|| DecodeFailure::MissingField {
                        field: name.clone(),
                    })?;
                    let decoded = decoder.run(value).map_err(|e| in_field(name, e))?;
                    out.insert(name.clone(), decoded);
                }
                Ok(Value::Object(out))
            }
            Self::Either { options } => {
                let mut failures = Vec::with_capacity(options.len());
                for option in options {
                    match option.run(input) {
                        Ok(value) => return Ok(value),
                        Err(e) => failures.push(e),
                    }
                }
                Err(DecodeFailure::OneOf { failures })
            }
            Self::Maybe { decoder } => Ok(decoder.run(input).unwrap_or(Value::Null)),
            Self::Optional { name, decoder } => {
                let object = input
                    .as_object()
                    .ok_or_else(|| expecting("an OBJECT", input))?;
                match object.get(name) {
                    None | Some(Value::Null) => Ok(Value::Null),
                    Some(value) => decoder.run(value).map_err(|e| in_field(name, e)),
                }
            }
            Self::Match { literal } => {
                if input == literal {
                    Ok(input.clone())
                } else {
                    Err(expecting(&literal.to_string(), input))
                }
            }
            Self::And { first, second } => {
                first.run(input)?;
                second.run(input)
            }
            Self::Ok { value } => Ok(value.clone()),
            Self::Error { message } => Err(DecodeFailure::Failure {
                message: message.clone(),
            }),
        }
    }
}

fn expecting(expected: &str, found: &Value) -> DecodeFailure {
    DecodeFailure::Expecting {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn in_field(name: &str, failure: DecodeFailure) -> DecodeFailure {
    DecodeFailure::InField {
        field: name.to_string(),
        source: Box::new(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn primitives_check_types() {
        assert_eq!(DecoderSpec::Bool.run(&json!(true)), Ok(json!(true)));
        assert!(DecoderSpec::Bool.run(&json!(1)).is_err());
        assert_eq!(DecoderSpec::Int.run(&json!(3)), Ok(json!(3)));
        assert!(DecoderSpec::Int.run(&json!(3.5)).is_err());
        assert_eq!(DecoderSpec::Float.run(&json!(3.5)), Ok(json!(3.5)));
        assert!(DecoderSpec::String.run(&json!(null)).is_err());
    }

    #[test]
    fn nested_field_access() {
        let decoder = DecoderSpec::at(["target", "value"], DecoderSpec::String);
        let event = json!({"target": {"value": "typed"}});
        assert_eq!(decoder.run(&event), Ok(json!("typed")));
    }

    #[test]
    fn missing_field_reports_path() {
        let decoder = DecoderSpec::at(["target", "checked"], DecoderSpec::Bool);
        let err = decoder.run(&json!({"target": {}})).unwrap_err();
        assert_eq!(
            err,
            DecodeFailure::InField {
                field: "target".into(),
                source: Box::new(DecodeFailure::MissingField {
                    field: "checked".into()
                }),
            }
        );
        assert!(err.to_string().contains("checked"));
    }

    #[test]
    fn index_out_of_range() {
        let decoder = DecoderSpec::index(2, DecoderSpec::Int);
        let err = decoder.run(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DecodeFailure::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn record_and_form() {
        let record = DecoderSpec::Record {
            fields: vec![
                ("x".into(), DecoderSpec::field("clientX", DecoderSpec::Int)),
                ("tag".into(), DecoderSpec::succeed(json!("move"))),
            ],
        };
        assert_eq!(
            record.run(&json!({"clientX": 10})),
            Ok(json!({"x": 10, "tag": "move"}))
        );

        let form = DecoderSpec::Form {
            fields: vec![("name".into(), DecoderSpec::String)],
        };
        assert_eq!(
            form.run(&json!({"name": "ada", "extra": 1})),
            Ok(json!({"name": "ada"}))
        );
    }

    #[test]
    fn either_collects_failures() {
        let decoder = DecoderSpec::Either {
            options: vec![DecoderSpec::Int, DecoderSpec::Bool],
        };
        assert_eq!(decoder.run(&json!(false)), Ok(json!(false)));
        match decoder.run(&json!("nope")) {
            Err(DecodeFailure::OneOf { failures }) => assert_eq!(failures.len(), 2),
            other => panic!("expected OneOf, got {other:?}"),
        }
    }

    #[test]
    fn maybe_and_optional_yield_null() {
        assert_eq!(DecoderSpec::maybe(DecoderSpec::Int).run(&json!("x")), Ok(Value::Null));
        let optional = DecoderSpec::optional("key", DecoderSpec::String);
        assert_eq!(optional.run(&json!({})), Ok(Value::Null));
        assert_eq!(optional.run(&json!({"key": "Enter"})), Ok(json!("Enter")));
        assert!(optional.run(&json!({"key": 13})).is_err());
    }

    #[test]
    fn match_and_and() {
        let enter = DecoderSpec::and(
            DecoderSpec::field("key", DecoderSpec::Match { literal: json!("Enter") }),
            DecoderSpec::succeed(json!("submit")),
        );
        assert_eq!(enter.run(&json!({"key": "Enter"})), Ok(json!("submit")));
        assert!(enter.run(&json!({"key": "Escape"})).is_err());
    }

    #[test]
    fn error_always_fails() {
        let err = DecoderSpec::fail("no").run(&json!(1)).unwrap_err();
        assert_eq!(err.to_string(), "no");
    }

    #[test]
    fn specs_compare_structurally() {
        let a = DecoderSpec::field("key", DecoderSpec::Match { literal: json!("a") });
        let b = DecoderSpec::field("key", DecoderSpec::Match { literal: json!("b") });
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn serde_shape_is_tagged() {
        let spec = DecoderSpec::field("x", DecoderSpec::Int);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "field");
        let back: DecoderSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    proptest! {
        #[test]
        fn value_decoder_is_identity(n in any::<i64>(), s in ".*") {
            let input = json!({"n": n, "s": s});
            prop_assert_eq!(DecoderSpec::Value.run(&input), Ok(input.clone()));
        }

        #[test]
        fn ok_ignores_input(n in any::<i32>()) {
            let decoder = DecoderSpec::succeed(json!("fixed"));
            prop_assert_eq!(decoder.run(&json!(n)), Ok(json!("fixed")));
        }
    }
}
