// src/host.rs

use serde::{Serialize, Serializer};

use crate::tensor_ops::Tensor;

/// The environment the tensor blocks run inside.
///
/// A host has its own value representation, usually with a tagged wrapper for
/// arrays. The blocks only ever need to get a plain nested array out of such a
/// value and put results back in, so that is all this trait asks for.
pub trait Host {
    type Value;

    /// Produces the plain nested array behind `value`, or `None` when the value
    /// is not array-like.
    fn coerce_to_plain_array(&self, value: &Self::Value) -> Option<Vec<Tensor>>;

    /// Wraps an array result. `placeholder` marks an intentionally empty
    /// result produced without running an operation.
    fn wrap(&self, items: Vec<Tensor>, placeholder: bool) -> Self::Value;

    /// Brings an uncoerced argument (fill value, search target, ...) into the tree.
    fn lift(&self, value: &Self::Value) -> Tensor;

    /// Hands a bare result (scalar, boolean, count, sentinel) back to the host.
    fn lower(&self, tensor: Tensor) -> Self::Value;
}

/// Value type of [`JsonHost`]: either a bare scalar or a wrapped array.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Scalar(Tensor),
    Array { items: Vec<Tensor>, placeholder: bool },
}

impl HostValue {
    pub fn text(s: &str) -> Self {
        HostValue::Scalar(Tensor::Text(s.to_string()))
    }

    /// Interprets a command-line style argument: valid JSON becomes the value
    /// it denotes, anything else is kept as text.
    pub fn from_argument(raw: &str) -> Self {
        match serde_json::from_str::<Tensor>(raw) {
            Ok(Tensor::Array(items)) => HostValue::Array { items, placeholder: false },
            Ok(scalar) => HostValue::Scalar(scalar),
            Err(_) => HostValue::text(raw),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, HostValue::Array { placeholder: true, .. })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl Serialize for HostValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HostValue::Scalar(tensor) => tensor.serialize(serializer),
            HostValue::Array { items, .. } => serializer.collect_seq(items),
        }
    }
}

/// Reference host backed by JSON text. Strings holding a JSON array coerce
/// to that array, the way a scripting host accepts "[1,2]" typed into a slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonHost;

impl Host for JsonHost {
    type Value = HostValue;

    fn coerce_to_plain_array(&self, value: &HostValue) -> Option<Vec<Tensor>> {
        match value {
            HostValue::Array { items, .. } => Some(items.clone()),
            HostValue::Scalar(Tensor::Array(items)) => Some(items.clone()),
            HostValue::Scalar(Tensor::Text(text)) => match serde_json::from_str::<Tensor>(text) {
                Ok(Tensor::Array(items)) => Some(items),
                _ => None,
            },
            HostValue::Scalar(_) => None,
        }
    }

    fn wrap(&self, items: Vec<Tensor>, placeholder: bool) -> HostValue {
        HostValue::Array { items, placeholder }
    }

    fn lift(&self, value: &HostValue) -> Tensor {
        match value {
            HostValue::Scalar(tensor) => tensor.clone(),
            HostValue::Array { items, .. } => Tensor::Array(items.clone()),
        }
    }

    fn lower(&self, tensor: Tensor) -> HostValue {
        match tensor {
            Tensor::Array(items) => HostValue::Array { items, placeholder: false },
            scalar => HostValue::Scalar(scalar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_wrapped_array() {
        let host = JsonHost;
        let value = host.wrap(vec![Tensor::from(1.0)], false);
        assert_eq!(host.coerce_to_plain_array(&value), Some(vec![Tensor::Number(1.0)]));
    }

    #[test]
    fn test_coerce_json_text() {
        let host = JsonHost;
        let items = host.coerce_to_plain_array(&HostValue::text("[[1,2],[3,4]]")).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(host.coerce_to_plain_array(&HostValue::text("[]")), Some(Vec::new()));
    }

    #[test]
    fn test_coerce_rejects_non_arrays() {
        let host = JsonHost;
        assert_eq!(host.coerce_to_plain_array(&HostValue::text("hello")), None);
        assert_eq!(host.coerce_to_plain_array(&HostValue::text("{\"a\":1}")), None);
        assert_eq!(host.coerce_to_plain_array(&HostValue::text("42")), None);
        assert_eq!(host.coerce_to_plain_array(&HostValue::Scalar(Tensor::Null)), None);
    }

    #[test]
    fn test_from_argument() {
        assert_eq!(HostValue::from_argument("3"), HostValue::Scalar(Tensor::Number(3.0)));
        assert_eq!(HostValue::from_argument("\"3\""), HostValue::text("3"));
        assert_eq!(HostValue::from_argument("apple"), HostValue::text("apple"));
        assert_eq!(
            HostValue::from_argument("[1]"),
            HostValue::Array { items: vec![Tensor::Number(1.0)], placeholder: false }
        );
    }

    #[test]
    fn test_lift_and_lower() {
        let host = JsonHost;
        let wrapped = host.wrap(vec![Tensor::Null], true);
        assert!(wrapped.is_placeholder());
        assert_eq!(host.lift(&wrapped), Tensor::Array(vec![Tensor::Null]));
        assert_eq!(host.lower(Tensor::Bool(true)), HostValue::Scalar(Tensor::Bool(true)));
        assert!(!host.lower(Tensor::Array(Vec::new())).is_placeholder());
    }

    #[test]
    fn test_to_json() {
        let value = HostValue::Array { items: vec![Tensor::from(3.0), Tensor::from(2.0)], placeholder: false };
        assert_eq!(value.to_json(false).unwrap(), "[3,2]");
        assert_eq!(HostValue::text("").to_json(false).unwrap(), "\"\"");
    }
}
