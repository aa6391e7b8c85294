use serde_json::Value;

/// A context property value captured at the call site.
///
/// Values are stored type-erased and materialized into a
/// [`serde_json::Value`] when the owning scope is entered, so the merge
/// engine always works over concrete data.
pub struct ContextValue(ContextValueInner);

enum ContextValueInner {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Debug(Box<dyn std::fmt::Debug + Send + Sync + 'static>),
    Display(Box<dyn std::fmt::Display + Send + Sync + 'static>),
    Error(Box<dyn std::error::Error + Send + Sync + 'static>),
    Serde(Box<dyn erased_serde::Serialize + Send + Sync + 'static>),
}

impl From<ContextValueInner> for ContextValue {
    fn from(inner: ContextValueInner) -> Self {
        ContextValue(inner)
    }
}

impl ContextValue {
    pub fn null() -> Self {
        ContextValueInner::Null.into()
    }

    pub fn serde<S>(value: S) -> Self
    where
        S: serde::Serialize + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Serde(value).into()
    }

    pub fn display<T>(value: T) -> Self
    where
        T: std::fmt::Display + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Display(value).into()
    }

    pub fn debug<T>(value: T) -> Self
    where
        T: std::fmt::Debug + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Debug(value).into()
    }

    pub fn error<T>(value: T) -> Self
    where
        T: std::error::Error + Send + Sync + 'static,
    {
        let value = Box::new(value);
        ContextValueInner::Error(value).into()
    }

    /// Materializes the value for the merge engine.
    ///
    /// Serialization problems degrade to a string form of the value rather
    /// than failing; a context property never aborts a log call.
    pub fn as_json(&self) -> Value {
        match &self.0 {
            ContextValueInner::Null => Value::Null,
            ContextValueInner::Bool(value) => Value::Bool(*value),
            ContextValueInner::Number(value) => Value::Number(value.clone()),
            ContextValueInner::String(value) => Value::String(value.clone()),
            ContextValueInner::Debug(value) => Value::String(format!("{value:?}")),
            ContextValueInner::Display(value) => Value::String(value.to_string()),
            ContextValueInner::Error(value) => Value::String(value.to_string()),
            ContextValueInner::Serde(value) => serde_json::to_value(&**value)
                .unwrap_or_else(|err| Value::String(format!("<unserializable: {err}>"))),
        }
    }
}

impl std::fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_json())
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue(ContextValueInner::String(value.to_owned()))
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue(ContextValueInner::String(value))
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue(ContextValueInner::Bool(value))
    }
}

impl From<Value> for ContextValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ContextValueInner::Null.into(),
            Value::Bool(value) => ContextValueInner::Bool(value).into(),
            Value::Number(value) => ContextValueInner::Number(value).into(),
            Value::String(value) => ContextValueInner::String(value).into(),
            other => Self::serde(other),
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ContextValue {
                fn from(value: $ty) -> Self {
                    ContextValue(ContextValueInner::Number(value.into()))
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(number) => ContextValue(ContextValueInner::Number(number)),
            None => Self::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(ContextValue::from("abc").as_json(), json!("abc"));
        assert_eq!(ContextValue::from(42).as_json(), json!(42));
        assert_eq!(ContextValue::from(true).as_json(), json!(true));
        assert_eq!(ContextValue::null().as_json(), Value::Null);
    }

    #[test]
    fn test_serde_values_keep_structure() {
        let value = ContextValue::serde(json!({"b": [1, 2]}));
        assert_eq!(value.as_json(), json!({"b": [1, 2]}));
    }

    #[test]
    fn test_display_and_error_degrade_to_strings() {
        let value = ContextValue::display(std::net::Ipv4Addr::LOCALHOST);
        assert_eq!(value.as_json(), json!("127.0.0.1"));

        let err = std::io::Error::other("boom");
        assert_eq!(ContextValue::error(err).as_json(), json!("boom"));
    }
}
