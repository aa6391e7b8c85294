//! Capturing selected call arguments into the logging context.
//!
//! A [`Signature`] describes a function's formal parameter list once, at
//! wrap time. [`CapturedFn`] then binds each call's actual arguments against
//! it and pushes the requested subset as a context scope for the duration
//! of the call.

use serde_json::Value;
use thiserror::Error;

use crate::{LogContext, fields::FieldMap};

/// An ordered description of a function's parameters.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    name: String,
    parameters: Vec<Parameter>,
    accepts_extra: bool,
}

#[derive(Debug, Clone)]
struct Parameter {
    name: String,
    default: Option<Value>,
}

impl Signature {
    /// Starts a signature description for the function called `name` (the
    /// name is only used in diagnostics).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            accepts_extra: false,
        }
    }

    /// Appends a required parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Appends a parameter with a default, used when the caller omits it.
    #[must_use]
    pub fn parameter_with_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Marks the signature as accepting arbitrary extra named arguments.
    #[must_use]
    pub const fn accepts_extra(mut self) -> Self {
        self.accepts_extra = true;
        self
    }

    fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|parameter| parameter.name == name)
    }

    fn parameter_names(&self) -> String {
        self.parameters
            .iter()
            .map(|parameter| parameter.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Matches actual call arguments against the parameter list.
    ///
    /// Returns the bound arguments as a name-to-value map in declaration
    /// order, defaults applied, extra named arguments (when accepted)
    /// appended under their own names.
    fn bind(&self, args: &CallArgs) -> Result<FieldMap, BindError> {
        if args.positional.len() > self.parameters.len() {
            return Err(BindError::TooManyPositional {
                expected: self.parameters.len(),
                given: args.positional.len(),
            });
        }

        let mut bound = FieldMap::new();
        for (parameter, value) in self.parameters.iter().zip(&args.positional) {
            bound.insert(parameter.name.clone(), value.clone());
        }

        let mut extras = Vec::new();
        for (name, value) in &args.named {
            if bound.contains_key(name) {
                return Err(BindError::DuplicateArgument { name: name.clone() });
            }
            if self.has_parameter(name) {
                bound.insert(name.clone(), value.clone());
            } else if self.accepts_extra {
                extras.push((name.clone(), value.clone()));
            } else {
                return Err(BindError::UnknownArgument { name: name.clone() });
            }
        }

        for parameter in &self.parameters {
            if bound.contains_key(&parameter.name) {
                continue;
            }
            match &parameter.default {
                Some(default) => {
                    bound.insert(parameter.name.clone(), default.clone());
                }
                None => {
                    return Err(BindError::MissingArgument {
                        name: parameter.name.clone(),
                    });
                }
            }
        }

        for (name, value) in extras {
            bound.insert(name, value);
        }
        Ok(bound)
    }
}

/// The actual arguments of one call: positional values in order, then named
/// values.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl CallArgs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn named_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }
}

/// Why a set of call arguments could not be matched to a [`Signature`].
#[derive(Debug, Error)]
pub enum BindError {
    #[error("expected at most {expected} positional arguments, got {given}")]
    TooManyPositional { expected: usize, given: usize },
    #[error("unknown named argument `{name}`")]
    UnknownArgument { name: String },
    #[error("argument `{name}` given both positionally and by name")]
    DuplicateArgument { name: String },
    #[error("missing required argument `{name}`")]
    MissingArgument { name: String },
}

/// A function wrapped so that selected arguments of each call join the
/// logging context for the duration of that call.
///
/// Requested names that don't appear in the signature are reported once at
/// wrap time and never captured; when the signature has a catch-all they
/// are kept and checked against the actual arguments of each call instead.
/// When nothing could ever be captured the wrapper degrades to a plain
/// passthrough call.
pub struct CapturedFn<F> {
    function: F,
    capture: Option<Capture>,
}

#[derive(Debug)]
struct Capture {
    signature: Signature,
    names: Vec<String>,
}

impl<F, R> CapturedFn<F>
where
    F: Fn(&CallArgs) -> R,
{
    /// Wraps `function`, capturing the arguments named in `names`.
    pub fn wrap<I, S>(signature: Signature, names: I, function: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested: Vec<String> = names.into_iter().map(Into::into).collect();
        if requested.is_empty() {
            log::warn!(
                "no parameters were specified to attach to the logging context of `{}`",
                signature.name
            );
            return Self {
                function,
                capture: None,
            };
        }

        let (resolved, unresolved): (Vec<String>, Vec<String>) = requested
            .into_iter()
            .partition(|name| signature.has_parameter(name));

        if !unresolved.is_empty() && !signature.accepts_extra {
            log::warn!(
                "invalid parameters [{}] cannot be attached to the logging context: \
                 not in the signature of `{}({})`",
                unresolved.join(", "),
                signature.name,
                signature.parameter_names(),
            );
        }

        let names = if signature.accepts_extra {
            // Unresolved names may still arrive through the catch-all;
            // keep them and check the bound arguments per call.
            resolved.into_iter().chain(unresolved).collect()
        } else {
            resolved
        };

        if names.is_empty() {
            log::warn!(
                "none of the parameters to attach to the logging context are in \
                 the signature of `{}({})`",
                signature.name,
                signature.parameter_names(),
            );
            return Self {
                function,
                capture: None,
            };
        }

        Self {
            function,
            capture: Some(Capture { signature, names }),
        }
    }

    /// Calls the wrapped function.
    ///
    /// When the arguments don't bind against the signature, the capture is
    /// skipped and the function is called with an empty context so its own
    /// error stays the clearest diagnostic.
    pub fn call(&self, args: &CallArgs) -> R {
        let Some(capture) = &self.capture else {
            return (self.function)(args);
        };

        let mut context = LogContext::new();
        if let Ok(bound) = capture.signature.bind(args) {
            for (name, value) in bound {
                if capture.names.iter().any(|captured| *captured == name) {
                    context = context.record(name, value);
                }
            }
        }
        let _guard = context.enter();
        (self.function)(args)
    }

    /// `true` when wrapping was skipped because nothing could be captured.
    pub const fn is_passthrough(&self) -> bool {
        self.capture.is_none()
    }
}

impl<F> std::fmt::Debug for CapturedFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFn")
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}
