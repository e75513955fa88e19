//! Method identity and argument adaptation.

use std::fmt;

use crate::invocation::Value;

/// Declared parameter type, used to reconcile call arguments with a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Array,
    Object,
}

impl ParamType {
    /// Whether a value is acceptable for this parameter without adaptation.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Bool => value.is_boolean(),
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_f64(),
            ParamType::Str => value.is_string(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "str",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a proxied method: declaring type, name and parameter signature.
///
/// For varargs methods the last parameter receives the trailing arguments
/// packed into an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    declaring_type: String,
    name: String,
    params: Vec<ParamType>,
    varargs: bool,
}

impl Method {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            params: Vec::new(),
            varargs: false,
        }
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = ParamType>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    /// Mark the last parameter as a varargs array.
    pub fn with_varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn is_varargs(&self) -> bool {
        self.varargs && !self.params.is_empty()
    }

    /// Whether a call with `count` arguments fits this signature.
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.is_varargs() {
            count + 1 >= self.params.len()
        } else {
            count == self.params.len()
        }
    }

    /// Same name and parameter list, ignoring the declaring type.
    pub fn same_signature(&self, other: &Method) -> bool {
        self.name == other.name && self.params == other.params && self.varargs == other.varargs
    }

    /// Reconcile call arguments with this signature.
    ///
    /// Packs trailing varargs into an array unless the caller already did,
    /// and widens integers passed for float parameters.
    pub fn adapt_arguments(&self, mut arguments: Vec<Value>) -> Vec<Value> {
        if self.is_varargs() {
            let fixed = self.params.len() - 1;
            let already_packed =
                arguments.len() == self.params.len() && arguments[fixed].is_array();
            if !already_packed && arguments.len() >= fixed {
                let rest = arguments.split_off(fixed);
                arguments.push(Value::Array(rest));
            }
        }

        for (param, argument) in self.params.iter().zip(arguments.iter_mut()) {
            if *param == ParamType::Float && !argument.is_f64() {
                if let Some(widened) = argument.as_f64() {
                    *argument = Value::from(widened);
                }
            }
        }

        arguments
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if self.varargs && i + 1 == self.params.len() {
                write!(f, "{}...", param)?;
            } else {
                write!(f, "{}", param)?;
            }
        }
        f.write_str(")")
    }
}
