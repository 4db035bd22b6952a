//! Members attached to a work directory.
//!
//! Every name a handle exposes is one of three kinds of [`Member`]: a plain
//! value, a function adapted by the [method adapter](crate::adapter), or a
//! script class. Functions are described by a [`FunctionDescriptor`], built
//! once when the function is loaded, which the adapter consumes to map call
//! arguments onto the original parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::adapter::BoundFunction;
use crate::error::Result;
use crate::handle::WorkDir;
use crate::script::{ScriptClass, ScriptFunction};

/// A named member of a work directory.
#[derive(Debug, Clone)]
pub enum Member {
    /// Data: numbers, strings, lists, mappings.
    Value(serde_json::Value),
    /// A function, adapted so that reserved parameters are filled in.
    Function(BoundFunction),
    /// A class defined in a script file.
    Type(ScriptClass),
}

impl Member {
    /// Returns true for members that can be called.
    ///
    /// Classes count as callable: calling one constructs an instance.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Type(_))
    }

    /// Short name of the member kind, as used in listings.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Function(_) => "function",
            Self::Type(_) => "type",
        }
    }

    /// The data of a value member.
    #[must_use]
    pub const fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The adapted function of a function member.
    #[must_use]
    pub const fn as_function(&self) -> Option<&BoundFunction> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }
}

/// How an omitted argument is filled in.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// The caller must supply the argument.
    Required,
    /// Use this value.
    Value(serde_json::Value),
    /// The function declares its own default expression and evaluates it
    /// when the argument is missing.
    Declared,
}

/// One parameter of a function, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    default: ParamDefault,
    variadic: bool,
}

impl Parameter {
    /// A parameter the caller must supply.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: ParamDefault::Required,
            variadic: false,
        }
    }

    /// A parameter that falls back to `value` when omitted.
    #[must_use]
    pub fn optional(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            default: ParamDefault::Value(value),
            variadic: false,
        }
    }

    /// A parameter whose default is evaluated by the function itself.
    #[must_use]
    pub fn declared_default(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: ParamDefault::Declared,
            variadic: false,
        }
    }

    /// A rest parameter collecting any extra positional arguments.
    #[must_use]
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: ParamDefault::Declared,
            variadic: true,
        }
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How an omitted argument is filled in.
    #[must_use]
    pub const fn default(&self) -> &ParamDefault {
        &self.default
    }

    /// Returns true if the parameter may be omitted.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        !matches!(self.default, ParamDefault::Required)
    }

    /// Returns true for a rest parameter.
    #[must_use]
    pub const fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// Command-line metadata attached to a function with `command(fn, spec)`.
///
/// ```js
/// export const hello = command(function hello(name) {
///     console.log("hello", name);
/// }, { help: "Greet someone", options: { name: { short: "n", help: "Who to greet" } } });
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandSpec {
    /// Help text of the generated subcommand.
    pub help: Option<String>,
    /// Per-parameter option settings.
    pub options: IndexMap<String, OptionSpec>,
}

/// Command-line settings for one parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OptionSpec {
    /// Single-letter short flag.
    pub short: Option<char>,
    /// Help text of the option.
    pub help: Option<String>,
}

/// The parameter list of a function, built once at load time.
///
/// # Examples
///
/// ```
/// use workdir::{FunctionDescriptor, Parameter};
///
/// let descriptor = FunctionDescriptor::new(
///     "double",
///     vec![Parameter::required("n"), Parameter::required("workdir")],
/// );
/// assert!(descriptor.has_parameter("workdir"));
/// assert!(!descriptor.has_parameter("here"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    name: String,
    parameters: Vec<Parameter>,
    command: Option<CommandSpec>,
}

impl FunctionDescriptor {
    /// Describes a function with the given parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
            command: None,
        }
    }

    /// Marks the function as command-line exposable with `spec`.
    #[must_use]
    pub fn with_command(mut self, spec: CommandSpec) -> Self {
        self.command = Some(spec);
        self
    }

    /// The function's own name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Returns true if a parameter called `name` exists.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Command-line metadata, present if the function carries the marker.
    #[must_use]
    pub const fn command(&self) -> Option<&CommandSpec> {
        self.command.as_ref()
    }
}

/// One argument handed to a [`Callable`], in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A concrete value.
    Value(serde_json::Value),
    /// Omitted: the callee evaluates its declared default.
    Missing,
    /// The work directory the function is bound to.
    Handle,
}

impl Argument {
    /// The value of a concrete argument.
    #[must_use]
    pub const fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Something the method adapter can invoke.
///
/// `arguments` has exactly one entry per descriptor parameter (a rest
/// parameter expands to any number of trailing entries). `handle` is the
/// work directory the call goes through, used for [`Argument::Handle`].
pub trait Callable {
    /// Invokes the function.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying function raises.
    fn invoke(&self, handle: &WorkDir, arguments: Vec<Argument>) -> Result<serde_json::Value>;

    /// The script function behind this callable, if it is one.
    fn as_script(&self) -> Option<&ScriptFunction> {
        None
    }
}

/// A Rust closure registered as a work directory function.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use indexmap::IndexMap;
/// use workdir::{Argument, FunctionDescriptor, NativeFunction, Parameter, WorkDir};
///
/// let tmp = tempfile::tempdir().unwrap();
/// let mut wd = WorkDir::new(tmp.path()).unwrap();
///
/// let add = NativeFunction::new(|_wd: &WorkDir, args: &[Argument]| {
///     let a = args[0].as_value().and_then(|v| v.as_i64()).unwrap_or(0);
///     let b = args[1].as_value().and_then(|v| v.as_i64()).unwrap_or(0);
///     Ok(serde_json::json!(a + b))
/// });
/// let descriptor = FunctionDescriptor::new(
///     "add",
///     vec![Parameter::required("a"), Parameter::optional("b", serde_json::json!(10))],
/// );
/// wd.register_function("add", Rc::new(add), descriptor, None, IndexMap::new(), tmp.path())
///     .unwrap();
///
/// assert_eq!(wd.call("add", vec![serde_json::json!(1)], IndexMap::new()).unwrap(), 11);
/// ```
pub struct NativeFunction<F> {
    function: F,
}

impl<F> NativeFunction<F>
where
    F: Fn(&WorkDir, &[Argument]) -> Result<serde_json::Value>,
{
    /// Wraps `function`.
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> Callable for NativeFunction<F>
where
    F: Fn(&WorkDir, &[Argument]) -> Result<serde_json::Value>,
{
    fn invoke(&self, handle: &WorkDir, arguments: Vec<Argument>) -> Result<serde_json::Value> {
        (self.function)(handle, &arguments)
    }
}
