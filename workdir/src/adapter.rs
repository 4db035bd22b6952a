//! The method adapter.
//!
//! A [`BoundFunction`] wraps a [`Callable`] together with its
//! [`FunctionDescriptor`] and hides some parameters from callers:
//!
//! - the *self parameter* (normally `workdir`) receives the handle the call
//!   goes through;
//! - each *substituted* parameter (normally `here`) always receives a fixed
//!   value.
//!
//! Callers see the remaining parameters as the function's signature and
//! supply them positionally or by name.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::handle::WorkDir;
use crate::member::{Argument, Callable, FunctionDescriptor, ParamDefault, Parameter};

/// A function adapted for attachment to a work directory.
#[derive(Clone)]
pub struct BoundFunction {
    name: String,
    descriptor: FunctionDescriptor,
    self_param: Option<String>,
    substitutions: IndexMap<String, Value>,
    callable: Rc<dyn Callable>,
}

impl BoundFunction {
    /// Adapts `callable` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] if `self_param` or a substitution
    /// key does not name a parameter of `descriptor`.
    pub fn adapt(
        name: impl Into<String>,
        callable: Rc<dyn Callable>,
        descriptor: FunctionDescriptor,
        self_param: Option<&str>,
        substitutions: IndexMap<String, Value>,
    ) -> Result<Self> {
        let name = name.into();
        let hidden = self_param
            .into_iter()
            .chain(substitutions.keys().map(String::as_str));
        for param in hidden {
            if !descriptor.has_parameter(param) {
                return Err(Error::UnknownParameter {
                    function: name,
                    name: param.to_string(),
                });
            }
        }

        Ok(Self {
            name,
            descriptor,
            self_param: self_param.map(str::to_string),
            substitutions,
            callable,
        })
    }

    /// The name the function is installed under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full descriptor, hidden parameters included.
    #[must_use]
    pub const fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    /// Returns true if the handle is injected into the call.
    #[must_use]
    pub const fn is_method(&self) -> bool {
        self.self_param.is_some()
    }

    /// The parameter that receives the handle, if any.
    #[must_use]
    pub fn self_param(&self) -> Option<&str> {
        self.self_param.as_deref()
    }

    /// The adapted callable.
    #[must_use]
    pub fn callable(&self) -> &dyn Callable {
        self.callable.as_ref()
    }

    /// The values substituted into hidden parameters.
    #[must_use]
    pub const fn substitutions(&self) -> &IndexMap<String, Value> {
        &self.substitutions
    }

    /// The apparent signature: every parameter a caller may supply.
    pub fn signature(&self) -> impl Iterator<Item = &Parameter> + '_ {
        self.descriptor
            .parameters()
            .iter()
            .filter(|p| !self.is_hidden(p.name()))
    }

    fn is_hidden(&self, name: &str) -> bool {
        self.self_param.as_deref() == Some(name) || self.substitutions.contains_key(name)
    }

    /// Calls the function through `handle`.
    ///
    /// # Errors
    ///
    /// Returns an argument error when the supplied arguments do not fit the
    /// apparent signature, or whatever the function itself raises.
    pub fn call(
        &self,
        handle: &WorkDir,
        positional: Vec<Value>,
        keywords: IndexMap<String, Value>,
    ) -> Result<Value> {
        let visible: Vec<&Parameter> = self.signature().filter(|p| !p.is_variadic()).collect();
        let accepts_rest = self.signature().any(Parameter::is_variadic);

        if positional.len() > visible.len() && !accepts_rest {
            return Err(Error::TooManyArguments {
                function: self.name.clone(),
                expected: visible.len(),
                given: positional.len(),
            });
        }

        let mut supplied: IndexMap<String, Value> = IndexMap::new();
        let mut extra = Vec::new();
        for (index, value) in positional.into_iter().enumerate() {
            match visible.get(index) {
                Some(param) => {
                    supplied.insert(param.name().to_string(), value);
                }
                None => extra.push(value),
            }
        }

        for (name, value) in keywords {
            if !visible.iter().any(|p| p.name() == name) {
                return Err(Error::UnexpectedArgument {
                    function: self.name.clone(),
                    name,
                });
            }
            if supplied.contains_key(&name) {
                return Err(Error::DuplicateArgument {
                    function: self.name.clone(),
                    name,
                });
            }
            supplied.insert(name, value);
        }

        let mut arguments = Vec::with_capacity(self.descriptor.parameters().len() + extra.len());
        for param in self.descriptor.parameters() {
            let name = param.name();
            if self.self_param.as_deref() == Some(name) {
                arguments.push(Argument::Handle);
            } else if let Some(value) = self.substitutions.get(name) {
                arguments.push(Argument::Value(value.clone()));
            } else if param.is_variadic() {
                arguments.extend(extra.drain(..).map(Argument::Value));
            } else if let Some(value) = supplied.shift_remove(name) {
                arguments.push(Argument::Value(value));
            } else {
                arguments.push(match param.default() {
                    ParamDefault::Required => {
                        return Err(Error::MissingArgument {
                            function: self.name.clone(),
                            name: name.to_string(),
                        })
                    }
                    ParamDefault::Value(value) => Argument::Value(value.clone()),
                    ParamDefault::Declared => Argument::Missing,
                });
            }
        }

        log::debug!("Calling {} with {} argument(s)", self.name, arguments.len());
        self.callable.invoke(handle, arguments)
    }
}

impl fmt::Debug for BoundFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFunction")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("self_param", &self.self_param)
            .field("substitutions", &self.substitutions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::NativeFunction;
    use serde_json::json;
    use tempfile::tempdir;

    /// A callable that echoes the arguments it received.
    fn echo() -> Rc<dyn Callable> {
        Rc::new(NativeFunction::new(|wd: &WorkDir, args: &[Argument]| {
            Ok(Value::Array(
                args.iter()
                    .map(|arg| match arg {
                        Argument::Value(v) => v.clone(),
                        Argument::Missing => json!("<missing>"),
                        Argument::Handle => json!(wd.path().display().to_string()),
                    })
                    .collect(),
            ))
        }))
    }

    fn handle() -> (tempfile::TempDir, WorkDir) {
        let dir = tempdir().unwrap();
        let wd = WorkDir::new(dir.path()).unwrap();
        (dir, wd)
    }

    fn no_keywords() -> IndexMap<String, Value> {
        IndexMap::new()
    }

    #[test]
    fn test_method_receives_handle() {
        let (_dir, wd) = handle();
        let descriptor = FunctionDescriptor::new(
            "double",
            vec![Parameter::required("n"), Parameter::required("workdir")],
        );
        let bound = BoundFunction::adapt("double", echo(), descriptor, Some("workdir"), IndexMap::new())
            .unwrap();

        let names: Vec<_> = bound.signature().map(Parameter::name).collect();
        assert_eq!(names, vec!["n"]);
        assert!(bound.is_method());

        let result = bound.call(&wd, vec![json!(5)], no_keywords()).unwrap();
        assert_eq!(result, json!([5, wd.path().display().to_string()]));
    }

    #[test]
    fn test_handle_in_middle_position() {
        let (_dir, wd) = handle();
        let descriptor = FunctionDescriptor::new(
            "f",
            vec![
                Parameter::required("a"),
                Parameter::required("workdir"),
                Parameter::required("b"),
            ],
        );
        let bound =
            BoundFunction::adapt("f", echo(), descriptor, Some("workdir"), IndexMap::new()).unwrap();

        let result = bound.call(&wd, vec![json!(1), json!(2)], no_keywords()).unwrap();
        assert_eq!(result[0], json!(1));
        assert_eq!(result[2], json!(2));
    }

    #[test]
    fn test_substitution_always_applied() {
        let (_dir, wd) = handle();
        let descriptor = FunctionDescriptor::new(
            "where_am_i",
            vec![Parameter::required("x"), Parameter::declared_default("here")],
        );
        let mut subs = IndexMap::new();
        subs.insert("here".to_string(), json!("/some/dir"));
        let bound = BoundFunction::adapt("where_am_i", echo(), descriptor, None, subs).unwrap();

        let result = bound.call(&wd, vec![json!("x")], no_keywords()).unwrap();
        assert_eq!(result, json!(["x", "/some/dir"]));

        let mut keywords = IndexMap::new();
        keywords.insert("here".to_string(), json!("/elsewhere"));
        let err = bound.call(&wd, vec![json!("x")], keywords).unwrap_err();
        assert!(matches!(err, Error::UnexpectedArgument { .. }));
    }

    #[test]
    fn test_keywords_and_defaults() {
        let (_dir, wd) = handle();
        let descriptor = FunctionDescriptor::new(
            "f",
            vec![
                Parameter::required("a"),
                Parameter::optional("b", json!(7)),
                Parameter::declared_default("c"),
            ],
        );
        let bound = BoundFunction::adapt("f", echo(), descriptor, None, IndexMap::new()).unwrap();

        let result = bound.call(&wd, vec![json!(1)], no_keywords()).unwrap();
        assert_eq!(result, json!([1, 7, "<missing>"]));

        let mut keywords = IndexMap::new();
        keywords.insert("c".to_string(), json!(3));
        keywords.insert("a".to_string(), json!(0));
        let result = bound.call(&wd, vec![], keywords).unwrap();
        assert_eq!(result, json!([0, 7, 3]));
    }

    #[test]
    fn test_argument_errors() {
        let (_dir, wd) = handle();
        let descriptor = FunctionDescriptor::new("f", vec![Parameter::required("a")]);
        let bound = BoundFunction::adapt("f", echo(), descriptor, None, IndexMap::new()).unwrap();

        let err = bound.call(&wd, vec![json!(1), json!(2)], no_keywords()).unwrap_err();
        assert!(matches!(err, Error::TooManyArguments { expected: 1, given: 2, .. }));

        let err = bound.call(&wd, vec![], no_keywords()).unwrap_err();
        assert!(matches!(err, Error::MissingArgument { .. }));

        let mut keywords = IndexMap::new();
        keywords.insert("a".to_string(), json!(2));
        let err = bound.call(&wd, vec![json!(1)], keywords).unwrap_err();
        assert!(matches!(err, Error::DuplicateArgument { .. }));

        let mut keywords = IndexMap::new();
        keywords.insert("zzz".to_string(), json!(2));
        let err = bound.call(&wd, vec![json!(1)], keywords).unwrap_err();
        assert!(matches!(err, Error::UnexpectedArgument { .. }));
    }

    #[test]
    fn test_rest_parameter_collects_extras() {
        let (_dir, wd) = handle();
        let descriptor = FunctionDescriptor::new(
            "f",
            vec![Parameter::required("first"), Parameter::variadic("rest")],
        );
        let bound = BoundFunction::adapt("f", echo(), descriptor, None, IndexMap::new()).unwrap();

        let result = bound
            .call(&wd, vec![json!(1), json!(2), json!(3)], no_keywords())
            .unwrap();
        assert_eq!(result, json!([1, 2, 3]));
    }

    #[test]
    fn test_unknown_hidden_parameter_rejected() {
        let descriptor = FunctionDescriptor::new("f", vec![Parameter::required("a")]);
        let err = BoundFunction::adapt("f", echo(), descriptor, Some("workdir"), IndexMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownParameter { .. }));
    }
}
