//! The embedded script engine.
//!
//! Executable customization files are JavaScript ES modules run by QuickJS
//! through `rquickjs`. [`ScriptHost::load`] evaluates one file and lists its
//! exports; the member loader decides which of them become members.
//!
//! Each file gets its own context, so its module cache is private: two
//! files that import a `lib.js` from different directories never see each
//! other's copy. Exported functions keep their context alive for as long as
//! the handle holds them.
//!
//! Scripts see a few host globals:
//!
//! - `command(fn, spec)` marks a function for the command line;
//! - `console.log` / `console.error` print to stdout / stderr;
//! - `getenv(name)` reads the live process environment.
//!
//! A method receives the handle as a plain object. It carries the handle's
//! `path`, `environment` and value members, `join`, `len`, `files`, `log`,
//! every class, and every script function, adapted the same way as when
//! called from Rust. Native Rust functions are not visible to scripts.

pub mod bridge;
pub mod params;
pub mod resolver;

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rquickjs::function::Rest;
use rquickjs::loader::ScriptLoader;
use log::Level;
use rquickjs::{
    Array, CatchResultExt, CaughtError, Context, Ctx, Exception, Function, Module, Object,
    Persistent, Promise, Runtime, Value as JsValue,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapter::BoundFunction;
use crate::error::{Error, Result};
use crate::handle::{count_entries, Files, WorkDir};
use crate::member::{Argument, Callable, CommandSpec, FunctionDescriptor, Member, Parameter};

pub use resolver::ImportResolver;

const PRELUDE: &str = r#"
(print, eprint, getenv) => {
    const format = (args) => args
        .map((a) => typeof a === "string" ? a : (JSON.stringify(a) ?? String(a)))
        .join(" ");
    globalThis.console = {
        log: (...args) => print(format(args)),
        info: (...args) => print(format(args)),
        warn: (...args) => eprint(format(args)),
        error: (...args) => eprint(format(args)),
    };
    globalThis.getenv = (name) => getenv(String(name));
    globalThis.command = (fn, spec = {}) => {
        if (typeof fn !== "function") {
            throw new TypeError("command() expects a function");
        }
        fn.cli = spec;
        return fn;
    };
}
"#;

const HARVEST: &str = r#"
(namespace, dependencies) => {
    const foreign = new Set();
    for (const dependency of dependencies) {
        for (const key of Object.keys(dependency)) {
            foreign.add(dependency[key]);
        }
    }
    return Object.keys(namespace).map((name) => {
        const value = namespace[name];
        let kind = "value";
        let source = null;
        const lineage = [];
        if (Object.prototype.toString.call(value) === "[object Module]") {
            kind = "module";
        } else if (typeof value === "function") {
            source = Function.prototype.toString.call(value);
            kind = /^class\b/.test(source) ? "type" : "function";
        }
        if (kind === "type") {
            let parent = Object.getPrototypeOf(value);
            while (typeof parent === "function" && parent !== Function.prototype) {
                lineage.push(Function.prototype.toString.call(parent));
                parent = Object.getPrototypeOf(parent);
            }
        }
        const marked = typeof value === "function" && value.cli !== undefined;
        return {
            name,
            kind,
            imported: foreign.has(value),
            cli: marked ? value.cli : null,
            source,
            lineage,
        };
    });
}
"#;

const HANDLE: &str = r#"
(data, host, members) => {
    const handle = {
        path: data.path,
        attributes: data.attributes,
        environment: data.environment,
        join: (...parts) => [data.path, ...parts].join("/"),
        len: () => host.len(),
        files: (absolute = false) => host.files(Boolean(absolute)),
        log: (message, level = "info") => host.log(String(message), String(level)),
        toString: () => data.path,
        ...data.attributes,
    };
    for (const { name, target, plan } of members) {
        if (plan === null) {
            handle[name] = target;
            continue;
        }
        handle[name] = (...args) => {
            const call = [];
            let next = 0;
            for (const slot of plan) {
                if (slot.handle) {
                    call.push(handle);
                } else if ("value" in slot) {
                    call.push(slot.value);
                } else if (slot.rest) {
                    call.push(...args.slice(next));
                    next = args.length;
                } else {
                    call.push(args[next++]);
                }
            }
            return target(...call);
        };
    }
    return handle;
}
"#;

const CONSTRUCT: &str = "(C, ...args) => new C(...args)";

/// Loads script files.
pub struct ScriptHost {
    runtime: Runtime,
    imports: Rc<RefCell<Vec<String>>>,
}

impl ScriptHost {
    /// Creates a host with its own engine runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the runtime cannot be created.
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new()?;
        let resolver = ImportResolver::new();
        let imports = resolver.record();
        runtime.set_loader(resolver, ScriptLoader::default());
        Ok(Self { runtime, imports })
    }

    /// Evaluates the module at `path` and lists its exports.
    ///
    /// Exports come back in namespace order, which sorts names by code
    /// unit. Nothing is filtered here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceLoad`] if the module fails to parse or throws
    /// during evaluation, and an I/O error if it cannot be read.
    pub fn load(&self, path: &Path) -> Result<Vec<ScriptExport>> {
        log::debug!("Loading script {}", path.display());
        let source = fs::read_to_string(path)?;
        let module_name = path.to_string_lossy().into_owned();
        let context = Context::full(&self.runtime)?;
        self.imports.borrow_mut().clear();

        context.with(|ctx| -> Result<Vec<ScriptExport>> {
            install_prelude(&ctx)?;

            let declared = Module::declare(ctx.clone(), module_name, source)
                .catch(&ctx)
                .map_err(|e| source_load(path, &e))?;
            let (module, promise) = declared
                .eval()
                .catch(&ctx)
                .map_err(|e| source_load(path, &e))?;
            promise
                .finish::<JsValue>()
                .catch(&ctx)
                .map_err(|e| source_load(path, &e))?;
            let namespace = module.namespace()?;

            let dependencies = Array::new(ctx.clone())?;
            let imported = std::mem::take(&mut *self.imports.borrow_mut());
            for (index, name) in imported.into_iter().enumerate() {
                let exports: Object = Module::import(&ctx, name)?.finish()?;
                dependencies.set(index, exports)?;
            }

            let harvest: Function = ctx.eval(HARVEST)?;
            let listing: JsValue = harvest.call((namespace.clone(), dependencies))?;
            let entries: Vec<ExportEntry> = serde_json::from_value(bridge::js_to_json(&ctx, listing)?)
                .map_err(|e| Error::Conversion {
                    message: e.to_string(),
                })?;

            let mut exports = Vec::with_capacity(entries.len());
            for entry in entries {
                let kind = match entry.kind {
                    EntryKind::Module => ExportKind::Namespace,
                    EntryKind::Value => {
                        let value: JsValue = namespace.get(entry.name.as_str())?;
                        ExportKind::Value(bridge::js_to_json(&ctx, value).unwrap_or_else(|e| {
                            log::warn!("Export '{}' of {} is not data: {e}", entry.name, path.display());
                            Value::Null
                        }))
                    }
                    EntryKind::Function | EntryKind::Type => {
                        let function: Function = namespace.get(entry.name.as_str())?;
                        let parameters = entry_parameters(&entry).map_err(|e| Error::SourceLoad {
                            path: path.to_path_buf(),
                            message: format!("cannot read the parameters of '{}': {e}", entry.name),
                        })?;
                        let mut descriptor = FunctionDescriptor::new(entry.name.as_str(), parameters);
                        if let Some(cli) = entry.cli {
                            let spec: CommandSpec =
                                serde_json::from_value(cli).map_err(|e| Error::SourceLoad {
                                    path: path.to_path_buf(),
                                    message: format!("invalid command() spec for '{}': {e}", entry.name),
                                })?;
                            descriptor = descriptor.with_command(spec);
                        }
                        let function = ScriptFunction {
                            function: Persistent::save(&ctx, function),
                            context: context.clone(),
                            descriptor,
                        };
                        if matches!(entry.kind, EntryKind::Type) {
                            ExportKind::Class(ScriptClass { constructor: function })
                        } else {
                            ExportKind::Function(function)
                        }
                    }
                };
                exports.push(ScriptExport {
                    name: entry.name,
                    imported: entry.imported,
                    kind,
                });
            }

            log::debug!("{} exported {} name(s)", path.display(), exports.len());
            Ok(exports)
        })
    }
}

impl fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHost").finish_non_exhaustive()
    }
}

fn install_prelude(ctx: &Ctx<'_>) -> Result<()> {
    let print = Function::new(ctx.clone(), |line: String| println!("{line}"))?;
    let eprint = Function::new(ctx.clone(), |line: String| eprintln!("{line}"))?;
    let getenv = Function::new(ctx.clone(), |name: String| std::env::var(name).ok())?;

    let prelude: Function = ctx.eval(PRELUDE)?;
    prelude.call::<_, ()>((print, eprint, getenv))?;
    Ok(())
}

/// Parameters of a harvested function. A class without a constructor of its
/// own takes the nearest ancestor's.
fn entry_parameters(entry: &ExportEntry) -> Result<Vec<Parameter>> {
    for source in entry.source.iter().chain(&entry.lineage) {
        if let Some(parameters) = params::own_parameters(source)? {
            return Ok(parameters);
        }
    }
    Ok(Vec::new())
}

/// Builds the object a method receives as its handle.
fn handle_object<'js>(ctx: &Ctx<'js>, handle: &WorkDir) -> Result<JsValue<'js>> {
    let data = bridge::json_to_js(ctx, &handle.snapshot())?;
    let host = host_object(ctx, handle)?;

    let members = Array::new(ctx.clone())?;
    let mut index = 0;
    for (name, member) in handle.members() {
        let (target, plan) = match member {
            Member::Value(_) => continue,
            Member::Function(bound) => match bound.callable().as_script() {
                Some(script) => (
                    script.function.clone().restore(ctx)?,
                    bridge::json_to_js(ctx, &call_plan(bound))?,
                ),
                None => {
                    log::debug!("Native function '{name}' is not visible to scripts");
                    continue;
                }
            },
            Member::Type(class) => (
                class.constructor.function.clone().restore(ctx)?,
                JsValue::new_null(ctx.clone()),
            ),
        };
        let entry = Object::new(ctx.clone())?;
        entry.set("name", name.as_str())?;
        entry.set("target", target)?;
        entry.set("plan", plan)?;
        members.set(index, entry)?;
        index += 1;
    }

    let factory: Function = ctx.eval(HANDLE)?;
    Ok(factory.call((data, host, members))?)
}

/// How the handle object fills each declared parameter of `bound`: the
/// handle itself, a substituted value, the remaining arguments, or the next
/// argument.
fn call_plan(bound: &BoundFunction) -> Value {
    let slots = bound
        .descriptor()
        .parameters()
        .iter()
        .map(|param| {
            if bound.self_param() == Some(param.name()) {
                json!({ "handle": true })
            } else if let Some(value) = bound.substitutions().get(param.name()) {
                json!({ "value": value })
            } else if param.is_variadic() {
                json!({ "rest": true })
            } else {
                json!({})
            }
        })
        .collect();
    Value::Array(slots)
}

fn host_object<'js>(ctx: &Ctx<'js>, handle: &WorkDir) -> Result<Object<'js>> {
    let host = Object::new(ctx.clone())?;

    let directory: PathBuf = handle.path().to_path_buf();
    let len = Function::new(ctx.clone(), move |ctx: Ctx<'js>| {
        count_entries(&directory).map_err(|e| throw(&ctx, &e))
    })?;
    host.set("len", len)?;

    let directory: PathBuf = handle.path().to_path_buf();
    let files = Function::new(ctx.clone(), move |ctx: Ctx<'js>, absolute: bool| {
        Files::open(&directory, absolute)
            .map(|files| {
                files
                    .map(|file| file.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
            })
            .map_err(|e| throw(&ctx, &e))
    })?;
    host.set("files", files)?;

    let sink = handle.log_sink().clone();
    let log = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, message: String, level: String| {
            let level: Level = level
                .parse()
                .map_err(|_| throw(&ctx, &format!("unknown log level '{level}'")))?;
            sink.log(&message, level).map_err(|e| throw(&ctx, &e))
        },
    )?;
    host.set("log", log)?;

    Ok(host)
}

fn throw(ctx: &Ctx<'_>, error: &dyn fmt::Display) -> rquickjs::Error {
    Exception::throw_message(ctx, &error.to_string())
}

fn describe(error: &CaughtError<'_>) -> String {
    match error {
        CaughtError::Exception(exception) => exception
            .message()
            .map_or_else(|| exception.to_string(), |message| {
                match exception.as_object().get::<_, String>("name") {
                    Ok(name) => format!("{name}: {message}"),
                    Err(_) => message,
                }
            }),
        CaughtError::Value(value) => value
            .as_string()
            .and_then(|s| s.to_string().ok())
            .unwrap_or_else(|| format!("{value:?}")),
        CaughtError::Error(error) => error.to_string(),
    }
}

fn source_load(path: &Path, error: &CaughtError<'_>) -> Error {
    Error::SourceLoad {
        path: path.to_path_buf(),
        message: describe(error),
    }
}

#[derive(Debug, Deserialize)]
struct ExportEntry {
    name: String,
    kind: EntryKind,
    imported: bool,
    cli: Option<Value>,
    source: Option<String>,
    #[serde(default)]
    lineage: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    Value,
    Module,
    Function,
    Type,
}

/// One export of a script module.
#[derive(Debug)]
pub struct ScriptExport {
    /// The exported name.
    pub name: String,
    /// True when the same function or class is also exported by a module
    /// this file imports, i.e. it was defined elsewhere.
    pub imported: bool,
    /// What was exported.
    pub kind: ExportKind,
}

/// The kind of an exported value.
#[derive(Debug)]
pub enum ExportKind {
    /// Data, converted to JSON.
    Value(Value),
    /// A function.
    Function(ScriptFunction),
    /// A class.
    Class(ScriptClass),
    /// A module namespace object (`export * as name from ...`).
    Namespace,
}

/// A function defined in a script.
#[derive(Clone)]
pub struct ScriptFunction {
    // Released before the context it belongs to.
    function: Persistent<Function<'static>>,
    context: Context,
    descriptor: FunctionDescriptor,
}

impl ScriptFunction {
    /// The function's descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    /// Returns true if the function carries the command-line marker.
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.descriptor.command().is_some()
    }

    fn failure(&self, error: &CaughtError<'_>) -> Error {
        Error::Script {
            name: self.descriptor.name().to_string(),
            message: describe(error),
        }
    }

    fn settle<'js>(&self, ctx: &Ctx<'js>, value: JsValue<'js>) -> Result<Value> {
        let value = if value.is_promise() {
            let promise: Promise = value.get()?;
            promise
                .finish::<JsValue>()
                .catch(ctx)
                .map_err(|e| self.failure(&e))?
        } else {
            value
        };
        bridge::js_to_json(ctx, value)
    }
}

impl Callable for ScriptFunction {
    fn as_script(&self) -> Option<&ScriptFunction> {
        Some(self)
    }

    fn invoke(&self, handle: &WorkDir, arguments: Vec<Argument>) -> Result<Value> {
        self.context.with(|ctx| -> Result<Value> {
            let function = self.function.clone().restore(&ctx)?;

            let mut values = Vec::with_capacity(arguments.len());
            for argument in arguments {
                values.push(match argument {
                    Argument::Value(value) => bridge::json_to_js(&ctx, &value)?,
                    Argument::Missing => JsValue::new_undefined(ctx.clone()),
                    Argument::Handle => handle_object(&ctx, handle)?,
                });
            }

            let result: JsValue = function
                .call((Rest(values),))
                .catch(&ctx)
                .map_err(|e| self.failure(&e))?;
            self.settle(&ctx, result)
        })
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A class defined in a script. Calling it constructs an instance.
#[derive(Debug, Clone)]
pub struct ScriptClass {
    constructor: ScriptFunction,
}

impl ScriptClass {
    /// The class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.constructor.descriptor.name()
    }

    /// The constructor's descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &FunctionDescriptor {
        &self.constructor.descriptor
    }

    /// Constructs an instance and returns its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Script`] if the constructor throws.
    pub fn instantiate(&self, arguments: Vec<Value>) -> Result<Value> {
        let function = &self.constructor;
        function.context.with(|ctx| -> Result<Value> {
            let class = function.function.clone().restore(&ctx)?;
            let construct: Function = ctx.eval(CONSTRUCT)?;

            let mut values = Vec::with_capacity(arguments.len());
            for argument in &arguments {
                values.push(bridge::json_to_js(&ctx, argument)?);
            }

            let instance: JsValue = construct
                .call((class, Rest(values)))
                .catch(&ctx)
                .map_err(|e| function.failure(&e))?;
            bridge::js_to_json(&ctx, instance)
        })
    }
}
