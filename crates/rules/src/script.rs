//! Scripting host contract.
//!
//! The engine never embeds a runtime. `$func|a|b` tokens and `custom` items
//! call out through [`ScriptHost`], implemented by whatever embeds the
//! tracker. Host failures never escape a query: callers coerce them to `0`
//! and log a warning.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("call failed: {0}")]
    Failed(String),

    #[error("function returned an unusable value")]
    BadReturn,
}

/// What a host function may return.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Bool(bool),
    Number(f64),
    /// Used by custom item `save` callbacks (JSON text).
    Text(String),
}

impl ScriptValue {
    /// Coerce to an integer count: booleans are 0/1, numbers truncate,
    /// numeric text parses, everything else is 0.
    pub fn as_count(&self) -> i32 {
        match self {
            ScriptValue::Nil => 0,
            ScriptValue::Bool(b) => i32::from(*b),
            ScriptValue::Number(n) => *n as i32,
            ScriptValue::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Nil | ScriptValue::Bool(false) => false,
            _ => true,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<i32> for ScriptValue {
    fn from(n: i32) -> Self {
        ScriptValue::Number(f64::from(n))
    }
}

/// Narrow call contract into the embedding scripting runtime.
///
/// Implementations may query back into the tracker (through their own
/// shared handle) while a call is in progress; the engine holds no
/// internal borrows across a host call.
pub trait ScriptHost {
    fn call_function(&self, name: &str, args: &[String]) -> Result<ScriptValue, ScriptError>;
}

/// Host with no functions. Every call fails with `UnknownFunction`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl ScriptHost for NullHost {
    fn call_function(&self, name: &str, _args: &[String]) -> Result<ScriptValue, ScriptError> {
        Err(ScriptError::UnknownFunction(name.to_string()))
    }
}

type HostFn = Box<dyn Fn(&[String]) -> Result<ScriptValue, ScriptError>>;

/// Calls kept in the [`FunctionHost`] log.
pub const CALL_LOG_LIMIT: usize = 256;

/// Host backed by registered Rust closures.
///
/// Useful for tests, for the CLI, and for embedders that expose a handful
/// of native helpers. Keeps the most recent [`CALL_LOG_LIMIT`] call names
/// for inspection.
#[derive(Default)]
pub struct FunctionHost {
    functions: HashMap<String, HostFn>,
    calls: RefCell<VecDeque<String>>,
}

impl FunctionHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        f: impl Fn(&[String]) -> Result<ScriptValue, ScriptError> + 'static,
    ) {
        self.functions.insert(name.to_string(), Box::new(f));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(
        mut self,
        name: &str,
        f: impl Fn(&[String]) -> Result<ScriptValue, ScriptError> + 'static,
    ) -> Self {
        self.register(name, f);
        self
    }

    /// Names of the most recent calls, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().cloned().collect()
    }

    pub fn into_rc(self) -> Rc<dyn ScriptHost> {
        Rc::new(self)
    }
}

impl ScriptHost for FunctionHost {
    fn call_function(&self, name: &str, args: &[String]) -> Result<ScriptValue, ScriptError> {
        {
            let mut calls = self.calls.borrow_mut();
            if calls.len() == CALL_LOG_LIMIT {
                calls.pop_front();
            }
            calls.push_back(name.to_string());
        }
        let f = self
            .functions
            .get(name)
            .ok_or_else(|| ScriptError::UnknownFunction(name.to_string()))?;
        f(args)
    }
}

impl std::fmt::Debug for FunctionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionHost").field("functions", &names).finish()
    }
}
