//! The fixed set of global bindings every program starts with: the
//! `Null`/`True`/`False` sentinels and the built-in functions `Print`,
//! `Input`, `Input_Int`, `Is_number`, `Is_string`, `Is_list`, `Append`,
//! `Pop`, and `Extend`.
//!
//! None of these names are reserved words - a script is free to rebind any
//! of them, the same as any other global. `install` just seeds the root
//! symbol table with ordinary values before the program's own statements
//! run.

use crate::context::{ContextId, Contexts, TableId};
use crate::engine::Engine;
use crate::error::ThistleError;
use crate::token::{Position, Span};
use crate::value::{BuiltInData, Value};
use crate::Int;

/// `(name, parameter names)` for every built-in function. Parameter names
/// exist only so arity mismatches can be reported the same way a user
/// function's would be; the dispatch in [`call`] matches on `name` alone.
const BUILTINS: &[(&str, &[&str])] = &[
    ("Print", &["value"]),
    ("Input", &[]),
    ("Input_Int", &[]),
    ("Is_number", &["value"]),
    ("Is_string", &["value"]),
    ("Is_list", &["value"]),
    ("Append", &["list", "value"]),
    ("Pop", &["list", "index"]),
    ("Extend", &["listA", "listB"]),
];

/// Seed `table` with the sentinel numbers and every built-in function,
/// all attributed to the zero-width span at `pos`.
pub fn install(contexts: &mut Contexts, table: TableId, pos: &Position, ctx: ContextId) {
    let span = pos.span_to(pos);
    contexts.set(table, "Null", Value::int(0, span.clone(), ctx));
    contexts.set(table, "True", Value::int(1, span.clone(), ctx));
    contexts.set(table, "False", Value::int(0, span.clone(), ctx));
    for (name, params) in BUILTINS {
        contexts.set(table, *name, Value::builtin(BuiltInData { name, params }, span.clone(), ctx));
    }
}

fn arity_error(
    data: &BuiltInData,
    got: usize,
    span: &Span,
    contexts: &Contexts,
    ctx: ContextId,
) -> ThistleError {
    let diff = got as i64 - data.params.len() as i64;
    let detail = if diff > 0 {
        format!("{} excess arguments", diff)
    } else {
        format!("{} less arguments", -diff)
    };
    ThistleError::runtime(detail, span.clone(), contexts.traceback(ctx))
}

fn type_error(what: &str, span: &Span, contexts: &Contexts, ctx: ContextId) -> ThistleError {
    ThistleError::runtime(format!("expected {}", what), span.clone(), contexts.traceback(ctx))
}

fn bool_value(b: bool, span: &Span, ctx: ContextId) -> Value {
    Value::int(if b { 1 } else { 0 }, span.clone(), ctx)
}

/// Dispatch a call to a built-in by name. `args` has already been checked
/// for nothing but its length against `data.params`.
pub fn call(
    contexts: &mut Contexts,
    engine: &mut Engine,
    data: &BuiltInData,
    args: Vec<Value>,
    span: &Span,
    ctx: ContextId,
) -> Result<Value, ThistleError> {
    if args.len() != data.params.len() {
        return Err(arity_error(data, args.len(), span, contexts, ctx));
    }

    match data.name {
        "Print" => {
            engine.print(&args[0].render());
            Ok(Value::null(span.clone(), ctx))
        }
        "Input" => {
            let line = engine.input().unwrap_or_default();
            Ok(Value::string(line, span.clone(), ctx))
        }
        "Input_Int" => loop {
            let line = engine.input().unwrap_or_default();
            match line.trim().parse::<Int>() {
                Ok(i) => return Ok(Value::int(i, span.clone(), ctx)),
                Err(_) => engine.print("Must enter an integer"),
            }
        },
        "Is_number" => Ok(bool_value(args[0].as_number().is_some(), span, ctx)),
        "Is_string" => Ok(bool_value(args[0].as_string().is_some(), span, ctx)),
        "Is_list" => Ok(bool_value(args[0].as_list().is_some(), span, ctx)),
        "Append" => {
            let list = args[0]
                .as_list()
                .ok_or_else(|| type_error("a list", span, contexts, ctx))?;
            list.borrow_mut().push(args[1].clone());
            Ok(Value::null(span.clone(), ctx))
        }
        "Pop" => {
            let list = args[0]
                .as_list()
                .ok_or_else(|| type_error("a list", span, contexts, ctx))?;
            let n = args[1]
                .as_number()
                .ok_or_else(|| type_error("a number", span, contexts, ctx))?;
            let raw = n.to_int();
            // A positive index is 1-based and adjusted to 0-based; zero and
            // negative indices pass through unchanged, so a negative index
            // counts from the end the same as native list indexing.
            let idx = if raw > 0 { raw - 1 } else { raw };
            let mut items = list.borrow_mut();
            let resolved = crate::value::raw_list_index(idx, items.len()).ok_or_else(|| {
                ThistleError::runtime("List index out of range", span.clone(), contexts.traceback(ctx))
            })?;
            Ok(items.remove(resolved))
        }
        "Extend" => {
            let a = args[0]
                .as_list()
                .ok_or_else(|| type_error("a list", span, contexts, ctx))?
                .clone();
            let b = args[1]
                .as_list()
                .ok_or_else(|| type_error("a list", span, contexts, ctx))?;
            let extra: Vec<Value> = b.borrow().clone();
            a.borrow_mut().extend(extra);
            Ok(Value::null(span.clone(), ctx))
        }
        other => unreachable!("builtin dispatch table is exhaustive, got {}", other),
    }
}
