//! The tree-walking evaluator and the embeddable [`Engine`] entry point.
//!
//! Evaluation is a set of free functions over an explicit [`Contexts`]
//! arena rather than methods on a self-referential struct; `Engine` itself
//! holds only the host-configurable IO hooks, created once and reused
//! across any number of [`Engine::run`] calls, while a fresh `Contexts`
//! arena is built and torn down for each one.

use crate::ast::Expr;
use crate::builtins;
use crate::context::{ContextId, Contexts, TableId};
use crate::error::ThistleError;
use crate::parse;
use crate::token::{Lexer, Position, Span};
use crate::value::Number;
use crate::Value;
use std::io::Write as _;
use std::rc::Rc;

type PrintHook = Box<dyn FnMut(&str)>;
type InputHook = Box<dyn FnMut() -> Option<String>>;

/// An embeddable interpreter instance. Cheap to construct; the real
/// per-run state lives in the [`Contexts`] arena built inside [`Engine::run`].
pub struct Engine {
    on_print: PrintHook,
    on_input: InputHook,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            on_print: Box::new(|line| {
                let mut stdout = std::io::stdout();
                let _ = writeln!(stdout, "{}", line);
            }),
            on_input: Box::new(|| {
                let mut buf = String::new();
                match std::io::stdin().read_line(&mut buf) {
                    Ok(0) => None,
                    Ok(_) => Some(buf.trim_end_matches(['\n', '\r']).to_string()),
                    Err(_) => None,
                }
            }),
        }
    }

    /// Replace the `Print` sink. Hosts that capture output (tests, a REPL
    /// with its own pane) install a closure here instead of letting
    /// `Print` go straight to stdout.
    pub fn on_print(&mut self, hook: impl FnMut(&str) + 'static) {
        self.on_print = Box::new(hook);
    }

    /// Replace the `Input`/`Input_Int` source. Returning `None` signals
    /// EOF; callers see it as an empty string from `Input` and loop
    /// forever asking for an integer from `Input_Int`, matching what a
    /// closed stdin does to a line-based reader.
    pub fn on_input(&mut self, hook: impl FnMut() -> Option<String> + 'static) {
        self.on_input = Box::new(hook);
    }

    pub(crate) fn print(&mut self, line: &str) {
        (self.on_print)(line)
    }

    pub(crate) fn input(&mut self) -> Option<String> {
        (self.on_input)()
    }

    /// Run a program from source to completion: lex, parse, then walk the
    /// tree in a fresh context arena rooted at a `<program>` call frame
    /// pre-populated with the built-in bindings.
    pub fn run(&mut self, filename: &str, source: &str) -> Result<Value, ThistleError> {
        let tokens = Lexer::new(filename, source).tokenize()?;
        let ast = parse::parse(tokens)?;

        let mut contexts = Contexts::new();
        let global_table = contexts.new_table(None);
        let root_pos = Position::start(Rc::from(filename), Rc::from(source));
        let root_ctx = contexts.new_context("<program>", None, root_pos.clone(), global_table);
        builtins::install(&mut contexts, global_table, &root_pos, root_ctx);

        eval(&mut contexts, self, &ast, root_ctx)
    }
}

fn illegal_op_here(op: &str, ty: &str, span: &Span) -> ThistleError {
    ThistleError::runtime_plain(format!("Illegal Operation: {} {}", op, ty), span.clone())
}

/// Evaluate one AST node in context `ctx`, using `ctx`'s symbol table for
/// name lookups and binding.
fn eval(contexts: &mut Contexts, engine: &mut Engine, node: &Expr, ctx: ContextId) -> Result<Value, ThistleError> {
    match node {
        Expr::Number { value, span } => Ok(Value::number(*value, span.clone(), ctx)),

        Expr::Str { value, span } => Ok(Value::string(value.clone(), span.clone(), ctx)),

        Expr::List { items, span } => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval(contexts, engine, item, ctx)?);
            }
            Ok(Value::list(values, span.clone(), ctx))
        }

        Expr::Dictionary { keys, values, span } => {
            let mut data = crate::value::DictionaryData::default();
            for (k, v) in keys.iter().zip(values.iter()) {
                data.keys.push(eval(contexts, engine, k, ctx)?);
                data.values.push(eval(contexts, engine, v, ctx)?);
            }
            Ok(Value::dictionary(data, span.clone(), ctx))
        }

        Expr::VarAccess { name, span } => {
            let table = contexts.table_of(ctx);
            match contexts.get(table, name) {
                Some(mut v) => {
                    v.set_pos(span.clone());
                    v.set_context(ctx);
                    Ok(v)
                }
                None => Err(ThistleError::runtime(
                    format!("'{}' is not defined", name),
                    span.clone(),
                    contexts.traceback(ctx),
                )),
            }
        }

        Expr::VarAssign { name, value, span } => {
            let v = eval(contexts, engine, value, ctx)?;
            let table = contexts.table_of(ctx);
            contexts.set(table, name.clone(), v.clone());
            let mut result = v;
            result.set_pos(span.clone());
            result.set_context(ctx);
            Ok(result)
        }

        Expr::BinaryOp { op, left, right, span } => {
            let l = eval(contexts, engine, left, ctx)?;
            let r = eval(contexts, engine, right, ctx)?;
            eval_binary(contexts, *op, &l, &r, span, ctx)
        }

        Expr::UnaryOp { op, operand, span } => {
            let v = eval(contexts, engine, operand, ctx)?;
            let mut result = match op {
                crate::ast::UnOp::Neg => v
                    .negate()
                    .map_err(|e| e.with_traceback(contexts.traceback(ctx)))?,
                crate::ast::UnOp::Not => v.not(),
                crate::ast::UnOp::Plus => v,
            };
            result.set_pos(span.clone());
            result.set_context(ctx);
            Ok(result)
        }

        Expr::If { clauses, else_branch, span } => {
            for clause in clauses {
                let cond = eval(contexts, engine, &clause.condition, ctx)?;
                if cond.is_truthy() {
                    return eval_branch(contexts, engine, &clause.body, clause.multi_line, span, ctx);
                }
            }
            if let Some((body, multi)) = else_branch {
                return eval_branch(contexts, engine, body, *multi, span, ctx);
            }
            Ok(Value::null(span.clone(), ctx))
        }

        Expr::For {
            var_name,
            start,
            end,
            step,
            body,
            discard_result,
            span,
        } => {
            let start_v = eval(contexts, engine, start, ctx)?;
            let end_v = eval(contexts, engine, end, ctx)?;
            let start_n = start_v
                .as_number()
                .ok_or_else(|| illegal_op_here("StartCycle", "Number", &start_v.span))?;
            let end_n = end_v
                .as_number()
                .ok_or_else(|| illegal_op_here("StartCycle", "Number", &end_v.span))?;
            let step_n = match step {
                Some(s) => {
                    let sv = eval(contexts, engine, s, ctx)?;
                    sv.as_number()
                        .ok_or_else(|| illegal_op_here("StartCycle", "Number", &sv.span))?
                }
                None => Number::Int(1),
            };

            let table = contexts.table_of(ctx);
            let ascending = step_n.as_float() >= 0.0;
            let mut results = Vec::new();
            let mut i = start_n;
            loop {
                let cond = if ascending {
                    i.as_float() <= end_n.as_float()
                } else {
                    i.as_float() >= end_n.as_float()
                };
                if !cond {
                    break;
                }
                contexts.set(table, var_name.clone(), Value::number(i, body.span().clone(), ctx));
                let v = eval(contexts, engine, body, ctx)?;
                if !*discard_result {
                    results.push(v);
                }
                i = i.add(step_n);
            }
            if *discard_result {
                Ok(Value::null(span.clone(), ctx))
            } else {
                Ok(Value::list(results, span.clone(), ctx))
            }
        }

        Expr::While {
            condition,
            body,
            discard_result,
            span,
        } => {
            let mut results = Vec::new();
            loop {
                let cond = eval(contexts, engine, condition, ctx)?;
                if !cond.is_truthy() {
                    break;
                }
                let v = eval(contexts, engine, body, ctx)?;
                if !*discard_result {
                    results.push(v);
                }
            }
            if *discard_result {
                Ok(Value::null(span.clone(), ctx))
            } else {
                Ok(Value::list(results, span.clone(), ctx))
            }
        }

        Expr::FuncDef {
            name,
            params,
            body,
            discard_result,
            span,
        } => {
            let data = crate::value::FunctionData {
                name: name.clone(),
                params: params.clone(),
                body: body.clone(),
                discard_result: *discard_result,
                captured_context: ctx,
            };
            let v = Value::function(data, span.clone(), ctx);
            if let Some(n) = name {
                let table = contexts.table_of(ctx);
                contexts.set(table, n.clone(), v.clone());
            }
            Ok(v)
        }

        Expr::Call { callee, args, span } => {
            let callee_v = eval(contexts, engine, callee, ctx)?;
            let mut arg_values = Vec::with_capacity(args.len());
            for a in args {
                arg_values.push(eval(contexts, engine, a, ctx)?);
            }
            let mut result = call_value(contexts, engine, &callee_v, arg_values, span, ctx)?;
            // The return value is re-attached to the *caller's* context,
            // not the callee's - once a call returns, the value belongs to
            // whoever holds the expression that invoked it.
            result.set_pos(span.clone());
            result.set_context(ctx);
            Ok(result)
        }

        Expr::Statements { items, span } => {
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                results.push(eval(contexts, engine, item, ctx)?);
            }
            Ok(Value::list(results, span.clone(), ctx))
        }
    }
}

fn eval_branch(
    contexts: &mut Contexts,
    engine: &mut Engine,
    body: &Expr,
    multi_line: bool,
    span: &Span,
    ctx: ContextId,
) -> Result<Value, ThistleError> {
    if multi_line {
        eval(contexts, engine, body, ctx)?;
        Ok(Value::null(span.clone(), ctx))
    } else {
        let mut v = eval(contexts, engine, body, ctx)?;
        v.set_pos(span.clone());
        v.set_context(ctx);
        Ok(v)
    }
}

fn eval_binary(
    contexts: &mut Contexts,
    op: crate::ast::BinOp,
    l: &Value,
    r: &Value,
    span: &Span,
    ctx: ContextId,
) -> Result<Value, ThistleError> {
    use crate::ast::BinOp;
    let mut result = match op {
        BinOp::Add => l.add(r),
        BinOp::Sub => l.sub(r),
        BinOp::Mul => l.mul(r),
        BinOp::Div => l.div(r),
        BinOp::FloorDiv => l.floor_div(r),
        BinOp::Mod => l.modulo(r),
        BinOp::Pow => l.pow(r),
        BinOp::Index => l.index(r),
        BinOp::Eq => Ok(l.eq_op(r)),
        BinOp::Ne => Ok(l.ne_op(r)),
        BinOp::Lt => Ok(l.lt(r)),
        BinOp::Lte => Ok(l.lte(r)),
        BinOp::Gt => Ok(l.gt(r)),
        BinOp::Gte => Ok(l.gte(r)),
        BinOp::And => Ok(l.and(r)),
        BinOp::Or => Ok(l.or(r)),
    }
    .map_err(|e| e.with_traceback(contexts.traceback(ctx)))?;
    result.set_pos(span.clone());
    result.set_context(ctx);
    Ok(result)
}

/// Invoke a callable value: a user [`crate::value::FunctionData`] or a
/// built-in. Builds a fresh call context whose table's parent is the
/// callee's *captured* table (lexical scope, for closures) and whose
/// context's parent is the *caller's* context (dynamic chain, for
/// tracebacks) - the two parent links this language keeps separate.
fn call_value(
    contexts: &mut Contexts,
    engine: &mut Engine,
    callee: &Value,
    args: Vec<Value>,
    call_span: &Span,
    caller_ctx: ContextId,
) -> Result<Value, ThistleError> {
    if let Some(func) = callee.as_function().cloned() {
        if args.len() != func.params.len() {
            let diff = args.len() as i64 - func.params.len() as i64;
            let detail = if diff > 0 {
                format!("{} excess arguments", diff)
            } else {
                format!("{} less arguments", -diff)
            };
            return Err(ThistleError::runtime(
                detail,
                call_span.clone(),
                contexts.traceback(caller_ctx),
            ));
        }

        let captured_table: TableId = contexts.table_of(func.captured_context);
        let new_table = contexts.new_table(Some(captured_table));
        let display_name = func
            .name
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());
        let new_ctx = contexts.new_context(display_name, Some(caller_ctx), call_span.start.clone(), new_table);

        for (param, value) in func.params.iter().zip(args.into_iter()) {
            contexts.set(new_table, param.clone(), value);
        }

        if func.discard_result {
            eval(contexts, engine, &func.body, new_ctx)?;
            Ok(Value::null(call_span.clone(), new_ctx))
        } else {
            eval(contexts, engine, &func.body, new_ctx)
        }
    } else if let Some(data) = callee.as_builtin().cloned() {
        builtins::call(contexts, engine, &data, args, call_span, caller_ctx)
    } else {
        Err(ThistleError::runtime(
            format!("'{}' is not callable", callee.type_name()),
            call_span.clone(),
            contexts.traceback(caller_ctx),
        ))
    }
}
