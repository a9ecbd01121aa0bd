//! The runtime value algebra: [`Number`], [`String`][Value::String],
//! [`List`][Value::List], [`Dictionary`][Value::Dictionary],
//! [`Function`][Value::Function], and [`BuiltIn`][Value::BuiltIn], plus the
//! operator methods each kind supports.
//!
//! Values are represented as a tagged variant and operator methods match on
//! the pair of operand tags rather than going through a per-kind virtual
//! table - a match on two tags is both faster and clearer than dynamic
//! dispatch for a closed, small set of kinds.

use crate::ast::Expr;
use crate::context::ContextId;
use crate::error::ThistleError;
use crate::token::Span;
use crate::{Float, Identifier, Int};
use std::cell::RefCell;
use std::rc::Rc;

/// Number unifies the integer and float cases; arithmetic between the two
/// widens automatically to float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(Int),
    Float(Float),
}

impl Number {
    pub fn as_float(self) -> Float {
        match self {
            Self::Int(i) => i as Float,
            Self::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(i) => i == 0,
            Self::Float(f) => f == 0.0,
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Self::Int(if b { 1 } else { 0 })
    }

    pub fn add(self, other: Number) -> Number {
        widen_add(self, other)
    }

    pub fn to_int(self) -> Int {
        match self {
            Self::Int(i) => i,
            Self::Float(f) => f as Int,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A user-defined function: name, body, parameter names, the discard flag
/// distinguishing block bodies from expression bodies, and the context it
/// closed over at definition time.
pub struct FunctionData {
    pub name: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: Rc<Expr>,
    pub discard_result: bool,
    pub captured_context: ContextId,
}

/// The fixed set of built-in function names the evaluator dispatches by
/// name; see [`crate::builtins`].
pub struct BuiltInData {
    pub name: &'static str,
    pub params: &'static [&'static str],
}

/// A dictionary's two parallel, insertion-ordered sequences of keys and
/// values.
#[derive(Default)]
pub struct DictionaryData {
    pub keys: Vec<Value>,
    pub values: Vec<Value>,
}

impl DictionaryData {
    pub fn pairs(&self) -> Vec<(Value, Value)> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

enum Payload {
    Number(Number),
    /// Owned, mutable buffer; shared behind `Rc<RefCell<_>>` the same way
    /// lists are, so that a value produced by `VarAccess` is a cheap alias
    /// rather than a deep copy.
    String(Rc<RefCell<String>>),
    List(Rc<RefCell<Vec<Value>>>),
    Dictionary(Rc<RefCell<DictionaryData>>),
    Function(Rc<FunctionData>),
    BuiltIn(Rc<BuiltInData>),
}

/// A runtime value. Every value carries the span of the expression that
/// produced it and the context it was produced in, so a diagnostic raised
/// while using the value can point at both where it came from and who is
/// holding it. Both are attached after construction via [`Value::set_pos`]
/// and [`Value::set_context`], matching how the evaluator threads position
/// information through as it walks the tree.
pub struct Value {
    payload: Payload,
    pub span: Span,
    pub context: ContextId,
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let payload = match &self.payload {
            Payload::Number(n) => Payload::Number(*n),
            Payload::String(s) => Payload::String(s.clone()),
            Payload::List(l) => Payload::List(l.clone()),
            Payload::Dictionary(d) => Payload::Dictionary(d.clone()),
            Payload::Function(f) => Payload::Function(f.clone()),
            Payload::BuiltIn(b) => Payload::BuiltIn(b.clone()),
        };
        Self {
            payload,
            span: self.span.clone(),
            context: self.context,
        }
    }
}

impl Value {
    pub fn number(n: Number, span: Span, context: ContextId) -> Self {
        Self {
            payload: Payload::Number(n),
            span,
            context,
        }
    }

    pub fn int(i: Int, span: Span, context: ContextId) -> Self {
        Self::number(Number::Int(i), span, context)
    }

    pub fn string(s: String, span: Span, context: ContextId) -> Self {
        Self {
            payload: Payload::String(Rc::new(RefCell::new(s))),
            span,
            context,
        }
    }

    pub fn list(items: Vec<Value>, span: Span, context: ContextId) -> Self {
        Self {
            payload: Payload::List(Rc::new(RefCell::new(items))),
            span,
            context,
        }
    }

    pub fn dictionary(data: DictionaryData, span: Span, context: ContextId) -> Self {
        Self {
            payload: Payload::Dictionary(Rc::new(RefCell::new(data))),
            span,
            context,
        }
    }

    pub fn function(data: FunctionData, span: Span, context: ContextId) -> Self {
        Self {
            payload: Payload::Function(Rc::new(data)),
            span,
            context,
        }
    }

    pub fn builtin(data: BuiltInData, span: Span, context: ContextId) -> Self {
        Self {
            payload: Payload::BuiltIn(Rc::new(data)),
            span,
            context,
        }
    }

    /// The null sentinel - the integer `0`.
    pub fn null(span: Span, context: ContextId) -> Self {
        Self::int(0, span, context)
    }

    pub fn set_pos(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    pub fn set_context(&mut self, context: ContextId) -> &mut Self {
        self.context = context;
        self
    }

    pub fn as_number(&self) -> Option<Number> {
        match &self.payload {
            Payload::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match &self.payload {
            Payload::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&Rc<RefCell<String>>> {
        match &self.payload {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<FunctionData>> {
        match &self.payload {
            Payload::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_builtin(&self) -> Option<&Rc<BuiltInData>> {
        match &self.payload {
            Payload::BuiltIn(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.payload {
            Payload::Number(_) => "Number",
            Payload::String(_) => "String",
            Payload::List(_) => "List",
            Payload::Dictionary(_) => "Dictionary",
            Payload::Function(_) => "Function",
            Payload::BuiltIn(_) => "BuiltInFunction",
        }
    }

    /// `value != 0` for numbers, `length > 0` for strings and lists;
    /// everything else (dictionaries, functions) is truthy.
    pub fn is_truthy(&self) -> bool {
        match &self.payload {
            Payload::Number(n) => !n.is_zero(),
            Payload::String(s) => !s.borrow().is_empty(),
            Payload::List(l) => !l.borrow().is_empty(),
            _ => true,
        }
    }

    fn illegal_op(&self, op: &str, rhs: &Value) -> ThistleError {
        ThistleError::runtime_plain(
            format!(
                "Illegal Operation: {} {} {}",
                self.type_name(),
                op,
                rhs.type_name()
            ),
            self.span.merge(&rhs.span),
        )
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => Ok(numeric_result(
                widen_add(*a, *b),
                self.span.merge(&rhs.span),
                self.context,
            )),
            (Payload::String(a), Payload::String(b)) => {
                let mut out = a.borrow().clone();
                out.push_str(&b.borrow());
                Ok(Value::string(out, self.span.merge(&rhs.span), self.context))
            }
            (Payload::List(a), Payload::List(b)) => {
                let mut out = a.borrow().clone();
                out.extend(b.borrow().iter().cloned());
                Ok(Value::list(out, self.span.merge(&rhs.span), self.context))
            }
            (Payload::Dictionary(d), Payload::List(pair)) => {
                let pair = pair.borrow();
                if pair.len() != 2 {
                    return Err(self.illegal_op("+", rhs));
                }
                // Appends to the dictionary's own key/value lists in place,
                // the same as the original's `Dictionary.add` - the
                // returned value aliases the same backing storage as `d`,
                // so the pre-existing binding observes the new pair too.
                d.borrow_mut().keys.push(pair[0].clone());
                d.borrow_mut().values.push(pair[1].clone());
                Ok(Value {
                    payload: Payload::Dictionary(d.clone()),
                    span: self.span.merge(&rhs.span),
                    context: self.context,
                })
            }
            _ => Err(self.illegal_op("+", rhs)),
        }
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => Ok(numeric_result(
                widen_sub(*a, *b),
                self.span.merge(&rhs.span),
                self.context,
            )),
            (Payload::List(list), Payload::Number(n)) => {
                let mut items = list.borrow().clone();
                let idx = raw_list_index(to_int(*n), items.len()).ok_or_else(|| {
                    ThistleError::runtime_plain(
                        "List index out of range",
                        self.span.merge(&rhs.span),
                    )
                })?;
                items.remove(idx);
                Ok(Value::list(items, self.span.merge(&rhs.span), self.context))
            }
            _ => Err(self.illegal_op("-", rhs)),
        }
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => Ok(numeric_result(
                widen_mul(*a, *b),
                self.span.merge(&rhs.span),
                self.context,
            )),
            (Payload::String(s), Payload::Number(n)) => {
                let count = repeat_count(*n);
                Ok(Value::string(
                    s.borrow().repeat(count),
                    self.span.merge(&rhs.span),
                    self.context,
                ))
            }
            (Payload::List(l), Payload::Number(n)) => {
                let count = repeat_count(*n);
                let base = l.borrow().clone();
                let mut out = Vec::with_capacity(base.len() * count);
                for _ in 0..count {
                    out.extend(base.iter().cloned());
                }
                Ok(Value::list(out, self.span.merge(&rhs.span), self.context))
            }
            _ => Err(self.illegal_op("*", rhs)),
        }
    }

    pub fn div(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => {
                if b.is_zero() {
                    return Err(ThistleError::runtime_plain(
                        "Division By Zero",
                        self.span.merge(&rhs.span),
                    ));
                }
                Ok(Value::number(
                    Number::Float(a.as_float() / b.as_float()),
                    self.span.merge(&rhs.span),
                    self.context,
                ))
            }
            _ => Err(self.illegal_op("/", rhs)),
        }
    }

    pub fn floor_div(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => {
                if b.is_zero() {
                    return Err(ThistleError::runtime_plain(
                        "Division By Zero",
                        self.span.merge(&rhs.span),
                    ));
                }
                let result = match (a, b) {
                    (Number::Int(x), Number::Int(y)) => {
                        let q = x / y;
                        let r = x % y;
                        Number::Int(if r != 0 && (*x < 0) != (*y < 0) { q - 1 } else { q })
                    }
                    _ => Number::Float((a.as_float() / b.as_float()).floor()),
                };
                Ok(numeric_result(result, self.span.merge(&rhs.span), self.context))
            }
            _ => Err(self.illegal_op("//", rhs)),
        }
    }

    pub fn modulo(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => {
                if b.is_zero() {
                    return Err(ThistleError::runtime_plain(
                        "Modulo By Zero",
                        self.span.merge(&rhs.span),
                    ));
                }
                let result = match (a, b) {
                    (Number::Int(x), Number::Int(y)) => Number::Int(((x % y) + y) % y),
                    _ => Number::Float(a.as_float() % b.as_float()),
                };
                Ok(numeric_result(result, self.span.merge(&rhs.span), self.context))
            }
            _ => Err(self.illegal_op("%", rhs)),
        }
    }

    pub fn pow(&self, rhs: &Value) -> Result<Value, ThistleError> {
        match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => {
                let result = match (a, b) {
                    (Number::Int(x), Number::Int(y)) if *y >= 0 => {
                        Number::Int(x.pow(*y as u32))
                    }
                    _ => Number::Float(a.as_float().powf(b.as_float())),
                };
                Ok(numeric_result(result, self.span.merge(&rhs.span), self.context))
            }
            _ => Err(self.illegal_op("^", rhs)),
        }
    }

    fn numeric_compare(&self, rhs: &Value) -> Option<std::cmp::Ordering> {
        match (self.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a.as_float().partial_cmp(&b.as_float()),
            _ => None,
        }
    }

    fn compare_bool(&self, rhs: &Value, f: impl FnOnce(std::cmp::Ordering) -> bool) -> Value {
        let result = self.numeric_compare(rhs).map(f).unwrap_or(false);
        Value::number(Number::from_bool(result), self.span.merge(&rhs.span), self.context)
    }

    pub fn eq_op(&self, rhs: &Value) -> Value {
        let result = match (&self.payload, &rhs.payload) {
            (Payload::Number(a), Payload::Number(b)) => a.as_float() == b.as_float(),
            (Payload::String(a), Payload::String(b)) => *a.borrow() == *b.borrow(),
            _ => false,
        };
        Value::number(Number::from_bool(result), self.span.merge(&rhs.span), self.context)
    }

    pub fn ne_op(&self, rhs: &Value) -> Value {
        let eq = self.eq_op(rhs);
        Value::number(
            Number::from_bool(!eq.is_truthy()),
            self.span.merge(&rhs.span),
            self.context,
        )
    }

    pub fn lt(&self, rhs: &Value) -> Value {
        self.compare_bool(rhs, |o| o == std::cmp::Ordering::Less)
    }
    pub fn lte(&self, rhs: &Value) -> Value {
        self.compare_bool(rhs, |o| o != std::cmp::Ordering::Greater)
    }
    pub fn gt(&self, rhs: &Value) -> Value {
        self.compare_bool(rhs, |o| o == std::cmp::Ordering::Greater)
    }
    pub fn gte(&self, rhs: &Value) -> Value {
        self.compare_bool(rhs, |o| o != std::cmp::Ordering::Less)
    }

    pub fn and(&self, rhs: &Value) -> Value {
        Value::number(
            Number::from_bool(self.is_truthy() && rhs.is_truthy()),
            self.span.merge(&rhs.span),
            self.context,
        )
    }

    pub fn or(&self, rhs: &Value) -> Value {
        Value::number(
            Number::from_bool(self.is_truthy() || rhs.is_truthy()),
            self.span.merge(&rhs.span),
            self.context,
        )
    }

    pub fn not(&self) -> Value {
        Value::number(Number::from_bool(!self.is_truthy()), self.span.clone(), self.context)
    }

    pub fn negate(&self) -> Result<Value, ThistleError> {
        match &self.payload {
            Payload::Number(Number::Int(i)) => Ok(Value::int(-i, self.span.clone(), self.context)),
            Payload::Number(Number::Float(f)) => Ok(Value::number(
                Number::Float(-f),
                self.span.clone(),
                self.context,
            )),
            _ => Err(ThistleError::runtime_plain(
                format!("Illegal Operation: -{}", self.type_name()),
                self.span.clone(),
            )),
        }
    }

    /// `?` indexing: 1-based with a zero-forbidden convention on both
    /// String and List; negative indices count from the end unadjusted.
    pub fn index(&self, rhs: &Value) -> Result<Value, ThistleError> {
        let span = self.span.merge(&rhs.span);
        match (&self.payload, &rhs.payload) {
            (Payload::String(s), Payload::Number(n)) => {
                let chars: Vec<char> = s.borrow().chars().collect();
                let i = resolve_index(to_int(*n), chars.len(), "String", &span)?;
                Ok(Value::string(chars[i].to_string(), span, self.context))
            }
            (Payload::String(s), Payload::List(idxs)) => {
                let chars: Vec<char> = s.borrow().chars().collect();
                let mut out = String::new();
                for idx_val in idxs.borrow().iter() {
                    let n = idx_val
                        .as_number()
                        .ok_or_else(|| self.illegal_op("?", rhs))?;
                    let i = resolve_index(to_int(n), chars.len(), "String", &span)?;
                    out.push(chars[i]);
                }
                Ok(Value::string(out, span, self.context))
            }
            (Payload::List(l), Payload::Number(n)) => {
                let items = l.borrow();
                let i = resolve_index(to_int(*n), items.len(), "List", &span)?;
                // `List ? Number` always produces a freshly allocated value for
                // numeric elements rather than aliasing the element in place.
                let elem = match items[i].as_number() {
                    Some(n) => Value::number(n, span, self.context),
                    None => items[i].clone(),
                };
                Ok(elem)
            }
            (Payload::List(l), Payload::List(idxs)) => {
                let items = l.borrow();
                let mut out = Vec::with_capacity(idxs.borrow().len());
                for idx_val in idxs.borrow().iter() {
                    let n = idx_val
                        .as_number()
                        .ok_or_else(|| self.illegal_op("?", rhs))?;
                    let i = resolve_index(to_int(n), items.len(), "List", &span)?;
                    out.push(match items[i].as_number() {
                        Some(n) => Value::number(n, span.clone(), self.context),
                        None => items[i].clone(),
                    });
                }
                Ok(Value::list(out, span, self.context))
            }
            _ => Err(self.illegal_op("?", rhs)),
        }
    }

    /// The string form used by `Print` and dictionary rendering.
    pub fn render(&self) -> String {
        match &self.payload {
            Payload::Number(n) => n.to_string(),
            Payload::String(s) => s.borrow().clone(),
            Payload::List(l) => {
                let items: Vec<String> = l.borrow().iter().map(Value::render).collect();
                format!("[{}]", items.join(", "))
            }
            Payload::Dictionary(d) => {
                let d = d.borrow();
                let items: Vec<String> = d
                    .keys
                    .iter()
                    .zip(d.values.iter())
                    .map(|(k, v)| format!("{}:{}", k.render_key(), v.render()))
                    .collect();
                items.join(",")
            }
            Payload::Function(f) => match &f.name {
                Some(name) => format!("<function {}>", name),
                None => "<function>".to_string(),
            },
            Payload::BuiltIn(b) => format!("<built-in function {}>", b.name),
        }
    }

    fn render_key(&self) -> String {
        match &self.payload {
            Payload::String(s) => format!("\"{}\"", s.borrow()),
            _ => self.render(),
        }
    }
}

fn to_int(n: Number) -> Int {
    match n {
        Number::Int(i) => i,
        Number::Float(f) => f as Int,
    }
}

fn repeat_count(n: Number) -> usize {
    match n {
        Number::Int(i) if i > 0 => i as usize,
        Number::Float(f) if f > 0.0 => f as usize,
        _ => 0,
    }
}

fn resolve_index(n: Int, len: usize, kind: &str, span: &Span) -> Result<usize, ThistleError> {
    if n == 0 {
        return Err(ThistleError::runtime_plain(
            format!("{} index out of range", kind),
            span.clone(),
        ));
    }
    let idx: i64 = if n > 0 { n - 1 } else { len as i64 + n };
    if idx < 0 || idx as usize >= len {
        return Err(ThistleError::runtime_plain(
            format!("{} index out of range", kind),
            span.clone(),
        ));
    }
    Ok(idx as usize)
}

/// Python-style list indexing: 0-based, with a negative index counting
/// from the end (`-1` is the last element). Used by `list - number`,
/// which unlike `?` indexing is never run through [`resolve_index`]'s
/// 1-based zero-forbidden convention.
pub(crate) fn raw_list_index(n: Int, len: usize) -> Option<usize> {
    let resolved = if n < 0 { n + len as i64 } else { n };
    if resolved < 0 || resolved as usize >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

fn widen_add(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x.wrapping_add(y)),
        _ => Number::Float(a.as_float() + b.as_float()),
    }
}

fn widen_sub(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x.wrapping_sub(y)),
        _ => Number::Float(a.as_float() - b.as_float()),
    }
}

fn widen_mul(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x.wrapping_mul(y)),
        _ => Number::Float(a.as_float() * b.as_float()),
    }
}

fn numeric_result(n: Number, span: Span, context: ContextId) -> Value {
    Value::number(n, span, context)
}
