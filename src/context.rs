//! Call-context and symbol-table bookkeeping.
//!
//! A [`Context`] is a call-frame descriptor: a display name, a call-site
//! position, and a link to the calling context (used only to render
//! tracebacks). A [`SymbolTable`] is the lexical scope chain a context
//! evaluates names against - its parent link is the function's *captured*
//! scope, not the caller's, which is what gives the language closures.
//!
//! Functions capture their defining context so closures can read outer
//! bindings, and a symbol table can store a function that in turn captures
//! that very context - a cycle the guest language has no way to break
//! itself. Rather than model contexts and tables as `Rc`-linked graphs (and
//! have to reach for a weak back-link to avoid leaking that cycle), both are
//! held in arenas owned by the [`Engine`][crate::Engine] and referenced by
//! plain integer handles; the arenas themselves are simply dropped in bulk
//! at the end of a `run()`.

use crate::error::TraceFrame;
use crate::token::Position;
use crate::{Identifier, Value};
use std::cell::RefCell;
use std::collections::HashMap;

/// Handle into the [`Engine`][crate::Engine]'s context arena.
pub type ContextId = usize;
/// Handle into the [`Engine`][crate::Engine]'s symbol-table arena.
pub type TableId = usize;

/// A string-keyed mapping with an optional parent pointer, forming a
/// lexical scope chain. Lookup walks the parent chain; assignment always
/// writes to the current scope.
#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<Identifier, Value>,
    parent: Option<TableId>,
}

/// A call-frame descriptor.
pub struct Context {
    pub display_name: String,
    pub parent: Option<ContextId>,
    pub call_site: Position,
    pub table: TableId,
}

/// Owns every [`Context`] and [`SymbolTable`] created during a single
/// `run()`.
pub struct Contexts {
    contexts: Vec<Context>,
    tables: Vec<RefCell<SymbolTable>>,
}

impl Contexts {
    pub fn new() -> Self {
        Self {
            contexts: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn new_table(&mut self, parent: Option<TableId>) -> TableId {
        self.tables.push(RefCell::new(SymbolTable {
            symbols: HashMap::new(),
            parent,
        }));
        self.tables.len() - 1
    }

    pub fn new_context(
        &mut self,
        display_name: impl Into<String>,
        parent: Option<ContextId>,
        call_site: Position,
        table: TableId,
    ) -> ContextId {
        self.contexts.push(Context {
            display_name: display_name.into(),
            parent,
            call_site,
            table,
        });
        self.contexts.len() - 1
    }

    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id]
    }

    pub fn table_of(&self, id: ContextId) -> TableId {
        self.contexts[id].table
    }

    /// Look a name up through the scope chain starting at `table`.
    pub fn get(&self, table: TableId, name: &str) -> Option<Value> {
        let mut current = Some(table);
        while let Some(id) = current {
            let t = self.tables[id].borrow();
            if let Some(v) = t.symbols.get(name) {
                return Some(v.clone());
            }
            current = t.parent;
        }
        None
    }

    /// Bind `name` in `table` directly - never an ancestor.
    pub fn set(&self, table: TableId, name: impl Into<Identifier>, value: Value) {
        self.tables[table].borrow_mut().symbols.insert(name.into(), value);
    }

    /// Remove `name` from `table` directly. Present for completeness; the
    /// language offers no surface syntax that exercises it.
    #[allow(dead_code)]
    pub fn remove(&self, table: TableId, name: &str) -> Option<Value> {
        self.tables[table].borrow_mut().symbols.remove(name)
    }

    /// Walk `id`'s parent chain, producing traceback frames in
    /// source-call order (oldest first), as
    /// `Traceback (most recent call last):` expects.
    pub fn traceback(&self, id: ContextId) -> Vec<TraceFrame> {
        let mut frames = Vec::new();
        let mut current = Some(id);
        while let Some(cid) = current {
            let ctx = &self.contexts[cid];
            frames.push(TraceFrame {
                filename: ctx.call_site.filename.clone(),
                line: ctx.call_site.line + 1,
                display_name: ctx.display_name.clone(),
            });
            current = ctx.parent;
        }
        frames.reverse();
        frames
    }
}
