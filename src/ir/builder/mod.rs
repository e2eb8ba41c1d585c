//! Code generator: walks a parsed class and emits stack IR.
//!
//! Runs in two phases per unit. Phase one builds the class symbol table and
//! a per-subroutine local table; phase two walks statement bodies and emits
//! `Vec<Instr>`. Identifier resolution checks the local table first, then
//! the class table. Calls resolve their return type against the current
//! class, then the cross-unit [`GlobalIndex`], then the standard library.

mod expr;
mod stmt;
#[cfg(test)]
mod tests;

use crate::ast::{Class, ClassVarKind, ReturnType, SubroutineDec, SubroutineKind};
use crate::diagnostic::Diagnostic;
use crate::ir::{Instr, Segment};
use crate::span::Spanned;
use crate::stdlib::Stdlib;
use crate::sym::{GlobalIndex, SymbolTable, VarInfo, VarKind};

pub struct Generator<'a> {
    class_name: String,
    class_table: SymbolTable,
    globals: &'a GlobalIndex,
    stdlib: &'a Stdlib,
    ops: Vec<Instr>,

    // Per-subroutine state, reset by emit_subroutine.
    pub(crate) locals: SymbolTable,
    pub(crate) sub_name: String,
    pub(crate) sub_return: ReturnType,
    label_id: u32,
}

impl<'a> Generator<'a> {
    /// Generate the IR for one compilation unit.
    pub fn generate(
        class: &Class,
        globals: &'a GlobalIndex,
        stdlib: &'a Stdlib,
    ) -> Result<Vec<Instr>, Vec<Diagnostic>> {
        let class_table = build_class_table(class).map_err(|d| vec![d])?;
        let mut generator = Generator {
            class_name: class.name.node.clone(),
            class_table,
            globals,
            stdlib,
            ops: Vec::new(),
            locals: SymbolTable::new(),
            sub_name: String::new(),
            sub_return: ReturnType::Void,
            label_id: 0,
        };

        for sub in &class.subroutines {
            generator.emit_subroutine(sub).map_err(|d| vec![d])?;
        }
        Ok(generator.ops)
    }

    fn emit_subroutine(&mut self, sub: &SubroutineDec) -> Result<(), Diagnostic> {
        self.locals = build_local_table(&self.class_name, sub)?;
        self.sub_name = sub.name.node.clone();
        self.sub_return = sub.return_type.clone();
        self.label_id = 0;

        let locals_count = self.locals.count(VarKind::Var);
        self.emit(Instr::Function(
            format!("{}.{}", self.class_name, sub.name.node),
            locals_count,
        ));

        match sub.kind {
            // Bind `this` from the hidden first argument.
            SubroutineKind::Method => {
                self.emit(Instr::Push(Segment::Argument, 0));
                self.emit(Instr::Pop(Segment::Pointer, 0));
            }
            // Allocate one slot per field and bind `this` to the new block.
            SubroutineKind::Constructor => {
                let fields = self.class_table.count(VarKind::Field);
                self.emit(Instr::Push(Segment::Constant, fields));
                self.emit(Instr::Call("Memory.alloc".to_string(), 1));
                self.emit(Instr::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Function => {}
        }

        self.emit_statements(&sub.body.statements)
    }

    // ── Shared helpers ────────────────────────────────────────────

    pub(crate) fn emit(&mut self, instr: Instr) {
        self.ops.push(instr);
    }

    pub(crate) fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Reserve a fresh label ID. IDs are monotonic within a subroutine, so
    /// every labelled statement gets a distinct set of labels regardless of
    /// nesting.
    pub(crate) fn next_label_id(&mut self) -> u32 {
        let id = self.label_id;
        self.label_id += 1;
        id
    }

    pub(crate) fn make_label(&self, kind: &str, id: u32, suffix: &str) -> String {
        format!("{}:{}:{}:{}", self.sub_name, kind, id, suffix)
    }

    /// Resolve a name against the local table, then the class table.
    pub(crate) fn resolve(&self, name: &Spanned<String>) -> Result<&VarInfo, Diagnostic> {
        self.locals
            .get(&name.node)
            .or_else(|| self.class_table.get(&name.node))
            .ok_or_else(|| {
                Diagnostic::error(format!("unknown identifier '{}'", name.node), name.span)
                    .with_help("declare it as a var, argument, field, or static".to_string())
            })
    }

    /// Resolve a name if it names a variable in scope; `None` means the
    /// name can only be a class.
    pub(crate) fn resolve_var(&self, name: &str) -> Option<&VarInfo> {
        self.locals.get(name).or_else(|| self.class_table.get(name))
    }

    /// Return type of `class.subroutine`: current class first, then the
    /// global index, then the standard library.
    pub(crate) fn lookup_return_type(
        &self,
        class: &str,
        subroutine: &Spanned<String>,
    ) -> Result<ReturnType, Diagnostic> {
        if let Some(sig) = self.globals.lookup(class, &subroutine.node) {
            return Ok(sig.return_type.clone());
        }
        if let Some(sub) = self.stdlib.lookup(class, &subroutine.node) {
            return Ok(sub.return_type.clone());
        }

        if self.globals.has_class(class) || self.stdlib.has_class(class) {
            Err(Diagnostic::error(
                format!("class '{}' has no subroutine '{}'", class, subroutine.node),
                subroutine.span,
            ))
        } else {
            Err(Diagnostic::error(
                format!("unknown class '{}'", class),
                subroutine.span,
            )
            .with_help(
                "callable classes are those in the compilation set or the standard library"
                    .to_string(),
            ))
        }
    }
}

/// Build the `static`/`field` table for a class.
pub fn build_class_table(class: &Class) -> Result<SymbolTable, Diagnostic> {
    let mut table = SymbolTable::new();
    for dec in &class.var_decs {
        let kind = match dec.kind {
            ClassVarKind::Static => VarKind::Static,
            ClassVarKind::Field => VarKind::Field,
        };
        for name in &dec.names {
            table.define(&name.node, dec.ty.name(), kind, name.span)?;
        }
    }
    Ok(table)
}

/// Build the `argument`/`var` table for one subroutine. For a method,
/// argument 0 is the implicit `this` of the enclosing class.
pub fn build_local_table(
    class_name: &str,
    sub: &SubroutineDec,
) -> Result<SymbolTable, Diagnostic> {
    let mut table = SymbolTable::new();

    if sub.kind == SubroutineKind::Method {
        table.define("this", class_name, VarKind::Argument, sub.name.span)?;
    }
    for param in &sub.params {
        table.define(
            &param.name.node,
            param.ty.name(),
            VarKind::Argument,
            param.name.span,
        )?;
    }
    for dec in &sub.body.var_decs {
        for name in &dec.names {
            table.define(&name.node, dec.ty.name(), VarKind::Var, name.span)?;
        }
    }
    Ok(table)
}
