//! Symbol tables for the code generator.
//!
//! Two table instances exist per compiled subroutine: the class-level table
//! (`static`/`field`) built once per unit, and the subroutine-local table
//! (`argument`/`var`) rebuilt for each subroutine. Indices are dense
//! per-kind counters in declaration order. A cross-unit [`GlobalIndex`]
//! carries subroutine signatures so calls resolve without declarations.

use std::collections::HashMap;

use crate::ast::{Class, Param, ReturnType, SubroutineKind};
use crate::diagnostic::Diagnostic;
use crate::ir::Segment;
use crate::span::Span;

/// The four storage kinds a name can resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Static,
    Field,
    Argument,
    Var,
}

impl VarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarKind::Static => "static",
            VarKind::Field => "field",
            VarKind::Argument => "argument",
            VarKind::Var => "var",
        }
    }

    /// The IR segment this kind addresses.
    pub fn segment(&self) -> Segment {
        match self {
            VarKind::Static => Segment::Static,
            VarKind::Field => Segment::This,
            VarKind::Argument => Segment::Argument,
            VarKind::Var => Segment::Local,
        }
    }

    fn slot(&self) -> usize {
        match self {
            VarKind::Static => 0,
            VarKind::Field => 1,
            VarKind::Argument => 2,
            VarKind::Var => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VarInfo {
    /// Type name as written in source ('int', 'boolean', a class name, ...).
    pub ty: String,
    pub kind: VarKind,
    pub index: u16,
}

/// One scope's name table. Per-kind indices start at 0 and grow densely.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    vars: HashMap<String, VarInfo>,
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(
        &mut self,
        name: &str,
        ty: &str,
        kind: VarKind,
        span: Span,
    ) -> Result<(), Diagnostic> {
        if self.vars.contains_key(name) {
            return Err(Diagnostic::error(
                format!("duplicate declaration of '{}'", name),
                span,
            )
            .with_help("a name may be declared only once per scope".to_string()));
        }
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;
        self.vars.insert(
            name.to_string(),
            VarInfo {
                ty: ty.to_string(),
                kind,
                index,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&VarInfo> {
        self.vars.get(name)
    }

    pub fn count(&self, kind: VarKind) -> u16 {
        self.counts[kind.slot()]
    }
}

/// A subroutine's declared shape, as scraped from its parse tree.
#[derive(Clone, Debug)]
pub struct Signature {
    pub kind: SubroutineKind,
    pub return_type: ReturnType,
    pub params: Vec<Param>,
}

/// Cross-unit subroutine signatures: class name → subroutine name →
/// signature. Populated for every unit before any code generation begins,
/// which is what makes forward and cross-file references legal.
#[derive(Clone, Debug, Default)]
pub struct GlobalIndex {
    classes: HashMap<String, HashMap<String, Signature>>,
}

impl GlobalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scrape one parsed class into the index.
    pub fn add_class(&mut self, class: &Class) {
        let subs = self.classes.entry(class.name.node.clone()).or_default();
        for sub in &class.subroutines {
            subs.insert(
                sub.name.node.clone(),
                Signature {
                    kind: sub.kind,
                    return_type: sub.return_type.clone(),
                    params: sub.params.clone(),
                },
            );
        }
    }

    /// Merge another index into this one (the phase-1 barrier join).
    pub fn merge(&mut self, other: GlobalIndex) {
        for (class, subs) in other.classes {
            self.classes.entry(class).or_default().extend(subs);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn lookup(&self, class: &str, subroutine: &str) -> Option<&Signature> {
        self.classes.get(class)?.get(subroutine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Type;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn table_with(entries: &[(&str, &str, VarKind)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, ty, kind) in entries {
            table.define(name, ty, *kind, Span::dummy()).expect(name);
        }
        table
    }

    #[test]
    fn test_indices_are_dense_per_kind() {
        let table = table_with(&[
            ("a", "int", VarKind::Static),
            ("b", "int", VarKind::Field),
            ("c", "int", VarKind::Static),
            ("d", "boolean", VarKind::Field),
            ("e", "int", VarKind::Field),
        ]);
        assert_eq!(table.get("a").unwrap().index, 0);
        assert_eq!(table.get("c").unwrap().index, 1);
        assert_eq!(table.get("b").unwrap().index, 0);
        assert_eq!(table.get("d").unwrap().index, 1);
        assert_eq!(table.get("e").unwrap().index, 2);
        assert_eq!(table.count(VarKind::Static), 2);
        assert_eq!(table.count(VarKind::Field), 3);
    }

    #[test]
    fn test_duplicate_name_is_error() {
        let mut table = SymbolTable::new();
        table.define("x", "int", VarKind::Var, Span::dummy()).unwrap();
        let err = table
            .define("x", "char", VarKind::Argument, Span::dummy())
            .unwrap_err();
        assert!(err.message.contains("duplicate declaration of 'x'"));
    }

    #[test]
    fn test_kind_segment_mapping() {
        assert_eq!(VarKind::Var.segment(), Segment::Local);
        assert_eq!(VarKind::Argument.segment(), Segment::Argument);
        assert_eq!(VarKind::Field.segment(), Segment::This);
        assert_eq!(VarKind::Static.segment(), Segment::Static);
    }

    fn parse(source: &str) -> Class {
        let (tokens, diags) = Lexer::new(source, 0).tokenize();
        assert!(diags.is_empty());
        Parser::new(tokens).parse_class().expect("parse").0
    }

    #[test]
    fn test_global_index_scrape_and_lookup() {
        let class = parse(
            "class Point { \
               constructor Point new(int x, int y) { return this; } \
               method int getX() { return 1; } \
               function void origin() { return; } \
             }",
        );
        let mut index = GlobalIndex::new();
        index.add_class(&class);

        assert!(index.has_class("Point"));
        let new_sig = index.lookup("Point", "new").expect("new");
        assert_eq!(new_sig.kind, SubroutineKind::Constructor);
        assert_eq!(new_sig.params.len(), 2);
        assert_eq!(new_sig.return_type, ReturnType::Of(Type::ClassName("Point".into())));

        let get_x = index.lookup("Point", "getX").expect("getX");
        assert_eq!(get_x.kind, SubroutineKind::Method);

        assert!(index.lookup("Point", "missing").is_none());
        assert!(index.lookup("Missing", "new").is_none());
    }

    #[test]
    fn test_global_index_merge() {
        let a = parse("class A { function void f() { return; } }");
        let b = parse("class B { function int g() { return 1; } }");

        let mut left = GlobalIndex::new();
        left.add_class(&a);
        let mut right = GlobalIndex::new();
        right.add_class(&b);

        left.merge(right);
        assert!(left.lookup("A", "f").is_some());
        assert!(left.lookup("B", "g").is_some());
    }
}
