//! Scripted front-end shared by the integration tests

#![allow(dead_code)]

use cxindex::{
    ClangSymbolKind, Declaration, FrontEnd, IndexEvent, ParseRequest, Range, Reference, Result,
    SymbolKind, Usr,
};

/// Replays a fixed event list for every parse.
pub struct ScriptedFrontEnd {
    events: Vec<IndexEvent>,
}

impl ScriptedFrontEnd {
    pub fn new(events: Vec<IndexEvent>) -> Self {
        Self { events }
    }
}

impl FrontEnd for ScriptedFrontEnd {
    fn parse(&self, _request: &ParseRequest, sink: &mut dyn FnMut(IndexEvent)) -> Result<()> {
        for event in &self.events {
            sink(event.clone());
        }
        Ok(())
    }
}

pub fn range(line: u32, start: u32, end: u32) -> Range {
    Range::from_coords(line, start, line, end)
}

pub fn declaration(file: &str, kind: SymbolKind, usr: &str, name: &str, spelling: Range) -> Declaration {
    Declaration {
        file: file.to_string(),
        kind,
        usr: Usr::from(usr),
        name: name.to_string(),
        spelling,
        extent: spelling,
        ..Default::default()
    }
}

/// Events for:
///
/// ```text
/// 1: struct S { void f(); };
/// 2: void S::f() {}
/// 3: void g();
/// 4: int x = (g(), 0);
/// ```
pub fn struct_with_method(file: &str) -> Vec<IndexEvent> {
    let s = Usr::from("c:@S@S");
    let mut ty = declaration(file, SymbolKind::Type, "c:@S@S", "S", range(1, 8, 9));
    ty.extent = Range::from_coords(1, 1, 1, 24);
    ty.is_definition = true;
    ty.detail = ClangSymbolKind::Struct;

    let mut decl = declaration(file, SymbolKind::Func, "c:@S@S@F@f#", "f", range(1, 17, 18));
    decl.container = Some(s.clone());
    decl.semantic_parent = Some((SymbolKind::Type, s.clone()));
    decl.detail = ClangSymbolKind::InstanceMethod;
    decl.content = "void f();".to_string();

    let mut def = declaration(file, SymbolKind::Func, "c:@S@S@F@f#", "f", range(2, 9, 10));
    def.extent = Range::from_coords(2, 1, 2, 15);
    def.container = Some(s.clone());
    def.semantic_parent = Some((SymbolKind::Type, s));
    def.detail = ClangSymbolKind::InstanceMethod;
    def.is_definition = true;

    let mut g = declaration(file, SymbolKind::Func, "c:@F@g#", "g", range(3, 6, 7));
    g.detail = ClangSymbolKind::Function;

    let mut x = declaration(file, SymbolKind::Var, "c:@x", "x", range(4, 5, 6));
    x.detail = ClangSymbolKind::Variable;
    x.is_definition = true;

    vec![
        IndexEvent::Declaration(ty),
        IndexEvent::Declaration(decl),
        IndexEvent::Declaration(def),
        IndexEvent::Declaration(g),
        IndexEvent::Declaration(x),
        IndexEvent::Reference(Reference {
            file: file.to_string(),
            kind: SymbolKind::Func,
            usr: Usr::from("c:@F@g#"),
            range: range(4, 10, 11),
            container_func: None,
            is_implicit: false,
        }),
    ]
}
