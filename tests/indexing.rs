mod common;

use common::{range, struct_with_method, ScriptedFrontEnd};
use cxindex::{
    index_translation_unit, FuncId, FuncRef, IndexDiff, LanguageId, ParseRequest, Reference,
    SymbolKind, Usr,
};

const FILE: &str = "/proj/s.cc";

fn index(events: Vec<cxindex::IndexEvent>) -> cxindex::IndexFile {
    let request = ParseRequest::new(FILE, vec!["-std=c++17".to_string()]);
    let mut files = index_translation_unit(&ScriptedFrontEnd::new(events), &request).into_files();
    assert_eq!(files.len(), 1);
    files.remove(0)
}

#[test]
fn method_defined_out_of_line() {
    let file = index(struct_with_method(FILE));
    assert_eq!(file.language(), LanguageId::Cpp);

    let s = file.find_type("c:@S@S").unwrap();
    assert_eq!(s.def.funcs.len(), 1);
    assert!(s.def.is_defined());

    let f = file.resolve_func(s.def.funcs[0]);
    assert_eq!(f.usr, Usr::from("c:@S@S@F@f#"));
    assert_eq!(f.def.declaring_type, Some(s.id));
    assert_eq!(f.def.name.as_str(), "S::f");
    assert_eq!(f.def.short_name(), "f");

    let spelling = f.def.definition_spelling.unwrap();
    assert!(!spelling.is_empty());
    assert_eq!(spelling, range(2, 9, 10));
    assert_eq!(f.declarations().len(), 1);
    assert_eq!(f.declarations()[0].content, "void f();");
}

#[test]
fn global_call_has_no_caller() {
    let file = index(struct_with_method(FILE));
    let g = file.find_func("c:@F@g#").unwrap();
    assert_eq!(g.callers().len(), 1);

    let call = g.callers()[0];
    assert!(!call.has_caller());
    assert_eq!(call.id, FuncId::INVALID);
    assert!(!call.is_implicit);
    assert_eq!(call.to_string(), "-1@4:10-4:11");
}

#[test]
fn call_inside_function_links_both_directions() {
    let mut events = struct_with_method(FILE);
    events.push(cxindex::IndexEvent::Reference(Reference {
        file: FILE.to_string(),
        kind: SymbolKind::Func,
        usr: Usr::from("c:@F@g#"),
        range: range(2, 13, 14),
        container_func: Some(Usr::from("c:@S@S@F@f#")),
        is_implicit: true,
    }));
    let file = index(events);

    let f = file.find_func("c:@S@S@F@f#").unwrap();
    let g = file.find_func("c:@F@g#").unwrap();
    assert_eq!(f.def.callees, vec![FuncRef::new(g.id, range(2, 13, 14), true)]);
    assert!(g.callers().contains(&FuncRef::new(f.id, range(2, 13, 14), true)));
}

#[test]
fn every_entity_sits_at_its_id() {
    let file = index(struct_with_method(FILE));
    for (i, t) in file.types().iter().enumerate() {
        assert_eq!(t.id.index(), Some(i));
        assert_eq!(file.id_cache().type_id(t.usr.as_str()), Some(t.id));
    }
    for (i, f) in file.funcs().iter().enumerate() {
        assert_eq!(f.id.index(), Some(i));
        assert_eq!(file.id_cache().func_usr(f.id), Some(&f.usr));
    }
    for (i, v) in file.vars().iter().enumerate() {
        assert_eq!(v.id.index(), Some(i));
    }
}

#[test]
fn reindexing_unchanged_file_has_empty_diff() {
    let first = index(struct_with_method(FILE));
    let second = index(struct_with_method(FILE));
    assert_eq!(first, second);
    assert!(IndexDiff::compute(&first, &second).is_empty());
}

#[test]
fn reindexing_after_edit_reports_the_change() {
    let first = index(struct_with_method(FILE));
    let mut events = struct_with_method(FILE);
    events.pop(); // drop the call to g
    let second = index(events);

    let diff = IndexDiff::compute(&first, &second);
    assert!(diff.funcs.added.is_empty());
    assert!(diff.funcs.changed.is_empty());
    assert_eq!(diff.funcs.references_changed, vec![Usr::from("c:@F@g#")]);
}
