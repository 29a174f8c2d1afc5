//! The evaluator listing: temporaries, guard placement and vivify branches.

use scope_expression::parse;

fn listing(text: &str) -> String {
    parse(text)
        .unwrap_or_else(|e| panic!("parse({:?}) failed: {}", text, e))
        .source()
        .to_string()
}

#[test]
fn test_identifier_and_unary() {
    assert_eq!(
        listing("-a"),
        "function(s, l) { var v0; ensureSafeMemberName('a'); \
         if(l && ('a' in l)){ v0 = (l).a; } \
         if(!(l && ('a' in l)) && s){ v0 = (s).a; } \
         v0 = ensureSafeObject(v0); \
         return -(ifDefined(v0, 0)); }"
    );
    assert!(listing("!+x").ends_with("return !(ifDefined(+(ifDefined(v0, 0)), 0)); }"));
}

#[test]
fn test_call_guards() {
    let source = listing("f(1)");
    assert!(source.starts_with("function(s, l) { var v0, v1; "), "{}", source);
    assert!(
        source.contains(
            "if(v0 != null){ ensureSafeFunction(v0); \
             v1 = ensureSafeObject(((l && ('f' in l) ? l : s)).f(ensureSafeObject(1))); }"
        ),
        "{}",
        source
    );
    assert!(source.ends_with("return v1; }"), "{}", source);

    let method = listing("o.m()");
    assert!(method.contains("if(v0){ v1 = ensureSafeObject((v0).m); }"), "{}", method);
    assert!(method.contains("v2 = ensureSafeObject((v0).m());"), "{}", method);
}

#[test]
fn test_assignment_vivifies_links() {
    let source = listing("a.b.c = 1");
    assert!(source.starts_with("function(s, l) { var v0, v1, v2; "), "{}", source);
    assert!(
        source.contains("if(v0 == null){ v0 = ((l && ('a' in l) ? l : s)).a = {}; }"),
        "{}",
        source
    );
    assert!(source.contains("if(v0 && (v0).b == null){ (v0).b = {}; }"), "{}", source);
    assert!(source.contains("ensureSafeMemberName('c');"), "{}", source);
    assert!(source.contains("v2 = ensureSafeObject(1); (v1).c = v2;"), "{}", source);
    assert!(source.ends_with("return v2; }"), "{}", source);

    // Plain reads carry no vivify branch.
    assert!(!listing("a.b.c").contains("= {}"));
}

#[test]
fn test_temporaries_in_allocation_order() {
    let source = listing("a[b](-c)");
    assert!(
        source.starts_with("function(s, l) { var v0, v1, v2, v3, v4, v5; "),
        "{}",
        source
    );
    assert!(source.contains("v2 = ensureSafeMemberName(v1);"), "{}", source);
    assert!(source.contains("if(v0){ v3 = ensureSafeObject((v0)[v2]); }"), "{}", source);
    assert!(source.contains("ensureSafeObject(-(ifDefined(v4, 0)))"), "{}", source);
    assert!(source.ends_with("return v5; }"), "{}", source);
}

#[test]
fn test_literal_keys_and_numbers() {
    let source = listing("a['x y'][1e21]");
    assert!(source.contains("ensureSafeMemberName('x y');"), "{}", source);
    assert!(source.contains("ensureSafeMemberName('1e\\u002b21');"), "{}", source);
    assert_eq!(listing("[1e-7, {k: 'v'}]"), "function(s, l) { return [1e-7,{ k:'v' }]; }");
}
