//! Integration tests for symbol interning

use std::collections::HashSet;

use lusp_foundation::Interner;

#[test]
fn interning_is_idempotent() {
    let mut interner = Interner::new();
    let a = interner.intern("counter");
    let b = interner.intern("counter");
    assert_eq!(a, b);
    assert_eq!(a.id(), b.id());
    assert_eq!(interner.len(), 1);
}

#[test]
fn distinct_names_get_distinct_ids() {
    let mut interner = Interner::new();
    let names = ["x", "y", "null?", "make_counter"];
    let ids: HashSet<_> = names.iter().map(|n| interner.intern(n).id()).collect();
    assert_eq!(ids.len(), names.len());
}

#[test]
fn lookup_and_resolve() {
    let mut interner = Interner::new();
    assert!(interner.lookup("x").is_none());
    let x = interner.intern("x");
    assert_eq!(interner.lookup("x"), Some(x.clone()));
    assert_eq!(interner.resolve(x.id()).map(|s| s.name()), Some("x"));
    assert_eq!(x.to_string(), "x");
}

#[test]
fn symbols_hash_by_identity() {
    let mut interner = Interner::new();
    let mut set = HashSet::new();
    set.insert(interner.intern("a"));
    set.insert(interner.intern("a"));
    set.insert(interner.intern("b"));
    assert_eq!(set.len(), 2);
}

#[test]
fn separate_interners_are_independent() {
    let mut first = Interner::new();
    let mut second = Interner::new();
    first.intern("only_here");
    assert!(second.lookup("only_here").is_none());
    second.intern("other");
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}
