use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_undeclared_operator_uses_default() {
    let table = OpTable::new();
    let props = table.find(Id::from_raw(42));
    assert_eq!(props.precedence, 9);
    assert_eq!(props.assoc, Assoc::Left);
    assert!(!table.is_declared(Id::from_raw(42)));
}

#[test]
fn test_declared_operator() {
    let mut table = OpTable::new();
    let pow = Id::from_raw(7);
    table.add(pow, 12, Assoc::Right);

    assert_eq!(table.find(pow), OpProperties::new(12, Assoc::Right));
    assert!(table.is_declared(pow));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_redeclaration_overwrites() {
    let mut table = OpTable::new();
    let op = Id::from_raw(3);
    table.add(op, 4, Assoc::Left);
    table.add(op, 6, Assoc::Right);

    assert_eq!(table.find(op), OpProperties::new(6, Assoc::Right));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_default_trait_matches_constant() {
    assert_eq!(OpProperties::default(), OpProperties::DEFAULT);
}

#[test]
fn test_binds_tighter() {
    let mul = OpProperties::new(7, Assoc::Left);
    let add = OpProperties::new(6, Assoc::Left);
    let pow = OpProperties::new(8, Assoc::Right);

    assert!(mul.binds_tighter(add));
    assert!(!add.binds_tighter(mul));
    assert!(!add.binds_tighter(add));
    assert!(pow.binds_tighter(pow));
}
