use rubble::{
    environment::{Discipline, Frame},
    string::IdentName,
    value::Value,
};

fn read(frame: &Frame, name: &str) -> Option<i64> {
    match frame.lookup(name) {
        Some(Value::Integer(v)) => Some(v),
        _ => None,
    }
}

#[test]
fn root_frame_shadows() {
    let root = Frame::root();
    assert_eq!(root.discipline(), Discipline::Shadowing);
    assert!(root.parent().is_none());

    root.assign("a".into(), Value::Integer(1));
    assert_eq!(read(&root, "a"), Some(1));
    assert!(root.lookup("b").is_none());
}

#[test]
fn shadowing_write_never_touches_parent() {
    let root = Frame::root();
    root.define("a".into(), Value::Integer(1));

    let method = root.new_scope(Discipline::Shadowing);
    assert_eq!(read(&method, "a"), Some(1));
    method.assign("a".into(), Value::Integer(2));

    assert_eq!(read(&method, "a"), Some(2));
    assert_eq!(read(&root, "a"), Some(1));
    assert!(method.binds("a"));
}

#[test]
fn through_write_updates_nearest_binding() {
    let root = Frame::root();
    root.define("a".into(), Value::Integer(0));

    let block = root.new_scope(Discipline::Through);
    block.assign("a".into(), Value::Integer(5));

    assert_eq!(read(&root, "a"), Some(5));
    assert!(!block.binds("a"));
}

#[test]
fn through_write_creates_local_when_unbound() {
    let root = Frame::root();
    let block = root.new_scope(Discipline::Through);
    block.assign("fresh".into(), Value::Integer(1));

    assert!(block.binds("fresh"));
    assert!(root.lookup("fresh").is_none());
}

#[test]
fn nested_blocks_write_through_each_other() {
    let root = Frame::root();
    root.define("total".into(), Value::Integer(0));
    let outer = root.new_scope(Discipline::Through);
    outer.define("step".into(), Value::Integer(1));
    let inner = outer.new_scope(Discipline::Through);

    inner.assign("total".into(), Value::Integer(10));
    inner.assign("step".into(), Value::Integer(2));

    assert_eq!(read(&root, "total"), Some(10));
    assert_eq!(read(&outer, "step"), Some(2));
    assert!(inner.local_names().is_empty());
}

#[test]
fn through_write_stops_at_enclosing_shadowing_frame() {
    let root = Frame::root();
    root.define("a".into(), Value::Integer(1));
    let method = root.new_scope(Discipline::Shadowing);
    let block = method.new_scope(Discipline::Through);

    block.assign("a".into(), Value::Integer(99));

    assert_eq!(read(&root, "a"), Some(1));
    assert!(block.binds("a"));
    assert!(!method.binds("a"));
}

#[test]
fn define_ignores_discipline() {
    let root = Frame::root();
    root.define("n".into(), Value::Integer(100));
    let block = root.new_scope(Discipline::Through);
    block.define("n".into(), Value::Integer(0));

    assert_eq!(read(&block, "n"), Some(0));
    assert_eq!(read(&root, "n"), Some(100));
}

#[test]
fn sibling_invocations_do_not_share_parameters() {
    let captured = Frame::root();
    let first = captured.new_scope(Discipline::Through);
    first.define("i".into(), Value::Integer(0));
    let second = captured.new_scope(Discipline::Through);

    assert!(second.lookup("i").is_none());
    assert!(first.parent().is_some_and(|p| p.ptr_eq(&captured)));
    assert_eq!(first.local_names(), vec![IdentName::from("i")]);
}
