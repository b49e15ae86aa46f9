#![allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Once;

use graft_value::{FieldDef, Heap, StructLayout, StructValue, Value};
use pretty_assertions::assert_eq;

use crate::{
    clone_value, copy_into, MethodDef, OverrideRegistry, ReturnShape, TypeMethods, CLONE_METHOD,
};

fn list_heap(v: &Value) -> &Heap<Vec<Value>> {
    match v {
        Value::List(h) => h,
        other => panic!("expected list, got {other:?}"),
    }
}

fn ref_heap(v: &Value) -> &Heap<Value> {
    match v {
        Value::Ref(h) => h,
        other => panic!("expected ref, got {other:?}"),
    }
}

fn flagged_layout() -> Heap<StructLayout> {
    Heap::new(StructLayout::new(
        "clone.tests.flagged",
        vec![
            FieldDef::exported("a", Value::Int(0)),
            FieldDef::private("cloned", Value::Bool(false)),
        ],
    ))
}

/// A type whose value-receiver clone method returns a pointer to a
/// copy with the internal `cloned` flag flipped.
fn register_flagged() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        OverrideRegistry::global().register(
            "clone.tests.flagged",
            TypeMethods::new().value_method(MethodDef::new(
                CLONE_METHOD,
                0,
                ReturnShape::SelfRef,
                |recv| {
                    let mut sv = recv.as_struct().unwrap().clone();
                    *sv.field_mut("cloned").unwrap() = Value::Bool(true);
                    Value::ptr(Value::Struct(sv))
                },
            )),
        );
    });
}

fn flagged(a: i64) -> StructValue {
    StructValue::new(flagged_layout(), vec![Value::int(a), Value::Bool(false)])
}

fn fixture_layout() -> Heap<StructLayout> {
    Heap::new(StructLayout::new(
        "clone.tests.fixture",
        vec![
            FieldDef::exported("y", Value::Null),
            FieldDef::exported("ptr", Value::Null),
            FieldDef::exported("ptr_ptr", Value::Null),
            FieldDef::exported("ptr_ptr_ptr", Value::Null),
            FieldDef::exported("nil_ptr", Value::Null),
            FieldDef::exported("s", Value::str("")),
            FieldDef::exported("x", Value::Null),
            FieldDef::exported("a", Value::array(vec![Value::Uint(0); 5])),
            FieldDef::private("secret", Value::Int(0)),
            FieldDef::exported("c", Value::Struct(StructValue::zeroed(flagged_layout()))),
            FieldDef::exported("c2", Value::Null),
        ],
    ))
}

/// The populated fixture from the original scenario: nested map with a
/// list payload, a three-deep pointer chain sharing its tail, a nil
/// pointer, an array of scalars, a private field, and an overriding
/// type both inline and behind a pointer.
fn fixture() -> Value {
    register_flagged();
    let n = Heap::new(Value::int(42));
    let p = Value::Ref(n);
    let pp = Value::ptr(p.clone());
    let ppp = Value::ptr(pp.clone());
    Value::Struct(StructValue::new(
        fixture_layout(),
        vec![
            Value::map([
                (Value::str("x"), Value::int(1)),
                (Value::str("y"), Value::float(2.2)),
                (
                    Value::str("z"),
                    Value::list(
                        [1, 2, 3, 6, 8, 9].iter().map(|&i| Value::int(i)).collect(),
                    ),
                ),
            ]),
            p,
            pp,
            ppp,
            Value::Null,
            Value::str("string"),
            Value::list(
                [1, 2, 3, 6, 8, 9].iter().map(|&i| Value::int(i)).collect(),
            ),
            Value::array(
                [4u64, 16, 64, 256, 1024]
                    .iter()
                    .map(|&u| Value::uint(u))
                    .collect(),
            ),
            Value::int(42),
            Value::Struct(flagged(420)),
            Value::ptr(Value::Struct(flagged(420))),
        ],
    ))
}

#[test]
fn keep_private_clone_is_deep_equal() {
    let src = fixture();
    let out = clone_value(&src, true);

    // Deep equality on every field, exported and private — except the
    // overriding type, whose own method flips its internal flag.
    let src_sv = src.as_struct().unwrap();
    let out_sv = out.as_struct().unwrap();
    for (def, (sf, of)) in src_sv
        .layout()
        .fields()
        .iter()
        .zip(src_sv.fields().iter().zip(out_sv.fields()))
    {
        if def.name.as_str() == "c" || def.name.as_str() == "c2" {
            continue;
        }
        assert_eq!(sf, of, "field {}", def.name);
    }
    assert_eq!(src_sv.field("secret"), out_sv.field("secret"));
}

#[test]
fn pointer_chains_are_reallocated_at_every_level() {
    let src = fixture();
    let out = clone_value(&src, true);
    let src_sv = src.as_struct().unwrap();
    let out_sv = out.as_struct().unwrap();

    // ptr
    let sp = ref_heap(src_sv.field("ptr").unwrap());
    let op = ref_heap(out_sv.field("ptr").unwrap());
    assert!(!Heap::ptr_eq(sp, op));
    assert_eq!(&**op, &Value::int(42));

    // ptr_ptr: outer and inner cells both fresh
    let spp = ref_heap(src_sv.field("ptr_ptr").unwrap());
    let opp = ref_heap(out_sv.field("ptr_ptr").unwrap());
    assert!(!Heap::ptr_eq(spp, opp));
    assert!(!Heap::ptr_eq(ref_heap(spp), ref_heap(opp)));

    // ptr_ptr_ptr: all three levels fresh
    let sppp = ref_heap(src_sv.field("ptr_ptr_ptr").unwrap());
    let oppp = ref_heap(out_sv.field("ptr_ptr_ptr").unwrap());
    assert!(!Heap::ptr_eq(sppp, oppp));
    assert!(!Heap::ptr_eq(ref_heap(sppp), ref_heap(oppp)));
    assert!(!Heap::ptr_eq(
        ref_heap(ref_heap(sppp)),
        ref_heap(ref_heap(oppp))
    ));
}

#[test]
fn nil_fields_stay_nil() {
    let layout = Heap::new(StructLayout::new(
        "clone.tests.nils",
        vec![
            FieldDef::exported("m", Value::Null),
            FieldDef::exported("xs", Value::Null),
            FieldDef::exported("p", Value::Null),
        ],
    ));
    let src = Value::Struct(StructValue::zeroed(layout));
    let out = clone_value(&src, true);
    let out_sv = out.as_struct().unwrap();
    // Absent stays absent: no empty allocations appear.
    assert_eq!(out_sv.field("m"), Some(&Value::Null));
    assert_eq!(out_sv.field("xs"), Some(&Value::Null));
    assert_eq!(out_sv.field("p"), Some(&Value::Null));
}

#[test]
fn mutating_the_clone_leaves_the_source_alone() {
    let src = fixture();
    let mut out = clone_value(&src, true);
    let out_sv = match &mut out {
        Value::Struct(sv) => sv,
        other => panic!("expected struct, got {other:?}"),
    };

    // clone.x[0] = 99
    match out_sv.field_mut("x").unwrap() {
        Value::List(h) => h.make_mut()[0] = Value::int(99),
        other => panic!("expected list, got {other:?}"),
    }
    // clone.y["z"][0] = 99
    match out_sv.field_mut("y").unwrap() {
        Value::Map(h) => match h.make_mut().get_mut(&Value::str("z")).unwrap() {
            Value::List(zs) => zs.make_mut()[0] = Value::int(99),
            other => panic!("expected list, got {other:?}"),
        },
        other => panic!("expected map, got {other:?}"),
    }

    let src_sv = src.as_struct().unwrap();
    assert_eq!(src_sv.field("x").unwrap().as_list().unwrap()[0], Value::int(1));
    let z = src_sv
        .field("y")
        .unwrap()
        .as_map()
        .unwrap()
        .get(&Value::str("z"))
        .unwrap();
    assert_eq!(z.as_list().unwrap()[0], Value::int(1));
}

#[test]
fn keep_private_false_resets_private_state() {
    let src = fixture();
    let out = clone_value(&src, false);
    let src_sv = src.as_struct().unwrap();
    let out_sv = out.as_struct().unwrap();

    assert_eq!(out_sv.field("secret"), Some(&Value::int(0)));
    assert_ne!(src_sv.field("secret"), out_sv.field("secret"));
    // Exported state is still deep-equal.
    assert_eq!(src_sv.field("s"), out_sv.field("s"));
    assert_eq!(src_sv.field("x"), out_sv.field("x"));
    assert_eq!(src_sv.field("y"), out_sv.field("y"));
}

#[test]
fn private_heap_fields_stay_shared_when_kept() {
    let layout = Heap::new(StructLayout::new(
        "clone.tests.private_share",
        vec![
            FieldDef::exported("shown", Value::Null),
            FieldDef::private("hidden", Value::Null),
        ],
    ));
    let shown = Value::list(vec![Value::int(1)]);
    let hidden = Value::list(vec![Value::int(2)]);
    let src = Value::Struct(StructValue::new(layout, vec![shown, hidden]));
    let out = clone_value(&src, true);
    let src_sv = src.as_struct().unwrap();
    let out_sv = out.as_struct().unwrap();

    // Exported composite state is never aliased...
    assert!(!Heap::ptr_eq(
        list_heap(src_sv.field("shown").unwrap()),
        list_heap(out_sv.field("shown").unwrap())
    ));
    // ...but private state preserved by bulk copy is shared, by design.
    assert!(Heap::ptr_eq(
        list_heap(src_sv.field("hidden").unwrap()),
        list_heap(out_sv.field("hidden").unwrap())
    ));
}

#[test]
fn value_receiver_override_flips_the_flag() {
    register_flagged();
    let src = Value::Struct(flagged(7));
    let out = clone_value(&src, true);

    let src_sv = src.as_struct().unwrap();
    let out_sv = out.as_struct().unwrap();
    assert_eq!(src_sv.field("cloned"), Some(&Value::Bool(false)));
    assert_eq!(out_sv.field("cloned"), Some(&Value::Bool(true)));
    assert_eq!(out_sv.field("a"), Some(&Value::int(7)));
}

#[test]
fn override_returning_a_pointer_is_dereferenced_for_value_slots() {
    register_flagged();
    // The override returns SelfRef; the inline struct field must come
    // back as a struct, the pointer field as a pointer.
    let src = fixture();
    let out = clone_value(&src, true);
    let out_sv = out.as_struct().unwrap();

    let c = out_sv.field("c").unwrap();
    assert!(matches!(c, Value::Struct(_)));
    assert_eq!(c.as_struct().unwrap().field("cloned"), Some(&Value::Bool(true)));

    let c2 = out_sv.field("c2").unwrap();
    let pointee = c2.pointee().unwrap();
    assert_eq!(
        pointee.as_struct().unwrap().field("cloned"),
        Some(&Value::Bool(true))
    );
}

#[test]
fn override_is_invoked_once_and_children_are_left_alone() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    OverrideRegistry::global().register(
        "clone.tests.shared_state",
        TypeMethods::new().value_method(MethodDef::new(
            CLONE_METHOD,
            0,
            ReturnShape::SelfValue,
            move |recv| {
                counted.fetch_add(1, Ordering::Relaxed);
                // Deliberately return shared state: a shallow copy.
                recv.clone()
            },
        )),
    );
    let layout = Heap::new(StructLayout::new(
        "clone.tests.shared_state",
        vec![FieldDef::exported("items", Value::Null)],
    ));
    let items = Value::list(vec![Value::int(1)]);
    let src = Value::Struct(StructValue::new(layout, vec![items]));

    let out = clone_value(&src, true);
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    // The engine must not second-guess the override: the shared list
    // stays shared, its children untraversed.
    assert!(Heap::ptr_eq(
        list_heap(src.as_struct().unwrap().field("items").unwrap()),
        list_heap(out.as_struct().unwrap().field("items").unwrap())
    ));
}

#[test]
fn ref_receiver_override_applies_behind_pointers() {
    OverrideRegistry::global().register(
        "clone.tests.ref_recv",
        TypeMethods::new().ref_method(MethodDef::new(
            CLONE_METHOD,
            0,
            ReturnShape::SelfValue,
            |recv| {
                // Receiver arrives as a pointer to an addressable copy.
                let mut sv = recv.pointee().unwrap().as_struct().unwrap().clone();
                *sv.field_mut("touched").unwrap() = Value::Bool(true);
                Value::Struct(sv)
            },
        )),
    );
    let layout = Heap::new(StructLayout::new(
        "clone.tests.ref_recv",
        vec![
            FieldDef::exported("n", Value::Int(0)),
            FieldDef::exported("touched", Value::Bool(false)),
        ],
    ));
    let src = Value::ptr(Value::Struct(StructValue::new(
        layout,
        vec![Value::int(5), Value::Bool(false)],
    )));

    let out = clone_value(&src, true);
    let out_sv = out.pointee().unwrap().as_struct().unwrap();
    assert_eq!(out_sv.field("n"), Some(&Value::int(5)));
    assert_eq!(out_sv.field("touched"), Some(&Value::Bool(true)));
    let src_sv = src.pointee().unwrap().as_struct().unwrap();
    assert_eq!(src_sv.field("touched"), Some(&Value::Bool(false)));
    assert!(!Heap::ptr_eq(ref_heap(&src), ref_heap(&out)));
}

#[test]
fn override_fires_even_for_a_zero_valued_source() {
    OverrideRegistry::global().register(
        "clone.tests.zero_flagged",
        TypeMethods::new().value_method(MethodDef::new(
            CLONE_METHOD,
            0,
            ReturnShape::SelfValue,
            |recv| {
                let mut sv = recv.as_struct().unwrap().clone();
                *sv.field_mut("cloned").unwrap() = Value::Bool(true);
                Value::Struct(sv)
            },
        )),
    );
    let layout = Heap::new(StructLayout::new(
        "clone.tests.zero_flagged",
        vec![FieldDef::private("cloned", Value::Bool(false))],
    ));
    // The source is its type's zero value; the override must still run,
    // at top level and behind a pointer alike.
    let src = Value::Struct(StructValue::zeroed(layout));
    let out = clone_value(&src, true);
    assert_eq!(
        out.as_struct().unwrap().field("cloned"),
        Some(&Value::Bool(true))
    );
    assert_eq!(src.as_struct().unwrap().field("cloned"), Some(&Value::Bool(false)));

    let behind_ptr = Value::ptr(src.clone());
    let out = clone_value(&behind_ptr, true);
    assert_eq!(
        out.pointee().unwrap().as_struct().unwrap().field("cloned"),
        Some(&Value::Bool(true))
    );
}

#[test]
fn override_returning_boxed_state_is_unboxed() {
    OverrideRegistry::global().register(
        "clone.tests.boxer",
        TypeMethods::new().value_method(MethodDef::new(
            CLONE_METHOD,
            0,
            ReturnShape::SelfValue,
            |recv| Value::boxed(recv.clone()),
        )),
    );
    let layout = Heap::new(StructLayout::new(
        "clone.tests.boxer",
        vec![FieldDef::exported("n", Value::Int(0))],
    ));
    let src = Value::Struct(StructValue::new(layout, vec![Value::int(3)]));
    let out = clone_value(&src, true);
    assert!(matches!(out, Value::Struct(_)));
    assert_eq!(out.as_struct().unwrap().field("n"), Some(&Value::int(3)));
}

#[test]
fn concurrent_clones_of_one_type_agree() {
    let src = fixture();
    let outs: Vec<Value> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let src = &src;
                s.spawn(move || clone_value(src, true))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for out in &outs {
        assert_eq!(
            out.as_struct().unwrap().field("s"),
            Some(&Value::str("string"))
        );
        assert_eq!(outs[0], *out);
    }
}

#[test]
fn copy_into_allocates_null_destination_slots() {
    let src = Value::list(vec![Value::int(1)]);
    let mut dst = Value::Null;
    copy_into(&mut dst, &src, true);
    assert_eq!(dst, src);
    assert!(!Heap::ptr_eq(list_heap(&src), list_heap(&dst)));
}
