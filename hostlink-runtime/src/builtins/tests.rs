//! Tests for builtin methods and utility functions

use super::*;
use crate::variant::{self, RawVariant};
use core::ffi::c_void;

fn float(value: CallResult<Value>) -> f64 {
    match value {
        Ok(Value::Float(f)) => f,
        other => panic!("expected float, got {:?}", other),
    }
}

#[test]
fn test_max_keeps_kind_and_first_winner() {
    let r = utility::max(&[Value::Int(3), Value::Float(3.0), Value::Int(1)]).unwrap();
    assert!(r.equals(&Value::Int(3)));

    let r = utility::max(&[Value::Int(1), Value::Float(2.5)]).unwrap();
    assert!(r.equals(&Value::Float(2.5)));

    let r = utility::min(&[Value::Int(4), Value::Int(-2), Value::Float(0.5)]).unwrap();
    assert!(r.equals(&Value::Int(-2)));
}

#[test]
fn test_max_position_independent() {
    for pos in 0..5 {
        let mut args = vec![Value::Int(1); 5];
        args[pos] = Value::Int(9);
        assert!(utility::max(&args).unwrap().equals(&Value::Int(9)));
    }
}

#[test]
fn test_max_rejects_bad_arguments() {
    assert_eq!(utility::max(&[Value::Int(1)]).unwrap_err(), CallErrorRaw::too_few(2));
    assert_eq!(
        utility::max(&[Value::Int(1), Value::string("x")]).unwrap_err(),
        CallErrorRaw::invalid_argument(1, VariantType::Float)
    );
}

#[test]
fn test_str_and_typeof() {
    let r = utility::str(&[Value::string("a"), Value::Int(1), Value::Bool(true)]).unwrap();
    assert!(r.equals(&Value::string("a1true")));

    let r = utility::type_of(&[Value::Vector3([0.0; 3])]).unwrap();
    assert!(r.equals(&Value::Int(VariantType::Vector3 as i64)));
    assert!(utility::type_of(&[]).is_err());
}

#[test]
fn test_absf() {
    assert_eq!(float(utility::absf(&[Value::Float(-2.5)])), 2.5);
    assert_eq!(float(utility::absf(&[Value::Int(-3)])), 3.0);
    assert!(utility::absf(&[Value::Nil]).is_err());
}

#[test]
fn test_utility_abi_entry() {
    let f = utility::lookup("max").unwrap();
    let a = Value::Int(2).encode();
    let b = Value::Float(7.5).encode();
    let args = [&a as *const RawVariant, &b as *const RawVariant];
    let mut ret = Value::Nil.encode();
    unsafe { f(&mut ret, args.as_ptr(), 2) };
    assert!(unsafe { variant::read(&ret) }.equals(&Value::Float(7.5)));

    // Errors leave Nil behind
    unsafe { f(&mut ret, args.as_ptr(), 1) };
    assert!(unsafe { variant::read(&ret) }.equals(&Value::Nil));

    assert!(utility::lookup("no_such_function").is_none());
}

#[test]
fn test_vector3_math() {
    let a = [1.0, 2.0, 3.0];
    let b = [4.0, 5.0, 6.0];
    assert_eq!(vector3::dot(a, b), 32.0);
    assert_eq!(vector3::length([3.0, 4.0, 0.0]), 5.0);
    assert_eq!(vector3::lerp(a, b, 0.5), [2.5, 3.5, 4.5]);

    // Endpoints of the cubic are the segment ends
    assert_eq!(vector3::cubic_interpolate(a, b, [0.0; 3], [0.0; 3], 0.0), a);
    assert_eq!(vector3::cubic_interpolate(a, b, [0.0; 3], [0.0; 3], 1.0), b);
}

#[test]
fn test_vector3_ptr_entry() {
    let lerp = lookup_ptr(VariantType::Vector3, Name::intern("lerp")).unwrap();
    let mut base: [f32; 3] = [0.0, 0.0, 0.0];
    let to: [f32; 3] = [2.0, 4.0, 6.0];
    let weight: f64 = 0.5;
    let args = [&to as *const _ as *const c_void, &weight as *const f64 as *const c_void];
    let mut ret: [f32; 3] = [9.0; 3];
    unsafe {
        lerp(
            &mut base as *mut _ as *mut c_void,
            args.as_ptr(),
            &mut ret as *mut _ as *mut c_void,
            2,
        )
    };
    assert_eq!(ret, [1.0, 2.0, 3.0]);

    assert!(lookup_ptr(VariantType::Int, Name::intern("lerp")).is_none());
    assert!(lookup_ptr(VariantType::Vector3, Name::intern("normalized_typo")).is_none());
}

#[test]
fn test_call_on_value() {
    let v = Value::Vector3([3.0, 4.0, 0.0]);
    assert_eq!(float(call_on_value(&v, Name::intern("length"), &[])), 5.0);
    // Int argument widens to the declared float weight
    let r = call_on_value(&v, Name::intern("lerp"), &[Value::Vector3([0.0; 3]), Value::Int(1)]).unwrap();
    assert!(r.equals(&Value::Vector3([0.0; 3])));

    let s = Value::string("héllo");
    assert!(call_on_value(&s, Name::intern("length"), &[]).unwrap().equals(&Value::Int(5)));
    assert!(call_on_value(&s, Name::intern("begins_with"), &[Value::string("hé")])
        .unwrap()
        .equals(&Value::Bool(true)));

    assert_eq!(
        call_on_value(&Value::Nil, Name::intern("length"), &[]).unwrap_err(),
        CallErrorRaw::instance_is_null()
    );
    assert_eq!(
        call_on_value(&Value::Int(1), Name::intern("length"), &[]).unwrap_err(),
        CallErrorRaw::invalid_method()
    );
}
