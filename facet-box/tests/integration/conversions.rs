use facet_box::{Encoding, Erasable, Unboxed, Value};

use crate::{Jello, Pudding, inline, setup};

#[test]
fn nil_and_custom_bits() {
    setup();
    assert_eq!(Value::nil().to_i64(), 0);
    assert!(Value::nil().is_nil());
    assert!(!Value::nil().is_custom_bits());
    assert!(!Value::custom_bits(0).is_nil());
    assert_eq!(Value::custom_bits(0).to_i64(), 0);
    assert_eq!(Value::custom_bits(1).to_i64(), 1);
    assert_eq!(Value::custom_bits(1).to_u64(), 1);
    assert!(Value::custom_bits(1).to_bool());
    assert!(!Value::custom_bits(0).to_bool());
    assert_eq!(Value::custom_bits(99).to_string(), "99");
}

#[test]
fn scalar_matrix() {
    setup();
    assert_eq!(Value::bool(true).to_i64(), 1);
    assert_eq!(Value::bool(false).to_i64(), 0);
    assert!(!Value::i64(0).to_bool());
    assert!(Value::i64(1).to_bool());
    assert!(!Value::f64(f64::NAN).to_bool());
    assert_eq!(Value::f64(1.0).to_i64(), 1);
    assert_eq!(Value::f64(f64::NAN).to_i64(), 0);
    assert_eq!(Value::u64(99).to_i64(), 99);

    assert_eq!(Value::i64(99).to_f64(), 99.0);
    assert_eq!(Value::nil().to_f64(), 0.0);
    assert_eq!(Value::custom_bits(1).to_f64(), 1.0);
    assert_eq!(Value::bool(true).to_f64(), 1.0);
    assert_eq!(Value::bool(false).to_f64(), 0.0);
    assert_eq!(Value::u64(98).to_f64(), 98.0);
    assert_eq!(Value::i64(-98).to_f64(), -98.0);

    assert_eq!(Value::i64(980).to_u64(), 980);
    assert_eq!(Value::f64(99.0).to_u64(), 99);
    assert_eq!(Value::bool(true).to_u64(), 1);
    assert_eq!(Value::nil().to_u64(), 0);

    assert!(Value::u64(98).to_bool());
    assert!(Value::i64(-98).to_bool());
    assert!(Value::f64(99.0).to_bool());
    assert!(!Value::nil().to_bool());
}

#[test]
fn scalar_text() {
    setup();
    assert_eq!(Value::i64(123).to_string(), "123");
    assert_eq!(Value::i64(123).to_bytes().as_ref(), b"123");
    assert_eq!(Value::bool(true).to_string(), "true");
    assert_eq!(Value::bool(false).to_string(), "false");
    assert_eq!(Value::u64(99).to_string(), "99");
    assert_eq!(Value::i64(-99).to_string(), "-99");
    assert_eq!(Value::f64(-998.0).to_string(), "-998");
    assert_eq!(Value::f64(0.25).to_string(), "0.25");
    assert_eq!(Value::nil().to_string(), "");
}

#[test]
fn reboxing_unboxed_scalars() {
    setup();
    for (v, text) in [
        (Value::custom_bits(99), "99"),
        (Value::bool(true), "true"),
        (Value::bool(false), "false"),
        (Value::u64(99), "99"),
        (Value::i64(-99), "-99"),
        (Value::f64(-998.0), "-998"),
        (Value::nil(), ""),
    ] {
        assert_eq!(Value::from(v.unbox()).to_string(), text);
    }
    assert!(matches!(Value::i64(123).unbox(), Unboxed::Int(123)));
}

#[test]
fn strings_and_bytes() {
    setup();
    let s = Value::string("hello world");
    assert_eq!(s.to_string(), "hello world");
    assert_eq!(s.to_i64(), 0);
    assert!(!s.is_nil());
    assert_eq!(s.to_bytes().as_ref(), b"hello world");

    let b = Value::bytes(b"hello world");
    assert_eq!(b.to_string(), "hello world");
    assert_eq!(b.to_i64(), 0);
    assert!(!b.is_nil());
    assert_eq!(b.to_bytes().as_ref(), b"hello world");

    assert!(Value::string("hello").to_f64().is_nan());
    assert_eq!(Value::string("-99").to_f64(), -99.0);
    assert!(Value::string("1e400").to_f64().is_nan());
    assert!(Value::bytes(b"-1e400").to_f64().is_nan());
    assert_eq!(Value::string("+Inf").to_f64(), f64::INFINITY);
    assert_eq!(Value::bytes(b"-99").to_i64(), -99);
    assert_eq!(Value::string("990").to_u64(), 990);
    assert_eq!(Value::bytes(b"990").to_u64(), 990);
    assert_eq!(Value::string("hello").to_u64(), 0);
    assert!(!Value::string("-99").to_bool());
    assert!(Value::string("true").to_bool());
    assert!(!Value::bytes(b"-99").to_bool());
    assert!(Value::bytes(b"true").to_bool());
    assert!(!Value::string("hello").to_bool());
}

#[test]
fn any_recognizes_native_types() {
    setup();
    assert!(Value::any(&()).is_nil());
    assert_eq!(Value::any(&"hello").to_string(), "hello");
    let owned = String::from("hello");
    assert!(Value::any(&owned).is_string());
    let buf = b"hello".to_vec();
    assert!(Value::any(&buf).is_bytes());
    assert_eq!(Value::any(&buf).to_string(), "hello");

    assert!(Value::any(&true).to_bool());
    assert!(!Value::any(&false).to_bool());
    assert_eq!(Value::any(&-1i8).to_i8(), -1);
    assert_eq!(Value::any(&-2i16).to_i16(), -2);
    assert_eq!(Value::any(&-3i32).to_i32(), -3);
    assert_eq!(Value::any(&-4i64).to_i64(), -4);
    assert_eq!(Value::any(&1u8).to_i8(), 1);
    assert_eq!(Value::any(&2u16).to_i16(), 2);
    assert_eq!(Value::any(&3u32).to_i32(), 3);
    assert_eq!(Value::any(&4u64).to_i64(), 4);
    assert_eq!(Value::any(&1isize).to_i8(), 1);
    assert_eq!(Value::any(&2usize).to_i16(), 2);
    assert_eq!(Value::any(&4f32).to_f32(), 4.0);
    assert_eq!(Value::any(&5f64).to_f64(), 5.0);

    assert!(Value::any(&10i32).is_number());
    assert!(Value::any(&10u8).is_uint());
    assert!(Value::any(&10f32).is_float());
}

#[test]
fn erased_conversions() {
    setup();
    inline(|| {
        let jello = Jello { neat: 10, feet: 20 };
        let v = Value::any(&jello);
        assert!(v.is_erased());
        assert!(v.to_f64().is_nan());
        assert_eq!(v.to_u64(), 0);
        assert_eq!(v.to_i64(), 0);
        assert!(!v.to_bool());
        assert_eq!(v.to_string(), "Jello { neat: 10, feet: 20 }");

        let pudding = Pudding { neat: 10, feet: 20 };
        let v = Value::any(&pudding);
        assert_eq!(v.to_f64(), 200.0);
        assert_eq!(v.to_u64(), 200);
        assert_eq!(v.to_i64(), 200);
        assert!(v.to_bool());
        assert_eq!(v.to_string(), "Yum{10 20}");
        assert_eq!(v.to_bytes().as_ref(), b"Yum{10 20}");
    });
}

#[test]
fn erased_text_is_parsed_when_no_capability_exists() {
    setup();
    #[derive(Debug)]
    struct Answer;

    impl Erasable for Answer {
        fn render(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("42")
        }
    }

    let v = Value::erased(&Answer);
    assert_eq!(v.to_i64(), 42);
    assert_eq!(v.to_u64(), 42);
    assert_eq!(v.to_f64(), 42.0);
    assert!(!v.to_bool());

    let owned = String::from("true");
    let v = Value::erased(&owned);
    assert!(!v.is_erased());
    assert!(v.is_string());
    assert_eq!(v.as_str(), Some("true"));
    assert!(v.to_bool());
}

#[test]
fn erased_text_and_bytes_keep_their_payload() {
    setup();
    let buf = vec![0xff, b'a', 0, 0xfe];
    let v = Value::erased(&buf);
    assert_eq!(v.encoding(), Encoding::ErasedRecord);
    assert!(v.is_bytes());
    assert!(!v.is_erased());
    assert_eq!(v.as_bytes(), Some(&buf[..]));
    assert_eq!(v.to_bytes().as_ref(), &[0xff, b'a', 0, 0xfe]);
    assert_eq!(v.bytes_capacity(), Some(buf.capacity()));

    let text: &'static str = "hi";
    for v in [Value::erased(&text), Value::erased(&String::from("hi"))] {
        assert!(v.is_string());
        assert_eq!(v.as_str(), Some("hi"));
        assert_eq!(v.to_bytes().as_ref(), b"hi");
    }
}

#[test]
fn predicates() {
    setup();
    let buf = b"hello".to_vec();
    assert!(!Value::nil().is_string());
    assert!(!Value::any(&123).is_string());
    assert!(Value::any(&"hello").is_string());
    assert!(!Value::any(&buf).is_string());

    assert!(!Value::nil().is_bytes());
    assert!(!Value::any(&123).is_bytes());
    assert!(!Value::any(&"hello").is_bytes());
    assert!(Value::any(&buf).is_bytes());

    assert!(!Value::string("hello").is_number());
    assert!(Value::i64(10).is_number());
    assert!(Value::u64(10).is_number());
    assert!(Value::f64(10.0).is_number());

    assert!(Value::u64(10).is_uint());
    assert!(Value::from(10u8).is_uint());
    assert!(!Value::i64(10).is_uint());
    assert!(Value::i64(10).is_int());
    assert!(Value::from(10i8).is_int());
    assert!(!Value::u64(10).is_int());
    assert!(Value::f64(10.0).is_float());
    assert!(Value::from(10f32).is_float());
    assert!(!Value::u64(10).is_float());
    assert!(Value::bool(true).is_bool());
    assert!(Value::bool(false).is_bool());
    assert!(!Value::u64(10).is_bool());
}

#[test]
fn narrow_accessors() {
    setup();
    assert_eq!(Value::from(-10i8).to_i8(), -10);
    assert_eq!(Value::from(500i64).to_i8(), -12);
    assert_eq!(Value::from(-10i16).to_i16(), -10);
    assert_eq!(Value::from(-10i32).to_i32(), -10);
    assert_eq!(Value::from(-10i64).to_f32(), -10.0);
    assert_eq!(Value::from(10.123_912_3f32).to_f32(), 10.123_912_3);
    assert_eq!(Value::from(10u8).to_u8(), 10);
    assert_eq!(Value::from(500usize).to_u8(), (500 & 0xFF) as u8);
    assert_eq!(Value::from(10u16).to_u16(), 10);
    assert_eq!(Value::from(11u32).to_u32(), 11);
    assert_eq!(Value::from(12u64).to_usize(), 12);
    assert_eq!(Value::u64(257).to_u8(), 1);
}

#[test]
fn tags() {
    setup();
    assert_eq!(Value::u64(10).tag(), 0);
    assert_eq!(Value::bytes(&[]).tag(), 0);
    assert_eq!(Value::string("hello").tag(), 0);
    assert_eq!(Value::string_with_tag("hello", 999).tag(), 999);
    assert_eq!(Value::string_with_tag("hello", 999).to_string(), "hello");
}
