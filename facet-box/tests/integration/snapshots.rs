use facet_box::{EscapeConfig, Value};
use insta::assert_snapshot;

use crate::{Pudding, setup};

#[test]
fn debug_of_scalars() {
    setup();
    let rendered = [
        Value::nil(),
        Value::bool(true),
        Value::i64(-7),
        Value::u64(7),
        Value::f64(0.5),
        Value::custom_bits(3),
    ]
    .iter()
    .map(|v| format!("{v:?}"))
    .collect::<Vec<_>>()
    .join("\n");

    assert_snapshot!(rendered, @r"
    Nil
    Bool(true)
    Int(-7)
    Uint(7)
    Float(0.5)
    CustomBits(3)
    ");
}

#[test]
fn debug_of_text() {
    setup();
    let s = EscapeConfig::new()
        .with_string_escape(true)
        .scope(|| Value::string_with_tag("hi \"there\"", 4));
    assert_snapshot!(format!("{s:?}"), @r#"String("hi \"there\"")"#);
    assert_snapshot!(format!("{:?}", Value::bytes(b"ab")), @"Bytes([97, 98])");
}

#[test]
fn display_of_erased() {
    setup();
    let pudding = Pudding { neat: 4, feet: 5 };
    assert_snapshot!(Value::any(&pudding).to_string(), @"Yum{4 5}");
    assert_snapshot!(Value::f64(1e21).to_string(), @"1000000000000000000000");
}

#[test]
fn config_errors() {
    setup();
    let err = "string,recrod".parse::<EscapeConfig>().unwrap_err();
    assert_snapshot!(err.to_string(), @"unknown escape switch `recrod` (expected string, record, all or none)");
}
