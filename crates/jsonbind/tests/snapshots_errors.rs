#![expect(missing_docs)]

use core::fmt::Write;

use bstr::BStr;
use common::{Order, order_schema};
use insta::assert_snapshot;
use jsonbind::{Event, ImportOptions, import, import_events};

mod common;

fn render(documents: &[&[u8]]) -> String {
    let schema = order_schema();
    let mut out = String::new();
    for document in documents {
        let result = import(document, &mut Order::default(), &schema);
        match result {
            Ok(()) => writeln!(out, "ok"),
            Err(err) => writeln!(out, "{err}"),
        }
        .unwrap();
    }
    out
}

#[test]
fn snapshot_schema_errors() {
    assert_snapshot!(render(&[
        br#"{"id": 1, "extra": 2}"#,
        br#"{"id": -5}"#,
        br#"{"lines": [{"sku": 7}]}"#,
        br#"{"discounts": [1, 2, 300]}"#,
        b"{\"lines\": [{\"sku\": \"\xff\"}]}",
        br#"{"customer": []}"#,
        br#"[{"id": 1}]"#,
    ]), @r#"
    schema mismatch: unexpected key "extra" in object Order at 1:11
    schema mismatch: -5 does not fit in u32 in field "id" (u32) at 1:8
    schema mismatch: unexpected unsigned integer 7 in field "sku" (String) at 1:20
    schema mismatch: 300 does not fit in u8 in array "discounts" of u8 at 1:22
    schema mismatch: string is not valid UTF-8 in field "sku" (String) at 1:20
    schema mismatch: unexpected array start in object Customer at 1:14
    schema mismatch: unexpected array start in object Order at 1:1
    "#);
}

#[test]
fn snapshot_syntax_errors() {
    assert_snapshot!(render(&[
        br#"{"customer": {"name": "Ada"}"#,
        br#"{"id": 1} x"#,
        br#"{"id": 01}"#,
        br#"{"id" 1}"#,
        b"{\"id\":\n  tru}",
    ]), @r#"
    syntax error: unexpected end of input at 1:29
    syntax error: trailing characters after the document at 1:11 near "x"
    syntax error: invalid number at 1:9 near "1}"
    syntax error: invalid character '1' at 1:7 near "1}"
    syntax error: invalid character '}' at 2:6 near "}"
    "#);
}

#[test]
fn snapshot_unterminated_event_stream() {
    let events = [
        Event::ObjectStart,
        Event::Key(BStr::new("lines")),
        Event::ArrayStart,
        Event::ObjectStart,
    ];
    let err = import_events(
        &mut events.iter(),
        &mut Order::default(),
        &order_schema(),
        &ImportOptions::default(),
    )
    .unwrap_err();
    assert_snapshot!(err.to_string(), @"schema mismatch: unexpected end of events in object Line");
}
