use dw_sexpr::{parse, parse_all, Pattern, Sexpr, SexprError, SexprReader, MAX_DEPTH};
use proptest::prelude::*;

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn cons_round_trip_and_destructuring() {
    let text = "(cons a (cons b (cons c ())))";
    let expr = parse(text).unwrap();
    assert_eq!(expr.to_string(), normalize_whitespace(text));

    let pattern = Pattern::parse("(cons ?x (cons ?y ?rest))").unwrap();
    let bindings = expr.matches(&pattern).unwrap();
    assert_eq!(bindings["x"], Sexpr::symbol("a"));
    assert_eq!(bindings["y"], Sexpr::symbol("b"));
    assert_eq!(bindings["rest"], parse("(cons c ())").unwrap());
    assert_eq!(bindings.len(), 3);
}

#[test]
fn whitespace_and_comments_are_normalized() {
    let text = "(summary ; effects of f\n   (reads  #0 #1)\n\t(writes \"out\"))";
    let expr = parse(text).unwrap();
    assert_eq!(expr.to_string(), "(summary (reads #0 #1) (writes \"out\"))");
}

#[test]
fn parse_requires_a_single_expression() {
    assert_eq!(parse("  "), Err(SexprError::UnexpectedEnd { line: 1 }));
    assert_eq!(parse("(a))"), Err(SexprError::UnbalancedParen { line: 1 }));
    assert!(matches!(parse("a b"), Err(SexprError::Parse { .. })));
    assert_eq!(parse("(a\n(b)"), Err(SexprError::UnexpectedEnd { line: 2 }));
}

#[test]
fn parse_all_stops_on_first_error() {
    assert_eq!(parse_all("a #1 ()").unwrap().len(), 3);
    assert_eq!(
        parse_all("a\n(b\n#c)"),
        Err(SexprError::Parse {
            line: 3,
            message: "invalid integer literal".to_string()
        })
    );
}

#[test]
fn reader_reports_missing_paren() {
    let mut reader = SexprReader::new("(ok)\n(missing");
    assert!(reader.read().is_some());
    assert!(reader.read().is_none());
    assert!(reader.fail());
    assert_eq!(reader.what(), "line 2: unexpected end of input");
}

#[test]
fn int_bounds() {
    assert_eq!(parse("#2147483647").unwrap(), Sexpr::Int(i32::MAX));
    assert_eq!(parse("#-2147483648").unwrap(), Sexpr::Int(i32::MIN));
    assert!(matches!(parse("#2147483648"), Err(SexprError::Parse { line: 1, .. })));
}

fn arb_sexpr() -> impl Strategy<Value = Sexpr> {
    let leaf = prop_oneof![
        "[a-z][a-z0-9_?.-]{0,6}".prop_map(Sexpr::Symbol),
        any::<i32>().prop_map(Sexpr::Int),
        "[a-z \"\\\\]{0,8}".prop_map(Sexpr::Str),
    ];
    leaf.prop_recursive(4, 32, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(Sexpr::List)
    })
}

proptest! {
    #[test]
    fn printed_expressions_parse_back(expr in arb_sexpr()) {
        prop_assert_eq!(parse(&expr.to_string()), Ok(expr));
    }
}

#[test]
fn reader_rejects_deep_nesting() {
    let source = format!("ok\n{}{}", "(".repeat(5_000), ")".repeat(5_000));
    let mut reader = SexprReader::new(&source);
    assert_eq!(reader.read(), Some(Sexpr::symbol("ok")));
    assert_eq!(reader.read(), None);
    assert!(reader.fail());
    assert_eq!(
        reader.what(),
        format!("line 2: lists nested deeper than {MAX_DEPTH} levels")
    );
}
