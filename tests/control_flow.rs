use thistle::run;

fn last(source: &str) -> thistle::Value {
    let result = run("test.thistle", source).expect("program should evaluate");
    let items = result.as_list().expect("top level result is a list");
    items.borrow().last().expect("at least one statement").clone()
}

#[test]
fn whether_picks_the_first_truthy_clause() {
    let v = last("whether 1 == 1 { 10 } ifnot { 20 }");
    assert_eq!(v.as_number().unwrap().to_int(), 10);
}

#[test]
fn whether_falls_through_to_ifnot() {
    let v = last("whether 1 == 2 { 10 } ifnot { 20 }");
    assert_eq!(v.as_number().unwrap().to_int(), 20);
}

#[test]
fn further_chains_additional_conditions() {
    let v = last("whether 1 == 2 { 10 } further 2 == 2 { 30 } ifnot { 20 }");
    assert_eq!(v.as_number().unwrap().to_int(), 30);
}

#[test]
fn whether_with_no_match_and_no_ifnot_is_null() {
    let v = last("whether 1 == 2 { 10 }");
    assert_eq!(v.as_number().unwrap().to_int(), 0);
}

#[test]
fn block_body_discards_its_result() {
    // `{` NEWLINE ... `}` is a block whose value is discarded in favor
    // of null, unlike `{` expr `}` which yields the expression's value.
    let v = last("whether 1 == 1 {\ntake y = 5\n}");
    assert_eq!(v.as_number().unwrap().to_int(), 0);
}

#[test]
fn for_loop_collects_expression_bodies() {
    let v = last("StartCycle i = 1 : 3 { i*i }");
    assert_eq!(v.render(), "[1, 4, 9]");
}

#[test]
fn for_loop_cardinality_matches_the_law() {
    let v = last("StartCycle i = 1 : 10 : 2 { i }");
    assert_eq!(v.render(), "[1, 3, 5, 7, 9]");
}

#[test]
fn for_loop_block_body_discards_and_returns_null() {
    let v = last("StartCycle i = 1 : 3 {\nPrint(i)\n}");
    assert_eq!(v.as_number().unwrap().to_int(), 0);
}

#[test]
fn while_loop_collects_until_condition_is_false() {
    let v = last("take i = 0\nAsLongAs (i < 3) { take i = i + 1 }");
    assert_eq!(v.render(), "[1, 2, 3]");
}

#[test]
fn and_or_short_circuit_on_truthiness_not_type() {
    assert_eq!(last("1 and 1").as_number().unwrap().to_int(), 1);
    assert_eq!(last("0 or 1").as_number().unwrap().to_int(), 1);
    assert_eq!(last("0 and 1").as_number().unwrap().to_int(), 0);
}
