use thistle::run;

fn last(source: &str) -> thistle::Value {
    let result = run("test.thistle", source).expect("program should evaluate");
    let items = result.as_list().expect("top level result is a list");
    items.borrow().last().expect("at least one statement").clone()
}

#[test]
fn string_concatenation_and_repeat() {
    assert_eq!(last(r#""foo" + "bar""#).render(), "foobar");
    assert_eq!(last(r#""ab" * 3"#).render(), "ababab");
}

#[test]
fn string_indexing_is_one_based() {
    assert_eq!(last(r#""hello" ? 1"#).render(), "h");
    assert_eq!(last(r#""hello" ? 5"#).render(), "o");
}

#[test]
fn string_index_zero_is_out_of_range() {
    let err = run("test.thistle", r#""hello" ? 0"#).unwrap_err();
    assert!(err.to_string().contains("String index out of range"));
}

#[test]
fn string_negative_index_counts_from_end() {
    assert_eq!(last(r#""hello" ? -1"#).render(), "o");
}

#[test]
fn list_literal_and_plus_index() {
    let v = last("take xs = [1,2,3]\nxs ? 2");
    assert_eq!(v.as_number().unwrap().to_int(), 2);
}

#[test]
fn list_concatenation_and_repeat() {
    assert_eq!(last("[1,2] + [3]").render(), "[1, 2, 3]");
    assert_eq!(last("[1,2] * 2").render(), "[1, 2, 1, 2]");
}

#[test]
fn list_minus_number_uses_raw_index() {
    // `list - number` removes at the raw (0-based, unadjusted) index,
    // unlike the 1-based `?` operator - this asymmetry is intentional.
    assert_eq!(last("[10,20,30] - 0").render(), "[20, 30]");
}

#[test]
fn list_minus_negative_number_counts_from_the_end() {
    // Negative indices count from the end, same as native list indexing -
    // `-1` removes the last element.
    assert_eq!(last("[10,20,30] - -1").render(), "[10, 20]");
    assert_eq!(last("[10,20,30] - -2").render(), "[10, 30]");
}

#[test]
fn list_index_with_index_list_gathers_elements() {
    let v = last("[10,20,30,40] ? [1,3]");
    assert_eq!(v.render(), "[10, 30]");
}

#[test]
fn dictionary_renders_in_insertion_order() {
    let v = last(r#"take d = {"a": 1, "b": 2}
d"#);
    assert_eq!(v.render(), "\"a\":1,\"b\":2");
}

#[test]
fn dictionary_plus_pair_appends() {
    let v = last(r#"take d = {"a": 1}
d + ["b", 2]"#);
    assert_eq!(v.render(), "\"a\":1,\"b\":2");
}

#[test]
fn dictionary_plus_pair_mutates_the_original_binding() {
    // `Dictionary + pair` appends to the dictionary's own key/value lists
    // in place, so a binding that still holds the original dictionary
    // observes the new pair too, even without reassignment.
    let v = last(r#"take d = {"a": 1}
take e = d + ["b", 2]
d"#);
    assert_eq!(v.render(), "\"a\":1,\"b\":2");
}
