use thistle::run;

fn last(source: &str) -> thistle::Value {
    let result = run("test.thistle", source).expect("program should evaluate");
    let items = result.as_list().expect("top level result is a list");
    items.borrow().last().expect("at least one statement").clone()
}

#[test]
fn addition_and_precedence() {
    let v = last("2 + 3 * 4");
    assert_eq!(v.as_number().unwrap().to_int(), 14);
}

#[test]
fn take_binds_in_current_scope() {
    let v = last("take x = 2 + 3 * 4\nx");
    assert_eq!(v.as_number().unwrap().to_int(), 14);
}

#[test]
fn division_always_widens_to_float() {
    let v = last("4 / 2");
    assert_eq!(v.as_number().unwrap().as_float(), 2.0);
}

#[test]
fn floor_div_and_modulo_preserve_int() {
    assert_eq!(last("7 // 2").as_number().unwrap().to_int(), 3);
    assert_eq!(last("7 % 2").as_number().unwrap().to_int(), 1);
}

#[test]
fn floor_div_rounds_toward_negative_infinity() {
    // Floor division, not Rust's truncating `div_euclid`: the quotient
    // always rounds down, matching Python's `//`.
    assert_eq!(last("7 // -2").as_number().unwrap().to_int(), -4);
    assert_eq!(last("-7 // -2").as_number().unwrap().to_int(), 3);
    assert_eq!(last("-7 // 2").as_number().unwrap().to_int(), -4);
}

#[test]
fn modulo_follows_the_sign_of_the_divisor() {
    assert_eq!(last("7 % -2").as_number().unwrap().to_int(), -1);
    assert_eq!(last("-7 % 2").as_number().unwrap().to_int(), 1);
    assert_eq!(last("-7 % -2").as_number().unwrap().to_int(), -1);
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let err = run("test.thistle", "1/0").unwrap_err();
    assert!(err.to_string().contains("Division By Zero"));
}

#[test]
fn modulo_by_zero_is_a_runtime_error() {
    let err = run("test.thistle", "1%0").unwrap_err();
    assert!(err.to_string().contains("Modulo By Zero"));
}

#[test]
fn power_of_two_ints_stays_int() {
    assert_eq!(last("2^10").as_number().unwrap().to_int(), 1024);
}

#[test]
fn arithmetic_identities() {
    assert_eq!(last("5 + 0").as_number().unwrap().to_int(), 5);
    assert_eq!(last("5 * 1").as_number().unwrap().to_int(), 5);
    assert_eq!(last("5.0 / 2.0 * 2.0").as_number().unwrap().as_float(), 5.0);
}

#[test]
fn comparisons_yield_one_or_zero() {
    assert_eq!(last("3 > 2").as_number().unwrap().to_int(), 1);
    assert_eq!(last("3 < 2").as_number().unwrap().to_int(), 0);
    assert_eq!(last("3 == 3").as_number().unwrap().to_int(), 1);
}

#[test]
fn unary_negation_and_not() {
    assert_eq!(last("-5").as_number().unwrap().to_int(), -5);
    assert_eq!(last("not 0").as_number().unwrap().to_int(), 1);
    assert_eq!(last("not 1").as_number().unwrap().to_int(), 0);
}
