use thistle::run;

fn last(source: &str) -> thistle::Value {
    let result = run("test.thistle", source).expect("program should evaluate");
    let items = result.as_list().expect("top level result is a list");
    items.borrow().last().expect("at least one statement").clone()
}

#[test]
fn named_function_call() {
    let v = last("Method add(a,b){ a+b }\nadd(2,3)");
    assert_eq!(v.as_number().unwrap().to_int(), 5);
}

#[test]
fn anonymous_function_value_is_callable() {
    let v = last("take square = Method(n){ n*n }\nsquare(4)");
    assert_eq!(v.as_number().unwrap().to_int(), 16);
}

#[test]
fn recursive_function_call() {
    let source = "Method fact(n){ whether n <= 1 { 1 } ifnot { n * fact(n-1) } }\nfact(5)";
    let v = last(source);
    assert_eq!(v.as_number().unwrap().to_int(), 120);
}

#[test]
fn excess_arguments_is_a_runtime_error() {
    let err = run("test.thistle", "Method f(a){ a }\nf(1,2)").unwrap_err();
    assert!(err.to_string().contains("excess arguments"));
}

#[test]
fn missing_arguments_is_a_runtime_error() {
    let err = run("test.thistle", "Method f(a,b){ a+b }\nf(1)").unwrap_err();
    assert!(err.to_string().contains("less arguments"));
}

#[test]
fn closure_reads_the_binding_live_at_call_time() {
    // `make_adder` captures its defining scope; the returned function
    // still sees whatever `base` is bound to when it is later called.
    let source = "\
take base = 10
Method make_adder() { Method(n) { n + base } }
take add_to_base = make_adder()
add_to_base(5)";
    let v = last(source);
    assert_eq!(v.as_number().unwrap().to_int(), 15);
}

#[test]
fn assignment_inside_a_function_does_not_leak_to_the_caller() {
    let source = "\
take x = 1
Method set_x() { take x = 2 }
set_x()
x";
    let v = last(source);
    assert_eq!(v.as_number().unwrap().to_int(), 1);
}

#[test]
fn calling_a_non_function_is_a_runtime_error() {
    let err = run("test.thistle", "take x = 5\nx(1)").unwrap_err();
    assert!(err.to_string().contains("not callable"));
}

#[test]
fn traceback_names_the_call_chain() {
    let err = run(
        "test.thistle",
        "Method inner() { 1/0 }\nMethod outer() { inner() }\nouter()",
    )
    .unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("Traceback (most recent call last):\n"));
    assert!(rendered.contains("in<outer>"));
    assert!(rendered.contains("in<inner>"));
}
