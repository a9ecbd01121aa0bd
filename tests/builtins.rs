use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use thistle::Engine;

fn capture_print() -> (Engine, Rc<RefCell<Vec<String>>>) {
    let mut engine = Engine::new();
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = lines.clone();
    engine.on_print(move |line| sink.borrow_mut().push(line.to_string()));
    (engine, lines)
}

fn with_input(mut lines: VecDeque<&'static str>) -> Engine {
    let mut engine = Engine::new();
    engine.on_input(move || lines.pop_front().map(|s| s.to_string()));
    engine
}

#[test]
fn print_writes_the_rendered_value_and_returns_null() {
    let (mut engine, lines) = capture_print();
    let result = engine.run("test.thistle", r#"Print("hi")"#).expect("ok");
    assert_eq!(*lines.borrow(), vec!["hi".to_string()]);
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.as_number().unwrap().to_int(), 0);
}

#[test]
fn input_reads_one_line_as_a_string() {
    let mut engine = with_input(VecDeque::from(["hello"]));
    let result = engine.run("test.thistle", "Input()").expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.render(), "hello");
}

#[test]
fn input_int_retries_until_it_parses() {
    let (mut engine, lines) = capture_print();
    engine.on_input({
        let mut queue = VecDeque::from(["not a number", "42"]);
        move || queue.pop_front().map(|s| s.to_string())
    });
    let result = engine.run("test.thistle", "Input_Int()").expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.as_number().unwrap().to_int(), 42);
    assert_eq!(*lines.borrow(), vec!["Must enter an integer".to_string()]);
}

#[test]
fn is_number_is_string_is_list() {
    let mut engine = Engine::new();
    let result = engine
        .run(
            "test.thistle",
            "Is_number(1)\nIs_string(\"x\")\nIs_list([1])\nIs_number(\"x\")",
        )
        .expect("ok");
    let items = result.as_list().unwrap();
    let items = items.borrow();
    assert_eq!(items[0].as_number().unwrap().to_int(), 1);
    assert_eq!(items[1].as_number().unwrap().to_int(), 1);
    assert_eq!(items[2].as_number().unwrap().to_int(), 1);
    assert_eq!(items[3].as_number().unwrap().to_int(), 0);
}

#[test]
fn append_mutates_the_list_in_place() {
    let mut engine = Engine::new();
    let result = engine
        .run("test.thistle", "take xs = [1,2]\nAppend(xs, 3)\nxs")
        .expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.render(), "[1, 2, 3]");
}

#[test]
fn pop_removes_at_one_based_index() {
    let mut engine = Engine::new();
    let result = engine
        .run("test.thistle", "take xs = [10,20,30]\ntake popped = Pop(xs, 2)\n[popped, xs]")
        .expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.render(), "[20, [10, 30]]");
}

#[test]
fn pop_with_a_negative_index_counts_from_the_end() {
    let mut engine = Engine::new();
    let result = engine
        .run("test.thistle", "take xs = [10,20,30]\ntake popped = Pop(xs, -1)\n[popped, xs]")
        .expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.render(), "[30, [10, 20]]");
}

#[test]
fn extend_mutates_the_first_list_with_the_second() {
    let mut engine = Engine::new();
    let result = engine
        .run("test.thistle", "take a = [1,2]\ntake b = [3,4]\nExtend(a, b)\na")
        .expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.render(), "[1, 2, 3, 4]");
}

#[test]
fn null_true_false_are_ordinary_rebindable_numbers() {
    let mut engine = Engine::new();
    let result = engine.run("test.thistle", "take True = 99\nTrue").expect("ok");
    let last = result.as_list().unwrap().borrow().last().unwrap().clone();
    assert_eq!(last.as_number().unwrap().to_int(), 99);
}
