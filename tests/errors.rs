use thistle::run;

#[test]
fn illegal_character_reports_the_offending_char() {
    let err = run("test.thistle", "@").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("IllegalCharacterError"));
    assert!(rendered.contains("'@'"));
}

#[test]
fn bang_without_equals_is_an_expected_char_error() {
    let err = run("test.thistle", "1 ! 2").unwrap_err();
    assert!(err.to_string().contains("ExpectedCharError"));
}

#[test]
fn unterminated_string_does_not_error() {
    // A known source quirk, preserved on purpose: the lexer reads to
    // EOF and returns whatever it collected rather than failing.
    let result = run("test.thistle", r#""unterminated"#);
    assert!(result.is_ok());
}

#[test]
fn dangling_operator_is_invalid_syntax() {
    let err = run("test.thistle", "1 +").unwrap_err();
    assert!(err.to_string().contains("InvalidSyntaxError"));
}

#[test]
fn undefined_name_is_a_runtime_error() {
    let err = run("test.thistle", "totally_unbound_name").unwrap_err();
    assert!(err.to_string().contains("'totally_unbound_name' is not defined"));
}

#[test]
fn error_rendering_includes_file_and_line() {
    let err = run("my_script.thistle", "@").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("File<my_script.thistle>"));
    assert!(rendered.contains("line<1>"));
}

#[test]
fn runtime_error_rendering_includes_traceback_header() {
    let err = run("test.thistle", "1/0").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("Traceback (most recent call last):\n"));
    assert!(rendered.contains("RunTimeError:Division By Zero"));
}

#[test]
fn illegal_operation_between_incompatible_types() {
    let err = run("test.thistle", r#""a" - 1"#).unwrap_err();
    assert!(err.to_string().contains("Illegal Operation"));
}
