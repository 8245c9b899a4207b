use super::*;
use pretty_assertions::assert_eq;

#[test]
fn inserts_and_removals() {
    let steps = parse_script("+0 The lamp is here.\n\n# tidy up\n-4 9\n+4 key\\nis")
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(
        steps,
        vec![
            Step::Insert {
                at: 0,
                text: "The lamp is here.".to_owned()
            },
            Step::Remove { lo: 4, hi: 9 },
            Step::Insert {
                at: 4,
                text: "key\nis".to_owned()
            },
        ]
    );
    assert_eq!(steps[1].as_edit(), (4, 9, ""));
    assert_eq!(steps[2].to_string(), "+4 \"key\\nis\"");
}

#[test]
fn inserted_text_keeps_its_spaces() {
    let steps = parse_script("+3  two  spaces ").unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(steps[0].as_edit(), (3, 3, " two  spaces "));
}

#[test]
fn errors_name_the_line() {
    let failure = |source: &str| match parse_script(source) {
        Err(CliError::Script { line, message }) => (line, message),
        other => panic!("expected a script error, got {other:?}"),
    };
    assert_eq!(failure("+0 a\n-5"), (2, "expected -<lo> <hi>".to_owned()));
    assert_eq!(failure("-9 3"), (1, "range 9..3 is backwards".to_owned()));
    assert_eq!(failure("+x a"), (1, "'x' is not a codepoint index".to_owned()));
    assert_eq!(failure("+0 a\\q"), (1, "unknown escape '\\q'".to_owned()));
    assert_eq!(failure("*0"), (1, "expected a line starting with + or -".to_owned()));
}
