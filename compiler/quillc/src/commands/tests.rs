use super::*;
use pretty_assertions::assert_eq;

fn declaration_line(lines: &[String]) -> Option<&String> {
    lines
        .iter()
        .find(|line| line.starts_with("  0..19 a nonterminal declaration ("))
}

#[test]
fn lex_lists_every_token() {
    let lines = lex("take lamp", SessionConfig::default()).unwrap_or_else(|error| panic!("{error}"));
    assert!(lines[0].ends_with(" tokens"));
    assert!(lines[1].starts_with("  0..4 \"take\" "));
    assert!(lines.last().is_some_and(|line| line.starts_with("  5..9 \"lamp\" ")));
}

#[test]
fn highlight_covers_the_text() {
    let lines = highlight("say \"hi\".", SessionConfig::default())
        .unwrap_or_else(|error| panic!("{error}"));
    assert!(lines[0].ends_with(" runs"));
    assert!(lines[1].starts_with("  0.."));
    assert!(lines.last().is_some_and(|line| line.contains("..9 ")));
}

#[test]
fn parse_reports_declarations() {
    let lines = parse("# foo is a wording.", SessionConfig::default())
        .unwrap_or_else(|error| panic!("{error}"));
    let line = declaration_line(&lines).unwrap_or_else(|| panic!("no declaration in {lines:#?}"));
    assert!(line.ends_with("sentence) \"# foo is a wording.\""));
    assert!(!lines.iter().any(|line| line.starts_with("stats:")));
}

#[test]
fn replay_reports_each_step() {
    let config = SessionConfig {
        stats: true,
        ..SessionConfig::default()
    };
    let steps = [Step::Insert {
        at: 18,
        text: ".".to_owned(),
    }];
    let lines = replay("# foo is a wording", &steps, config).unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(lines[0], "step 1: +18 \".\"");
    assert!(lines[1].starts_with("  remove "));
    assert!(lines.iter().any(|line| line.starts_with("  stats: ")));
    assert!(declaration_line(&lines).is_some());
}

#[test]
fn replay_stops_at_a_bad_edit() {
    let steps = [Step::Remove { lo: 2, hi: 40 }];
    assert!(matches!(
        replay("# foo", &steps, SessionConfig::default()),
        Err(CliError::Session(_))
    ));
}
