use super::*;
use pretty_assertions::assert_eq;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|arg| (*arg).to_owned()).collect()
}

#[test]
fn defaults_show_everything_quietly() {
    let options = Options::parse(&args(&["story.ni"])).unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(options.config, SessionConfig::default());
    assert_eq!(options.positional, vec!["story.ni".to_owned()]);
}

#[test]
fn flags_anywhere() {
    let options = Options::parse(&args(&["--stats", "story.ni", "--highlights=basic", "edits"]))
        .unwrap_or_else(|error| panic!("{error}"));
    assert!(options.config.stats);
    assert_eq!(options.config.support, HighlightSupport::BASIC);
    assert_eq!(options.positional(1, "script").ok(), Some("edits"));
    assert!(matches!(
        options.positional(2, "extra"),
        Err(CliError::Usage(message)) if message == "missing extra"
    ));
}

#[test]
fn bad_flags_are_rejected() {
    assert!(matches!(
        Options::parse(&args(&["--highlights=some"])),
        Err(CliError::Usage(_))
    ));
    assert!(matches!(
        Options::parse(&args(&["--verbose"])),
        Err(CliError::UnknownOption(flag)) if flag == "--verbose"
    ));
}
