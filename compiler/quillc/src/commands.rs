//! Command handlers.
//!
//! Each handler takes the source text and returns its report as lines; the
//! binary prints them.

use quill_lexer::text_at;
use quill_lexer_core::INITIAL_LEXICAL_STATE;
use quill_parse::{sample, BufferId, BufferKind, Session, SessionConfig};
use tracing::debug;

use crate::script::Step;
use crate::CliError;

/// The buffer every command works in.
const BUFFER: BufferId = BufferId(1);

fn open(config: SessionConfig, grammar: bool, text: &str) -> Result<Session, CliError> {
    let mut session = Session::new(config);
    if grammar {
        sample::install(&mut session)?;
    }
    session.introduce_buffer(BUFFER, BufferKind::Story)?;
    session.edit(BUFFER, 0, 0, text)?;
    Ok(session)
}

/// Tokens with their offsets and the lexical states around them.
pub fn lex(text: &str, config: SessionConfig) -> Result<Vec<String>, CliError> {
    let session = open(config, false, text)?;
    let tokens = session.buffer(BUFFER)?.tokens();

    let mut lines = vec![format!("{} tokens", tokens.iter().count())];
    let mut offset = 0;
    let mut before = INITIAL_LEXICAL_STATE;
    for (cursor, token) in tokens.iter() {
        let after = token.state_after(before);
        let hi = offset + token.codepoint_count();
        let text = text_at(tokens, session.vocabulary(), cursor).unwrap_or_default();
        lines.push(format!("  {offset}..{hi} {text:?} {before} -> {after}"));
        offset = hi;
        before = after;
    }
    Ok(lines)
}

/// Highlight runs over the whole text.
pub fn highlight(text: &str, config: SessionConfig) -> Result<Vec<String>, CliError> {
    let session = open(config, false, text)?;
    let runs = session.highlights(BUFFER)?;
    let mut lines = vec![format!("{} runs", runs.len())];
    lines.extend(
        runs.iter()
            .map(|run| format!("  {}..{} {}", run.lo, run.hi, run.code)),
    );
    Ok(lines)
}

/// Complete matches under the sample grammar.
pub fn parse(text: &str, config: SessionConfig) -> Result<Vec<String>, CliError> {
    let session = open(config, true, text)?;
    let mut lines = matches(&session)?;
    if config.stats {
        lines.push(format!("stats: {}", session.stats()));
    }
    Ok(lines)
}

/// Replay an edit script over `text`, reporting what each edit changed.
pub fn replay(text: &str, steps: &[Step], config: SessionConfig) -> Result<Vec<String>, CliError> {
    let mut session = open(config, true, text)?;
    session.take_stats();

    let mut lines = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        let (lo, hi, insertion) = step.as_edit();
        debug!(index, %step, "replaying");
        let events = session.edit(BUFFER, lo, hi, insertion)?;
        lines.push(format!("step {}: {step}", index + 1));
        lines.extend(events.iter().map(|event| format!("  {event}")));
        if config.stats {
            lines.push(format!("  stats: {}", session.take_stats()));
        }
    }
    lines.extend(matches(&session)?);
    Ok(lines)
}

fn matches(session: &Session) -> Result<Vec<String>, CliError> {
    let text: Vec<char> = session.text(BUFFER)?.chars().collect();
    let found = session.complete_matches(BUFFER)?;
    let mut lines = vec![format!("{} matches", found.len())];
    for span in &found {
        let variant = session
            .grammar()
            .get(span.production)
            .map(|production| production.variant().to_string())
            .unwrap_or_default();
        let excerpt: String = text
            .get(span.lo..span.hi)
            .map(|chars| chars.iter().collect())
            .unwrap_or_default();
        lines.push(format!(
            "  {}..{} {} ({} {variant}) {excerpt:?}",
            span.lo,
            span.hi,
            session.vocabulary().lookup(span.result.name),
            span.production,
        ));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests;
