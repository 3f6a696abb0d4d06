//! Command dispatch: split a line, match each command against the table,
//! and decode its parameters.
//!
//! A [`ParserSession`] carries the state that links the commands of one
//! line: the command tree and the suffixes of the last match.

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{OptionalNodes, ParserConfig};
use crate::grammar::diag::{Diagnostic, ErrorKind, Span};
use crate::grammar::keyword::{FullCommand, SuffixSet, match_keywords};
use crate::grammar::split::{keyword_len, next_param, param_count, split_command};
use crate::grammar::tables::{CommandSpec, CommandTable, MAX_PARAMS, ParamKind};
use crate::grammar::tree::CommandTree;
use crate::params::ParsedParam;
use crate::params::translate::{TranslateContext, translate};

/// A successfully parsed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommand<'a> {
    /// Index of the matched spec in the command table.
    pub index: usize,
    /// Decoded parameters in declaration order; unused slots are `None`.
    pub params: [ParsedParam<'a>; MAX_PARAMS],
    /// Number of parameters present in the input.
    pub param_count: usize,
    /// Numeric suffixes from the keywords, then from character data.
    pub suffixes: SuffixSet,
    /// Bytes of the command text.
    pub span: Span,
}

impl<'a> ParsedCommand<'a> {
    /// Parameters up to the last declared slot that holds a value.
    pub fn present_params(&self) -> &[ParsedParam<'a>] {
        let len = self
            .params
            .iter()
            .rposition(|p| !p.is_none())
            .map_or(0, |i| i + 1);
        &self.params[..len]
    }
}

/// A command that did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct CommandError {
    /// Most specific reason across all candidate specs.
    pub kind: ErrorKind,
    /// Bytes of the command text.
    pub span: Span,
}

impl CommandError {
    /// Diagnostic for this error.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::from_error(self.kind, Some(self.span))
    }
}

/// Parameter-count bounds of a spec: optional parameters raise the
/// maximum, required ones raise both bounds.
fn param_bounds(spec: &CommandSpec) -> (usize, usize) {
    let mut bounds = (0, 0);
    for (i, param) in spec.params.iter().enumerate() {
        if matches!(param.kind, ParamKind::None) {
            break;
        }
        if param.optional {
            bounds.1 = i + 1;
        } else {
            bounds = (i + 1, i + 1);
        }
    }
    bounds
}

/// Decode the parameters of `params` against `spec`.
fn translate_params<'a>(
    spec: &CommandSpec,
    params: &'a str,
    count: usize,
    ctx: &TranslateContext<'_>,
    suffixes: &mut SuffixSet,
) -> Result<[ParsedParam<'a>; MAX_PARAMS], ErrorKind> {
    let mut out = [ParsedParam::None; MAX_PARAMS];
    let mut pos = 0;
    for (i, param) in spec.params.iter().take(MAX_PARAMS).enumerate() {
        if matches!(param.kind, ParamKind::None) {
            break;
        }
        if matches!(param.kind, ParamKind::UnquotedString) && i >= count {
            continue;
        }
        let range = next_param(params.as_bytes(), &mut pos)?;
        let text = params.get(range).ok_or(ErrorKind::ParamType)?;
        match translate(&param.kind, text, ctx, suffixes) {
            Ok(value) => out[i] = value,
            Err(_) if param.optional && text.is_empty() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Successful match, before the tree is updated.
struct Matched<'a> {
    command: ParsedCommand<'a>,
    tree_size: usize,
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Parser state for one input stream.
#[derive(Debug, Clone)]
pub struct ParserSession<'t> {
    table: &'t CommandTable,
    config: ParserConfig,
    tree: CommandTree,
    previous: SuffixSet,
}

impl<'t> ParserSession<'t> {
    /// Session over `table` with the default config.
    pub fn new(table: &'t CommandTable) -> Self {
        Self::with_config(table, ParserConfig::default())
    }

    /// Session over `table` with `config`.
    pub fn with_config(table: &'t CommandTable, config: ParserConfig) -> Self {
        Self {
            table,
            config,
            tree: CommandTree::new(),
            previous: SuffixSet::new(),
        }
    }

    /// Command table this session matches against.
    pub fn table(&self) -> &'t CommandTable {
        self.table
    }

    /// Active config.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Spec of a parsed command.
    pub fn spec(&self, command: &ParsedCommand<'_>) -> Option<&'t CommandSpec> {
        self.table.commands.get(command.index)
    }

    /// Return the command tree to the root.
    pub fn reset_tree(&mut self) {
        self.tree.reset();
    }

    /// Start from an explicit scope such as `"SOURce:"`.
    pub fn set_scope(&mut self, prefix: &str) {
        self.tree.set(prefix);
    }

    /// Current command tree.
    pub fn scope(&self) -> &str {
        self.tree.as_str()
    }

    /// Suffixes of the last matched non-common command.
    pub fn previous_suffixes(&self) -> &SuffixSet {
        &self.previous
    }

    /// Parse the first command of `*cursor` and advance the cursor to the
    /// `;` that ends it, or to the end of the input.
    ///
    /// Spans are relative to the cursor's text on entry.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoCommand`] when no command text remains, otherwise the
    /// most specific error across all specs.
    pub fn parse_next<'a>(
        &mut self,
        cursor: &mut &'a str,
        reset_tree: bool,
    ) -> Result<ParsedCommand<'a>, CommandError> {
        let input = *cursor;
        let (result, end) = self.parse_at(input, reset_tree);
        *cursor = input.get(end..).unwrap_or_default();
        result
    }

    /// Parse the first command of `input`, leaving the caller's input as is.
    ///
    /// # Errors
    ///
    /// As [`parse_next`](Self::parse_next).
    pub fn parse_one<'a>(
        &mut self,
        input: &'a str,
        reset_tree: bool,
    ) -> Result<ParsedCommand<'a>, CommandError> {
        self.parse_at(input, reset_tree).0
    }

    /// Iterate over every command of `line`. The tree is reset before the
    /// first command. Spans are relative to `line`.
    pub fn commands<'s, 'a>(&'s mut self, line: &'a str) -> Commands<'s, 't, 'a> {
        Commands {
            session: self,
            line,
            offset: 0,
            first: true,
        }
    }

    /// Parse the first command of `input`, returning the result and the
    /// offset where the command ended.
    fn parse_at<'a>(
        &mut self,
        input: &'a str,
        reset_tree: bool,
    ) -> (Result<ParsedCommand<'a>, CommandError>, usize) {
        if reset_tree {
            self.tree.reset();
        }
        let Some(range) = split_command(input.as_bytes()) else {
            debug!("no command");
            let err = CommandError {
                kind: ErrorKind::NoCommand,
                span: Span::empty(input.len()),
            };
            return (Err(err), input.len());
        };
        let span = Span::new(range.start, range.end);
        let mut start = range.start;
        if input.as_bytes()[start] == b':' {
            self.tree.reset();
            start += 1;
        }
        let Some(text) = input.get(start..range.end) else {
            let err = CommandError {
                kind: ErrorKind::InvalidCommand,
                span,
            };
            return (Err(err), range.end);
        };
        let result = self.dispatch(text, span).map(|matched| {
            self.commit(text, &matched);
            matched.command
        });
        (result, range.end)
    }

    /// Try every live spec against one command.
    fn dispatch<'a>(&self, text: &'a str, span: Span) -> Result<Matched<'a>, CommandError> {
        let kw_len = keyword_len(text.as_bytes());
        let keywords = &text.as_bytes()[..kw_len];
        let params = text.get(kw_len..).unwrap_or_default();
        let count = param_count(params.as_bytes());
        let input = FullCommand::new(self.tree.as_bytes(), keywords);
        let rules = self.config.suffix_rules();
        let ctx = TranslateContext {
            units: &self.table.units,
            rules,
            advanced_channel_lists: self.config.advanced_channel_lists,
        };

        let mut best = ErrorKind::InvalidCommand;
        for (index, spec) in self.table.live_commands().iter().enumerate() {
            let mut suffixes = SuffixSet::new();
            let outcome = match_keywords(spec.keywords.as_bytes(), &input, &mut suffixes, &rules)
                .and_then(|m| {
                    let (min, max) = param_bounds(spec);
                    if !(min..=max).contains(&count) {
                        return Err(ErrorKind::ParamCount);
                    }
                    let decoded = translate_params(spec, params, count, &ctx, &mut suffixes)?;
                    Ok((m, decoded))
                });
            match outcome {
                Ok((m, params)) => {
                    return Ok(Matched {
                        command: ParsedCommand {
                            index,
                            params,
                            param_count: count,
                            suffixes,
                            span,
                        },
                        tree_size: m.tree_size,
                    });
                }
                Err(kind) => {
                    if kind != ErrorKind::InvalidCommand {
                        trace!(index, pattern = %spec.keywords, error = %kind, "candidate rejected");
                    }
                    best = ErrorKind::most_specific(best, kind);
                }
            }
        }
        debug!(command = text, error = %best, "command rejected");
        Err(CommandError { kind: best, span })
    }

    /// Update the tree and previous suffixes after a match.
    fn commit(&mut self, text: &str, matched: &Matched<'_>) {
        if text.starts_with('*') {
            return;
        }
        let Some(spec) = self.table.commands.get(matched.command.index) else {
            return;
        };
        let suffixes = &matched.command.suffixes;
        match self.config.optional_nodes {
            OptionalNodes::Tracked => self.tree.set_tracked(&spec.keywords, matched.tree_size, suffixes),
            OptionalNodes::Legacy => self.tree.set_legacy(&spec.keywords, suffixes),
        }
        self.previous = *suffixes;
        debug!(
            command = spec.name.as_deref().unwrap_or(&spec.keywords),
            index = matched.command.index,
            tree = self.tree.as_str(),
            "command matched"
        );
    }
}

/// Iterator over the commands of one line; see [`ParserSession::commands`].
#[derive(Debug)]
pub struct Commands<'s, 't, 'a> {
    session: &'s mut ParserSession<'t>,
    line: &'a str,
    offset: usize,
    first: bool,
}

impl<'a> Iterator for Commands<'_, '_, 'a> {
    type Item = Result<ParsedCommand<'a>, CommandError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.line.get(self.offset..)?;
        split_command(rest.as_bytes())?;
        let base = self.offset;
        let (result, end) = self.session.parse_at(rest, self.first);
        self.first = false;
        self.offset += end;
        Some(
            result
                .map(|mut command| {
                    command.span = command.span.offset(base);
                    command
                })
                .map_err(|err| CommandError {
                    span: err.span.offset(base),
                    ..err
                }),
        )
    }
}
