//! Reference extraction
//!
//! Extraction runs in two passes over the token stream:
//!
//! 1. Every cell, range and column reference is collected in text order,
//!    wherever it appears, including inside function arguments.
//! 2. Lookup calls are located and their arguments inspected, innermost
//!    call first. A reference keeps the first role it is given.
//!
//! Fragments that look like references but cannot be one (reversed ranges,
//! a cell joined to a whole column) are skipped and logged at `debug`.

use std::ops::Range;

use ahash::AHashSet;
use sheet_trace_core::ColumnId;
use tracing::debug;

use crate::reference::{LookupRole, Reference, ReferenceKind};
use crate::tokenizer::{tokenize, Token, TokenKind};

/// Every reference occurrence in `formula`, in text order, with lookup roles
/// assigned. Occurrences are not de-duplicated, so each span can be rewritten.
pub fn scan(formula: &str) -> Vec<Reference> {
    let tokens = tokenize(formula);
    let mut found = collect_references(formula, &tokens);
    assign_lookup_roles(&tokens, &mut found);
    found.into_iter().map(|o| o.reference).collect()
}

/// The distinct references in `formula`, first occurrence first.
///
/// Two occurrences are the same reference when they point at the same sheet
/// (resolved against `current_sheet`), cover the same columns and have the
/// same kind. The first occurrence's role wins.
///
/// # Example
/// ```
/// use sheet_trace_formula::{extract, LookupRole};
///
/// let refs = extract("=VLOOKUP(A2,Rates!A:B,2,FALSE)+A3", "Orders");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].role, LookupRole::LookupValue);
/// assert_eq!(refs[1].role, LookupRole::LookupTable { result_offset: Some(2) });
/// ```
pub fn extract(formula: &str, current_sheet: &str) -> Vec<Reference> {
    dedup(scan(formula), current_sheet)
}

/// Drop repeats from `references`, keeping the first occurrence of each.
///
/// Callers that discard some occurrences (by role, say) should do so before
/// calling this, so a dropped occurrence cannot hide a kept one.
pub fn dedup(references: Vec<Reference>, current_sheet: &str) -> Vec<Reference> {
    let mut seen: AHashSet<(String, Vec<ColumnId>, ReferenceKind)> = AHashSet::new();
    references
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.target_sheet(current_sheet).to_string(),
                r.columns.clone(),
                r.kind,
            ))
        })
        .collect()
}

/// A reference plus the tokens it was read from
struct Occurrence {
    reference: Reference,
    tokens: Range<usize>,
}

enum Address {
    Found {
        kind: ReferenceKind,
        columns: Vec<ColumnId>,
        row: Option<u32>,
        end: usize,
    },
    Malformed {
        end: usize,
    },
    None,
}

fn collect_references(formula: &str, tokens: &[Token]) -> Vec<Occurrence> {
    let mut found = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let (sheet, start) = match &tokens[i].kind {
            TokenKind::SheetPrefix(name) => (Some(name.clone()), i + 1),
            _ => (None, i),
        };

        match read_address(tokens, start) {
            Address::Found {
                kind,
                columns,
                row,
                end,
            } => {
                let last = tokens[end - 1].span.end;
                found.push(Occurrence {
                    reference: Reference {
                        sheet,
                        kind,
                        columns,
                        role: LookupRole::None,
                        row,
                        span: tokens[i].span.start..last,
                        address_span: tokens[start].span.start..last,
                    },
                    tokens: i..end,
                });
                i = end;
            }
            Address::Malformed { end } => {
                let fragment = &formula[tokens[i].span.start..tokens[end - 1].span.end];
                debug!(fragment, "skipping malformed range");
                i = end;
            }
            Address::None => {
                if let Some(sheet) = sheet {
                    debug!(%sheet, "sheet qualifier without a reference");
                }
                i += 1;
            }
        }
    }

    found
}

fn read_address(tokens: &[Token], at: usize) -> Address {
    let first = match tokens.get(at) {
        Some(token) => &token.kind,
        None => return Address::None,
    };
    let range_end = match (tokens.get(at + 1), tokens.get(at + 2)) {
        (
            Some(Token {
                kind: TokenKind::Colon,
                ..
            }),
            Some(end),
        ) => Some(&end.kind),
        _ => None,
    };

    match (first, range_end) {
        (TokenKind::Cell { col: start, row }, Some(TokenKind::Cell { col: end, .. })) => {
            range(*start, *end, ReferenceKind::CellRange, Some(*row), at + 3)
        }
        (TokenKind::Column { col: start, .. }, Some(TokenKind::Column { col: end, .. })) => {
            range(*start, *end, ReferenceKind::ColumnRange, None, at + 3)
        }
        (TokenKind::Cell { .. }, Some(TokenKind::Column { .. }))
        | (TokenKind::Column { .. }, Some(TokenKind::Cell { .. })) => {
            Address::Malformed { end: at + 3 }
        }
        (TokenKind::Cell { col, row }, _) => Address::Found {
            kind: ReferenceKind::Cell,
            columns: vec![*col],
            row: Some(*row),
            end: at + 1,
        },
        (TokenKind::Column { col, explicit: true }, _) => Address::Found {
            kind: ReferenceKind::Cell,
            columns: vec![*col],
            row: None,
            end: at + 1,
        },
        _ => Address::None,
    }
}

fn range(
    start: ColumnId,
    end: ColumnId,
    kind: ReferenceKind,
    row: Option<u32>,
    end_token: usize,
) -> Address {
    match start.span_to(end) {
        Some(columns) => Address::Found {
            kind,
            columns,
            row,
            end: end_token,
        },
        None => Address::Malformed { end: end_token },
    }
}

// === Lookup roles ===

/// A function call and its top-level argument token ranges
struct Call {
    name: String,
    depth: usize,
    tokens: Range<usize>,
    args: Vec<Range<usize>>,
}

fn find_calls(tokens: &[Token]) -> Vec<Call> {
    let mut calls: Vec<Call> = Vec::new();
    // One entry per open paren: the call it belongs to, if any
    let mut stack: Vec<Option<usize>> = Vec::new();
    let mut arg_starts: Vec<usize> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Function(name) => {
                calls.push(Call {
                    name: name.clone(),
                    depth: stack.len(),
                    tokens: i..tokens.len(),
                    args: Vec::new(),
                });
                arg_starts.push(i + 2);
            }
            TokenKind::LeftParen => {
                let opens_call = i > 0 && matches!(tokens[i - 1].kind, TokenKind::Function(_));
                stack.push(opens_call.then(|| calls.len() - 1));
            }
            TokenKind::Comma | TokenKind::Semicolon => {
                if let Some(Some(idx)) = stack.last() {
                    calls[*idx].args.push(arg_starts[*idx]..i);
                    arg_starts[*idx] = i + 1;
                }
            }
            TokenKind::RightParen => {
                if let Some(Some(idx)) = stack.pop() {
                    calls[idx].args.push(arg_starts[idx]..i);
                    calls[idx].tokens.end = i + 1;
                }
            }
            _ => {}
        }
    }

    // Unclosed calls run to the end of the formula
    for idx in stack.into_iter().flatten() {
        let start = arg_starts[idx].min(tokens.len());
        calls[idx].args.push(start..tokens.len());
    }

    calls
}

fn assign_lookup_roles(tokens: &[Token], found: &mut [Occurrence]) {
    let calls = find_calls(tokens);

    let mut order: Vec<&Call> = calls.iter().collect();
    order.sort_by(|a, b| b.depth.cmp(&a.depth));

    for call in order {
        match call.name.as_str() {
            "VLOOKUP" => assign_vlookup(tokens, call, found),
            "INDEX" => {
                let has_match = calls.iter().any(|c| {
                    c.name == "MATCH"
                        && c.tokens.start > call.tokens.start
                        && c.tokens.end <= call.tokens.end
                });
                if has_match {
                    assign_index_match(tokens, call, found);
                }
            }
            _ => {}
        }
    }
}

/// `VLOOKUP(value, table, col_index, ...)`
fn assign_vlookup(tokens: &[Token], call: &Call, found: &mut [Occurrence]) {
    if let Some(value_arg) = call.args.first() {
        for occurrence in found.iter_mut() {
            if within(&occurrence.tokens, value_arg) && occurrence.reference.role == LookupRole::None
            {
                occurrence.reference.role = LookupRole::LookupValue;
            }
        }
    }

    let offset = call.args.get(2).and_then(|arg| integer_literal(tokens, arg));
    if let Some(table) = call.args.get(1).and_then(|arg| sole_reference(found, arg)) {
        mark_table(&mut found[table], offset);
    }
}

/// `INDEX(array, MATCH(...), [col])`
fn assign_index_match(tokens: &[Token], call: &Call, found: &mut [Occurrence]) {
    let Some(table) = call.args.first().and_then(|arg| sole_reference(found, arg)) else {
        return;
    };
    let single_column = found[table].reference.columns.len() == 1;
    let offset = call
        .args
        .get(2)
        .and_then(|arg| integer_literal(tokens, arg))
        .or_else(|| single_column.then_some(1));
    mark_table(&mut found[table], offset);
}

fn mark_table(occurrence: &mut Occurrence, result_offset: Option<u32>) {
    if occurrence.reference.role == LookupRole::None {
        occurrence.reference.role = LookupRole::LookupTable { result_offset };
    }
}

fn within(inner: &Range<usize>, outer: &Range<usize>) -> bool {
    inner.start >= outer.start && inner.end <= outer.end
}

/// The occurrence that makes up the whole of `arg`, if there is exactly one
fn sole_reference(found: &[Occurrence], arg: &Range<usize>) -> Option<usize> {
    found.iter().position(|o| o.tokens == *arg)
}

/// A whole-number literal >= 1 making up the whole of `arg`
fn integer_literal(tokens: &[Token], arg: &Range<usize>) -> Option<u32> {
    if arg.len() != 1 {
        return None;
    }
    match tokens.get(arg.start)?.kind {
        TokenKind::Number(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
            Some(n as u32)
        }
        _ => None,
    }
}
