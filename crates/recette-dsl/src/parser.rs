use chumsky::error::RichPattern;
use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use recette_core::LineIndex;

use crate::ast::*;
use crate::lexer::Token;

/// Syntax error in the assembler grammar.
///
/// Aborts the statement it occurs in; parsing resumes on the next line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: expected {}, found {}", describe_expected(.expected), .found.as_deref().unwrap_or("end of line"))]
pub struct SyntaxError {
    /// Location of the offending token.
    pub span: Span,
    /// What the parser would have accepted, sorted.
    pub expected: Vec<String>,
    /// The token found instead; `None` at the end of a line.
    pub found: Option<String>,
    /// One-based line number.
    pub line: usize,
}

fn describe_expected(expected: &[String]) -> String {
    match expected {
        [] => "something else".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

impl SyntaxError {
    fn from_rich(index: &LineIndex<'_>, error: &Rich<'_, Token>) -> Self {
        let span = index.span_of_offsets(error.span().into_range());
        let mut expected: Vec<String> = error
            .expected()
            .map(|pattern| match pattern {
                RichPattern::Token(token) => Token::to_string(token),
                RichPattern::Label(label) => label.to_string(),
                RichPattern::EndOfInput => "end of line".to_string(),
                other => other.to_string(),
            })
            .collect();
        expected.sort();
        expected.dedup();
        Self {
            span,
            expected,
            found: error.found().map(Token::to_string),
            line: span.start.line as usize + 1,
        }
    }
}

fn binary(op: BinaryOp, left: Spanned<Expression>, right: Spanned<Expression>) -> Spanned<Expression> {
    let span = left.span.merge(right.span);
    Spanned::new(
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

/// Build the parser for one line: any number of labels, then at most one
/// statement.
///
/// Token spans are character offsets; `index` turns them into positions.
fn line_parser<'a, I>(
    index: &'a LineIndex<'a>,
) -> impl Parser<'a, I, Vec<Spanned<Statement>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let to_span = move |s: SimpleSpan| index.span_of_offsets(s.into_range());

    let ident = select! { Token::Ident(name) => name }
        .labelled("identifier")
        .map_with(move |name, e| Spanned::new(name, to_span(e.span())));

    // -- Expressions --

    let atom = select! {
        Token::Ident(name) => Expression::Var(name),
        Token::Integer(value, _) => Expression::Integer(value),
        Token::Char(c) => Expression::Integer(i64::from(u32::from(c))),
        Token::Str(s) => Expression::String(s),
    }
    .labelled("expression")
    .map_with(move |expr, e| Spanned::new(expr, to_span(e.span())));

    let unary = recursive(|unary| {
        just(Token::Minus)
            .ignore_then(unary)
            .map_with(move |operand: Spanned<Expression>, e| {
                Spanned::new(
                    Expression::Unary {
                        op: UnaryOp::Negate,
                        operand: Box::new(operand),
                    },
                    to_span(e.span()),
                )
            })
            .or(atom)
    });

    let product = unary.clone().foldl(
        just(Token::Times).ignore_then(unary).repeated(),
        |left, right| binary(BinaryOp::Mul, left, right),
    );

    let additive = choice((
        just(Token::Plus).to(BinaryOp::Add),
        just(Token::Minus).to(BinaryOp::Sub),
    ));
    let expr = product
        .clone()
        .foldl(additive.then(product).repeated(), |left, (op, right)| {
            binary(op, left, right)
        });

    // -- Operands --

    let register = ident
        .clone()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let operand = recursive(|operand| {
        let immediate = just(Token::Sharp)
            .ignore_then(expr.clone())
            .map(Operand::Immediate);

        let deferred = register
            .clone()
            .then(just(Token::Plus).or_not())
            .map(|(register, plus)| match plus {
                Some(_) => Operand::PostIncrement(register),
                None => Operand::Indirect {
                    register,
                    displacement: None,
                },
            });

        let pre_decrement = just(Token::Minus)
            .ignore_then(register.clone())
            .map(Operand::PreDecrement);

        let double = just(Token::At)
            .ignore_then(operand)
            .map(|inner: Spanned<Operand>| Operand::DoubleIndirect(Box::new(inner)));

        let indexed = expr
            .clone()
            .then(register.clone().or_not())
            .map(|(value, register)| match register {
                Some(register) => Operand::Indirect {
                    register,
                    displacement: Some(value),
                },
                None => Operand::Absolute(value),
            });

        choice((immediate, deferred, pre_decrement, double, indexed))
            .map_with(move |op, e| Spanned::new(op, to_span(e.span())))
            .labelled("operand")
    });

    // -- Statements --

    let label = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .map_with(move |name, e| Spanned::new(Statement::Label(Label { name }), to_span(e.span())));

    let assignment = ident
        .clone()
        .then_ignore(just(Token::Equals))
        .then(expr)
        .map(|(name, value)| Statement::Assignment(Assignment { name, value }));

    let operands = operand
        .clone()
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>();

    let instruction = ident.then(operands).map(|(name, operands)| {
        match DirectiveKind::from_name(&name.node) {
            Some(kind) => Statement::Directive(Directive {
                kind,
                keyword: name.span,
                operands,
            }),
            None => Statement::Instruction(Instruction {
                mnemonic: Some(name),
                operands,
            }),
        }
    });

    let bare = operand.map(|operand| {
        Statement::Instruction(Instruction {
            mnemonic: None,
            operands: vec![operand],
        })
    });

    // An instruction must run to the end of the line; otherwise the line is
    // retried as a single operand (`LOC+2`).
    let statement = choice((assignment, instruction.then_ignore(end().rewind()), bare))
        .map_with(move |statement, e| Spanned::new(statement, to_span(e.span())));

    label
        .repeated()
        .collect::<Vec<_>>()
        .then(statement.or_not())
        .then_ignore(end())
        .map(|(mut statements, statement)| {
            statements.extend(statement);
            statements
        })
}

fn parse_line(
    index: &LineIndex<'_>,
    line: &[(Token, Span)],
) -> Result<Vec<Spanned<Statement>>, SyntaxError> {
    let token_iter = line
        .iter()
        .map(|(tok, span)| (tok.clone(), SimpleSpan::from(span.offsets())));

    let end = line.last().map_or(0, |(_, span)| span.end.offset);
    let eoi = SimpleSpan::from(end..end);
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = line_parser(index).parse(stream).into_output_errors();

    match errors.first() {
        Some(error) => Err(SyntaxError::from_rich(index, error)),
        None => Ok(output.unwrap_or_default()),
    }
}

/// Parse a token stream leniently: a line that fails to parse is reported
/// and skipped, and parsing resumes on the next line.
pub fn parse(index: &LineIndex<'_>, tokens: &[(Token, Span)]) -> (Program, Vec<SyntaxError>) {
    let mut statements = Vec::new();
    let mut errors = Vec::new();

    for line in tokens.split(|(token, _)| matches!(token, Token::Eol | Token::Eof)) {
        if line.is_empty() {
            continue;
        }
        match parse_line(index, line) {
            Ok(mut parsed) => statements.append(&mut parsed),
            Err(error) => errors.push(error),
        }
    }

    (Program { statements }, errors)
}

/// Parse a token stream, failing on the first syntax error.
pub fn parse_strict(index: &LineIndex<'_>, tokens: &[(Token, Span)]) -> Result<Program, SyntaxError> {
    let (program, errors) = parse(index, tokens);
    match errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(program),
    }
}
