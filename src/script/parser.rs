//! Parser for the script subset, built from `chumsky` combinators directly over characters.
//!
//! Every token parser consumes its own trailing whitespace and comments, so the program
//! parser only strips leading trivia once before the first statement.

use std::rc::Rc;

use chumsky::prelude::*;

use super::error::ScriptError;
use super::syntax::{
  BinaryOp, Declarator, Expr, FunctionBody, FunctionDef, LogicalOp, Program, Property,
  PropertyKey, Stmt, UnaryOp,
};
use super::value::number_to_string;

type Extra<'a> = extra::Err<Rich<'a, char>>;
type ExprParser<'a> = Boxed<'a, 'a, &'a str, Expr, Extra<'a>>;

const RESERVED_WORDS: &[&str] = &[
  "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
  "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
  "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
  "typeof", "var", "void", "while", "with", "yield",
];

/// Deepest nesting [`parse_program`] accepts: one level per open bracket plus one per operator
/// chained at the same bracket level.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse script source into a [`Program`].
///
/// Input nested deeper than [`MAX_NESTING_DEPTH`] fails with a `RangeError` before parsing.
pub fn parse_program(source: &str) -> Result<Program, ScriptError> {
  check_nesting(source)?;
  program().parse(source).into_result().map_err(|errors| {
    match errors.into_iter().next() {
      Some(error) => {
        let (line, column) = line_column(source, error.span().into_range().start);
        ScriptError::Syntax {
          message: error.reason().to_string(),
          line,
          column,
        }
      }
      None => ScriptError::Syntax {
        message: "unexpected input".to_string(),
        line: 1,
        column: 1,
      },
    }
  })
}

/// Open bracket levels, each with the operators chained since its last separator.
struct Nesting {
  chains: Vec<usize>,
  depth: usize,
}

impl Nesting {
  fn open(&mut self) {
    self.chains.push(0);
    self.depth += 1;
  }

  fn close(&mut self) {
    if self.chains.len() > 1 {
      if let Some(chain) = self.chains.pop() {
        self.depth -= 1 + chain;
      }
    }
  }

  fn chain(&mut self) {
    if let Some(chain) = self.chains.last_mut() {
      *chain += 1;
      self.depth += 1;
    }
  }

  fn separate(&mut self) {
    if let Some(chain) = self.chains.last_mut() {
      self.depth -= *chain;
      *chain = 0;
    }
  }
}

/// Scan for nesting that would run the recursive parser out of stack.
///
/// Strings and comments are skipped. A line break between the end of one operand and the
/// start of another separates statements the same way `;` does.
fn check_nesting(source: &str) -> Result<(), ScriptError> {
  let mut nesting = Nesting {
    chains: vec![0],
    depth: 1,
  };
  let mut ends_operand = false;
  let mut line_break = false;
  let mut chars = source.chars().peekable();

  while let Some(c) = chars.next() {
    if matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
      line_break = true;
      continue;
    }
    if c.is_whitespace() {
      continue;
    }
    if c == '/' && chars.peek() == Some(&'/') {
      while chars.next_if(|next| *next != '\n').is_some() {}
      continue;
    }
    if c == '/' && chars.peek() == Some(&'*') {
      chars.next();
      let mut previous = '\0';
      for next in chars.by_ref() {
        if next == '\n' {
          line_break = true;
        }
        if previous == '*' && next == '/' {
          break;
        }
        previous = next;
      }
      continue;
    }

    let word_start = c.is_alphanumeric() || c == '_' || c == '$';
    if line_break && ends_operand && (word_start || c == '"' || c == '\'') {
      nesting.separate();
    }
    line_break = false;

    match c {
      '"' | '\'' => {
        while let Some(next) = chars.next() {
          if next == '\\' {
            chars.next();
          } else if next == c || next == '\n' {
            break;
          }
        }
        ends_operand = true;
      }
      '(' | '[' | '{' => {
        nesting.open();
        ends_operand = false;
      }
      ')' | ']' | '}' => {
        nesting.close();
        ends_operand = true;
      }
      ',' | ';' => {
        nesting.separate();
        ends_operand = false;
      }
      ':' => ends_operand = false,
      _ if word_start => {
        let mut word = String::from(c);
        while let Some(next) = chars.next_if(|next| {
          next.is_alphanumeric() || *next == '_' || *next == '$' || (c.is_ascii_digit() && *next == '.')
        }) {
          word.push(next);
        }
        match word.as_str() {
          "var" | "let" | "const" | "return" => {
            nesting.separate();
            ends_operand = false;
          }
          "typeof" | "void" => {
            nesting.chain();
            ends_operand = false;
          }
          _ => ends_operand = true,
        }
      }
      _ => {
        nesting.chain();
        ends_operand = false;
      }
    }

    if nesting.depth > MAX_NESTING_DEPTH {
      return Err(ScriptError::Range(
        "Maximum call stack size exceeded".to_string(),
      ));
    }
  }
  Ok(())
}

fn line_column(source: &str, offset: usize) -> (usize, usize) {
  let before = source.get(..offset).unwrap_or(source);
  let line = before.matches('\n').count() + 1;
  let column = before
    .rsplit('\n')
    .next()
    .map_or(0, |tail| tail.chars().count())
    + 1;
  (line, column)
}

fn program<'a>() -> impl Parser<'a, &'a str, Program, Extra<'a>> {
  let assign = expression().boxed();
  let sequence = sequence_of(assign.clone());
  trivia()
    .ignore_then(statements(assign, sequence))
    .then_ignore(end())
    .map(|body| Program { body })
}

fn trivia<'a>() -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
  let whitespace = any()
    .filter(|c: &char| c.is_whitespace() || *c == '\u{feff}')
    .repeated()
    .at_least(1)
    .ignored();
  let line_comment = just("//").then(none_of("\n\r").repeated()).ignored();
  let block_comment = just("/*")
    .then(any().and_is(just("*/").not()).repeated())
    .then(just("*/"))
    .ignored();

  choice((whitespace, line_comment, block_comment))
    .repeated()
    .ignored()
}

fn lexeme<'a, O, P>(parser: P) -> impl Parser<'a, &'a str, O, Extra<'a>> + Clone
where
  P: Parser<'a, &'a str, O, Extra<'a>> + Clone,
{
  parser.then_ignore(trivia())
}

fn symbol<'a>(text: &'static str) -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
  lexeme(just(text).ignored())
}

/// Operator token that must not be the prefix of a longer operator.
fn operator<'a>(
  text: &'static str,
  not_followed_by: &'static str,
) -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
  lexeme(just(text).then_ignore(one_of(not_followed_by).not()).ignored())
}

fn identifier_name<'a>() -> impl Parser<'a, &'a str, &'a str, Extra<'a>> + Clone {
  any()
    .filter(|c: &char| c.is_alphabetic() || *c == '_' || *c == '$')
    .then(
      any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_' || *c == '$')
        .repeated(),
    )
    .to_slice()
}

fn keyword<'a>(word: &'static str) -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
  lexeme(
    identifier_name()
      .filter(move |name: &&str| *name == word)
      .ignored(),
  )
}

fn binding<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
  lexeme(identifier_name().try_map(|name: &str, span| {
    if RESERVED_WORDS.contains(&name) {
      Err(Rich::custom(span, format!("unexpected keyword '{name}'")))
    } else {
      Ok(name.to_string())
    }
  }))
}

/// Fragment of a string literal before surrogate pairs are joined.
#[derive(Clone, Copy)]
enum Piece {
  Char(char),
  Unit(u32),
  Nothing,
}

fn string_literal<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
  let hex_digits = |count: usize| {
    any()
      .filter(char::is_ascii_hexdigit)
      .repeated()
      .exactly(count)
      .to_slice()
      .map(|digits: &str| Piece::Unit(u32::from_str_radix(digits, 16).unwrap_or(0xFFFD)))
  };
  let braced_code_point = any()
    .filter(char::is_ascii_hexdigit)
    .repeated()
    .at_least(1)
    .at_most(6)
    .to_slice()
    .delimited_by(just('{'), just('}'))
    .map(|digits: &str| Piece::Unit(u32::from_str_radix(digits, 16).unwrap_or(0xFFFD)));

  let escape = just('\\').ignore_then(choice((
    just('\r').then(just('\n').or_not()).to(Piece::Nothing),
    just('\n').to(Piece::Nothing),
    just('u').ignore_then(braced_code_point.or(hex_digits(4))),
    just('x').ignore_then(hex_digits(2)),
    just('n').to(Piece::Char('\n')),
    just('t').to(Piece::Char('\t')),
    just('r').to(Piece::Char('\r')),
    just('b').to(Piece::Char('\u{8}')),
    just('f').to(Piece::Char('\u{c}')),
    just('v').to(Piece::Char('\u{b}')),
    just('0').to(Piece::Char('\0')),
    any().map(Piece::Char),
  )));

  let quoted = |quote: char, forbidden: &'static str| {
    none_of(forbidden)
      .map(Piece::Char)
      .or(escape.clone())
      .repeated()
      .collect::<Vec<_>>()
      .delimited_by(just(quote), just(quote))
      .map(assemble)
  };

  choice((quoted('"', "\\\"\n"), quoted('\'', "\\'\n")))
}

fn assemble(pieces: Vec<Piece>) -> String {
  let mut text = String::with_capacity(pieces.len());
  let mut pending_high: Option<u32> = None;
  for piece in pieces {
    let unit = match piece {
      Piece::Nothing => continue,
      Piece::Char(c) => {
        if pending_high.take().is_some() {
          text.push(char::REPLACEMENT_CHARACTER);
        }
        text.push(c);
        continue;
      }
      Piece::Unit(unit) => unit,
    };
    match (pending_high.take(), unit) {
      (Some(high), 0xDC00..=0xDFFF) => {
        let combined = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
        text.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
      }
      (previous, 0xD800..=0xDBFF) => {
        if previous.is_some() {
          text.push(char::REPLACEMENT_CHARACTER);
        }
        pending_high = Some(unit);
      }
      (previous, _) => {
        if previous.is_some() {
          text.push(char::REPLACEMENT_CHARACTER);
        }
        text.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
      }
    }
  }
  if pending_high.is_some() {
    text.push(char::REPLACEMENT_CHARACTER);
  }
  text
}

fn number_literal<'a>() -> impl Parser<'a, &'a str, f64, Extra<'a>> + Clone {
  let digits = any().filter(char::is_ascii_digit).repeated().at_least(1);

  let hex = just('0')
    .then(one_of("xX"))
    .ignore_then(
      any()
        .filter(char::is_ascii_hexdigit)
        .repeated()
        .at_least(1)
        .to_slice(),
    )
    .map(|digits: &str| {
      digits
        .chars()
        .fold(0.0, |acc, c| acc * 16.0 + f64::from(c.to_digit(16).unwrap_or(0)))
    });

  let exponent = one_of("eE")
    .then(one_of("+-").or_not())
    .then(digits.clone());
  let decimal = choice((
    digits
      .clone()
      .then(just('.').then(digits.clone().or_not()).or_not())
      .ignored(),
    just('.').then(digits.clone()).ignored(),
  ))
  .then(exponent.or_not())
  .to_slice()
  .try_map(|text: &str, span| {
    text
      .parse::<f64>()
      .map_err(|err| Rich::custom(span, format!("invalid number '{text}': {err}")))
  });

  choice((hex, decimal)).then_ignore(
    any()
      .filter(|c: &char| c.is_alphanumeric() || *c == '_' || *c == '$')
      .not(),
  )
}

fn sequence_of<'a>(assign: ExprParser<'a>) -> ExprParser<'a> {
  assign
    .separated_by(symbol(","))
    .at_least(1)
    .collect::<Vec<_>>()
    .map(|mut items| {
      if items.len() == 1 {
        items.remove(0)
      } else {
        Expr::Sequence(items)
      }
    })
    .boxed()
}

fn statements<'a>(
  assign: ExprParser<'a>,
  sequence: ExprParser<'a>,
) -> impl Parser<'a, &'a str, Vec<Stmt>, Extra<'a>> + Clone {
  let declarator = binding()
    .then(operator("=", "=>").ignore_then(assign).or_not())
    .map(|(name, init)| Declarator { name, init });
  let declaration = choice((keyword("var"), keyword("let"), keyword("const")))
    .ignore_then(
      declarator
        .separated_by(symbol(","))
        .at_least(1)
        .collect::<Vec<_>>(),
    )
    .map(Stmt::Declare);
  let ret = keyword("return")
    .ignore_then(sequence.clone().or_not())
    .map(Stmt::Return);
  let statement = choice((declaration, ret, sequence.map(Stmt::Expr)));

  choice((
    statement.then_ignore(symbol(";").or_not()),
    symbol(";").to(Stmt::Empty),
  ))
  .repeated()
  .collect::<Vec<_>>()
}

enum Postfix {
  Member(Expr),
  Call(Vec<Expr>),
}

fn binary_level<'a>(
  operand: ExprParser<'a>,
  operators: impl Parser<'a, &'a str, BinaryOp, Extra<'a>> + Clone + 'a,
) -> ExprParser<'a> {
  operand
    .clone()
    .foldl(operators.then(operand).repeated(), |lhs, (op, rhs)| {
      Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    })
    .boxed()
}

fn logical_level<'a>(
  operand: ExprParser<'a>,
  operators: impl Parser<'a, &'a str, LogicalOp, Extra<'a>> + Clone + 'a,
) -> ExprParser<'a> {
  operand
    .clone()
    .foldl(operators.then(operand).repeated(), |lhs, (op, rhs)| {
      Expr::Logical(op, Box::new(lhs), Box::new(rhs))
    })
    .boxed()
}

/// Parser for a single assignment-level expression (no top-level comma).
fn expression<'a>() -> impl Parser<'a, &'a str, Expr, Extra<'a>> + Clone {
  recursive(|assign| {
    let assign: ExprParser<'a> = assign.boxed();
    let sequence = sequence_of(assign.clone());
    let block = statements(assign.clone(), sequence.clone())
      .delimited_by(symbol("{"), symbol("}"))
      .boxed();

    let params = binding()
      .separated_by(symbol(","))
      .allow_trailing()
      .collect::<Vec<_>>()
      .delimited_by(symbol("("), symbol(")"));

    let function = keyword("function")
      .ignore_then(binding().or_not())
      .then(params.clone())
      .then(block.clone())
      .map(|((name, params), body)| {
        Expr::Function(Rc::new(FunctionDef {
          name,
          params,
          body: FunctionBody::Block(body),
        }))
      });

    let arrow = choice((binding().map(|name| vec![name]), params))
      .then_ignore(symbol("=>"))
      .then(choice((
        block.map(FunctionBody::Block),
        assign.clone().map(|body| FunctionBody::Expr(Box::new(body))),
      )))
      .map(|(params, body)| {
        Expr::Function(Rc::new(FunctionDef {
          name: None,
          params,
          body,
        }))
      });

    let literal = choice((
      keyword("true").to(Expr::Bool(true)),
      keyword("false").to(Expr::Bool(false)),
      keyword("null").to(Expr::Null),
      lexeme(number_literal()).map(Expr::Number),
      lexeme(string_literal()).map(Expr::Str),
    ));

    let array = assign
      .clone()
      .separated_by(symbol(","))
      .allow_trailing()
      .collect::<Vec<_>>()
      .delimited_by(symbol("["), symbol("]"))
      .map(Expr::Array);

    let property_key = choice((
      lexeme(identifier_name()).map(|name: &str| PropertyKey::Named(name.to_string())),
      lexeme(string_literal()).map(PropertyKey::Named),
      lexeme(number_literal()).map(|number| PropertyKey::Named(number_to_string(number))),
      assign
        .clone()
        .delimited_by(symbol("["), symbol("]"))
        .map(PropertyKey::Computed),
    ));
    let property = choice((
      property_key
        .then_ignore(symbol(":"))
        .then(assign.clone())
        .map(|(key, value)| Property { key, value }),
      binding().map(|name| Property {
        key: PropertyKey::Named(name.clone()),
        value: Expr::Ident(name),
      }),
    ));
    let object = property
      .separated_by(symbol(","))
      .allow_trailing()
      .collect::<Vec<_>>()
      .delimited_by(symbol("{"), symbol("}"))
      .map(Expr::Object);

    let primary = choice((
      arrow,
      function,
      literal,
      array,
      object,
      sequence.clone().delimited_by(symbol("("), symbol(")")),
      binding().map(Expr::Ident),
    ))
    .boxed();

    let arguments = assign
      .clone()
      .separated_by(symbol(","))
      .allow_trailing()
      .collect::<Vec<_>>()
      .delimited_by(symbol("("), symbol(")"));
    let postfix = choice((
      symbol(".")
        .ignore_then(lexeme(identifier_name()))
        .map(|name: &str| Postfix::Member(Expr::Str(name.to_string()))),
      sequence
        .clone()
        .delimited_by(symbol("["), symbol("]"))
        .map(Postfix::Member),
      arguments.map(Postfix::Call),
    ));
    let call = primary
      .foldl(postfix.repeated(), |expr, postfix| match postfix {
        Postfix::Member(property) => Expr::Member {
          object: Box::new(expr),
          property: Box::new(property),
        },
        Postfix::Call(args) => Expr::Call {
          callee: Box::new(expr),
          args,
        },
      })
      .boxed();

    let unary_operator = choice((
      symbol("!").to(UnaryOp::Not),
      operator("-", "-").to(UnaryOp::Negate),
      operator("+", "+").to(UnaryOp::Plus),
      keyword("typeof").to(UnaryOp::TypeOf),
      keyword("void").to(UnaryOp::Void),
    ));
    let unary = unary_operator
      .repeated()
      .foldr(call, |op, operand| Expr::Unary(op, Box::new(operand)))
      .boxed();

    let multiplicative = binary_level(
      unary,
      choice((
        operator("*", "=*").to(BinaryOp::Mul),
        operator("/", "=").to(BinaryOp::Div),
        operator("%", "=").to(BinaryOp::Rem),
      )),
    );
    let additive = binary_level(
      multiplicative,
      choice((
        operator("+", "+=").to(BinaryOp::Add),
        operator("-", "-=").to(BinaryOp::Sub),
      )),
    );
    let relational = binary_level(
      additive,
      choice((
        symbol("<=").to(BinaryOp::LtEq),
        symbol(">=").to(BinaryOp::GtEq),
        operator("<", "<=").to(BinaryOp::Lt),
        operator(">", ">=").to(BinaryOp::Gt),
      )),
    );
    let equality = binary_level(
      relational,
      choice((
        symbol("===").to(BinaryOp::StrictEq),
        symbol("!==").to(BinaryOp::StrictNotEq),
        symbol("==").to(BinaryOp::Eq),
        symbol("!=").to(BinaryOp::NotEq),
      )),
    );
    let logical_and = logical_level(equality, symbol("&&").to(LogicalOp::And));
    let logical_or = logical_level(
      logical_and,
      choice((
        symbol("||").to(LogicalOp::Or),
        symbol("??").to(LogicalOp::Coalesce),
      )),
    );

    let conditional = logical_or
      .then(
        operator("?", "?.")
          .ignore_then(assign.clone())
          .then_ignore(symbol(":"))
          .then(assign.clone())
          .or_not(),
      )
      .map(|(test, branches)| match branches {
        Some((consequent, alternate)) => Expr::Conditional {
          test: Box::new(test),
          consequent: Box::new(consequent),
          alternate: Box::new(alternate),
        },
        None => test,
      });

    conditional
      .then(operator("=", "=>").ignore_then(assign).or_not())
      .try_map(|(target, value), span| match value {
        None => Ok(target),
        Some(value) => match target {
          Expr::Ident(_) | Expr::Member { .. } => Ok(Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
          }),
          _ => Err(Rich::custom(span, "Invalid left-hand side in assignment")),
        },
      })
  })
}
