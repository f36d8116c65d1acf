//! Syntax tree for the script subset emitted by Next.js for `_buildManifest.js`.

use std::rc::Rc;

/// Parsed script: the statement list of the implicit wrapper function.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
  /// Top-level statements in source order.
  pub body: Vec<Stmt>,
}

/// Statement forms understood by the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  /// `var`, `let` or `const` declaration list.
  Declare(Vec<Declarator>),
  /// `return` with an optional value.
  Return(Option<Expr>),
  /// Expression statement. A named function expression in this position is a declaration.
  Expr(Expr),
  /// Lone `;`.
  Empty,
}

/// Single `name = init` entry of a declaration list.
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
  /// Declared binding name.
  pub name: String,
  /// Optional initialiser.
  pub init: Option<Expr>,
}

/// Expression forms understood by the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  /// Numeric literal.
  Number(f64),
  /// String literal.
  Str(String),
  /// `true` / `false`.
  Bool(bool),
  /// `null`.
  Null,
  /// Identifier reference.
  Ident(String),
  /// Array literal.
  Array(Vec<Expr>),
  /// Object literal.
  Object(Vec<Property>),
  /// Function or arrow function literal.
  Function(Rc<FunctionDef>),
  /// Property access, both `a.b` and `a[b]`.
  Member {
    /// Object being read.
    object: Box<Expr>,
    /// Property key expression; dotted access is stored as a string literal.
    property: Box<Expr>,
  },
  /// Function call.
  Call {
    /// Called expression.
    callee: Box<Expr>,
    /// Argument expressions.
    args: Vec<Expr>,
  },
  /// Prefix operator.
  Unary(UnaryOp, Box<Expr>),
  /// Arithmetic, relational or equality operator.
  Binary(BinaryOp, Box<Expr>, Box<Expr>),
  /// Short-circuiting operator.
  Logical(LogicalOp, Box<Expr>, Box<Expr>),
  /// `test ? consequent : alternate`.
  Conditional {
    /// Condition.
    test: Box<Expr>,
    /// Value when the condition is truthy.
    consequent: Box<Expr>,
    /// Value when the condition is falsy.
    alternate: Box<Expr>,
  },
  /// `target = value`, where the target is an identifier or member expression.
  Assign {
    /// Assignment target.
    target: Box<Expr>,
    /// Assigned value.
    value: Box<Expr>,
  },
  /// Comma-separated expressions; evaluates to the last one.
  Sequence(Vec<Expr>),
}

impl Expr {
  /// Short source-like rendering used in error messages such as `x.y is not a function`.
  pub fn describe(&self) -> String {
    match self {
      Expr::Ident(name) => name.clone(),
      Expr::Member { object, property } => match property.as_ref() {
        Expr::Str(name) => format!("{}.{}", object.describe(), name),
        _ => format!("{}[...]", object.describe()),
      },
      Expr::Call { callee, .. } => format!("{}(...)", callee.describe()),
      Expr::Function(_) => "function".to_string(),
      _ => "expression".to_string(),
    }
  }
}

/// Key of an object literal property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
  /// Identifier, string or numeric key, already converted to its string form.
  Named(String),
  /// `[expr]` key evaluated at runtime.
  Computed(Expr),
}

/// Object literal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
  /// Property key.
  pub key: PropertyKey,
  /// Property value.
  pub value: Expr,
}

/// Shared definition of a function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
  /// Optional function name.
  pub name: Option<String>,
  /// Parameter names in order.
  pub params: Vec<String>,
  /// Function body.
  pub body: FunctionBody,
}

/// Body of a function literal.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
  /// `{ ... }` statement block.
  Block(Vec<Stmt>),
  /// Concise arrow body.
  Expr(Box<Expr>),
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Not,
  Negate,
  Plus,
  TypeOf,
  Void,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Lt,
  LtEq,
  Gt,
  GtEq,
  Eq,
  NotEq,
  StrictEq,
  StrictNotEq,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
  And,
  Or,
  Coalesce,
}
