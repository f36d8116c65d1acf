//! Tree-walking interpreter over an isolated scope chain.
//!
//! An [`Interpreter`] is a disposable execution context: its global scope is private to it,
//! and every scope, array and object it allocates is cleared when it is dropped so that
//! reference cycles created by the script do not outlive the evaluation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::error::ScriptError;
use super::syntax::{
  BinaryOp, Expr, FunctionBody, FunctionDef, LogicalOp, Program, PropertyKey, Stmt, UnaryOp,
};
use super::value::{Closure, MAX_STRING_LENGTH, Object, Value, array_index};

/// Array slots one context may add through index and `length` writes. Arrays are stored densely.
pub const MAX_ARRAY_GROWTH: usize = 1 << 20;
/// Deepest expression evaluation, counted across nested calls.
pub const MAX_EVALUATION_DEPTH: usize = 4096;

/// Lexical scope holding variable bindings.
#[derive(Default)]
pub struct Scope {
  vars: RefCell<HashMap<String, Value>>,
  parent: Option<Rc<Scope>>,
}

impl Scope {
  /// Create or overwrite a binding in this scope.
  pub fn declare(&self, name: impl Into<String>, value: Value) {
    self.vars.borrow_mut().insert(name.into(), value);
  }

  /// Whether this scope itself (not a parent) has the binding.
  pub fn has_own(&self, name: &str) -> bool {
    self.vars.borrow().contains_key(name)
  }

  /// Resolve a binding through the scope chain.
  pub fn lookup(&self, name: &str) -> Option<Value> {
    if let Some(value) = self.vars.borrow().get(name) {
      return Some(value.clone());
    }
    self.parent.as_ref().and_then(|parent| parent.lookup(name))
  }

  /// Overwrite the nearest existing binding. Returns `false` when no scope declares it.
  pub fn assign(&self, name: &str, value: Value) -> bool {
    if let Some(slot) = self.vars.borrow_mut().get_mut(name) {
      *slot = value;
      return true;
    }
    match &self.parent {
      Some(parent) => parent.assign(name, value),
      None => false,
    }
  }
}

/// How a statement list finished.
enum Completion {
  Normal,
  Return(Value),
}

/// Result of running a whole script.
pub enum ScriptOutcome {
  /// The script ran to the end; the scope holds its top-level bindings.
  Completed(Rc<Scope>),
  /// The script executed a top-level `return`.
  Returned(Value),
}

enum Allocation {
  Scope(Rc<Scope>),
  Array(Rc<RefCell<Vec<Value>>>),
  Object(Rc<RefCell<Object>>),
}

/// Isolated execution context for one script evaluation.
pub struct Interpreter {
  global: Rc<Scope>,
  max_call_depth: usize,
  depth: Cell<usize>,
  nesting: Cell<usize>,
  array_growth: Cell<usize>,
  heap: RefCell<Vec<Allocation>>,
}

impl Interpreter {
  /// Create a context with a fresh global scope holding `undefined`, `NaN` and `Infinity`.
  pub fn new(max_call_depth: usize) -> Self {
    let global = Rc::new(Scope::default());
    global.declare("undefined", Value::Undefined);
    global.declare("NaN", Value::Number(f64::NAN));
    global.declare("Infinity", Value::Number(f64::INFINITY));
    Self {
      global,
      max_call_depth,
      depth: Cell::new(0),
      nesting: Cell::new(0),
      array_growth: Cell::new(0),
      heap: RefCell::new(Vec::new()),
    }
  }

  /// The context's private global scope.
  pub fn global(&self) -> &Rc<Scope> {
    &self.global
  }

  /// Allocate an empty plain object owned by this context.
  pub fn new_object(&self) -> Value {
    self.alloc_object(Object::default())
  }

  /// Run `program` as the body of a function whose single parameter `binding` is `argument`.
  pub fn run_script(
    &self,
    program: &Program,
    binding: &str,
    argument: Value,
  ) -> Result<ScriptOutcome, ScriptError> {
    let scope = self.child_scope(&self.global);
    scope.declare(binding, argument);
    match self.execute_block(&program.body, &scope)? {
      Completion::Return(value) => Ok(ScriptOutcome::Returned(value)),
      Completion::Normal => Ok(ScriptOutcome::Completed(scope)),
    }
  }

  /// Property read with the usual errors for `undefined` and `null` receivers.
  pub fn get_property(&self, target: &Value, key: &str) -> Result<Value, ScriptError> {
    match target {
      Value::Undefined | Value::Null => Err(ScriptError::Type(format!(
        "Cannot read properties of {} (reading '{}')",
        target.to_js_string(),
        key
      ))),
      Value::Object(object) => Ok(object.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
      Value::Array(items) => {
        let items = items.borrow();
        if key == "length" {
          return Ok(Value::Number(items.len() as f64));
        }
        Ok(
          array_index(key)
            .and_then(|index| items.get(index as usize).cloned())
            .unwrap_or(Value::Undefined),
        )
      }
      Value::String(text) => {
        if key == "length" {
          return Ok(Value::Number(text.encode_utf16().count() as f64));
        }
        // Indexes count UTF-16 units like `length`; half of a surrogate pair reads as U+FFFD.
        Ok(
          array_index(key)
            .and_then(|index| text.encode_utf16().nth(index as usize))
            .map(|unit| Value::string(String::from_utf16_lossy(&[unit])))
            .unwrap_or(Value::Undefined),
        )
      }
      Value::Bool(_) | Value::Number(_) | Value::Function(_) => Ok(Value::Undefined),
    }
  }

  fn set_property(&self, target: &Value, key: String, value: Value) -> Result<(), ScriptError> {
    match target {
      Value::Undefined | Value::Null => Err(ScriptError::Type(format!(
        "Cannot set properties of {} (setting '{}')",
        target.to_js_string(),
        key
      ))),
      Value::Object(object) => {
        object.borrow_mut().set(key, value);
        Ok(())
      }
      Value::Array(items) => {
        let mut items = items.borrow_mut();
        if key == "length" {
          let length = value.to_number();
          if !(0.0..=f64::from(u32::MAX)).contains(&length) || length.fract() != 0.0 {
            return Err(ScriptError::Range("Invalid array length".to_string()));
          }
          let length = length as usize;
          self.reserve_slots(items.len(), length)?;
          items.resize(length, Value::Undefined);
          return Ok(());
        }
        // Non-index keys would be named properties, which arrays do not keep.
        if let Some(index) = array_index(&key) {
          let index = index as usize;
          if index >= items.len() {
            self.reserve_slots(items.len(), index + 1)?;
            items.resize(index + 1, Value::Undefined);
          }
          items[index] = value;
        }
        Ok(())
      }
      // Writes to primitive wrappers are silently dropped in sloppy mode.
      _ => Ok(()),
    }
  }

  fn reserve_slots(&self, current: usize, wanted: usize) -> Result<(), ScriptError> {
    let total = self
      .array_growth
      .get()
      .saturating_add(wanted.saturating_sub(current));
    if total > MAX_ARRAY_GROWTH {
      return Err(ScriptError::Range(format!(
        "Array storage exceeds {MAX_ARRAY_GROWTH} elements"
      )));
    }
    self.array_growth.set(total);
    Ok(())
  }

  fn child_scope(&self, parent: &Rc<Scope>) -> Rc<Scope> {
    let scope = Rc::new(Scope {
      vars: RefCell::new(HashMap::new()),
      parent: Some(parent.clone()),
    });
    self.heap.borrow_mut().push(Allocation::Scope(scope.clone()));
    scope
  }

  fn alloc_array(&self, items: Vec<Value>) -> Value {
    let items = Rc::new(RefCell::new(items));
    self.heap.borrow_mut().push(Allocation::Array(items.clone()));
    Value::Array(items)
  }

  fn alloc_object(&self, object: Object) -> Value {
    let object = Rc::new(RefCell::new(object));
    self.heap.borrow_mut().push(Allocation::Object(object.clone()));
    Value::Object(object)
  }

  fn make_closure(&self, function: &Rc<FunctionDef>, scope: &Rc<Scope>) -> Value {
    Value::Function(Rc::new(Closure {
      function: function.clone(),
      scope: scope.clone(),
    }))
  }

  fn hoist(&self, statements: &[Stmt], scope: &Rc<Scope>) {
    for statement in statements {
      match statement {
        Stmt::Declare(declarators) => {
          for declarator in declarators {
            if !scope.has_own(&declarator.name) {
              scope.declare(declarator.name.clone(), Value::Undefined);
            }
          }
        }
        Stmt::Expr(Expr::Function(function)) => {
          if let Some(name) = &function.name {
            scope.declare(name.clone(), self.make_closure(function, scope));
          }
        }
        _ => {}
      }
    }
  }

  fn execute_block(&self, statements: &[Stmt], scope: &Rc<Scope>) -> Result<Completion, ScriptError> {
    self.hoist(statements, scope);
    for statement in statements {
      if let Completion::Return(value) = self.execute(statement, scope)? {
        return Ok(Completion::Return(value));
      }
    }
    Ok(Completion::Normal)
  }

  fn execute(&self, statement: &Stmt, scope: &Rc<Scope>) -> Result<Completion, ScriptError> {
    match statement {
      Stmt::Declare(declarators) => {
        for declarator in declarators {
          if let Some(init) = &declarator.init {
            let value = self.evaluate(init, scope)?;
            scope.declare(declarator.name.clone(), value);
          }
        }
        Ok(Completion::Normal)
      }
      Stmt::Return(value) => {
        let value = match value {
          Some(expr) => self.evaluate(expr, scope)?,
          None => Value::Undefined,
        };
        Ok(Completion::Return(value))
      }
      // Hoisted already.
      Stmt::Expr(Expr::Function(function)) if function.name.is_some() => Ok(Completion::Normal),
      Stmt::Expr(expr) => {
        self.evaluate(expr, scope)?;
        Ok(Completion::Normal)
      }
      Stmt::Empty => Ok(Completion::Normal),
    }
  }

  /// Evaluate an expression in `scope`.
  fn evaluate(&self, expr: &Expr, scope: &Rc<Scope>) -> Result<Value, ScriptError> {
    let nesting = self.nesting.get();
    if nesting >= MAX_EVALUATION_DEPTH {
      return Err(stack_exhausted());
    }
    self.nesting.set(nesting + 1);
    let result = self.evaluate_expr(expr, scope);
    self.nesting.set(nesting);
    result
  }

  fn evaluate_expr(&self, expr: &Expr, scope: &Rc<Scope>) -> Result<Value, ScriptError> {
    match expr {
      Expr::Number(number) => Ok(Value::Number(*number)),
      Expr::Str(text) => Ok(Value::string(text.as_str())),
      Expr::Bool(flag) => Ok(Value::Bool(*flag)),
      Expr::Null => Ok(Value::Null),
      Expr::Ident(name) => scope
        .lookup(name)
        .ok_or_else(|| ScriptError::Reference(name.clone())),
      Expr::Array(items) => {
        let values = items
          .iter()
          .map(|item| self.evaluate(item, scope))
          .collect::<Result<Vec<_>, _>>()?;
        Ok(self.alloc_array(values))
      }
      Expr::Object(properties) => {
        let mut object = Object::default();
        for property in properties {
          let key = match &property.key {
            PropertyKey::Named(name) => name.clone(),
            PropertyKey::Computed(expr) => self.evaluate(expr, scope)?.to_js_string(),
          };
          let value = self.evaluate(&property.value, scope)?;
          object.set(key, value);
        }
        Ok(self.alloc_object(object))
      }
      Expr::Function(function) => Ok(self.make_closure(function, scope)),
      Expr::Member { object, property } => {
        let target = self.evaluate(object, scope)?;
        let key = self.evaluate(property, scope)?.to_js_string();
        self.get_property(&target, &key)
      }
      Expr::Call { callee, args } => {
        let function = self.evaluate(callee, scope)?;
        let args = args
          .iter()
          .map(|arg| self.evaluate(arg, scope))
          .collect::<Result<Vec<_>, _>>()?;
        self.call(&function, args, callee)
      }
      Expr::Unary(op, operand) => self.unary(*op, operand, scope),
      Expr::Binary(op, left, right) => {
        let left = self.evaluate(left, scope)?;
        let right = self.evaluate(right, scope)?;
        binary(*op, &left, &right)
      }
      Expr::Logical(op, left, right) => {
        let left = self.evaluate(left, scope)?;
        let short_circuit = match op {
          LogicalOp::And => !left.is_truthy(),
          LogicalOp::Or => left.is_truthy(),
          LogicalOp::Coalesce => !matches!(left, Value::Undefined | Value::Null),
        };
        if short_circuit {
          Ok(left)
        } else {
          self.evaluate(right, scope)
        }
      }
      Expr::Conditional {
        test,
        consequent,
        alternate,
      } => {
        if self.evaluate(test, scope)?.is_truthy() {
          self.evaluate(consequent, scope)
        } else {
          self.evaluate(alternate, scope)
        }
      }
      Expr::Assign { target, value } => self.assign(target, value, scope),
      Expr::Sequence(items) => {
        let mut last = Value::Undefined;
        for item in items {
          last = self.evaluate(item, scope)?;
        }
        Ok(last)
      }
    }
  }

  fn assign(&self, target: &Expr, value: &Expr, scope: &Rc<Scope>) -> Result<Value, ScriptError> {
    match target {
      Expr::Ident(name) => {
        let value = self.evaluate(value, scope)?;
        // Undeclared names land on this context's global scope, never outside it.
        if !scope.assign(name, value.clone()) {
          self.global.declare(name.clone(), value.clone());
        }
        Ok(value)
      }
      Expr::Member { object, property } => {
        let receiver = self.evaluate(object, scope)?;
        let key = self.evaluate(property, scope)?.to_js_string();
        let value = self.evaluate(value, scope)?;
        self.set_property(&receiver, key, value.clone())?;
        Ok(value)
      }
      _ => Err(ScriptError::Type(
        "Invalid left-hand side in assignment".to_string(),
      )),
    }
  }

  fn unary(&self, op: UnaryOp, operand: &Expr, scope: &Rc<Scope>) -> Result<Value, ScriptError> {
    if let (UnaryOp::TypeOf, Expr::Ident(name)) = (op, operand) {
      if scope.lookup(name).is_none() {
        return Ok(Value::string("undefined"));
      }
    }
    let value = self.evaluate(operand, scope)?;
    Ok(match op {
      UnaryOp::Not => Value::Bool(!value.is_truthy()),
      UnaryOp::Negate => Value::Number(-value.to_number()),
      UnaryOp::Plus => Value::Number(value.to_number()),
      UnaryOp::TypeOf => Value::string(value.type_of()),
      UnaryOp::Void => Value::Undefined,
    })
  }

  fn call(&self, function: &Value, args: Vec<Value>, callee: &Expr) -> Result<Value, ScriptError> {
    let Value::Function(closure) = function else {
      return Err(ScriptError::Type(format!(
        "{} is not a function",
        callee.describe()
      )));
    };

    let depth = self.depth.get();
    if depth >= self.max_call_depth {
      return Err(stack_exhausted());
    }
    self.depth.set(depth + 1);
    let result = self.invoke(closure, args);
    self.depth.set(depth);
    result
  }

  fn invoke(&self, closure: &Rc<Closure>, args: Vec<Value>) -> Result<Value, ScriptError> {
    let scope = self.child_scope(&closure.scope);
    if let Some(name) = &closure.function.name {
      scope.declare(name.clone(), Value::Function(closure.clone()));
    }
    let mut args = args.into_iter();
    for param in &closure.function.params {
      scope.declare(param.clone(), args.next().unwrap_or(Value::Undefined));
    }

    match &closure.function.body {
      FunctionBody::Block(statements) => match self.execute_block(statements, &scope)? {
        Completion::Return(value) => Ok(value),
        Completion::Normal => Ok(Value::Undefined),
      },
      FunctionBody::Expr(body) => self.evaluate(body, &scope),
    }
  }
}

impl Drop for Interpreter {
  fn drop(&mut self) {
    self.global.vars.borrow_mut().clear();
    for allocation in self.heap.get_mut().drain(..) {
      match allocation {
        Allocation::Scope(scope) => scope.vars.borrow_mut().clear(),
        Allocation::Array(items) => items.borrow_mut().clear(),
        Allocation::Object(object) => object.borrow_mut().clear(),
      }
    }
  }
}

fn stack_exhausted() -> ScriptError {
  ScriptError::Range("Maximum call stack size exceeded".to_string())
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ScriptError> {
  Ok(match op {
    BinaryOp::Add => {
      let (left, right) = (left.to_primitive(), right.to_primitive());
      if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let mut text = left.to_js_string();
        let tail = right.to_js_string();
        if text.len() + tail.len() > MAX_STRING_LENGTH {
          return Err(ScriptError::Range("Invalid string length".to_string()));
        }
        text.push_str(&tail);
        Value::string(text)
      } else {
        Value::Number(left.to_number() + right.to_number())
      }
    }
    BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
    BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
    BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
    BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
    BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
      let (left, right) = (left.to_primitive(), right.to_primitive());
      let ordering = match (&left, &right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
      };
      Value::Bool(match (op, ordering) {
        (_, None) => false,
        (BinaryOp::Lt, Some(ordering)) => ordering.is_lt(),
        (BinaryOp::LtEq, Some(ordering)) => ordering.is_le(),
        (BinaryOp::Gt, Some(ordering)) => ordering.is_gt(),
        (_, Some(ordering)) => ordering.is_ge(),
      })
    }
    BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
    BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
    BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
    BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::script::parse_program;

  /// Runs `source` and renders its result before the context tears its heap down.
  fn run(source: &str) -> Result<String, ScriptError> {
    let program = parse_program(source)?;
    let interpreter = Interpreter::new(32);
    let value = match interpreter.run_script(&program, "self", interpreter.new_object())? {
      ScriptOutcome::Returned(value) => value,
      ScriptOutcome::Completed(scope) => scope.lookup("result").unwrap_or(Value::Undefined),
    };
    Ok(value.to_js_string())
  }

  fn run_to_string(source: &str) -> String {
    run(source).expect("script should run")
  }

  #[test]
  fn dropping_the_context_clears_its_allocations() {
    let program = parse_program("var a = []; a[0] = a; self.keep = a").unwrap();
    let interpreter = Interpreter::new(8);
    let sandbox = interpreter.new_object();
    interpreter.run_script(&program, "self", sandbox.clone()).unwrap();
    let Value::Object(object) = &sandbox else {
      panic!("sandbox is an object");
    };
    let kept = object.borrow().get("keep").cloned().expect("keep was assigned");
    drop(interpreter);
    let Value::Array(items) = kept else {
      panic!("keep is an array");
    };
    assert!(items.borrow().is_empty());
  }

  #[test]
  fn applies_arguments_to_immediately_invoked_functions() {
    assert_eq!(
      run_to_string("var result = function(a, b){ return [a, b, typeof c] }('x', 2)"),
      "x,2,undefined"
    );
    assert_eq!(run_to_string("var result = ((a) => a + 1)(41)"), "42");
  }

  #[test]
  fn closures_capture_their_scope() {
    let source = "function make(n){ return function(){ return n * 2 } }\nvar result = make(21)()";
    assert_eq!(run_to_string(source), "42");
  }

  #[test]
  fn hoists_function_declarations() {
    assert_eq!(run_to_string("var result = twice(4); function twice(x){ return x + x }"), "8");
  }

  #[test]
  fn evaluates_operators_like_javascript() {
    assert_eq!(run_to_string("return [!0, !1, void 0, 1 + '2', '3' * '4', 7 % 4]"), "true,false,,12,12,3");
    assert_eq!(run_to_string("return [null ?? 'd', 0 || 'e', 1 && 'f', 2 > 1 ? 'g' : 'h']"), "d,e,f,g");
    assert_eq!(run_to_string("return ['b' < 'a', 1 == '1', 1 === '1', NaN == NaN]"), "false,true,false,false");
  }

  #[test]
  fn reads_lengths_and_indexes() {
    assert_eq!(run_to_string("var a = [1, 2, 3]; a[5] = 6; return [a.length, a[1], 'abc'.length, 'abc'[2]]"), "6,2,3,c");
  }

  #[test]
  fn reports_reference_and_type_errors() {
    assert_eq!(run("missing + 1").unwrap_err(), ScriptError::Reference("missing".into()));
    assert_eq!(
      run("self.cb()").unwrap_err(),
      ScriptError::Type("self.cb is not a function".into())
    );
    assert_eq!(
      run("self.a.b").unwrap_err(),
      ScriptError::Type("Cannot read properties of undefined (reading 'b')".into())
    );
    assert_eq!(
      run("null.x = 1").unwrap_err(),
      ScriptError::Type("Cannot set properties of null (setting 'x')".into())
    );
  }

  #[test]
  fn bounds_recursion_depth() {
    let error = run("function f(){ return f() } f()").unwrap_err();
    assert_eq!(error, ScriptError::Range("Maximum call stack size exceeded".into()));
  }

  #[test]
  fn undeclared_assignments_stay_inside_the_context() {
    let program = parse_program("leaked = 1; self.seen = typeof leaked").unwrap();
    let first = Interpreter::new(8);
    let sandbox = first.new_object();
    first.run_script(&program, "self", sandbox.clone()).unwrap();
    assert_eq!(first.get_property(&sandbox, "seen").unwrap().to_js_string(), "number");
    assert!(first.global().lookup("leaked").is_some());

    let second = Interpreter::new(8);
    assert!(second.global().lookup("leaked").is_none());
    let check = parse_program("return typeof leaked").unwrap();
    let ScriptOutcome::Returned(value) = second.run_script(&check, "self", second.new_object()).unwrap() else {
      panic!("expected a top-level return");
    };
    assert_eq!(value.to_js_string(), "undefined");
  }

  #[test]
  fn far_array_writes_fail_without_allocating() {
    let invalid = ScriptError::Range("Invalid array length".into());
    assert_eq!(run("var a = []; a.length = 4294967296").unwrap_err(), invalid);
    assert_eq!(run("var a = []; a.length = 1.5").unwrap_err(), invalid);
    assert_eq!(run("var a = []; a.length = -1").unwrap_err(), invalid);

    let exhausted = ScriptError::Range(format!("Array storage exceeds {MAX_ARRAY_GROWTH} elements"));
    assert_eq!(run("var a = []; a[4294967294] = 'x.js'").unwrap_err(), exhausted);
    assert_eq!(run("var a = []; a.length = 4294967295").unwrap_err(), exhausted);
    assert_eq!(
      run("var a = [], b = []; a.length = 1048576; b[0] = 1").unwrap_err(),
      exhausted
    );

    assert_eq!(run_to_string("var a = []; a[4294967295] = 1; return a.length"), "0");
    assert_eq!(run_to_string("var a = ['x']; a.length = 0; return a.length"), "0");
  }

  #[test]
  fn indexes_strings_by_utf16_unit() {
    assert_eq!(run_to_string("var s = '\\u{1F600}a'; return [s.length, s[2], s[3]]"), "3,a,");
    assert_eq!(run_to_string("return 'abc'['01'] + 'abc'[1]"), "undefinedb");
    assert_eq!(run_to_string("return '\\u{1F600}'[0]"), "\u{FFFD}");
  }

  #[test]
  fn caps_string_growth() {
    let mut source = String::from("var s = 'xxxxxxxxxxxxxxxx';");
    for _ in 0..21 {
      source.push_str(" s = s + s;");
    }
    assert_eq!(
      run(&source).unwrap_err(),
      ScriptError::Range("Invalid string length".into())
    );
  }

  #[test]
  fn bounds_evaluation_depth_across_calls() {
    let error = std::thread::Builder::new()
      .stack_size(64 << 20)
      .spawn(|| {
        let program = parse_program("function f(n){ return n ? [f(n - 1)] : 0 } f(5000)").unwrap();
        let interpreter = Interpreter::new(usize::MAX);
        interpreter
          .run_script(&program, "self", interpreter.new_object())
          .err()
      })
      .unwrap()
      .join()
      .unwrap();
    assert_eq!(
      error,
      Some(ScriptError::Range("Maximum call stack size exceeded".into()))
    );
  }
}
