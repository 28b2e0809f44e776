use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use crate::{
    ast::{BinOp, Expr, FuncDef, Program, Stmt, UnaryOp},
    builtins::Builtins,
    error::{RuntimeError, RuntimeResult},
};

/// Runtime values. Lists and dicts are reference types: assignment shares
/// the underlying container, and `==` on them compares identity rather
/// than contents. Strings are immutable byte sequences.
#[derive(Debug, Clone)]
pub enum Value<'ast> {
    Int(i64),
    Float(f64),
    Str(Rc<Vec<u8>>),
    Bool(bool),
    None,
    List(Rc<RefCell<Vec<Value<'ast>>>>),
    /// Insertion-ordered key/value pairs with linear-scan lookup by
    /// structural equality. Deliberately not a hash map.
    Dict(Rc<RefCell<Vec<(Value<'ast>, Value<'ast>)>>>),
    Function(Rc<FunctionValue<'ast>>),
}

impl<'ast> Value<'ast> {
    pub fn str_from(text: &str) -> Self {
        Value::Str(Rc::new(text.as_bytes().to_vec()))
    }

    pub fn list_from(values: Vec<Value<'ast>>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }
}

/// A user function: its parameter list and body are borrowed straight from
/// the AST, which therefore has to outlive every call.
#[derive(Debug)]
pub struct FunctionValue<'ast> {
    pub def: &'ast FuncDef,
}

pub fn type_name(value: &Value<'_>) -> &'static str {
    match value {
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Str(_) => "str",
        Value::Bool(_) => "bool",
        Value::None => "none",
        Value::List(_) => "list",
        Value::Dict(_) => "dict",
        Value::Function(_) => "function",
    }
}

pub fn truthy(value: &Value<'_>) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Str(bytes) => !bytes.is_empty(),
        Value::List(items) => !items.borrow().is_empty(),
        Value::Dict(entries) => !entries.borrow().is_empty(),
        Value::None => false,
        Value::Function(_) => true,
    }
}

/// The `==` semantics: value equality for scalars, reference identity for
/// lists, dicts and functions. Mismatched types are unequal, except that
/// ints and floats compare numerically.
pub fn values_equal<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::None, Value::None) => true,
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Deep equality, used for dict key lookup, dict deletion and membership
/// tests against dict keys.
pub fn structural_eq<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::List(a), Value::List(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| structural_eq(x, y))
        }
        (Value::Dict(a), Value::Dict(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| structural_eq(ka, kb) && structural_eq(va, vb))
        }
        _ => values_equal(left, right),
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::None => write!(f, "none"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<fn {}>", func.def.name),
        }
    }
}

/// A chain of name→value scopes. Both blocks and function calls push
/// scopes onto this chain; a called function's scope is parented on the
/// caller's active scope at call time, not the definition site.
pub struct Environment<'ast> {
    values: RefCell<HashMap<String, Value<'ast>>>,
    parent: Option<Rc<Environment<'ast>>>,
}

impl<'ast> Environment<'ast> {
    pub fn new(parent: Option<Rc<Environment<'ast>>>) -> Rc<Self> {
        Rc::new(Self {
            values: RefCell::new(HashMap::new()),
            parent,
        })
    }

    pub fn get(&self, name: &str) -> Option<Value<'ast>> {
        if let Some(value) = self.values.borrow().get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.get(name)
        } else {
            None
        }
    }

    /// Creates or overwrites the binding in this scope only.
    pub fn define(&self, name: String, value: Value<'ast>) {
        self.values.borrow_mut().insert(name, value);
    }

    /// Mutates the nearest scope that already owns the name; if no scope
    /// does, the name is defined in this (innermost) scope.
    pub fn assign(&self, name: &str, value: Value<'ast>) {
        if !self.assign_existing(name, &value) {
            self.define(name.to_string(), value);
        }
    }

    fn assign_existing(&self, name: &str, value: &Value<'ast>) -> bool {
        {
            let mut values = self.values.borrow_mut();
            if let Some(slot) = values.get_mut(name) {
                *slot = value.clone();
                return true;
            }
        }
        match &self.parent {
            Some(parent) => parent.assign_existing(name, value),
            None => false,
        }
    }
}

/// Control-flow signal threaded out of statement execution. Loops consume
/// Break/Continue, function-call boundaries consume everything else.
#[derive(Debug)]
pub enum Flow<'ast> {
    Normal,
    Break,
    Continue,
    Return(Value<'ast>),
}

pub struct Interpreter<'ast> {
    globals: Rc<Environment<'ast>>,
    builtins: Builtins,
}

impl<'ast> Interpreter<'ast> {
    pub fn new(builtins: Builtins) -> Self {
        Self {
            globals: Environment::new(None),
            builtins,
        }
    }

    /// Runs against a host-provided global scope, which may already hold
    /// bindings such as `__file__`.
    pub fn with_globals(builtins: Builtins, globals: Rc<Environment<'ast>>) -> Self {
        Self { globals, builtins }
    }

    pub fn globals(&self) -> &Rc<Environment<'ast>> {
        &self.globals
    }

    /// Executes the program's statements in order. A stray break, continue
    /// or return at top level halts the remaining statements silently.
    pub fn run(&self, program: &'ast Program) -> RuntimeResult<()> {
        tracing::debug!(statements = program.statements.len(), "executing program");
        self.exec_all(&program.statements, Rc::clone(&self.globals))?;
        Ok(())
    }

    fn exec_all(
        &self,
        stmts: &'ast [Stmt],
        env: Rc<Environment<'ast>>,
    ) -> RuntimeResult<Flow<'ast>> {
        for stmt in stmts {
            let flow = self.exec_stmt(stmt, Rc::clone(&env))?;
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, stmt: &'ast Stmt, env: Rc<Environment<'ast>>) -> RuntimeResult<Flow<'ast>> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(expr, &env)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                let value = self.eval_expr(value, &env)?;
                env.assign(name, value);
                Ok(Flow::Normal)
            }
            Stmt::AugAssign { name, op, value } => {
                let current = env
                    .get(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?;
                let rhs = self.eval_expr(value, &env)?;
                let combined = self.eval_binary(*op, current, rhs)?;
                env.assign(name, combined);
                Ok(Flow::Normal)
            }
            Stmt::IndexAssign {
                object,
                index,
                value,
            } => self.exec_index_assign(object, index, value, &env),
            Stmt::Delete { object, index } => self.exec_delete(object, index, &env),
            Stmt::If {
                cond,
                then,
                elifs,
                else_body,
            } => {
                if truthy(&self.eval_expr(cond, &env)?) {
                    return self.exec_stmt(then, env);
                }
                for (elif_cond, elif_body) in elifs {
                    if truthy(&self.eval_expr(elif_cond, &env)?) {
                        return self.exec_stmt(elif_body, env);
                    }
                }
                if let Some(body) = else_body {
                    return self.exec_stmt(body, env);
                }
                Ok(Flow::Normal)
            }
            Stmt::While { cond, body } => {
                loop {
                    if !truthy(&self.eval_expr(cond, &env)?) {
                        break;
                    }
                    match self.exec_stmt(body, Rc::clone(&env))? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                var,
                iterable,
                body,
            } => self.exec_for(var, iterable, body, &env),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, &env)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::FuncDef(def) => {
                // Redefinition simply overwrites the binding.
                env.define(
                    def.name.clone(),
                    Value::Function(Rc::new(FunctionValue { def })),
                );
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => {
                let scope = Environment::new(Some(env));
                self.exec_all(stmts, scope)
            }
            Stmt::Pass => Ok(Flow::Normal),
        }
    }

    fn exec_for(
        &self,
        var: &str,
        iterable: &'ast Expr,
        body: &'ast Stmt,
        env: &Rc<Environment<'ast>>,
    ) -> RuntimeResult<Flow<'ast>> {
        let source = self.eval_expr(iterable, env)?;
        let mut index = 0usize;
        loop {
            let item = match &source {
                Value::List(items) => {
                    let items = items.borrow();
                    match items.get(index) {
                        Some(value) => value.clone(),
                        None => break,
                    }
                }
                // Strings iterate by raw byte: one-byte strings come out,
                // and multi-byte UTF-8 sequences are split.
                Value::Str(bytes) => match bytes.get(index) {
                    Some(byte) => Value::Str(Rc::new(vec![*byte])),
                    None => break,
                },
                // Dicts iterate over their keys in insertion order.
                Value::Dict(entries) => {
                    let entries = entries.borrow();
                    match entries.get(index) {
                        Some((key, _)) => key.clone(),
                        None => break,
                    }
                }
                other => {
                    return Err(RuntimeError::Type(format!(
                        "value of type {} is not iterable",
                        type_name(other)
                    )))
                }
            };
            index += 1;

            let scope = Environment::new(Some(Rc::clone(env)));
            scope.define(var.to_string(), item);
            match self.exec_stmt(body, scope)? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_index_assign(
        &self,
        object: &'ast Expr,
        index: &'ast Expr,
        value: &'ast Expr,
        env: &Rc<Environment<'ast>>,
    ) -> RuntimeResult<Flow<'ast>> {
        let target = self.eval_expr(object, env)?;
        let key = self.eval_expr(index, env)?;
        let new_value = self.eval_expr(value, env)?;
        match target {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let len = items.len();
                let slot = resolve_index(&key, len)?;
                items[slot] = new_value;
            }
            Value::Dict(entries) => {
                let mut entries = entries.borrow_mut();
                match entries.iter_mut().find(|(k, _)| structural_eq(k, &key)) {
                    // Reassigning an existing key keeps its insertion slot.
                    Some(entry) => entry.1 = new_value,
                    None => entries.push((key, new_value)),
                }
            }
            other => {
                return Err(RuntimeError::Type(format!(
                    "cannot assign by index into {}",
                    type_name(&other)
                )))
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_delete(
        &self,
        object: &'ast Expr,
        index: &'ast Expr,
        env: &Rc<Environment<'ast>>,
    ) -> RuntimeResult<Flow<'ast>> {
        let target = self.eval_expr(object, env)?;
        let key = self.eval_expr(index, env)?;
        match target {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let len = items.len();
                let slot = resolve_index(&key, len)?;
                // Ordered shift-remove.
                items.remove(slot);
            }
            Value::Dict(entries) => {
                let mut entries = entries.borrow_mut();
                match entries.iter().position(|(k, _)| structural_eq(k, &key)) {
                    Some(pos) => {
                        entries.remove(pos);
                    }
                    None => return Err(RuntimeError::KeyNotFound(key.to_string())),
                }
            }
            other => {
                return Err(RuntimeError::Type(format!(
                    "del requires a list or dict, found {}",
                    type_name(&other)
                )))
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_expr(&self, expr: &'ast Expr, env: &Rc<Environment<'ast>>) -> RuntimeResult<Value<'ast>> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(text) => Ok(Value::str_from(text)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Identifier(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
            Expr::Binary { op, left, right } => {
                // Both operands evaluate unconditionally: `and`/`or` do not
                // short-circuit, so right-hand side effects always happen.
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                self.eval_binary(*op, left, right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!truthy(&operand))),
                    UnaryOp::Neg => match operand {
                        Value::Int(n) => Ok(Value::Int(-n)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(RuntimeError::Type(format!(
                            "cannot negate {}",
                            type_name(&other)
                        ))),
                    },
                }
            }
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::list_from(values))
            }
            Expr::Dict { keys, values } => {
                let mut entries: Vec<(Value<'ast>, Value<'ast>)> =
                    Vec::with_capacity(keys.len());
                for (key_expr, value_expr) in keys.iter().zip(values.iter()) {
                    let key = self.eval_expr(key_expr, env)?;
                    let value = self.eval_expr(value_expr, env)?;
                    match entries.iter_mut().find(|(k, _)| structural_eq(k, &key)) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(Value::Dict(Rc::new(RefCell::new(entries))))
            }
            Expr::Index { object, index } => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                self.eval_index(object, index)
            }
            Expr::Call { name, args } => self.eval_call(name, args, env),
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = self.eval_expr(object, env)?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval_expr(arg, env)?);
                }
                self.eval_method(receiver, method, evaluated)
            }
            Expr::Membership {
                value,
                collection,
                negated,
            } => {
                let needle = self.eval_expr(value, env)?;
                let haystack = self.eval_expr(collection, env)?;
                let found = self.eval_membership(&needle, &haystack)?;
                Ok(Value::Bool(found != *negated))
            }
        }
    }

    fn eval_call(
        &self,
        name: &str,
        args: &'ast [Expr],
        env: &Rc<Environment<'ast>>,
    ) -> RuntimeResult<Value<'ast>> {
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval_expr(arg, env)?);
        }

        // Builtins resolve before user definitions, so `def print(...)`
        // never shadows the builtin.
        if let Some(builtin) = self.builtins.get(name) {
            return builtin(&evaluated).map_err(|message| RuntimeError::Builtin {
                name: name.to_string(),
                message,
            });
        }

        match env.get(name) {
            Some(Value::Function(func)) => self.call_function(&func, evaluated, env),
            Some(other) => Err(RuntimeError::Type(format!(
                "'{}' is not callable (found {})",
                name,
                type_name(&other)
            ))),
            None => Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }

    fn call_function(
        &self,
        func: &FunctionValue<'ast>,
        args: Vec<Value<'ast>>,
        caller_env: &Rc<Environment<'ast>>,
    ) -> RuntimeResult<Value<'ast>> {
        tracing::trace!(
            function = func.def.name.as_str(),
            argc = args.len(),
            "calling function"
        );

        // The call scope is parented on the caller's active scope at call
        // time; free names resolve through the live caller chain.
        let call_env = Environment::new(Some(Rc::clone(caller_env)));
        let mut supplied = args.into_iter();
        for param in &func.def.params {
            // Missing trailing arguments bind to none; extras are dropped.
            let value = supplied.next().unwrap_or(Value::None);
            call_env.define(param.clone(), value);
        }

        match self.exec_stmt(&func.def.body, call_env)? {
            Flow::Return(value) => Ok(value),
            // Falling off the end yields none; stray break/continue are
            // consumed here at the call boundary.
            _ => Ok(Value::None),
        }
    }

    fn eval_binary(
        &self,
        op: BinOp,
        left: Value<'ast>,
        right: Value<'ast>,
    ) -> RuntimeResult<Value<'ast>> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                self.eval_arithmetic(op, left, right)
            }
            BinOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
            BinOp::NotEq => Ok(Value::Bool(!values_equal(&left, &right))),
            BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
                Ok(Value::Bool(self.compare(op, &left, &right)?))
            }
            BinOp::And => Ok(Value::Bool(truthy(&left) && truthy(&right))),
            BinOp::Or => Ok(Value::Bool(truthy(&left) || truthy(&right))),
        }
    }

    fn eval_arithmetic(
        &self,
        op: BinOp,
        left: Value<'ast>,
        right: Value<'ast>,
    ) -> RuntimeResult<Value<'ast>> {
        match (op, &left, &right) {
            (BinOp::Add, Value::Str(a), Value::Str(b)) => {
                let mut combined = Vec::with_capacity(a.len() + b.len());
                combined.extend_from_slice(a);
                combined.extend_from_slice(b);
                Ok(Value::Str(Rc::new(combined)))
            }
            (BinOp::Mul, Value::Str(s), Value::Int(count))
            | (BinOp::Mul, Value::Int(count), Value::Str(s)) => repeat_str(s, *count),
            _ => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => self.int_arithmetic(op, *a, *b),
                (Value::Int(a), Value::Float(b)) => self.float_arithmetic(op, *a as f64, *b),
                (Value::Float(a), Value::Int(b)) => self.float_arithmetic(op, *a, *b as f64),
                (Value::Float(a), Value::Float(b)) => self.float_arithmetic(op, *a, *b),
                _ => Err(RuntimeError::Type(format!(
                    "unsupported operand types for {}: {} and {}",
                    op,
                    type_name(&left),
                    type_name(&right)
                ))),
            },
        }
    }

    fn int_arithmetic(&self, op: BinOp, a: i64, b: i64) -> RuntimeResult<Value<'ast>> {
        let result = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            // Truncates toward zero.
            BinOp::Div => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                a / b
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                a % b
            }
            _ => {
                return Err(RuntimeError::UnsupportedOperation(format!(
                    "operator {} is not arithmetic",
                    op
                )))
            }
        };
        Ok(Value::Int(result))
    }

    fn float_arithmetic(&self, op: BinOp, a: f64, b: f64) -> RuntimeResult<Value<'ast>> {
        let result = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            // A zero divisor is an error, never infinity.
            BinOp::Div => {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                a / b
            }
            BinOp::Mod => {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                a % b
            }
            _ => {
                return Err(RuntimeError::UnsupportedOperation(format!(
                    "operator {} is not arithmetic",
                    op
                )))
            }
        };
        Ok(Value::Float(result))
    }

    fn compare(&self, op: BinOp, left: &Value<'ast>, right: &Value<'ast>) -> RuntimeResult<bool> {
        use std::cmp::Ordering;

        let ordering = match (left, right) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            // Byte-wise lexicographic.
            (Value::Str(a), Value::Str(b)) => Some(a.as_slice().cmp(b.as_slice())),
            _ => {
                return Err(RuntimeError::Type(format!(
                    "cannot compare {} with {}",
                    type_name(left),
                    type_name(right)
                )))
            }
        };

        Ok(match ordering {
            Some(Ordering::Less) => matches!(op, BinOp::Less | BinOp::LessEq),
            Some(Ordering::Equal) => matches!(op, BinOp::LessEq | BinOp::GreaterEq),
            Some(Ordering::Greater) => matches!(op, BinOp::Greater | BinOp::GreaterEq),
            None => false,
        })
    }

    fn eval_index(&self, object: Value<'ast>, index: Value<'ast>) -> RuntimeResult<Value<'ast>> {
        match object {
            Value::List(items) => {
                let items = items.borrow();
                let slot = resolve_index(&index, items.len())?;
                Ok(items[slot].clone())
            }
            Value::Str(bytes) => {
                let slot = resolve_index(&index, bytes.len())?;
                Ok(Value::Str(Rc::new(vec![bytes[slot]])))
            }
            Value::Dict(entries) => {
                let entries = entries.borrow();
                for (key, value) in entries.iter() {
                    if structural_eq(key, &index) {
                        return Ok(value.clone());
                    }
                }
                Err(RuntimeError::KeyNotFound(index.to_string()))
            }
            other => Err(RuntimeError::Type(format!(
                "value of type {} is not indexable",
                type_name(&other)
            ))),
        }
    }

    fn eval_membership(
        &self,
        needle: &Value<'ast>,
        haystack: &Value<'ast>,
    ) -> RuntimeResult<bool> {
        match haystack {
            Value::List(items) => Ok(items
                .borrow()
                .iter()
                .any(|item| values_equal(item, needle))),
            Value::Dict(entries) => Ok(entries
                .borrow()
                .iter()
                .any(|(key, _)| structural_eq(key, needle))),
            Value::Str(bytes) => match needle {
                Value::Str(sub) => Ok(contains_subslice(bytes, sub)),
                other => Err(RuntimeError::Type(format!(
                    "membership in a string requires a string operand, found {}",
                    type_name(other)
                ))),
            },
            other => Err(RuntimeError::Type(format!(
                "cannot test membership in {}",
                type_name(other)
            ))),
        }
    }

    fn eval_method(
        &self,
        receiver: Value<'ast>,
        method: &str,
        args: Vec<Value<'ast>>,
    ) -> RuntimeResult<Value<'ast>> {
        match (&receiver, method) {
            (Value::List(items), "append") => {
                let mut args = check_arity(method, args, 1)?;
                items.borrow_mut().push(args.remove(0));
                Ok(Value::None)
            }
            (Value::List(items), "pop") => {
                check_arity(method, args, 0)?;
                let mut items = items.borrow_mut();
                match items.pop() {
                    Some(value) => Ok(value),
                    None => Err(RuntimeError::IndexOutOfBounds { index: -1, len: 0 }),
                }
            }
            (Value::Dict(entries), "keys") => {
                check_arity(method, args, 0)?;
                let keys = entries.borrow().iter().map(|(k, _)| k.clone()).collect();
                Ok(Value::list_from(keys))
            }
            (Value::Dict(entries), "values") => {
                check_arity(method, args, 0)?;
                let values = entries.borrow().iter().map(|(_, v)| v.clone()).collect();
                Ok(Value::list_from(values))
            }
            (Value::Str(bytes), "upper") => {
                check_arity(method, args, 0)?;
                Ok(Value::Str(Rc::new(bytes.to_ascii_uppercase())))
            }
            (Value::Str(bytes), "lower") => {
                check_arity(method, args, 0)?;
                Ok(Value::Str(Rc::new(bytes.to_ascii_lowercase())))
            }
            (Value::Str(bytes), "strip") => {
                check_arity(method, args, 0)?;
                let start = bytes
                    .iter()
                    .position(|b| !b.is_ascii_whitespace())
                    .unwrap_or(bytes.len());
                let end = bytes
                    .iter()
                    .rposition(|b| !b.is_ascii_whitespace())
                    .map(|pos| pos + 1)
                    .unwrap_or(start);
                Ok(Value::Str(Rc::new(bytes[start..end].to_vec())))
            }
            (Value::Str(bytes), "split") => {
                let args = check_arity(method, args, 1)?;
                let separator = match &args[0] {
                    Value::Str(sep) => sep,
                    other => {
                        return Err(RuntimeError::Type(format!(
                            "split() separator must be a string, found {}",
                            type_name(other)
                        )))
                    }
                };
                if separator.is_empty() {
                    return Err(RuntimeError::Type(
                        "split() separator must not be empty".to_string(),
                    ));
                }
                let pieces = split_bytes(bytes, separator)
                    .into_iter()
                    .map(|piece| Value::Str(Rc::new(piece)))
                    .collect();
                Ok(Value::list_from(pieces))
            }
            _ => Err(RuntimeError::UnsupportedOperation(format!(
                "unknown method '{}' on {}",
                method,
                type_name(&receiver)
            ))),
        }
    }
}

/// Resolves a possibly-negative index against a container length; anything
/// outside `[-len, len)` is out of bounds.
fn resolve_index(index: &Value<'_>, len: usize) -> Result<usize, RuntimeError> {
    let raw = match index {
        Value::Int(n) => *n,
        other => {
            return Err(RuntimeError::Type(format!(
                "index must be an integer, found {}",
                type_name(other)
            )))
        }
    };
    let adjusted = if raw < 0 { raw + len as i64 } else { raw };
    if adjusted < 0 || adjusted >= len as i64 {
        return Err(RuntimeError::IndexOutOfBounds { index: raw, len });
    }
    Ok(adjusted as usize)
}

fn check_arity<'ast>(
    method: &str,
    args: Vec<Value<'ast>>,
    expected: usize,
) -> RuntimeResult<Vec<Value<'ast>>> {
    if args.len() != expected {
        return Err(RuntimeError::Type(format!(
            "{}() expects exactly {} argument(s), received {}",
            method,
            expected,
            args.len()
        )));
    }
    Ok(args)
}

fn repeat_str<'ast>(bytes: &Rc<Vec<u8>>, count: i64) -> RuntimeResult<Value<'ast>> {
    if count <= 0 {
        return Ok(Value::Str(Rc::new(Vec::new())));
    }
    let count = count as usize;
    let total = bytes
        .len()
        .checked_mul(count)
        .ok_or_else(|| RuntimeError::OutOfMemory("string repetition is too large".to_string()))?;
    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| RuntimeError::OutOfMemory("string repetition is too large".to_string()))?;
    for _ in 0..count {
        out.extend_from_slice(bytes);
    }
    Ok(Value::Str(Rc::new(out)))
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

fn split_bytes(haystack: &[u8], separator: &[u8]) -> Vec<Vec<u8>> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + separator.len() <= haystack.len() {
        if &haystack[i..i + separator.len()] == separator {
            pieces.push(haystack[start..i].to_vec());
            i += separator.len();
            start = i;
        } else {
            i += 1;
        }
    }
    pieces.push(haystack[start..].to_vec());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::Lexer, parser::Parser};
    use pretty_assertions::assert_eq;

    fn parse_source(source: &str) -> Program {
        let tokens = Lexer::new(source).tokenize();
        let mut parser = Parser::new(tokens);
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "unexpected parse errors: {:?}",
            parser.errors()
        );
        program
    }

    fn run_program(program: &Program) -> Interpreter<'_> {
        let interpreter = Interpreter::new(Builtins::core());
        match interpreter.run(program) {
            Ok(()) => interpreter,
            Err(err) => panic!("program failed: {}", err),
        }
    }

    fn run_error(program: &Program) -> RuntimeError {
        let interpreter = Interpreter::new(Builtins::core());
        match interpreter.run(program) {
            Ok(()) => panic!("expected a runtime error"),
            Err(err) => err,
        }
    }

    fn global_int(interpreter: &Interpreter<'_>, name: &str) -> i64 {
        match interpreter.globals().get(name) {
            Some(Value::Int(n)) => n,
            other => panic!("expected int for '{}', got {:?}", name, other),
        }
    }

    fn global_bytes(interpreter: &Interpreter<'_>, name: &str) -> Vec<u8> {
        match interpreter.globals().get(name) {
            Some(Value::Str(bytes)) => bytes.as_ref().clone(),
            other => panic!("expected string for '{}', got {:?}", name, other),
        }
    }

    fn global_bool(interpreter: &Interpreter<'_>, name: &str) -> bool {
        match interpreter.globals().get(name) {
            Some(Value::Bool(b)) => b,
            other => panic!("expected bool for '{}', got {:?}", name, other),
        }
    }

    #[test]
    fn integer_arithmetic_follows_precedence() {
        let program = parse_source("x = 5 + 3 * 2\n");
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 11);
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        let program = parse_source("a = 15 / 4\nb = -7 / 2\n");
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "a"), 3);
        // Truncation, not flooring.
        assert_eq!(global_int(&interpreter, "b"), -3);
    }

    #[test]
    fn float_operand_promotes_division() {
        let program = parse_source("x = 15 / 4.0\n");
        let interpreter = run_program(&program);
        match interpreter.globals().get("x") {
            Some(Value::Float(x)) => assert_eq!(x, 3.75),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn string_repetition_works_both_ways() {
        let program = parse_source("a = \"ab\" * 3\nb = 3 * \"ab\"\nc = \"ab\" * 0\n");
        let interpreter = run_program(&program);
        assert_eq!(global_bytes(&interpreter, "a"), b"ababab");
        assert_eq!(global_bytes(&interpreter, "b"), b"ababab");
        assert_eq!(global_bytes(&interpreter, "c"), b"");
    }

    #[test]
    fn string_concatenation() {
        let program = parse_source("x = \"foo\" + \"bar\"\n");
        let interpreter = run_program(&program);
        assert_eq!(global_bytes(&interpreter, "x"), b"foobar");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let program = parse_source("x = 1 / 0\n");
        assert_eq!(run_error(&program), RuntimeError::DivisionByZero);

        let program = parse_source("x = 1.5 / 0.0\n");
        assert_eq!(run_error(&program), RuntimeError::DivisionByZero);

        let program = parse_source("x = 7 % 0\n");
        assert_eq!(run_error(&program), RuntimeError::DivisionByZero);
    }

    #[test]
    fn logical_operators_do_not_short_circuit() {
        let source = "\
hits = []
def side():
    hits.append(1)
    return true
a = false and side()
b = true or side()
n = len(hits)
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        // Both right-hand sides ran despite the left operand deciding the
        // outcome.
        assert_eq!(global_int(&interpreter, "n"), 2);
        assert!(!global_bool(&interpreter, "a"));
        assert!(global_bool(&interpreter, "b"));
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let program = parse_source("x = [1, 2, 3][-1]\n");
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 3);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let program = parse_source("x = [1, 2, 3][5]\n");
        assert_eq!(
            run_error(&program),
            RuntimeError::IndexOutOfBounds { index: 5, len: 3 }
        );

        let program = parse_source("x = [1, 2, 3][-4]\n");
        assert_eq!(
            run_error(&program),
            RuntimeError::IndexOutOfBounds { index: -4, len: 3 }
        );
    }

    #[test]
    fn lists_share_their_backing_store() {
        let source = "\
x = [1, 2]
y = x
y.append(3)
n = len(x)
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "n"), 3);
    }

    #[test]
    fn list_equality_is_reference_identity() {
        let source = "\
a = [1, 2] == [1, 2]
x = [1, 2]
y = x
b = x == y
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert!(!global_bool(&interpreter, "a"));
        assert!(global_bool(&interpreter, "b"));
    }

    #[test]
    fn function_calls_bind_parameters() {
        let source = "\
def f(a, b):
    return a + b
x = f(3, 4)
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 7);
    }

    #[test]
    fn missing_arguments_bind_none_not_an_arity_error() {
        let source = "\
def f(a, b):
    return a + b
x = f(3)
";
        let program = parse_source(source);
        // The failure comes from `+` on int and none, not from the call.
        match run_error(&program) {
            RuntimeError::Type(message) => {
                assert!(message.contains("int"), "message: {}", message);
                assert!(message.contains("none"), "message: {}", message);
            }
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn extra_arguments_are_silently_dropped() {
        let source = "\
def f(a):
    return a
x = f(1, 2, 3)
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 1);
    }

    #[test]
    fn while_loop_counts_to_five() {
        let source = "\
i = 0
while i < 5:
    i = i + 1
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "i"), 5);
    }

    #[test]
    fn return_escapes_nested_loops() {
        let source = "\
def find():
    i = 0
    while true:
        while true:
            return 42
x = find()
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 42);
    }

    #[test]
    fn break_and_continue_stay_inside_their_loop() {
        let source = "\
total = 0
for n in [1, 2, 3, 4, 5]:
    if n == 2:
        continue
    if n == 5:
        break
    total += n
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "total"), 8);
    }

    #[test]
    fn top_level_break_halts_silently() {
        let source = "\
x = 1
break
x = 2
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 1);
    }

    #[test]
    fn dict_iteration_follows_insertion_order() {
        let source = "\
d = {\"a\": 1, \"b\": 2}
d[\"c\"] = 3
d[\"a\"] = 99
order = \"\"
for key in d:
    order = order + key
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        // Reassigning `a` did not move it.
        assert_eq!(global_bytes(&interpreter, "order"), b"abc");
    }

    #[test]
    fn string_iteration_yields_raw_bytes() {
        let source = "\
count = 0
for c in \"hé\":
    count += 1
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        // `é` is two bytes of UTF-8, so the loop runs three times.
        assert_eq!(global_int(&interpreter, "count"), 3);
    }

    #[test]
    fn del_shifts_list_elements() {
        let source = "\
items = [1, 2, 3, 4, 5]
del items[2]
a = items[0]
b = items[1]
c = items[2]
d = items[3]
n = len(items)
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "n"), 4);
        assert_eq!(global_int(&interpreter, "a"), 1);
        assert_eq!(global_int(&interpreter, "b"), 2);
        assert_eq!(global_int(&interpreter, "c"), 4);
        assert_eq!(global_int(&interpreter, "d"), 5);
    }

    #[test]
    fn del_removes_dict_keys_in_place() {
        let source = "\
d = {\"a\": 1, \"b\": 2}
del d[\"b\"]
n = len(d)
a = d[\"a\"]
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "n"), 1);
        assert_eq!(global_int(&interpreter, "a"), 1);

        let program = parse_source("d = {\"a\": 1}\ndel d[\"x\"]\n");
        assert!(matches!(run_error(&program), RuntimeError::KeyNotFound(_)));
    }

    #[test]
    fn missing_dict_key_is_an_error() {
        let program = parse_source("d = {\"a\": 1}\nx = d[\"b\"]\n");
        assert!(matches!(run_error(&program), RuntimeError::KeyNotFound(_)));
    }

    #[test]
    fn free_names_resolve_through_the_caller_chain() {
        let source = "\
def show():
    return secret
def caller():
    secret = 99
    return show()
x = caller()
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        // Dynamic scoping: `secret` lives in the caller's frame, not the
        // definition site.
        assert_eq!(global_int(&interpreter, "x"), 99);
    }

    #[test]
    fn builtins_cannot_be_shadowed_by_def() {
        let source = "\
def len(x):
    return 0
n = len([1, 2, 3])
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "n"), 3);
    }

    #[test]
    fn cross_type_comparison_is_an_error() {
        let program = parse_source("x = \"a\" < 1\n");
        assert!(matches!(run_error(&program), RuntimeError::Type(_)));
    }

    #[test]
    fn mixed_numeric_comparison_promotes() {
        let program = parse_source("a = 1 < 1.5\nb = 2.5 <= 2\n");
        let interpreter = run_program(&program);
        assert!(global_bool(&interpreter, "a"));
        assert!(!global_bool(&interpreter, "b"));
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        let program = parse_source("a = \"abc\" < \"abd\"\nb = \"b\" < \"a\"\n");
        let interpreter = run_program(&program);
        assert!(global_bool(&interpreter, "a"));
        assert!(!global_bool(&interpreter, "b"));
    }

    #[test]
    fn mismatched_type_equality_is_false() {
        let program = parse_source("a = 1 == \"1\"\nb = 1 == 1.0\nc = none == none\n");
        let interpreter = run_program(&program);
        assert!(!global_bool(&interpreter, "a"));
        assert!(global_bool(&interpreter, "b"));
        assert!(global_bool(&interpreter, "c"));
    }

    #[test]
    fn membership_tests_lists_dicts_and_strings() {
        let source = "\
a = 2 in [1, 2, 3]
b = 5 not in [1, 2, 3]
c = \"b\" in {\"a\": 1, \"b\": 2}
d = \"bc\" in \"abcd\"
e = \"x\" in \"abcd\"
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert!(global_bool(&interpreter, "a"));
        assert!(global_bool(&interpreter, "b"));
        assert!(global_bool(&interpreter, "c"));
        assert!(global_bool(&interpreter, "d"));
        assert!(!global_bool(&interpreter, "e"));
    }

    #[test]
    fn augmented_assignment_reads_then_writes() {
        let source = "\
x = 10
x -= 3
x *= 2
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 14);

        let program = parse_source("y += 1\n");
        assert!(matches!(
            run_error(&program),
            RuntimeError::UndefinedVariable(_)
        ));
    }

    #[test]
    fn assignment_mutates_the_owning_scope() {
        let source = "\
counter = 0
def bump():
    counter = counter + 1
    return none
bump()
bump()
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        // `assign` walks out to the scope that owns `counter`.
        assert_eq!(global_int(&interpreter, "counter"), 2);
    }

    #[test]
    fn block_scopes_do_not_leak_fresh_names() {
        let source = "\
if true:
    temp = 5
found = \"temp\" in [\"nothing\"]
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert!(interpreter.globals().get("temp").is_none());
        assert!(!global_bool(&interpreter, "found"));
    }

    #[test]
    fn string_indexing_is_byte_based() {
        let source = "\
s = \"abc\"
first = s[0]
last = s[-1]
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_bytes(&interpreter, "first"), b"a");
        assert_eq!(global_bytes(&interpreter, "last"), b"c");
    }

    #[test]
    fn function_redefinition_overwrites() {
        let source = "\
def f():
    return 1
def f():
    return 2
x = f()
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), 2);
    }

    #[test]
    fn elif_branches_evaluate_in_order() {
        let source = "\
x = 2
if x == 1:
    label = \"one\"
elif x == 2:
    label = \"two\"
else:
    label = \"other\"
result = none
if x == 2:
    result = 1
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "result"), 1);
    }

    #[test]
    fn list_methods_append_and_pop() {
        let source = "\
xs = [1]
xs.append(2)
tail = xs.pop()
n = len(xs)
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "tail"), 2);
        assert_eq!(global_int(&interpreter, "n"), 1);

        let program = parse_source("x = [].pop()\n");
        assert!(matches!(
            run_error(&program),
            RuntimeError::IndexOutOfBounds { .. }
        ));
    }

    #[test]
    fn dict_keys_and_values_snapshot_in_order() {
        let source = "\
d = {\"a\": 1, \"b\": 2}
ks = d.keys()
vs = d.values()
first_key = ks[0]
second_value = vs[1]
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_bytes(&interpreter, "first_key"), b"a");
        assert_eq!(global_int(&interpreter, "second_value"), 2);
    }

    #[test]
    fn string_methods_transform_bytes() {
        let source = "\
a = \"Mixed Case\".upper()
b = \"Mixed Case\".lower()
c = \"  padded  \".strip()
parts = \"a,b,c\".split(\",\")
n = len(parts)
mid = parts[1]
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert_eq!(global_bytes(&interpreter, "a"), b"MIXED CASE");
        assert_eq!(global_bytes(&interpreter, "b"), b"mixed case");
        assert_eq!(global_bytes(&interpreter, "c"), b"padded");
        assert_eq!(global_int(&interpreter, "n"), 3);
        assert_eq!(global_bytes(&interpreter, "mid"), b"b");
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let program = parse_source("x = [1].reverse()\n");
        assert!(matches!(
            run_error(&program),
            RuntimeError::UnsupportedOperation(_)
        ));
    }

    #[test]
    fn undefined_variable_fails_fast() {
        let source = "\
x = missing
x = 2
";
        let program = parse_source(source);
        let interpreter = Interpreter::new(Builtins::core());
        assert!(matches!(
            interpreter.run(&program),
            Err(RuntimeError::UndefinedVariable(_))
        ));
        // The failing statement aborted the rest of the program.
        assert!(interpreter.globals().get("x").is_none());
    }

    #[test]
    fn builtin_failure_collapses_to_builtin_error() {
        let program = parse_source("x = int(\"not a number\")\n");
        match run_error(&program) {
            RuntimeError::Builtin { name, .. } => assert_eq!(name, "int"),
            other => panic!("expected builtin error, got {:?}", other),
        }
    }

    #[test]
    fn negation_applies_to_numbers_only() {
        let program = parse_source("x = -5\ny = -2.5\n");
        let interpreter = run_program(&program);
        assert_eq!(global_int(&interpreter, "x"), -5);

        let program = parse_source("x = -\"s\"\n");
        assert!(matches!(run_error(&program), RuntimeError::Type(_)));
    }

    #[test]
    fn not_follows_truthiness() {
        let source = "\
a = not 0
b = not \"text\"
c = not []
d = not none
";
        let program = parse_source(source);
        let interpreter = run_program(&program);
        assert!(global_bool(&interpreter, "a"));
        assert!(!global_bool(&interpreter, "b"));
        assert!(global_bool(&interpreter, "c"));
        assert!(global_bool(&interpreter, "d"));
    }

    #[test]
    fn huge_string_repetition_reports_out_of_memory() {
        let program = parse_source("x = \"ab\" * 9223372036854775807\n");
        assert!(matches!(
            run_error(&program),
            RuntimeError::OutOfMemory(_)
        ));
    }

    #[test]
    fn host_globals_are_visible_to_scripts() {
        let program = parse_source("x = __marker__\n");
        let globals = Environment::new(None);
        globals.define("__marker__".to_string(), Value::Int(7));
        let interpreter = Interpreter::with_globals(Builtins::core(), globals);
        interpreter.run(&program).expect("program should run");
        assert_eq!(global_int(&interpreter, "x"), 7);
    }
}
