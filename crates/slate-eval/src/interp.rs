//! The tree-walking evaluator.
//!
//! [`Evaluator`] owns the environment arena, the function table, and the
//! host I/O streams. Evaluation recurses on AST node kind: statements
//! return [`Value::Null`] by convention, expressions return their value,
//! and a program's result is the last value produced.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use slate_par::ast::*;
use slate_util::IndexVec;

use crate::builtins;
use crate::env::{Access, EnvId, Environments, ROOT_ENV};
use crate::error::RuntimeError;
use crate::methods;
use crate::value::{normalise_index, FuncId, Value};

/// A user subroutine interned by the evaluator: the parsed block plus the
/// environment it was defined in (its lexical parent for calls).
#[derive(Debug)]
struct FuncDef {
    block: FuncBlock,
    env: EnvId,
}

/// The Slate evaluator.
pub struct Evaluator {
    envs: Environments,
    funcs: IndexVec<FuncId, Rc<FuncDef>>,
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Evaluator {
    /// Creates an evaluator talking to the process's stdin/stdout, with
    /// the built-ins installed in the root environment.
    pub fn new() -> Self {
        Self::with_io(
            Box::new(io::stdout()),
            Box::new(io::BufReader::new(io::stdin())),
        )
    }

    /// Creates an evaluator over caller-supplied streams.
    ///
    /// Tests pass capture buffers here; the REPL passes stdin/stdout once
    /// and keeps the evaluator across inputs.
    pub fn with_io(out: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        let mut envs = Environments::new();
        builtins::install(&mut envs);
        Self {
            envs,
            funcs: IndexVec::new(),
            out,
            input,
        }
    }

    /// Evaluates a whole program in the root environment.
    ///
    /// Returns the last value produced, which the REPL echoes.
    pub fn eval_program(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in &program.body {
            last = self.eval_stmt(stmt, ROOT_ENV)?;
        }
        Ok(last)
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: EnvId) -> Result<Value, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr, env),
            Stmt::If(block) => self.eval_if(block, env),
            Stmt::For(block) => self.eval_for(block, env),
            Stmt::While(block) => self.eval_while(block, env),
            Stmt::Func(block) => self.eval_func_decl(block, env),
        }
    }

    /// Evaluates a statement list, returning the last value produced.
    fn eval_body(&mut self, body: &[Stmt], env: EnvId) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in body {
            last = self.eval_stmt(stmt, env)?;
        }
        Ok(last)
    }

    /// Walks the branches in order; at most one body runs.
    fn eval_if(&mut self, block: &IfBlock, env: EnvId) -> Result<Value, RuntimeError> {
        for branch in &block.branches {
            match &branch.condition {
                None => return self.eval_body(&branch.body, env),
                Some(condition) => {
                    if self.eval_expr(condition, env)?.is_truthy() {
                        return self.eval_body(&branch.body, env);
                    }
                }
            }
        }
        Ok(Value::Null)
    }

    /// Runs a counted loop.
    ///
    /// Termination is "variable not equal to limit", as the language
    /// defines it; a step that skips over the limit loops forever. Limit
    /// and step are evaluated once, before the first iteration.
    fn eval_for(&mut self, block: &ForBlock, env: EnvId) -> Result<Value, RuntimeError> {
        self.eval_expr(&block.init, env)?;
        let limit = self.eval_expr(&block.limit, env)?;
        let step = match &block.step {
            Some(expr) => self.eval_expr(expr, env)?,
            None => Value::Int(1),
        };
        if limit.as_number().is_none() || step.as_number().is_none() {
            return Err(RuntimeError::type_error(
                "for loop limit and step must be numbers",
            ));
        }

        loop {
            let current = self.envs.get(env, &block.var)?;
            if current.as_number().is_none() {
                return Err(RuntimeError::type_error(format!(
                    "for loop variable '{}' must be a number",
                    block.var
                )));
            }
            if current == limit {
                return Ok(Value::Null);
            }

            self.eval_body(&block.body, env)?;

            let current = self.envs.get(env, &block.var)?;
            let next = add_values(&current, &step)?;
            self.envs.assign(env, &block.var, next, Access::Norm)?;
        }
    }

    fn eval_while(&mut self, block: &WhileBlock, env: EnvId) -> Result<Value, RuntimeError> {
        while self.eval_expr(&block.condition, env)?.is_truthy() {
            self.eval_body(&block.body, env)?;
        }
        Ok(Value::Null)
    }

    /// Interns the subroutine and binds it under its name.
    fn eval_func_decl(&mut self, block: &FuncBlock, env: EnvId) -> Result<Value, RuntimeError> {
        let id = self.funcs.push(Rc::new(FuncDef {
            block: block.clone(),
            env,
        }));
        self.envs
            .assign(env, &block.name, Value::Subroutine(id), Access::Norm)?;
        Ok(Value::Null)
    }

    fn eval_expr(&mut self, expr: &Expr, env: EnvId) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::string(s)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name) => self.envs.get(env, name),
            Expr::Unary { op: UnOp::Not, operand } => {
                let value = self.eval_expr(operand, env)?;
                Ok(Value::Bool(!value.is_truthy()))
            }
            Expr::Binary {
                op,
                kind,
                left,
                right,
            } => {
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                eval_binary(*op, *kind, left, right)
            }
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::list(values))
            }
            Expr::Assign { name, value, scope } => {
                let value = self.eval_expr(value, env)?;
                self.bind(env, name, value, *scope)?;
                Ok(Value::Null)
            }
            Expr::ArrayDecl {
                name,
                length,
                init,
                scope,
            } => {
                let elements = match init {
                    None => vec![Value::Null; *length],
                    Some(exprs) => {
                        if exprs.len() != *length {
                            return Err(RuntimeError::value_error(format!(
                                "array '{}' declared with length {} but initialised with {} element(s)",
                                name,
                                length,
                                exprs.len()
                            )));
                        }
                        let mut values = Vec::with_capacity(exprs.len());
                        for expr in exprs {
                            values.push(self.eval_expr(expr, env)?);
                        }
                        values
                    }
                };
                self.bind(env, name, Value::list(elements), *scope)?;
                Ok(Value::Null)
            }
            Expr::Index {
                object,
                index,
                value,
            } => self.eval_index(object, index, value, env),
            Expr::Member {
                object,
                member,
                args,
                is_attribute,
            } => {
                let recv = self.eval_expr(object, env)?;
                let args = self.eval_args(args, env)?;
                methods::eval_member(&recv, member, &args, *is_attribute)
            }
            Expr::Call { name, args } => {
                let callee = self.envs.get(env, name)?;
                let args = self.eval_args(args, env)?;
                match callee {
                    Value::Builtin(builtin) => {
                        builtin.call(args, &mut *self.out, &mut *self.input)
                    }
                    Value::Subroutine(id) => self.call_subroutine(id, args),
                    other => Err(RuntimeError::type_error(format!(
                        "'{}' is not callable (it is a {})",
                        name,
                        other.type_name()
                    ))),
                }
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: EnvId) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env)?);
        }
        Ok(values)
    }

    /// Binds an assignment target according to its scope prefix.
    fn bind(
        &mut self,
        env: EnvId,
        name: &str,
        value: Value,
        scope: AssignScope,
    ) -> Result<(), RuntimeError> {
        match scope {
            AssignScope::Var => self.envs.assign(env, name, value, Access::Norm),
            AssignScope::Const => self.envs.assign(env, name, value, Access::Const),
            AssignScope::Global => self.envs.assign_global(name, value, Access::Norm),
        }
    }

    /// Indexed read or write.
    ///
    /// Reads work on lists and strings; writes only on lists. Writes
    /// return the container, reads the element. A negative index counts
    /// from the end of the container.
    fn eval_index(
        &mut self,
        object: &Expr,
        index: &Expr,
        value: &Option<Box<Expr>>,
        env: EnvId,
    ) -> Result<Value, RuntimeError> {
        let container = self.eval_expr(object, env)?;
        let raw = match self.eval_expr(index, env)? {
            Value::Int(n) => n,
            other => {
                return Err(RuntimeError::type_error(format!(
                    "index must be an integer, found {}",
                    other.type_name()
                )))
            }
        };

        match value {
            None => match &container {
                Value::List(items) => {
                    let items = items.borrow();
                    let position = normalise_index(raw, items.len())?;
                    Ok(items[position].clone())
                }
                Value::Str(s) => {
                    let position = normalise_index(raw, s.chars().count())?;
                    let c = s.chars().nth(position).unwrap_or_default();
                    Ok(Value::string(c.to_string()))
                }
                other => Err(RuntimeError::type_error(format!(
                    "value of type {} is not indexable",
                    other.type_name()
                ))),
            },
            Some(rhs) => {
                let new_value = self.eval_expr(rhs, env)?;
                match &container {
                    Value::List(items) => {
                        let mut items = items.borrow_mut();
                        let position = normalise_index(raw, items.len())?;
                        items[position] = new_value;
                        drop(items);
                        Ok(container)
                    }
                    Value::Str(_) => Err(RuntimeError::type_error(
                        "strings are immutable and cannot be assigned into",
                    )),
                    other => Err(RuntimeError::type_error(format!(
                        "value of type {} does not support indexed assignment",
                        other.type_name()
                    ))),
                }
            }
        }
    }

    /// Calls a user subroutine.
    ///
    /// The call frame's parent is the *defining* environment, so names
    /// resolve lexically; the caller's frame is never visible.
    fn call_subroutine(&mut self, id: FuncId, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let def = self.funcs[id].clone();
        let block = &def.block;

        if args.len() != block.params.len() {
            return Err(RuntimeError::Arity {
                name: block.name.clone(),
                expected: block.params.len().to_string(),
                found: args.len(),
            });
        }

        let frame = self.envs.push_frame(def.env);
        for (param, arg) in block.params.iter().zip(args) {
            self.envs.declare(frame, param, arg, Access::Norm)?;
        }

        self.eval_body(&block.body, frame)?;

        match (block.kind, &block.return_expr) {
            (FuncKind::Function, Some(expr)) => self.eval_expr(expr, frame),
            _ => Ok(Value::Null),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Binary operator evaluation
// =============================================================================

/// Applies a binary operator to two evaluated operands.
fn eval_binary(op: BinOp, kind: BinKind, left: Value, right: Value) -> Result<Value, RuntimeError> {
    // AND/OR combine truthiness whichever table they were parsed into.
    if matches!(op, BinOp::And | BinOp::Or) || kind == BinKind::Boolean {
        return eval_logical(op, &left, &right);
    }

    match op {
        BinOp::Add => add_values(&left, &right),
        BinOp::Sub => numeric_op(op, &left, &right, |a, b| a - b, |a, b| a - b),
        BinOp::Mul => numeric_op(op, &left, &right, |a, b| a * b, |a, b| a * b),
        BinOp::Div => {
            let (a, b) = both_numbers(op, &left, &right)?;
            if b == 0.0 {
                return Err(RuntimeError::value_error("division by zero"));
            }
            Ok(Value::Float(a / b))
        }
        BinOp::Mod => {
            check_divisor(&right)?;
            numeric_op(op, &left, &right, floor_mod_i, |a, b| {
                a - b * (a / b).floor()
            })
        }
        BinOp::IntDiv => {
            check_divisor(&right)?;
            numeric_op(op, &left, &right, floor_div_i, |a, b| (a / b).floor())
        }
        BinOp::Eq | BinOp::Ne => {
            if !comparable(&left, &right) {
                return Err(cmp_error(op, &left, &right));
            }
            let equal = left == right;
            Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }))
        }
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => eval_ordering(op, &left, &right),
        BinOp::And | BinOp::Or => eval_logical(op, &left, &right),
    }
}

fn eval_logical(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let (l, r) = (left.is_truthy(), right.is_truthy());
    match op {
        BinOp::And => Ok(Value::Bool(l && r)),
        BinOp::Or => Ok(Value::Bool(l || r)),
        other => Err(RuntimeError::unsupported(format!(
            "operator '{}' is not a boolean operator",
            other.as_str()
        ))),
    }
}

/// `+`: numeric addition, or concatenation of two strings.
fn add_values(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        let mut joined = String::with_capacity(a.len() + b.len());
        joined.push_str(a);
        joined.push_str(b);
        return Ok(Value::string(joined));
    }
    numeric_op(BinOp::Add, left, right, |a, b| a + b, |a, b| a + b)
}

/// Dispatches a numeric operator: int op int stays int, any float operand
/// widens the whole operation to float.
fn numeric_op(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => {
            let (a, b) = both_numbers(op, left, right)?;
            Ok(Value::Float(float_op(a, b)))
        }
    }
}

fn both_numbers(op: BinOp, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.as_str(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn check_divisor(right: &Value) -> Result<(), RuntimeError> {
    if right.as_number() == Some(0.0) {
        return Err(RuntimeError::value_error("division by zero"));
    }
    Ok(())
}

/// Equality is defined within a kind (numbers count as one kind).
fn comparable(left: &Value, right: &Value) -> bool {
    if left.as_number().is_some() && right.as_number().is_some() {
        return true;
    }
    left.type_name() == right.type_name()
}

fn eval_ordering(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            let (a, b) = both_numbers(op, left, right)?;
            a.partial_cmp(&b)
                .ok_or_else(|| cmp_error(op, left, right))?
        }
    };
    let result = match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Ge => ordering.is_ge(),
        _ => unreachable!("eval_ordering called with a non-ordering operator"),
    };
    Ok(Value::Bool(result))
}

fn cmp_error(op: BinOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "cannot compare {} and {} with '{}'",
        left.type_name(),
        right.type_name(),
        op.as_str()
    ))
}

/// Floor division: the quotient rounds toward negative infinity.
fn floor_div_i(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if (a % b != 0) && ((a % b < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

/// Floor modulus: the result's sign follows the divisor.
fn floor_mod_i(a: i64, b: i64) -> i64 {
    a - b * floor_div_i(a, b)
}
