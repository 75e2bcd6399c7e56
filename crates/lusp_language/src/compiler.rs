//! Single-pass compiler from source text to register bytecode.
//!
//! Parsing and code generation are fused: the compiler pulls one token at a
//! time from the lexer and emits instructions as it recognizes each
//! construct. Registers are allocated with a stack discipline and rolled back
//! in bulk when a statement or scope ends.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! statement  := 'let' SYMBOL ['=' expr]
//!             | 'if' expr block ['else' (block | if-statement)]
//!             | 'while' expr block
//!             | '{' statement* '}'
//!             | expr
//! block      := '{' statement* '}' | statement
//! expr       := equality
//! equality   := relational (('==' | '!=') relational)*
//! relational := multiplicative (('<' | '<=' | '>' | '>=') multiplicative)*
//! multiplicative := additive (('*' | '/' | '%') additive)*
//! additive   := term (('+' | '-') term)*
//! term       := literal | '(' expr ')' | closure
//!             | SYMBOL ('(' args ')')* | SYMBOL '=' expr
//! closure    := '|' '(' params ')' statement* '|' | '|' params '|' block
//! ```

#![allow(clippy::too_many_lines)]

mod scope;

use std::mem;
use std::rc::Rc;

use lusp_foundation::{CapacityLimit, Error, ErrorKind, Result, Symbol};
use tracing::debug;

use crate::closure::Closure;
use crate::environment::Environment;
use crate::lexer::Lexer;
use crate::opcode::{BinaryOp, Bytecode, Capture, Op, Reg};
use crate::token::{Span, Token, TokenKind};
use crate::value::Value;

use scope::{Binding, FunctionState, Resolved, Scope, UpvalueDesc};

/// Capacity ceilings applied while compiling.
///
/// Exceeding any of them aborts the compile unit with
/// [`ErrorKind::LimitExceeded`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompilerLimits {
    /// Instructions per function body.
    pub max_instructions: usize,
    /// Registers per function window. Capped at `u16::MAX`.
    pub max_registers: usize,
    /// Upvalues captured per function.
    pub max_upvalues: usize,
    /// Bindings per scope.
    pub max_bindings: usize,
    /// Scope nesting, and nesting of parentheses, calls, closures,
    /// assignments and `else if` chains.
    pub max_depth: usize,
}

impl Default for CompilerLimits {
    fn default() -> Self {
        Self {
            max_instructions: 65_536,
            max_registers: 1_024,
            max_upvalues: 1_024,
            max_bindings: 1_024,
            max_depth: 128,
        }
    }
}

type ErrorHook<'h> = Box<dyn FnMut(&Error) + 'h>;

/// Compiles source text into closures.
///
/// A `Compiler` only carries configuration; each call to
/// [`compile`](Self::compile) is an independent compile unit.
pub struct Compiler<'h> {
    limits: CompilerLimits,
    on_error: Option<ErrorHook<'h>>,
}

impl<'h> Compiler<'h> {
    /// Creates a compiler with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limits: CompilerLimits::default(),
            on_error: None,
        }
    }

    /// Replaces the capacity limits.
    #[must_use]
    pub fn with_limits(mut self, limits: CompilerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Registers a hook that sees every compile error before it is returned.
    #[must_use]
    pub fn on_error(mut self, hook: impl FnMut(&Error) + 'h) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Returns the active limits.
    #[must_use]
    pub fn limits(&self) -> &CompilerLimits {
        &self.limits
    }

    /// Compiles `source` into a zero-argument closure.
    ///
    /// Global names are resolved against `env`, creating slots as needed.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed syntax, duplicate bindings in one
    /// scope, or an exceeded capacity limit. No bytecode survives a failed
    /// compile.
    pub fn compile(&mut self, env: &mut Environment, source: &str) -> Result<Rc<Closure>> {
        let result = Session::new(env, &self.limits, source).program();
        if let Err(err) = &result {
            debug!(error = %err, "compile failed");
            if let Some(hook) = self.on_error.as_mut() {
                hook(err);
            }
        }
        result
    }
}

impl Default for Compiler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles `source` against `env` with default limits.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(env: &mut Environment, source: &str) -> Result<Rc<Closure>> {
    Compiler::new().compile(env, source)
}

/// Number of binary precedence levels.
const LEVELS: usize = 4;

/// Binding level of a binary operator, loosest first.
const fn precedence(op: BinaryOp) -> usize {
    match op {
        BinaryOp::Equal | BinaryOp::NotEqual => 0,
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => 1,
        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 2,
        BinaryOp::Add | BinaryOp::Subtract => 3,
    }
}

/// Returns the operator `kind` denotes if it binds at `level`.
fn binary_op(kind: &TokenKind, level: usize) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        _ => return None,
    };
    (precedence(op) == level).then_some(op)
}

/// State of one compile unit.
struct Session<'c, 'src> {
    env: &'c mut Environment,
    limits: &'c CompilerLimits,
    lexer: Lexer<'src>,
    /// Lookahead; the compiler never looks further.
    token: Token,
    /// Scope chain across every function being compiled, innermost last.
    scopes: Vec<Scope>,
    /// The function whose body is being compiled.
    current: FunctionState,
    /// Functions enclosing `current`, outermost first.
    enclosing: Vec<FunctionState>,
    /// Parenthesis and closure-literal nesting.
    nesting: usize,
}

impl<'c, 'src> Session<'c, 'src> {
    fn new(env: &'c mut Environment, limits: &'c CompilerLimits, source: &'src str) -> Self {
        Self {
            env,
            limits,
            lexer: Lexer::new(source),
            token: Token::new(TokenKind::Eof, Span::default()),
            scopes: Vec::new(),
            current: FunctionState::new(),
            enclosing: Vec::new(),
            nesting: 0,
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Moves to the next token and returns the one just consumed.
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token();
        if let TokenKind::Error(message) = &next.kind {
            return Err(Error::compile(
                message.clone(),
                next.span.line,
                next.span.column,
            ));
        }
        Ok(mem::replace(&mut self.token, next))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.token.kind) == mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> Result<()> {
        if self.eat(kind)? {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {} {context}, found {}",
                kind.name(),
                self.token.kind.name()
            )))
        }
    }

    fn expect_symbol(&mut self, context: &str) -> Result<Symbol> {
        if let TokenKind::Symbol(name) = &self.token.kind {
            let symbol = self.env.intern(name);
            self.advance()?;
            Ok(symbol)
        } else {
            Err(self.error(format!(
                "expected symbol {context}, found {}",
                self.token.kind.name()
            )))
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::compile(message, self.token.span.line, self.token.span.column)
    }

    fn limit(&self, limit: CapacityLimit) -> Error {
        Error::limit_exceeded(limit, self.token.span.line)
    }

    // =========================================================================
    // Code and registers
    // =========================================================================

    fn emit(&mut self, op: Op) -> Result<usize> {
        if self.current.code.len() >= self.limits.max_instructions {
            return Err(self.limit(CapacityLimit::Instructions(self.limits.max_instructions)));
        }
        Ok(self.current.code.emit(op, self.token.span.line))
    }

    fn max_registers(&self) -> usize {
        self.limits.max_registers.min(usize::from(Reg::MAX))
    }

    fn alloc_reg(&mut self) -> Result<Reg> {
        let max = self.max_registers();
        let reg = self.current.free_reg;
        if reg >= max {
            return Err(self.limit(CapacityLimit::Registers(max)));
        }
        self.current.free_reg += 1;
        self.current.reg_count = self.current.reg_count.max(self.current.free_reg);
        Reg::try_from(reg).map_err(|_| self.limit(CapacityLimit::Registers(max)))
    }

    fn free_reg(&self) -> usize {
        self.current.free_reg
    }

    fn release_to(&mut self, mark: usize) {
        self.current.free_reg = mark;
    }

    fn move_into(&mut self, dst: Reg, src: Reg) -> Result<()> {
        if dst != src {
            self.emit(Op::Move(dst, src))?;
        }
        Ok(())
    }

    fn jump_offset(&self, from: usize, to: usize) -> Result<i32> {
        match (i32::try_from(from), i32::try_from(to)) {
            (Ok(from), Ok(to)) => Ok(to - from),
            _ => Err(self.error("jump offset too large")),
        }
    }

    /// Points the jump at `site` to the next instruction to be emitted.
    fn patch_to_here(&mut self, site: usize) -> Result<()> {
        let offset = self.jump_offset(site + 1, self.current.code.len())?;
        self.current.code.patch_jump(site, offset);
        Ok(())
    }

    fn emit_loop(&mut self, target: usize) -> Result<()> {
        let offset = self.jump_offset(self.current.code.len() + 1, target)?;
        self.emit(Op::Jump(offset))?;
        Ok(())
    }

    /// Finishes `function`, returning its bytecode and capture list.
    fn bake(&self, function: FunctionState) -> Result<(Bytecode, Box<[Capture]>)> {
        let reg_count = Reg::try_from(function.reg_count)
            .map_err(|_| self.limit(CapacityLimit::Registers(self.max_registers())))?;
        let upval_count = u16::try_from(function.upvals.len())
            .map_err(|_| self.limit(CapacityLimit::Upvalues(self.limits.max_upvalues)))?;
        debug!(
            params = function.param_count,
            registers = function.reg_count,
            upvalues = function.upvals.len(),
            instructions = function.code.len(),
            "compiled function"
        );
        let captures = function.captures();
        let code = Bytecode::new(function.param_count, reg_count, upval_count, function.code);
        Ok((code, captures))
    }

    // =========================================================================
    // Scopes and names
    // =========================================================================

    /// Index of `current` in the function stack.
    fn depth(&self) -> usize {
        self.enclosing.len()
    }

    fn function_at(&self, index: usize) -> &FunctionState {
        if index == self.enclosing.len() {
            &self.current
        } else {
            &self.enclosing[index]
        }
    }

    fn function_at_mut(&mut self, index: usize) -> &mut FunctionState {
        if index == self.enclosing.len() {
            &mut self.current
        } else {
            &mut self.enclosing[index]
        }
    }

    fn push_scope(&mut self) -> Result<()> {
        if self.scopes.len() >= self.limits.max_depth {
            return Err(self.limit(CapacityLimit::Depth(self.limits.max_depth)));
        }
        self.scopes.push(Scope::new(self.depth(), self.free_reg()));
        Ok(())
    }

    /// Leaves the innermost scope, closing its captured registers.
    fn pop_scope(&mut self) -> Result<()> {
        let Some(scope) = self.scopes.pop() else {
            return Err(Error::new(ErrorKind::Internal("scope stack underflow".into())));
        };
        if scope.has_upvals {
            let begin = Reg::try_from(scope.base)
                .map_err(|_| self.limit(CapacityLimit::Registers(self.max_registers())))?;
            self.emit(Op::Close(begin))?;
        }
        self.release_to(scope.base);
        Ok(())
    }

    /// Checks that `symbol` may be bound in the innermost scope.
    fn declare(&self, symbol: &Symbol) -> Result<()> {
        let Some(scope) = self.scopes.last() else {
            return Err(Error::new(ErrorKind::Internal("no scope to bind in".into())));
        };
        if scope.find(symbol.id()).is_some() {
            return Err(self.error(format!("duplicate variable '{}'", symbol.name())));
        }
        if scope.bindings.len() >= self.limits.max_bindings {
            return Err(self.limit(CapacityLimit::Bindings(self.limits.max_bindings)));
        }
        Ok(())
    }

    fn bind(&mut self, symbol: &Symbol, register: Reg) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.push(Binding {
                symbol: symbol.id(),
                register,
            });
        }
    }

    /// Resolves a name to a local register, an upvalue or a global slot.
    fn resolve(&mut self, symbol: &Symbol) -> Result<Resolved> {
        let current = self.depth();
        let found = self
            .scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, scope)| scope.find(symbol.id()).map(|binding| (index, binding)));

        match found {
            Some((scope, binding)) if self.scopes[scope].function == current => Ok(
                Resolved::Local(self.scopes[scope].bindings[binding].register),
            ),
            Some((scope, binding)) => self.capture(current, scope, binding).map(Resolved::Upvalue),
            None => Ok(Resolved::Global(self.env.get_or_create_slot(symbol))),
        }
    }

    /// Returns the upvalue index of a binding in `function`, registering it
    /// (and, transitively, in every function in between) on first use.
    fn capture(&mut self, function: usize, scope: usize, binding: usize) -> Result<u16> {
        let max = self.limits.max_upvalues;
        if let Some(index) = self.function_at(function).find_upval(scope, binding) {
            return u16::try_from(index).map_err(|_| self.limit(CapacityLimit::Upvalues(max)));
        }

        let capture = if self.scopes[scope].function + 1 == function {
            Capture::Register(self.scopes[scope].bindings[binding].register)
        } else {
            Capture::Upvalue(self.capture(function - 1, scope, binding)?)
        };

        let index = self.function_at(function).upvals.len();
        if index >= max {
            return Err(self.limit(CapacityLimit::Upvalues(max)));
        }
        let index = u16::try_from(index).map_err(|_| self.limit(CapacityLimit::Upvalues(max)))?;

        self.scopes[scope].has_upvals = true;
        self.function_at_mut(function).upvals.push(UpvalueDesc {
            scope,
            binding,
            capture,
        });
        Ok(index)
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= self.limits.max_depth {
            return Err(self.limit(CapacityLimit::Depth(self.limits.max_depth)));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn program(mut self) -> Result<Rc<Closure>> {
        self.advance()?;
        self.push_scope()?;
        let dest = self.alloc_reg()?;
        self.statements_until(&TokenKind::Eof, dest)?;
        self.emit(Op::Return(dest))?;
        self.scopes.pop();

        let function = mem::replace(&mut self.current, FunctionState::new());
        let (code, _) = self.bake(function)?;
        Ok(Rc::new(Closure::new(Rc::new(code), Box::new([]))))
    }

    /// Compiles statements up to (not including) `end`, leaving the last
    /// one's value in `dest`.
    fn statements_until(&mut self, end: &TokenKind, dest: Reg) -> Result<()> {
        let mut empty = true;
        while !self.check(end) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error(format!("expected {} before end of input", end.name())));
            }
            self.statement(dest)?;
            empty = false;
        }
        if empty {
            self.emit(Op::LoadConst(dest, Value::Null))?;
        }
        Ok(())
    }

    fn statement(&mut self, dest: Reg) -> Result<()> {
        let mark = self.free_reg();
        match self.token.kind {
            TokenKind::Let => return self.let_statement(dest),
            TokenKind::If => self.if_statement(dest)?,
            TokenKind::While => self.while_statement(dest)?,
            TokenKind::LBrace => self.block(dest)?,
            _ => {
                let value = self.expression(dest)?;
                self.move_into(dest, value)?;
            }
        }
        self.release_to(mark);
        Ok(())
    }

    /// `let name [= expr]`. The binding is visible after its initializer.
    fn let_statement(&mut self, dest: Reg) -> Result<()> {
        self.advance()?;
        let symbol = self.expect_symbol("after 'let'")?;
        self.declare(&symbol)?;
        let reg = self.alloc_reg()?;
        if self.eat(&TokenKind::Assign)? {
            let value = self.expression(reg)?;
            self.move_into(reg, value)?;
        } else {
            self.emit(Op::LoadConst(reg, Value::Null))?;
        }
        self.bind(&symbol, reg);
        self.release_to(usize::from(reg) + 1);
        self.move_into(dest, reg)
    }

    fn if_statement(&mut self, dest: Reg) -> Result<()> {
        self.advance()?;
        let mark = self.free_reg();
        let temp = self.alloc_reg()?;
        let condition = self.expression(temp)?;
        let skip_then = self.emit(Op::JumpIfNot(condition, 0))?;
        self.release_to(mark);

        self.block(dest)?;
        let skip_else = self.emit(Op::Jump(0))?;
        self.patch_to_here(skip_then)?;

        if self.eat(&TokenKind::Else)? {
            if self.check(&TokenKind::If) {
                self.nested(|this| this.if_statement(dest))?;
            } else {
                self.block(dest)?;
            }
        } else {
            self.emit(Op::LoadConst(dest, Value::Null))?;
        }
        self.patch_to_here(skip_else)
    }

    /// `while cond block`. Evaluates to null.
    fn while_statement(&mut self, dest: Reg) -> Result<()> {
        self.advance()?;
        let start = self.current.code.len();
        let mark = self.free_reg();
        let temp = self.alloc_reg()?;
        let condition = self.expression(temp)?;
        let exit = self.emit(Op::JumpIfNot(condition, 0))?;
        self.release_to(mark);

        self.block(dest)?;
        self.emit_loop(start)?;
        self.patch_to_here(exit)?;
        self.emit(Op::LoadConst(dest, Value::Null))?;
        Ok(())
    }

    fn block(&mut self, dest: Reg) -> Result<()> {
        self.push_scope()?;
        if self.eat(&TokenKind::LBrace)? {
            self.statements_until(&TokenKind::RBrace, dest)?;
            self.advance()?;
        } else {
            self.statement(dest)?;
        }
        self.pop_scope()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Compiles an expression, preferring `dest` as its result register.
    ///
    /// Returns the register holding the value: `dest`, or the register of a
    /// local variable read without copying.
    fn expression(&mut self, dest: Reg) -> Result<Reg> {
        self.binary(0, dest)
    }

    fn binary(&mut self, level: usize, dest: Reg) -> Result<Reg> {
        if level == LEVELS {
            return self.term(dest);
        }

        let mut left = self.binary(level + 1, dest)?;
        while let Some(op) = binary_op(&self.token.kind, level) {
            self.advance()?;
            // The right operand may assign to the left one's variable.
            self.move_into(dest, left)?;
            let mark = self.free_reg();
            let temp = self.alloc_reg()?;
            let right = self.binary(level + 1, temp)?;
            self.emit(Op::Binary(op, dest, dest, right))?;
            self.release_to(mark);
            left = dest;
        }
        Ok(left)
    }

    fn term(&mut self, dest: Reg) -> Result<Reg> {
        let value = match &self.token.kind {
            TokenKind::Boolean(b) => Value::Boolean(*b),
            TokenKind::Integer(n) => Value::Integer(*n),
            TokenKind::Real(n) => Value::Real(*n),
            TokenKind::String(s) => Value::string(s),
            TokenKind::Symbol(_) => return self.symbol_term(dest),
            TokenKind::LParen => return self.nested(|this| this.parenthesized(dest)),
            TokenKind::Bar => return self.nested(|this| this.closure(dest)).map(|()| dest),
            other => {
                return Err(self.error(format!("expected expression, found {}", other.name())));
            }
        };
        self.advance()?;
        self.emit(Op::LoadConst(dest, value))?;
        Ok(dest)
    }

    fn parenthesized(&mut self, dest: Reg) -> Result<Reg> {
        self.advance()?;
        let value = self.expression(dest)?;
        self.expect(&TokenKind::RParen, "after expression")?;
        Ok(value)
    }

    /// A variable read, a chain of calls, or an assignment.
    fn symbol_term(&mut self, dest: Reg) -> Result<Reg> {
        let symbol = self.expect_symbol("")?;

        if self.eat(&TokenKind::Assign)? {
            let target = self.resolve(&symbol)?;
            let value = self.nested(|this| this.expression(dest))?;
            match target {
                Resolved::Local(reg) => self.move_into(reg, value)?,
                Resolved::Upvalue(index) => {
                    self.emit(Op::StoreUpval(value, index))?;
                }
                Resolved::Global(slot) => {
                    self.emit(Op::StoreGlobal(value, slot))?;
                }
            }
            return Ok(value);
        }

        let mut reg = match self.resolve(&symbol)? {
            Resolved::Local(reg) => reg,
            Resolved::Upvalue(index) => {
                self.emit(Op::LoadUpval(dest, index))?;
                dest
            }
            Resolved::Global(slot) => {
                self.emit(Op::LoadGlobal(dest, slot))?;
                dest
            }
        };
        while self.check(&TokenKind::LParen) {
            reg = self.nested(|this| this.call(dest, reg))?;
        }
        Ok(reg)
    }

    /// Calls the value in `callee` with a parenthesized argument list.
    ///
    /// The callee is copied to a fresh register with the arguments laid out
    /// right after it; the result ends up in `dest`.
    fn call(&mut self, dest: Reg, callee: Reg) -> Result<Reg> {
        self.advance()?;
        let mark = self.free_reg();
        let func = if usize::from(dest) + 1 == mark {
            dest
        } else {
            self.alloc_reg()?
        };
        self.move_into(func, callee)?;

        let mut count: u16 = 0;
        if !self.check(&TokenKind::RParen) {
            loop {
                let arg = self.alloc_reg()?;
                let value = self.expression(arg)?;
                self.move_into(arg, value)?;
                self.release_to(usize::from(arg) + 1);
                count += 1;
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "after arguments")?;

        self.emit(Op::Call(func, func + 1, count))?;
        self.release_to(mark);
        self.move_into(dest, func)?;
        Ok(dest)
    }

    /// Compiles a closure literal into a nested function and emits the
    /// instruction that instantiates it.
    fn closure(&mut self, dest: Reg) -> Result<()> {
        self.advance()?;
        let parent = mem::replace(&mut self.current, FunctionState::new());
        self.enclosing.push(parent);
        self.push_scope()?;

        let bracketed = self.eat(&TokenKind::LParen)?;
        let close = if bracketed {
            TokenKind::RParen
        } else {
            TokenKind::Bar
        };
        let mut params: u16 = 0;
        if !self.check(&close) {
            loop {
                let symbol = self.expect_symbol("in parameter list")?;
                self.declare(&symbol)?;
                let reg = self.alloc_reg()?;
                self.bind(&symbol, reg);
                params += 1;
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(&close, "after parameters")?;
        self.current.param_count = params;

        let result = self.alloc_reg()?;
        if bracketed {
            self.push_scope()?;
            self.statements_until(&TokenKind::Bar, result)?;
            self.advance()?;
            self.pop_scope()?;
        } else {
            self.block(result)?;
        }
        self.emit(Op::Return(result))?;
        // Return closes everything still open, so the parameter scope needs no close.
        self.scopes.pop();

        let Some(parent) = self.enclosing.pop() else {
            return Err(Error::new(ErrorKind::Internal(
                "closure without an enclosing function".into(),
            )));
        };
        let function = mem::replace(&mut self.current, parent);
        let (code, captures) = self.bake(function)?;
        self.emit(Op::CreateClosure(dest, Rc::new(code), captures))?;
        Ok(())
    }
}
