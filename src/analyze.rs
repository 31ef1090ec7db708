//! Semantic analysis.
//!
//! One pass over the parse tree per function: resolves identifiers against
//! the function's symbol table, synthesizes a `CType` for every expression,
//! applies array-to-pointer decay where an operand is used arithmetically,
//! checks assignability, lays out the stack frame, and lowers pointer
//! `++`/`--` into its scaled assignment form. The result is the typed tree
//! of [`crate::ast::typed`]; the parse tree is never mutated.

use crate::arena_ctx::AstContext;
use crate::ast::typed::{self, Fixity, IncDec};
use crate::ast::{self, BinaryOp, UnaryOp};
use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::intern::Interner;
use crate::symtab::{SymbolEntry, SymbolTable};
use crate::types::CType;

/// The SysV AMD64 integer argument registers bound the parameter count.
const MAX_PARAMS: usize = 6;

pub struct Analyzer<'a, 'int> {
    ctx: AstContext<'a>,
    interner: &'int Interner,
    /// Table of the function currently being analyzed.
    table: SymbolTable<'a>,
    /// Running frame size: highest byte distance below `%rbp` so far.
    offset_from_bp: i32,
}

impl<'a, 'int> Analyzer<'a, 'int> {
    pub fn new(ctx: AstContext<'a>, interner: &'int Interner) -> Self {
        Analyzer {
            ctx,
            interner,
            table: SymbolTable::new(),
            offset_from_bp: 0,
        }
    }

    pub fn analyze(
        &mut self,
        functions: &[ast::Function<'a>],
    ) -> CompileResult<Vec<typed::Function<'a>>> {
        functions.iter().map(|f| self.function(f)).collect()
    }

    fn function(&mut self, f: &ast::Function<'a>) -> CompileResult<typed::Function<'a>> {
        self.table = SymbolTable::new();
        self.offset_from_bp = 0;

        if f.params.len() > MAX_PARAMS {
            return Err(CompileError::at(ErrorKind::TooManyArguments, f.token.span));
        }

        let mut params = Vec::with_capacity(f.params.len());
        for decl in &f.params {
            let entry = self.declare(decl)?;
            params.push(typed::Param {
                name: decl.name,
                ctype: entry.ctype,
                offset: entry.offset,
            });
        }

        let body = self.block(f.body)?;

        Ok(typed::Function {
            name: f.name,
            params,
            body,
            frame_size: self.offset_from_bp,
            symbols: std::mem::take(&mut self.table),
        })
    }

    // ------------------------------------------------------------------
    // Declarations and frame layout
    // ------------------------------------------------------------------

    fn declare(&mut self, decl: &ast::Decl<'a>) -> CompileResult<SymbolEntry<'a>> {
        if self.table.contains(decl.name) {
            return Err(CompileError::at(
                ErrorKind::Redefinition(self.interner.resolve(decl.name).to_string()),
                decl.token.span,
            ));
        }
        let offset = self.grow_frame(decl.ctype);
        let entry = SymbolEntry { ctype: decl.ctype, offset };
        self.table.insert(decl.name, entry);
        Ok(entry)
    }

    /// Grows the frame for one declaration and returns the new offset.
    /// 4-byte objects pack; anything 8 bytes or larger is 8-aligned first.
    fn grow_frame(&mut self, ctype: &CType<'_>) -> i32 {
        let size = ctype.size();
        if size == 4 {
            self.offset_from_bp += 4;
        } else if size >= 8 {
            if self.offset_from_bp % 8 != 0 {
                self.offset_from_bp += 8 - self.offset_from_bp % 8;
            }
            self.offset_from_bp += size;
        }
        self.offset_from_bp
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self, stmts: &'a [ast::Stmt<'a>]) -> CompileResult<&'a [typed::Stmt<'a>]> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.push(self.statement(stmt)?);
        }
        Ok(self.ctx.typed_stmt_slice(out))
    }

    fn statement(&mut self, stmt: &'a ast::Stmt<'a>) -> CompileResult<typed::Stmt<'a>> {
        match stmt {
            ast::Stmt::Expr(e) => Ok(typed::Stmt::Expr(self.expr(e)?)),
            ast::Stmt::Decl(decl) => {
                // declarations reserve a slot and emit nothing
                self.declare(decl)?;
                Ok(typed::Stmt::Compound(&[]))
            }
            ast::Stmt::Compound(stmts) => Ok(typed::Stmt::Compound(self.block(stmts)?)),
            ast::Stmt::If { cond, then_branch, else_branch } => {
                let cond = self.expr(cond)?;
                let then_stmt = self.statement(then_branch)?;
                let then_branch = self.ctx.typed_stmt(then_stmt);
                let else_branch = match else_branch {
                    Some(stmt) => {
                        let else_stmt = self.statement(stmt)?;
                        Some(self.ctx.typed_stmt(else_stmt))
                    }
                    None => None,
                };
                Ok(typed::Stmt::If { cond, then_branch, else_branch })
            }
            ast::Stmt::While { cond, body } => {
                let cond = self.expr(cond)?;
                let body_stmt = self.statement(body)?;
                Ok(typed::Stmt::While { cond, body: self.ctx.typed_stmt(body_stmt) })
            }
            ast::Stmt::For { init, cond, step, body } => {
                // init and step are analyzed before cond and body; error
                // order depends on it
                let init = self.expr(init)?;
                let step = self.expr(step)?;
                let cond = self.expr(cond)?;
                let body_stmt = self.statement(body)?;
                Ok(typed::Stmt::For { init, cond, step, body: self.ctx.typed_stmt(body_stmt) })
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self, e: &'a ast::Expr<'a>) -> CompileResult<&'a typed::Expr<'a>> {
        match &e.kind {
            ast::ExprKind::Num(value) => {
                Ok(self.ctx.typed_expr(typed::ExprKind::Num(*value), CType::INT))
            }
            ast::ExprKind::Var(name) => {
                let entry = match self.table.get(*name) {
                    Some(entry) => entry,
                    None => {
                        return Err(CompileError::at(
                            ErrorKind::UndeclaredIdentifier(
                                self.interner.resolve(*name).to_string(),
                            ),
                            e.token.span,
                        ))
                    }
                };
                let var = typed::VarRef {
                    name: *name,
                    offset: entry.offset,
                    ctype: entry.ctype,
                };
                Ok(self.ctx.typed_expr(typed::ExprKind::Var(var), entry.ctype))
            }
            ast::ExprKind::Binary { op, lhs, rhs } => self.binary(e, *op, lhs, rhs),
            ast::ExprKind::Assign { lhs, rhs } => self.assign(e, lhs, rhs),
            ast::ExprKind::Call { callee, args } => {
                // arguments are analyzed right to left
                let mut typed_args = Vec::with_capacity(args.len());
                for arg in args.iter().rev() {
                    typed_args.push(self.expr(arg)?);
                }
                typed_args.reverse();
                Ok(self.ctx.typed_expr(
                    typed::ExprKind::Call {
                        callee: *callee,
                        args: self.ctx.typed_arg_slice(typed_args),
                    },
                    CType::INT,
                ))
            }
            ast::ExprKind::Unary { op: UnaryOp::Ref, operand } => self.address_of(e, operand),
            ast::ExprKind::Unary { op: UnaryOp::Deref, operand } => self.deref(e, operand),
            ast::ExprKind::Unary { op: UnaryOp::PreInc, operand } => {
                self.inc_dec(e, operand, IncDec::Inc, Fixity::Pre)
            }
            ast::ExprKind::Unary { op: UnaryOp::PreDec, operand } => {
                self.inc_dec(e, operand, IncDec::Dec, Fixity::Pre)
            }
            ast::ExprKind::Unary { op: UnaryOp::PostInc, operand } => {
                self.inc_dec(e, operand, IncDec::Inc, Fixity::Post)
            }
            ast::ExprKind::Unary { op: UnaryOp::PostDec, operand } => {
                self.inc_dec(e, operand, IncDec::Dec, Fixity::Post)
            }
        }
    }

    fn binary(
        &mut self,
        e: &'a ast::Expr<'a>,
        op: BinaryOp,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> CompileResult<&'a typed::Expr<'a>> {
        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                let lhs = self.decay(lhs);
                let rhs = self.decay(rhs);

                let ctype = if lhs.ctype.is_ptr() && rhs.ctype.is_ptr() {
                    if op == BinaryOp::Add {
                        return Err(CompileError::at(
                            ErrorKind::InvalidBinaryOperands,
                            e.token.span,
                        ));
                    }
                    // pointer difference is an element count
                    CType::INT
                } else if rhs.ctype.is_ptr() {
                    rhs.ctype
                } else {
                    lhs.ctype
                };
                Ok(self.ctx.typed_expr(typed::ExprKind::Binary { op, lhs, rhs }, ctype))
            }
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Eq
            | BinaryOp::Ne => {
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                Ok(self.ctx.typed_expr(typed::ExprKind::Binary { op, lhs, rhs }, lhs.ctype))
            }
        }
    }

    fn assign(
        &mut self,
        e: &'a ast::Expr<'a>,
        lhs: &'a ast::Expr<'a>,
        rhs: &'a ast::Expr<'a>,
    ) -> CompileResult<&'a typed::Expr<'a>> {
        let lhs = self.expr(lhs)?;
        let rhs = self.expr(rhs)?;
        let lhs = self.decay(lhs);
        let rhs = self.decay(rhs);

        let lvalue = match &lhs.kind {
            typed::ExprKind::Var(var) => typed::LValue::Var(*var),
            typed::ExprKind::Deref(addr) => typed::LValue::Deref(*addr),
            _ => return Err(CompileError::at(ErrorKind::NotAssignable, e.token.span)),
        };
        // only the top-level constructors have to match
        if !lhs.ctype.same_tag(rhs.ctype) {
            return Err(CompileError::at(ErrorKind::NotAssignable, e.token.span));
        }
        Ok(self.ctx.typed_expr(typed::ExprKind::Assign { lhs: lvalue, rhs }, lhs.ctype))
    }

    fn address_of(
        &mut self,
        e: &'a ast::Expr<'a>,
        operand: &'a ast::Expr<'a>,
    ) -> CompileResult<&'a typed::Expr<'a>> {
        let inner = self.expr(operand)?;
        let lvalue = match &inner.kind {
            typed::ExprKind::Var(var) => typed::LValue::Var(*var),
            typed::ExprKind::Deref(addr) => typed::LValue::Deref(*addr),
            _ => return Err(CompileError::at(ErrorKind::NotAssignable, e.token.span)),
        };
        let ctype = self.ctx.ctype(CType::Ptr(inner.ctype));
        Ok(self.ctx.typed_expr(typed::ExprKind::Ref(lvalue), ctype))
    }

    fn deref(
        &mut self,
        e: &'a ast::Expr<'a>,
        operand: &'a ast::Expr<'a>,
    ) -> CompileResult<&'a typed::Expr<'a>> {
        let inner = self.expr(operand)?;
        let inner = self.decay(inner);
        match inner.ctype {
            CType::Ptr(pointee) => {
                Ok(self.ctx.typed_expr(typed::ExprKind::Deref(inner), *pointee))
            }
            _ => Err(CompileError::at(ErrorKind::IndirectionRequiresPointer, e.token.span)),
        }
    }

    fn inc_dec(
        &mut self,
        e: &'a ast::Expr<'a>,
        operand: &'a ast::Expr<'a>,
        op: IncDec,
        fixity: Fixity,
    ) -> CompileResult<&'a typed::Expr<'a>> {
        // only a plain variable can be incremented
        if !matches!(operand.kind, ast::ExprKind::Var(_)) {
            return Err(CompileError::at(ErrorKind::NotAssignable, e.token.span));
        }
        let inner = self.expr(operand)?;
        let inner = self.decay(inner);
        let var = match &inner.kind {
            typed::ExprKind::Var(var) => *var,
            // an array variable decays away from being a variable
            _ => return Err(CompileError::at(ErrorKind::NotAssignable, e.token.span)),
        };

        if var.ctype.is_int() {
            Ok(self.ctx.typed_expr(typed::ExprKind::IncDecInt { op, fixity, var }, var.ctype))
        } else {
            // lower to `var = var +/- 1`; the mixed int/pointer operand
            // types of the sum give the scaled step during generation
            let var_expr = self.ctx.typed_expr(typed::ExprKind::Var(var), var.ctype);
            let one = self.ctx.typed_expr(typed::ExprKind::Num(1), CType::INT);
            let sum_op = match op {
                IncDec::Inc => BinaryOp::Add,
                IncDec::Dec => BinaryOp::Sub,
            };
            let sum = self.ctx.typed_expr(
                typed::ExprKind::Binary { op: sum_op, lhs: var_expr, rhs: one },
                var.ctype,
            );
            let assign = self.ctx.typed_expr(
                typed::ExprKind::Assign { lhs: typed::LValue::Var(var), rhs: sum },
                var.ctype,
            );
            Ok(self.ctx.typed_expr(typed::ExprKind::IncDecPtr { fixity, var, assign }, var.ctype))
        }
    }

    /// Array-to-pointer decay: an array-typed variable or dereference used
    /// as an arithmetic or assignment operand becomes a pointer to its
    /// first element, expressed as an address-of wrapper. Applying decay to
    /// an already-decayed node is the identity.
    fn decay(&self, e: &'a typed::Expr<'a>) -> &'a typed::Expr<'a> {
        let element = match e.ctype {
            CType::Array(element, _) => *element,
            _ => return e,
        };
        let lvalue = match &e.kind {
            typed::ExprKind::Var(var) => typed::LValue::Var(*var),
            typed::ExprKind::Deref(addr) => typed::LValue::Deref(*addr),
            _ => return e,
        };
        let ctype = self.ctx.ctype(CType::Ptr(element));
        self.ctx.typed_expr(typed::ExprKind::Ref(lvalue), ctype)
    }
}
