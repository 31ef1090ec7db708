use crate::arena::Arena;
use crate::ast::{typed, Expr, ExprKind, Stmt};
use crate::token::Token;
use crate::types::CType;

/// Bundle of arena references threaded through the parser and the analyzer.
/// Copyable so callers can pass it around freely; all allocation methods
/// take `&self`.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    pub exprs: &'a Arena<Expr<'a>>,
    pub stmts: &'a Arena<Stmt<'a>>,
    pub types: &'a Arena<CType<'a>>,
    pub expr_refs: &'a Arena<&'a Expr<'a>>,
    pub typed_exprs: &'a Arena<typed::Expr<'a>>,
    pub typed_stmts: &'a Arena<typed::Stmt<'a>>,
    pub typed_expr_refs: &'a Arena<&'a typed::Expr<'a>>,
}

impl<'a> AstContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exprs: &'a Arena<Expr<'a>>,
        stmts: &'a Arena<Stmt<'a>>,
        types: &'a Arena<CType<'a>>,
        expr_refs: &'a Arena<&'a Expr<'a>>,
        typed_exprs: &'a Arena<typed::Expr<'a>>,
        typed_stmts: &'a Arena<typed::Stmt<'a>>,
        typed_expr_refs: &'a Arena<&'a typed::Expr<'a>>,
    ) -> Self {
        AstContext {
            exprs,
            stmts,
            types,
            expr_refs,
            typed_exprs,
            typed_stmts,
            typed_expr_refs,
        }
    }

    pub fn expr(&self, kind: ExprKind<'a>, token: Token) -> &'a Expr<'a> {
        self.exprs.alloc(Expr { kind, token })
    }

    pub fn stmt(&self, stmt: Stmt<'a>) -> &'a Stmt<'a> {
        self.stmts.alloc(stmt)
    }

    pub fn stmt_slice(&self, stmts: Vec<Stmt<'a>>) -> &'a [Stmt<'a>] {
        self.stmts.alloc_slice(stmts)
    }

    pub fn ctype(&self, ctype: CType<'a>) -> &'a CType<'a> {
        self.types.alloc(ctype)
    }

    pub fn arg_slice(&self, args: Vec<&'a Expr<'a>>) -> &'a [&'a Expr<'a>] {
        self.expr_refs.alloc_slice(args)
    }

    pub fn typed_expr(&self, kind: typed::ExprKind<'a>, ctype: &'a CType<'a>) -> &'a typed::Expr<'a> {
        self.typed_exprs.alloc(typed::Expr { kind, ctype })
    }

    pub fn typed_stmt(&self, stmt: typed::Stmt<'a>) -> &'a typed::Stmt<'a> {
        self.typed_stmts.alloc(stmt)
    }

    pub fn typed_stmt_slice(&self, stmts: Vec<typed::Stmt<'a>>) -> &'a [typed::Stmt<'a>] {
        self.typed_stmts.alloc_slice(stmts)
    }

    pub fn typed_arg_slice(&self, args: Vec<&'a typed::Expr<'a>>) -> &'a [&'a typed::Expr<'a>] {
        self.typed_expr_refs.alloc_slice(args)
    }
}
