//! The typed tree produced by semantic analysis.
//!
//! Differences from the parse tree: every expression node carries a
//! `&CType`; variables are resolved to frame slots; assignment targets and
//! `&` operands are a closed [`LValue`]; array-typed operands have been
//! decayed to pointers; pointer `++`/`--` is already lowered to its
//! assignment form, so code generation never consults the symbol table and
//! never re-analyzes anything.

use crate::intern::Symbol;
use crate::symtab::SymbolTable;
use crate::types::CType;

pub use super::BinaryOp;

/// A resolved reference to a local variable.
#[derive(Debug, Clone, Copy)]
pub struct VarRef<'a> {
    pub name: Symbol,
    pub offset: i32,
    pub ctype: &'a CType<'a>,
}

/// A place that can be written through: a named slot or a pointer
/// dereference. Emitting an lvalue pushes its address.
#[derive(Debug, Clone, Copy)]
pub enum LValue<'a> {
    Var(VarRef<'a>),
    /// The inner expression evaluates to the address written through.
    Deref(&'a Expr<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDec {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Pre,
    Post,
}

#[derive(Debug)]
pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub ctype: &'a CType<'a>,
}

#[derive(Debug)]
pub enum ExprKind<'a> {
    Num(i64),
    Var(VarRef<'a>),
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    Assign {
        lhs: LValue<'a>,
        rhs: &'a Expr<'a>,
    },
    Ref(LValue<'a>),
    Deref(&'a Expr<'a>),
    /// `++`/`--` on an `int` variable; a single in-place `incl`/`decl`.
    IncDecInt {
        op: IncDec,
        fixity: Fixity,
        var: VarRef<'a>,
    },
    /// `++`/`--` on a pointer variable, lowered to `var = var +/- 1` with
    /// pointer scaling supplied by the operand types of `assign`.
    IncDecPtr {
        fixity: Fixity,
        var: VarRef<'a>,
        assign: &'a Expr<'a>,
    },
    Call {
        callee: Symbol,
        args: &'a [&'a Expr<'a>],
    },
}

#[derive(Debug)]
pub enum Stmt<'a> {
    Expr(&'a Expr<'a>),
    Compound(&'a [Stmt<'a>]),
    If {
        cond: &'a Expr<'a>,
        then_branch: &'a Stmt<'a>,
        else_branch: Option<&'a Stmt<'a>>,
    },
    While {
        cond: &'a Expr<'a>,
        body: &'a Stmt<'a>,
    },
    For {
        init: &'a Expr<'a>,
        cond: &'a Expr<'a>,
        step: &'a Expr<'a>,
        body: &'a Stmt<'a>,
    },
}

#[derive(Debug)]
pub struct Param<'a> {
    pub name: Symbol,
    pub ctype: &'a CType<'a>,
    pub offset: i32,
}

/// An analyzed function: body statements, parameter slots, the frame size
/// before 16-byte alignment, and the symbol table the analysis built.
#[derive(Debug)]
pub struct Function<'a> {
    pub name: Symbol,
    pub params: Vec<Param<'a>>,
    pub body: &'a [Stmt<'a>],
    pub frame_size: i32,
    pub symbols: SymbolTable<'a>,
}
