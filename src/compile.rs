//! End-to-end compilation pipeline: source text in, assembly text out.

use crate::analyze::Analyzer;
use crate::arena::Arena;
use crate::arena_ctx::AstContext;
use crate::codegen::Codegen;
use crate::error::CompileResult;
use crate::intern::Interner;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Compiles a translation unit to AT&T x86-64 assembly. The first error
/// aborts compilation; render it with
/// [`CompileError::display_with_source`](crate::error::CompileError::display_with_source).
pub fn compile(source: &str) -> CompileResult<String> {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize()?;

    let exprs = Arena::new();
    let stmts = Arena::new();
    let types = Arena::new();
    let expr_refs = Arena::new();
    let typed_exprs = Arena::new();
    let typed_stmts = Arena::new();
    let typed_expr_refs = Arena::new();
    let ctx = AstContext::new(
        &exprs,
        &stmts,
        &types,
        &expr_refs,
        &typed_exprs,
        &typed_stmts,
        &typed_expr_refs,
    );

    let mut parser = Parser::new(tokens, ctx);
    let program = parser.parse_program()?;

    let mut analyzer = Analyzer::new(ctx, &interner);
    let typed = analyzer.analyze(&program)?;

    Ok(Codegen::new(&interner).generate(&typed))
}
