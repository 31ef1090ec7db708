//! minicc: a single-pass compiler for a small statically-typed subset of C,
//! emitting AT&T-syntax x86-64 assembly for the System V AMD64 ABI.
//!
//! The pipeline is strictly forward: [`lexer`] turns source text into
//! tokens, [`parser`] builds an untyped arena-allocated syntax tree,
//! [`analyze`] resolves names and types and lays out stack frames while
//! producing the typed tree, and [`codegen`] emits assembly from it.
//! [`compile()`] wires the stages together; the `minicc` binary adds the
//! stdin/stdout driver.

pub mod analyze;
pub mod arena;
pub mod arena_ctx;
pub mod ast;
pub mod cli;
pub mod codegen;
pub mod compile;
pub mod error;
pub mod intern;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod token;
pub mod types;

pub use compile::compile;
