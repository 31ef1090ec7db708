//! x86-64 code generation.
//!
//! Emits AT&T-syntax assembly for the System V AMD64 ABI from the typed
//! tree. Evaluation is a stack machine: every expression leaves exactly one
//! 8-byte value pushed, and operators pop their operands off the top.
//! Nothing live ever sits in a caller-saved
//! register across a `call`, so no caller-save spills are emitted. The
//! epilogue pops the top of stack into `%rax`: a function's return value is
//! the value of the last expression it evaluated.

use std::fmt::Write;

use crate::ast::typed::{Expr, ExprKind, Fixity, Function, IncDec, LValue, Stmt};
use crate::ast::BinaryOp;
use crate::intern::Interner;
use crate::types::CType;

const ARG_REGS_64: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];
const ARG_REGS_32: [&str; 6] = ["edi", "esi", "edx", "ecx", "r8d", "r9d"];

pub struct Codegen<'int> {
    interner: &'int Interner,
    out: String,
    /// Monotonic label counter; `.L<n>` labels are unique program-wide.
    labels: u32,
}

impl<'int> Codegen<'int> {
    pub fn new(interner: &'int Interner) -> Self {
        Codegen {
            interner,
            out: String::new(),
            labels: 0,
        }
    }

    pub fn generate(mut self, program: &[Function<'_>]) -> String {
        self.emit(".global main");
        for function in program {
            self.function(function);
        }
        self.out
    }

    fn next_label(&mut self) -> u32 {
        let label = self.labels;
        self.labels += 1;
        label
    }

    fn emit(&mut self, instr: &str) {
        writeln!(self.out, "\t{}", instr).unwrap();
    }

    fn label(&mut self, label: u32) {
        writeln!(self.out, ".L{}:", label).unwrap();
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn function(&mut self, f: &Function<'_>) {
        let interner = self.interner;
        writeln!(self.out, "{}:", interner.resolve(f.name)).unwrap();
        self.emit("pushq %rbp");
        self.emit("movq %rsp, %rbp");

        // frame padded to a 16-byte multiple
        if f.frame_size > 0 {
            let aligned = if f.frame_size % 16 == 0 {
                f.frame_size
            } else {
                f.frame_size + (16 - f.frame_size % 16)
            };
            self.emit(&format!("sub ${}, %rsp", aligned));
        }

        // spill argument registers into the parameter slots
        for (i, param) in f.params.iter().enumerate() {
            if param.ctype.is_int() {
                self.emit(&format!("movl %{}, {}(%rbp)", ARG_REGS_32[i], -param.offset));
            } else {
                self.emit(&format!("movq %{}, {}(%rbp)", ARG_REGS_64[i], -param.offset));
            }
        }

        for stmt in f.body {
            self.stmt(stmt);
        }

        self.emit("popq %rax");
        self.emit("movq %rbp, %rsp");
        self.emit("popq %rbp");
        self.emit("ret");
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Compound(stmts) => {
                for stmt in *stmts {
                    self.stmt(stmt);
                }
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.expr(cond);
                self.emit("popq %rax");
                self.emit("test %rax, %rax");
                let skip = self.next_label();
                self.emit(&format!("jz .L{}", skip));
                self.stmt(then_branch);
                match else_branch {
                    Some(else_branch) => {
                        let end = self.next_label();
                        self.emit(&format!("jmp .L{}", end));
                        self.label(skip);
                        self.stmt(else_branch);
                        self.label(end);
                    }
                    None => self.label(skip),
                }
            }
            Stmt::While { cond, body } => {
                let top = self.next_label();
                let end = self.next_label();
                self.label(top);
                self.expr(cond);
                self.emit("popq %rax");
                self.emit("test %rax, %rax");
                self.emit(&format!("jz .L{}", end));
                self.stmt(body);
                self.emit(&format!("jmp .L{}", top));
                self.label(end);
            }
            Stmt::For { init, cond, step, body } => {
                let top = self.next_label();
                let end = self.next_label();
                self.expr(init);
                self.label(top);
                self.expr(cond);
                self.emit("popq %rax");
                self.emit("test %rax, %rax");
                self.emit(&format!("jz .L{}", end));
                self.stmt(body);
                self.expr(step);
                self.emit(&format!("jmp .L{}", top));
                self.label(end);
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self, e: &Expr<'_>) {
        match &e.kind {
            ExprKind::Num(value) => {
                self.emit(&format!("pushq ${}", value));
            }
            ExprKind::Var(var) => {
                self.emit(&format!("pushq {}(%rbp)", -var.offset));
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            ExprKind::Assign { lhs, rhs } => {
                self.lvalue(lhs);
                self.expr(rhs);
                self.emit("popq %rdi");
                self.emit("popq %rax");
                if e.ctype.is_ptr() {
                    self.emit("movq %rdi, (%rax)");
                } else {
                    self.emit("movl %edi, (%rax)");
                }
                self.emit("pushq %rdi");
            }
            ExprKind::Ref(lvalue) => self.lvalue(lvalue),
            ExprKind::Deref(addr) => {
                self.expr(addr);
                self.emit("popq %rax");
                self.emit("pushq (%rax)");
            }
            ExprKind::IncDecInt { op, fixity, var } => {
                self.lvalue(&LValue::Var(*var));
                self.emit("popq %rax");
                let instr = match op {
                    IncDec::Inc => "incl (%rax)",
                    IncDec::Dec => "decl (%rax)",
                };
                match fixity {
                    Fixity::Post => {
                        self.emit("pushq (%rax)");
                        self.emit(instr);
                    }
                    Fixity::Pre => {
                        self.emit(instr);
                        self.emit("pushq (%rax)");
                    }
                }
            }
            ExprKind::IncDecPtr { fixity, var, assign } => match fixity {
                Fixity::Pre => self.expr(assign),
                Fixity::Post => {
                    // push the pre-image, run the assignment, drop its value
                    self.lvalue(&LValue::Var(*var));
                    self.emit("popq %rax");
                    self.emit("pushq (%rax)");
                    self.expr(assign);
                    self.emit("popq %rax");
                }
            },
            ExprKind::Call { callee, args } => {
                for arg in args.iter().rev() {
                    self.expr(arg);
                }
                for reg in ARG_REGS_64.iter().take(args.len()) {
                    self.emit(&format!("popq %{}", reg));
                }
                let interner = self.interner;
                self.emit(&format!("call {}", interner.resolve(*callee)));
                self.emit("pushq %rax");
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr<'_>, rhs: &Expr<'_>) {
        self.expr(lhs);
        self.expr(rhs);
        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                self.emit("popq %rdx");
                self.emit("popq %rax");
                let ltype = lhs.ctype;
                let rtype = rhs.ctype;
                if !ltype.is_ptr() && !rtype.is_ptr() {
                    self.emit(if op == BinaryOp::Add {
                        "addl %edx, %eax"
                    } else {
                        "subl %edx, %eax"
                    });
                } else if ltype.is_ptr() && rtype.is_ptr() {
                    // pointer difference, scaled down to an element count
                    self.emit("subq %rdx, %rax");
                    self.emit(&format!("sarq ${}, %rax", element_shift(ltype)));
                } else {
                    // scale the integer side by the element width
                    if ltype.is_ptr() {
                        self.emit(&format!("salq ${}, %rdx", element_shift(ltype)));
                    } else {
                        self.emit(&format!("salq ${}, %rax", element_shift(rtype)));
                    }
                    self.emit(if op == BinaryOp::Add {
                        "addq %rdx, %rax"
                    } else {
                        "subq %rdx, %rax"
                    });
                }
                self.emit("pushq %rax");
            }
            BinaryOp::Mul => {
                self.emit("popq %rbx");
                self.emit("popq %rax");
                self.emit("mul %rbx");
                self.emit("pushq %rax");
            }
            BinaryOp::Div => {
                self.emit("popq %rbx");
                self.emit("popq %rax");
                self.emit("xor %rdx, %rdx");
                self.emit("div %rbx");
                self.emit("pushq %rax");
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne => {
                self.emit("popq %rdx");
                self.emit("popq %rax");
                self.emit("cmpl %edx, %eax");
                let set = match op {
                    BinaryOp::Lt => "setl %al",
                    BinaryOp::Le => "setle %al",
                    BinaryOp::Eq => "sete %al",
                    _ => "setne %al",
                };
                self.emit(set);
                self.emit("movzbl %al, %eax");
                self.emit("pushq %rax");
            }
        }
    }

    /// Pushes the address of an lvalue.
    fn lvalue(&mut self, lvalue: &LValue<'_>) {
        match lvalue {
            LValue::Var(var) => {
                self.emit(&format!("leaq {}(%rbp), %rax", -var.offset));
                self.emit("pushq %rax");
            }
            LValue::Deref(addr) => self.expr(addr),
        }
    }
}

/// Shift amount converting between element counts and byte offsets for a
/// pointer type: 2 for `int` elements, 3 for pointer elements.
fn element_shift(ctype: &CType<'_>) -> u32 {
    match ctype.pointee() {
        Some(CType::Int) => 2,
        _ => 3,
    }
}
