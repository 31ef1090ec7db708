//! End-to-end tests over the emitted assembly text. The harness does not
//! assemble or run the output, so each scenario pins down the instruction
//! sequences that determine its runtime behavior.

use minicc::compile;

fn asm(source: &str) -> String {
    compile(source).expect("program should compile")
}

/// Instruction lines of one function, label line excluded.
fn function_body<'a>(asm: &'a str, name: &str) -> Vec<&'a str> {
    let label = format!("{}:", name);
    let mut lines = asm.lines().skip_while(|l| *l != label);
    assert_eq!(lines.next(), Some(label.as_str()), "no function {}", name);
    lines.take_while(|l| *l != "\tret").map(|l| l.trim()).collect()
}

#[test]
fn output_starts_with_global_main() {
    let out = asm("int main(){1;}");
    assert!(out.starts_with("\t.global main\n"));
}

#[test]
fn prologue_and_epilogue_frame_the_body() {
    let out = asm("int main(){1;}");
    let body = function_body(&out, "main");
    assert_eq!(body[0], "pushq %rbp");
    assert_eq!(body[1], "movq %rsp, %rbp");
    let n = body.len();
    assert_eq!(&body[n - 3..], &["popq %rax", "movq %rbp, %rsp", "popq %rbp"]);
}

#[test]
fn last_expression_value_becomes_the_return_value() {
    // exit status is the value of the last expression evaluated
    let out = asm("int main(){int a; a = 42; a;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"pushq $42"));
    // the final load of `a` sits right before the epilogue pop
    let last_push = body.iter().rposition(|l| *l == "pushq -4(%rbp)").expect("load of a");
    let epilogue_pop = body.iter().rposition(|l| *l == "popq %rax").expect("epilogue");
    assert!(last_push < epilogue_pop);
}

#[test]
fn int_assignment_stores_four_bytes() {
    let out = asm("int main(){int a; a = 42; a;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"leaq -4(%rbp), %rax"));
    assert!(body.contains(&"movl %edi, (%rax)"));
    assert!(!body.contains(&"movq %rdi, (%rax)"));
}

#[test]
fn pointer_assignment_stores_eight_bytes() {
    let out = asm("int main(){int a; int *p; p = &a; p;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"movq %rdi, (%rax)"));
}

#[test]
fn sum_of_squares_uses_unsigned_multiply() {
    let out = asm("int main(){int a; a = 3; int b; b = 4; a*a + b*b;}");
    let body = function_body(&out, "main");
    assert_eq!(body.iter().filter(|l| **l == "mul %rbx").count(), 2);
    assert!(body.contains(&"addl %edx, %eax"));
}

#[test]
fn division_is_unsigned_with_zeroed_rdx() {
    let out = asm("int main(){int a; a = 6; a / 2;}");
    let body = function_body(&out, "main");
    let div = body.iter().position(|l| *l == "div %rbx").expect("div");
    assert_eq!(body[div - 1], "xor %rdx, %rdx");
}

#[test]
fn array_subscript_scales_by_element_width() {
    let out = asm("int main(){int a[3]; a[0]=1; a[1]=2; a[2]=7; *(a+2);}");
    let body = function_body(&out, "main");
    // index scaled by 4-byte elements, loads through the pointer
    assert!(body.contains(&"salq $2, %rdx") || body.contains(&"salq $2, %rax"));
    assert!(body.contains(&"pushq (%rax)"));
}

#[test]
fn array_frame_is_aligned_to_sixteen() {
    // 3 ints = 12 bytes, padded to 16
    let out = asm("int main(){int a[3]; a[0]=1;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"sub $16, %rsp"));
}

#[test]
fn emitted_frame_adjustments_are_multiples_of_sixteen() {
    let sources = [
        "int main(){int a; a;}",
        "int main(){int a; int b; int *p; p = &a; b;}",
        "int main(){int a[7]; int *p[3]; a[0];}",
        "int f(int a, int b, int c){a;} int main(){f(1,2,3);}",
    ];
    for source in sources {
        let out = asm(source);
        for line in out.lines() {
            if let Some(rest) = line.trim().strip_prefix("sub $") {
                let n: i64 = rest
                    .strip_suffix(", %rsp")
                    .expect("frame adjustment form")
                    .parse()
                    .expect("numeric frame size");
                assert_eq!(n % 16, 0, "unaligned frame in {}: {}", source, line);
            }
        }
    }
}

#[test]
fn zero_sized_frame_emits_no_adjustment() {
    let out = asm("int main(){1;}");
    assert!(!out.contains("sub $"));
}

#[test]
fn for_loop_emits_test_and_backward_jump() {
    let out = asm("int main(){int i; int s; s=0; for(i=0;i<10;i=i+1) s=s+i; s;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"cmpl %edx, %eax"));
    assert!(body.contains(&"setl %al"));
    assert!(body.contains(&"movzbl %al, %eax"));
    assert!(body.contains(&"jz .L1"));
    assert!(body.contains(&"jmp .L0"));
    let out_lines: Vec<&str> = out.lines().collect();
    let top = out_lines.iter().position(|l| *l == ".L0:").expect("loop top");
    let end = out_lines.iter().position(|l| *l == ".L1:").expect("loop end");
    assert!(top < end);
}

#[test]
fn while_false_jumps_over_body() {
    let out = asm("int main(){int a; a = 1; while(0) a = 2; a;}");
    let lines: Vec<&str> = out.lines().map(|l| l.trim()).collect();
    let cond = lines.iter().position(|l| *l == "pushq $0").expect("condition");
    let skip = lines.iter().skip(cond).position(|l| *l == "jz .L1").expect("skip jump");
    let store2 = lines.iter().position(|l| *l == "pushq $2").expect("body value");
    assert!(cond + skip < store2, "body must come after the skipping jump");
}

#[test]
fn if_without_else_skips_then_branch() {
    let out = asm("int main(){int a; a = 0; if (a) a = 1; a;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"test %rax, %rax"));
    assert!(body.contains(&"jz .L0"));
    assert!(out.contains("\n.L0:\n"));
}

#[test]
fn if_else_selects_exactly_one_branch() {
    let out = asm("int main(){int a; a=1; if (a == 1) a = 10; else a = 20; a;}");
    let lines: Vec<&str> = out.lines().map(|l| l.trim()).collect();
    let jz = lines.iter().position(|l| *l == "jz .L0").expect("branch to else");
    let jmp = lines.iter().position(|l| *l == "jmp .L1").expect("jump past else");
    let else_label = lines.iter().position(|l| *l == ".L0:").expect("else label");
    let end_label = lines.iter().position(|l| *l == ".L1:").expect("end label");
    assert!(jz < jmp && jmp < else_label && else_label < end_label);
}

#[test]
fn nested_control_flow_labels_are_unique() {
    let out = asm(
        "int main(){int i; int s; s = 0; \
         for(i=0;i<3;i=i+1){ if (i == 1) s = s + 10; else s = s + 1; \
         while (s > 100) s = s - 1; } s;}",
    );
    let mut seen = Vec::new();
    for line in out.lines() {
        if line.starts_with(".L") && line.ends_with(':') {
            assert!(!seen.contains(&line), "label {} defined twice", line);
            seen.push(line);
        }
    }
    assert!(seen.len() >= 6);
}

#[test]
fn call_pops_arguments_into_sysv_registers() {
    let out = asm("int f(int x, int y){ x*10 + y; } int main(){ f(3,4); }");
    let main_body = function_body(&out, "main");
    let rdi = main_body.iter().position(|l| *l == "popq %rdi").expect("rdi");
    let rsi = main_body.iter().position(|l| *l == "popq %rsi").expect("rsi");
    let call = main_body.iter().position(|l| *l == "call f").expect("call");
    assert!(rdi < rsi && rsi < call);
    assert_eq!(main_body[call + 1], "pushq %rax");
}

#[test]
fn callee_spills_parameters_to_their_slots() {
    let out = asm("int f(int x, int y){ x*10 + y; } int main(){ f(3,4); }");
    let f_body = function_body(&out, "f");
    assert!(f_body.contains(&"movl %edi, -4(%rbp)"));
    assert!(f_body.contains(&"movl %esi, -8(%rbp)"));
}

#[test]
fn six_parameters_use_all_argument_registers() {
    let out = asm(
        "int f(int a, int b, int c, int d, int e, int g){ a; } \
         int main(){ f(1,2,3,4,5,6); }",
    );
    let f_body = function_body(&out, "f");
    for spill in [
        "movl %edi, -4(%rbp)",
        "movl %esi, -8(%rbp)",
        "movl %edx, -12(%rbp)",
        "movl %ecx, -16(%rbp)",
        "movl %r8d, -20(%rbp)",
        "movl %r9d, -24(%rbp)",
    ] {
        assert!(f_body.contains(&spill), "missing {}", spill);
    }
    let main_body = function_body(&out, "main");
    for pop in ["popq %rdi", "popq %rsi", "popq %rdx", "popq %rcx", "popq %r8", "popq %r9"] {
        assert!(main_body.contains(&pop), "missing {}", pop);
    }
}

#[test]
fn pointer_parameter_spills_eight_bytes() {
    let out = asm("int f(int *p){ *p; } int main(){ int a; a = 1; f(&a); }");
    let f_body = function_body(&out, "f");
    assert!(f_body.contains(&"movq %rdi, -8(%rbp)"));
}

#[test]
fn address_of_then_store_through_pointer() {
    let out = asm("int main(){ int a; int *p; a=5; p=&a; *p = *p + 1; a; }");
    let body = function_body(&out, "main");
    assert!(body.contains(&"leaq -4(%rbp), %rax"));
    assert!(body.contains(&"pushq (%rax)"));
    assert!(body.contains(&"movl %edi, (%rax)"));
}

#[test]
fn deref_loads_eight_bytes() {
    let out = asm("int main(){int a; int *p; p = &a; *p;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"pushq (%rax)"));
}

#[test]
fn pointer_minus_pointer_scales_down() {
    let out = asm("int main(){int a[4]; int *p; int *q; p = a; q = a; p - q;}");
    let body = function_body(&out, "main");
    let sub = body.iter().position(|l| *l == "subq %rdx, %rax").expect("subq");
    assert_eq!(body[sub + 1], "sarq $2, %rax");
}

#[test]
fn pointer_to_pointer_difference_shifts_by_three() {
    let out = asm("int main(){int *a[4]; int **p; int **q; p = a; q = a; p - q;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"sarq $3, %rax"));
}

#[test]
fn int_plus_pointer_scales_the_int_side() {
    let out = asm("int main(){int a[2]; int *p; p = 1 + a; p;}");
    let body = function_body(&out, "main");
    // left operand is the integer, so the scale lands on %rax
    assert!(body.contains(&"salq $2, %rax"));
    assert!(body.contains(&"addq %rdx, %rax"));
}

#[test]
fn pointer_plus_int_scales_the_int_side() {
    let out = asm("int main(){int a[2]; int *p; p = a + 1; p;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"salq $2, %rdx"));
    assert!(body.contains(&"addq %rdx, %rax"));
}

#[test]
fn int_increment_is_a_single_incl() {
    let out = asm("int main(){int a; a = 1; a++; a;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"incl (%rax)"));
}

#[test]
fn pre_decrement_pushes_the_new_value() {
    let out = asm("int main(){int a; a = 1; --a;}");
    let body = function_body(&out, "main");
    let dec = body.iter().position(|l| *l == "decl (%rax)").expect("decl");
    assert_eq!(body[dec + 1], "pushq (%rax)");
}

#[test]
fn post_increment_pushes_the_old_value_first() {
    let out = asm("int main(){int a; a = 1; a++;}");
    let body = function_body(&out, "main");
    let inc = body.iter().position(|l| *l == "incl (%rax)").expect("incl");
    assert_eq!(body[inc - 1], "pushq (%rax)");
}

#[test]
fn pointer_increment_steps_by_element_width() {
    let out = asm("int main(){int a[2]; int *p; p = a; p++; *p;}");
    let body = function_body(&out, "main");
    // lowered to p = p + 1 with the 1 scaled to 4 bytes
    assert!(body.contains(&"salq $2, %rdx"));
    assert!(body.contains(&"movq %rdi, (%rax)"));
}

#[test]
fn single_expression_body_balances_the_stack() {
    // one value flows out of the body into the epilogue pop
    let out = asm("int main(){1 + 2 * 3;}");
    let body = function_body(&out, "main");
    let pushes = body.iter().filter(|l| l.starts_with("pushq")).count();
    let pops = body.iter().filter(|l| l.starts_with("popq")).count();
    // prologue push offsets one epilogue pop; the body's one extra push
    // feeds the remaining epilogue pop
    assert_eq!(pushes, pops);
}

#[test]
fn comparison_materializes_a_boolean() {
    let out = asm("int main(){int a; a = 1; a == 1;}");
    let body = function_body(&out, "main");
    let cmp = body.iter().position(|l| *l == "cmpl %edx, %eax").expect("cmpl");
    assert_eq!(body[cmp + 1], "sete %al");
    assert_eq!(body[cmp + 2], "movzbl %al, %eax");
}

#[test]
fn gt_compiles_as_swapped_lt() {
    let a_gt_b = asm("int main(){int a; int b; a=1; b=2; a > b;}");
    let b_lt_a = asm("int main(){int a; int b; a=1; b=2; b < a;}");
    assert_eq!(a_gt_b, b_lt_a);
}

#[test]
fn subscript_compiles_like_pointer_arithmetic() {
    let sugar = asm("int main(){int a[3]; a[2] = 7; a[2];}");
    let explicit = asm("int main(){int a[3]; *(a+2) = 7; *(a+2);}");
    assert_eq!(sugar, explicit);
}

#[test]
fn deeply_nested_pointer_types_compile() {
    let out = asm("int main(){int ****p; int *****q; q = &p; q;}");
    let body = function_body(&out, "main");
    assert!(body.contains(&"movq %rdi, (%rax)"));
}
