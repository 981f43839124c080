//! Codegen tests: compile source through the real front-end, verify the
//! module, and check the shape of the produced IR.

use std::sync::Once;

use glyphc_gen::CodeGen;
use glyphc_par::{ParseConfig, Parser};
use inkwell::context::Context;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

static INIT: Once = Once::new();

fn native_machine() -> TargetMachine {
    INIT.call_once(|| {
        Target::initialize_native(&InitializationConfig::default())
            .expect("native target unavailable");
    });
    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple).expect("target lookup");
    target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::None,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .expect("target machine")
}

/// Compile a source snippet (no std prelude) to verified IR text.
fn compile_to_ir(source: &str) -> String {
    try_compile(source).expect("compilation failed")
}

fn try_compile(source: &str) -> Result<String, String> {
    let src = glyphc_pp::preprocess(source);
    let mut parser = Parser::new(&src, "test.gly", ParseConfig { no_std_prelude: true })
        .map_err(|e| e.to_string())?;
    let program = parser.parse().map_err(|e| e.to_string())?;

    let machine = native_machine();
    let context = Context::create();
    let mut cg = CodeGen::new(&context, "test", machine.get_target_data());
    cg.module.set_triple(&TargetMachine::get_default_triple());
    cg.module
        .set_data_layout(&machine.get_target_data().get_data_layout());
    cg.compile_program(&program).map_err(|e| e.to_string())?;
    cg.module.verify().map_err(|e| e.to_string())?;
    Ok(cg.module.print_to_string().to_string())
}

#[test]
fn test_arithmetic_verifies() {
    // operands come from locals so the builder cannot constant-fold
    let ir = compile_to_ir("fn main() -> i32 {\n a := 2\n b := 3\n c := 4\n ret a + b * c\n}");
    assert!(ir.contains("mul"));
    assert!(ir.contains("add"));
}

#[test]
fn test_integer_widening_zext() {
    let ir = compile_to_ir(
        "fn main() -> i32 {\n a : i64 = 100\n b : i32 = 3\n c := a + b\n ret 0\n}",
    );
    assert!(ir.contains("zext"), "narrow operand must widen:\n{}", ir);
}

#[test]
fn test_int_float_promotion() {
    let ir = compile_to_ir("fn main() -> i32 {\n x := 1\n y := x + 2.5\n ret 0\n}");
    assert!(ir.contains("sitofp"), "int must promote to float:\n{}", ir);
    assert!(ir.contains("fadd"));
}

#[test]
fn test_unsigned_division() {
    let ir = compile_to_ir("fn main() -> i32 {\n a : u32 = 10\n b : u32 = 3\n c := a / b\n ret 0\n}");
    assert!(ir.contains("udiv"), "u32 division must be unsigned:\n{}", ir);
}

#[test]
fn test_signed_division() {
    let ir = compile_to_ir("fn main() -> i32 {\n a : i32 = 10\n c := a / 3\n ret 0\n}");
    assert!(ir.contains("sdiv"), "i32 division must be signed:\n{}", ir);
}

#[test]
fn test_pointer_arithmetic_gep() {
    let ir = compile_to_ir(
        "ext malloc(i64) -> *v\nfn main() -> i32 {\n p : *i32 = malloc(64) as *i32\n q := p + 3\n ret 0\n}",
    );
    assert!(ir.contains("getelementptr i32"), "stride by pointee:\n{}", ir);
}

#[test]
fn test_pointer_difference() {
    let ir = compile_to_ir(
        "ext malloc(i64) -> *v\nfn main() -> i32 {\n p : *i32 = malloc(64) as *i32\n d := p - p\n ret 0\n}",
    );
    assert!(ir.contains("ptrtoint"));
}

#[test]
fn test_short_circuit_phi() {
    let ir = compile_to_ir("fn f(a: i32, b: i32) -> i32 { ret a && b }");
    assert!(ir.contains("phi i1"), "&& must emit an i1 phi:\n{}", ir);
}

#[test]
fn test_string_literal_global() {
    let ir = compile_to_ir("fn main() -> i32 {\n s := \"ab\"\n ret *s as i32\n}");
    assert!(ir.contains("c\"ab\\00\""), "C string global:\n{}", ir);
}

#[test]
fn test_struct_layout_and_field_access() {
    let ir = compile_to_ir(
        "ext malloc(i64) -> *v\nst Point { x: i32, y: i32 }\nfn main() -> i32 {\n p := nw Point { x: 10, y: 20 }\n ret p.x + p.y\n}",
    );
    assert!(ir.contains("%Point = type { i32, i32 }"), "{}", ir);
    assert!(ir.contains("call") && ir.contains("malloc"));
}

#[test]
fn test_enum_members_are_private_constants() {
    let ir = compile_to_ir("enum Color { Red; Green; Blue = 5 }\nfn main() -> i32 { ret Green }");
    assert!(ir.contains("@Green = private constant i32 1"), "{}", ir);
    assert!(ir.contains("@Blue = private constant i32 5"), "{}", ir);
}

#[test]
fn test_match_compare_chain() {
    let ir = compile_to_ir(
        "fn main() -> i32 {\n x := 2\n match x { 1 { ret 1 } 2 { ret 2 } _ { ret 0 } }\n ret 9\n}",
    );
    assert!(ir.matches("icmp eq").count() >= 2, "{}", ir);
}

#[test]
fn test_defer_reverse_order() {
    let ir = compile_to_ir(
        "ext first()\next second()\nfn main() -> i32 {\n defer first()\n defer second()\n ret 0\n}",
    );
    let second_pos = ir.find("call void @second").expect("second call");
    let first_pos = ir.find("call void @first").expect("first call");
    assert!(
        second_pos < first_pos,
        "defers must run in reverse push order:\n{}",
        ir
    );
}

#[test]
fn test_deferred_return_wins() {
    // the deferred ret terminates before the outer ret is emitted
    let ir = compile_to_ir("fn main() -> i32 {\n defer ret 7\n ret 3\n}");
    assert!(ir.contains("ret i32 7"), "{}", ir);
    assert!(!ir.contains("ret i32 3"), "outer return is dead:\n{}", ir);
}

#[test]
fn test_comptime_folds_to_constant() {
    // ct binds like a unary prefix, so the folded expression is grouped
    let ir = compile_to_ir("fn main() -> i32 {\n x : i64 = ct (2 + 3 * 4)\n ret 0\n}");
    assert!(ir.contains("store i64 14"), "folded constant:\n{}", ir);
}

#[test]
fn test_comptime_sizeof() {
    let ir = compile_to_ir("fn main() -> i32 {\n x : i64 = ct sz i64\n ret 0\n}");
    assert!(ir.contains("store i64 8"), "{}", ir);
}

#[test]
fn test_comptime_division_by_zero_is_zero() {
    let ir = compile_to_ir("fn main() -> i32 {\n x : i64 = ct (5 / 0)\n ret 0\n}");
    assert!(ir.contains("store i64 0"), "{}", ir);
}

#[test]
fn test_comptime_unfoldable_is_error() {
    let err = try_compile("fn f() -> i32 { ret 1 }\nfn main() -> i32 {\n x := ct f()\n ret 0\n}")
        .unwrap_err();
    assert!(err.contains("compile time"), "{}", err);
}

#[test]
fn test_ufcs_rewrites_receiver() {
    let ir = compile_to_ir(
        "fn double(x: i32) -> i32 { ret x * 2 }\nfn main() -> i32 {\n y := 21\n ret y.double()\n}",
    );
    assert!(ir.contains("call i32 @double(i32"), "{}", ir);
}

#[test]
fn test_pipeline_is_plain_call() {
    let ir = compile_to_ir(
        "fn add(a: i32, b: i32) -> i32 { ret a + b }\nfn main() -> i32 { ret 1 |> add(2) }",
    );
    assert!(ir.contains("call i32 @add(i32"), "{}", ir);
}

#[test]
fn test_function_pointer_indirect_call() {
    let ir = compile_to_ir(
        "fn inc(x: i32) -> i32 { ret x + 1 }\nfn main() -> i32 {\n f : *fn(i32) -> i32 = inc\n ret f(41)\n}",
    );
    assert!(ir.contains("call i32 %"), "indirect call through loaded pointer:\n{}", ir);
}

#[test]
fn test_sizeof_is_layout_size() {
    let ir = compile_to_ir("st Pair { a: i32, b: i64 }\nfn main() -> i32 {\n s := sz Pair\n ret 0\n}");
    // i32 + padding + i64
    assert!(ir.contains("store i64 16"), "{}", ir);
}

#[test]
fn test_inline_asm_volatile() {
    let ir = compile_to_ir("fn main() -> i32 {\n asm(\"nop\")\n ret 0\n}");
    assert!(ir.contains("asm sideeffect"), "{}", ir);
}

#[test]
fn test_inline_asm_output_constraint() {
    let ir = compile_to_ir(
        "fn main() -> i32 {\n x := 0\n asm(\"movl $$7, $0\" : \"=r\"(x))\n ret x\n}",
    );
    assert!(ir.contains("=r"), "{}", ir);
}

#[test]
fn test_undefined_name_is_error() {
    let err = try_compile("fn main() -> i32 { ret nope }").unwrap_err();
    assert!(err.contains("undefined 'nope'"), "{}", err);
}

#[test]
fn test_undefined_function_is_error() {
    let err = try_compile("fn main() -> i32 { ret nope(1) }").unwrap_err();
    assert!(err.contains("undefined function"), "{}", err);
}

#[test]
fn test_unknown_field_is_error() {
    let err = try_compile(
        "ext malloc(i64) -> *v\nst P { x: i32 }\nfn main() -> i32 {\n p := nw P { x: 1 }\n ret p.z\n}",
    )
    .unwrap_err();
    assert!(err.contains("no field 'z'"), "{}", err);
}

#[test]
fn test_break_outside_loop_is_error() {
    let err = try_compile("fn main() -> i32 {\n brk\n ret 0\n}").unwrap_err();
    assert!(err.contains("outside of loop"), "{}", err);
}

#[test]
fn test_while_loop_blocks() {
    let ir = compile_to_ir(
        "fn main() -> i32 {\n x := 0\n wh x < 10 { x += 1 }\n ret x\n}",
    );
    assert!(ir.contains("wh.cond"));
    assert!(ir.contains("wh.body"));
    assert!(ir.contains("wh.end"));
}

#[test]
fn test_for_loop_continue_targets_incr() {
    let ir = compile_to_ir(
        "fn main() -> i32 {\n x := 0\n for i := 0..10 { cont }\n ret x\n}",
    );
    assert!(ir.contains("for.incr"));
    assert!(ir.contains("br label %for.incr"), "{}", ir);
}

#[test]
fn test_reducer_intrinsic_expands_to_loop() {
    let ir = compile_to_ir("fn main() -> i32 { ret sum(1..=4) }");
    assert!(ir.contains("red.cond"), "{}", ir);
    assert!(ir.contains("red.body"));
}

#[test]
fn test_reducer_shadowed_by_user_function() {
    let ir = compile_to_ir(
        "fn sum(a: i32, b: i32) -> i32 { ret a + b }\nfn main() -> i32 { ret sum(1, 2) }",
    );
    assert!(ir.contains("call i32 @sum"), "{}", ir);
    assert!(!ir.contains("red.cond"));
}

#[test]
fn test_ternary_phi() {
    let ir = compile_to_ir("fn main() -> i32 {\n x := 1\n ret x > 0 ? 10 : 20\n}");
    assert!(ir.contains("phi i32"), "{}", ir);
}

#[test]
fn test_sexpr_surface_compiles() {
    let src = "(fn add ((a i32) (b i32)) i32 (^ (+ a b))) (fn main () (^ (add 2 3)))";
    let program = glyphc_par::sexpr::parse(src, "test.gsx", &ParseConfig { no_std_prelude: true })
        .expect("parse");
    let machine = native_machine();
    let context = Context::create();
    let mut cg = CodeGen::new(&context, "test", machine.get_target_data());
    cg.compile_program(&program).expect("codegen");
    cg.module.verify().expect("verify");
    let ir = cg.module.print_to_string().to_string();
    assert!(ir.contains("call i32 @add"));
}

#[test]
fn test_emit_object_writes_file() {
    let src = "fn main() -> i32 { ret 0 }";
    let mut parser =
        Parser::new(src, "test.gly", ParseConfig { no_std_prelude: true }).unwrap();
    let program = parser.parse().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let obj = dir.path().join("out.o");
    glyphc_gen::emit_object(
        &program,
        &glyphc_gen::CodegenOptions {
            module_name: "test".to_string(),
            obj_path: obj.clone(),
            opt_level: 0,
            target: glyphc_gen::TargetKind::Native,
            emit_ir: false,
        },
    )
    .expect("emit");
    let meta = std::fs::metadata(&obj).expect("object file");
    assert!(meta.len() > 0);
}
