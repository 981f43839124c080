//! End-to-end tests: compile real programs with the glyphc binary, run the
//! produced executables, and assert exit codes and output.
//!
//! Sources declare their own externs and pass --no-std so the tests do not
//! depend on the working directory; the prelude tests pin the working
//! directory to the workspace root instead.

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::Command as CargoCommand;
use predicates::prelude::*;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root")
        .to_path_buf()
}

/// Compile `source` with --no-std and return the executable's exit code.
fn exit_code_of(source: &str) -> i32 {
    exit_code_with_ext(source, "gly")
}

fn exit_code_with_ext(source: &str, ext: &str) -> i32 {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join(format!("prog.{}", ext));
    std::fs::write(&src_path, source).expect("write source");
    let out_path = dir.path().join("prog.bin");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .arg("--no-std")
        .assert()
        .success();

    let status = Command::new(&out_path).status().expect("run output");
    status.code().expect("exit code")
}

/// Compile and run, returning captured stdout.
fn stdout_of(source: &str) -> String {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, source).expect("write source");
    let out_path = dir.path().join("prog.bin");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .arg("--no-std")
        .assert()
        .success();

    let out = Command::new(&out_path).output().expect("run output");
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(exit_code_of("fn main() -> i32 { ret 2 + 3 * 4 }"), 14);
}

#[test]
fn test_string_deref() {
    assert_eq!(
        exit_code_of("fn main() -> i32 {\n s := \"ab\"\n ret *s as i32\n}"),
        97
    );
}

#[test]
fn test_struct_literal_and_fields() {
    let src = "ext malloc(i64) -> *v\n\
               st P { x: i32, y: i32 }\n\
               fn main() -> i32 {\n p := nw P { x: 10, y: 20 }\n ret p.x + p.y\n}";
    assert_eq!(exit_code_of(src), 30);
}

#[test]
fn test_inclusive_for_range() {
    let src = "fn main() -> i32 {\n x := 0\n for i := 1..=4 { x += i }\n ret x\n}";
    assert_eq!(exit_code_of(src), 10);
}

#[test]
fn test_exclusive_for_range() {
    let src = "fn main() -> i32 {\n x := 0\n for i := 1..4 { x += i }\n ret x\n}";
    assert_eq!(exit_code_of(src), 6);
}

#[test]
fn test_deferred_return_overrides_exit() {
    let src = "fn main() -> i32 {\n defer ret 7\n ret 3\n}";
    assert_eq!(exit_code_of(src), 7);
}

#[test]
fn test_match_dispatch() {
    let src = "fn main() -> i32 {\n x := 2\n match x { 1 { ret 1 } 2 { ret 2 } _ { ret 0 } }\n ret 9\n}";
    assert_eq!(exit_code_of(src), 2);
}

#[test]
fn test_match_default_arm() {
    let src = "fn main() -> i32 {\n x := 5\n match x { 1 { ret 1 } 2 { ret 2 } _ { ret 42 } }\n ret 9\n}";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_match_fallthrough_without_default() {
    let src = "fn main() -> i32 {\n x := 5\n match x { 1 { ret 1 } }\n ret 9\n}";
    assert_eq!(exit_code_of(src), 9);
}

#[test]
fn test_defer_ordering_and_not_on_break() {
    // body prints b twice (defers are not per-iteration), then e, then the
    // three defers replay C B A in reverse push order at exit
    let src = "ext printf(*u8, ...) -> i32\n\
               fn main() -> i32 {\n\
                 defer printf(\"A\")\n\
                 defer printf(\"B\")\n\
                 for i := 0..2 { printf(\"b\") }\n\
                 defer printf(\"C\")\n\
                 printf(\"e\")\n\
                 ret 0\n}";
    assert_eq!(stdout_of(src), "bbeCBA");
}

#[test]
fn test_pipeline_rewrite() {
    let src = "fn add(a: i32, b: i32) -> i32 { ret a + b }\n\
               fn main() -> i32 { ret 1 |> add(2) }";
    assert_eq!(exit_code_of(src), 3);
}

#[test]
fn test_pipeline_bare_function() {
    let src = "fn double(x: i32) -> i32 { ret x * 2 }\n\
               fn main() -> i32 { ret 21 |> double }";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_ufcs_call() {
    let src = "fn double(x: i32) -> i32 { ret x * 2 }\n\
               fn main() -> i32 {\n y := 21\n ret y.double()\n}";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_new_allocates_sizeof_bytes() {
    // nw T is malloc(sz T) as *T; writing through the pointer must work
    let src = "ext malloc(i64) -> *v\n\
               st Big { a: i64, b: i64, c: i64 }\n\
               fn main() -> i32 {\n\
                 p := nw Big\n\
                 p.c = 9\n\
                 ret (sz Big) as i32 + p.c as i32\n}";
    assert_eq!(exit_code_of(src), 33);
}

#[test]
fn test_pointer_arithmetic_stride() {
    let src = "ext malloc(i64) -> *v\n\
               fn main() -> i32 {\n\
                 p : *i32 = malloc(16) as *i32\n\
                 *p = 1\n\
                 q := p + 3\n\
                 *q = 2\n\
                 d := q - p\n\
                 ret d as i32\n}";
    // byte difference of 3 i32 strides
    assert_eq!(exit_code_of(src), 12);
}

#[test]
fn test_comptime_constant() {
    let src = "fn main() -> i32 {\n x : i64 = ct (sz i64)\n ret x as i32\n}";
    assert_eq!(exit_code_of(src), 8);
}

#[test]
fn test_while_break_continue() {
    let src = "fn main() -> i32 {\n\
                 x := 0\n i := 0\n\
                 wh 1 {\n\
                   i += 1\n\
                   if i > 10 { brk }\n\
                   if i % 2 { cont }\n\
                   x += i\n\
                 }\n\
                 ret x\n}";
    // 2 + 4 + 6 + 8 + 10
    assert_eq!(exit_code_of(src), 30);
}

#[test]
fn test_short_circuit_effects() {
    // the RHS call must not run when the LHS already decides
    let src = "ext printf(*u8, ...) -> i32\n\
               fn side() -> i32 {\n printf(\"x\")\n ret 1\n}\n\
               fn main() -> i32 {\n\
                 a := 0\n\
                 if a && side() { ret 1 }\n\
                 if 1 || side() { ret 2 }\n\
                 ret 3\n}";
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, src).expect("write source");
    let out_path = dir.path().join("prog.bin");
    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .arg("--no-std")
        .assert()
        .success();
    let out = Command::new(&out_path).output().expect("run output");
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty(), "side() must not run");
}

#[test]
fn test_implicit_main_from_statements() {
    let src = "x := 40\ny := x + 2\nret y\n";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_emoji_surface() {
    let src = "🔧 main() { ↩ 40 + 2 }";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_preprocessor_macro() {
    let src = "⚡ SQ(x) 👉 (x * x)\nfn main() -> i32 { ret SQ(3) }";
    assert_eq!(exit_code_of(src), 9);
}

#[test]
fn test_sexpr_surface_file() {
    let src = "(fn add ((a i32) (b i32)) i32 (^ (+ a b)))\n(fn main () (^ (add 40 2)))";
    assert_eq!(exit_code_with_ext(src, "gsx"), 42);
}

#[test]
fn test_sexpr_while_loop() {
    let src = "(fn main ()\n  (= x 0)\n  (= i 0)\n  (@ (< i 5) (+= x i) (+= i 1))\n  (^ x))";
    assert_eq!(exit_code_with_ext(src, "gsx"), 10);
}

#[test]
fn test_enum_values() {
    let src = "enum Color { Red; Green; Blue = 5 }\n\
               fn main() -> i32 { ret Green + Blue }";
    assert_eq!(exit_code_of(src), 6);
}

#[test]
fn test_fn_one_liner() {
    let src = "fn inc(x: i32) = x + 1\nfn main() -> i32 { ret inc(41) }";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_function_pointer_call() {
    let src = "fn inc(x: i32) -> i32 { ret x + 1 }\n\
               fn main() -> i32 {\n f : *fn(i32) -> i32 = inc\n ret f(41)\n}";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_ternary_coercion() {
    let src = "fn main() -> i32 {\n x := 1\n ret x > 0 ? 40 + 2 : 0\n}";
    assert_eq!(exit_code_of(src), 42);
}

#[test]
fn test_emit_ir_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, "fn main() -> i32 { ret 0 }").expect("write source");
    let out_path = dir.path().join("prog.bin");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .arg("--no-std")
        .arg("--emit-ir")
        .assert()
        .success()
        .stderr(predicate::str::contains("define i32 @main"));
}

#[test]
fn test_dump_expanded_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, "⚡ N 👉 7\nfn main() -> i32 { ret N }").expect("write source");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("--dump-expanded")
        .arg("--no-std")
        .assert()
        .success()
        .stdout(predicate::str::contains("ret 7"));
}

#[test]
fn test_error_diagnostic_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, "fn main() -> i32 {\n ret nope\n}").expect("write source");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("--no-std")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_syntax_error_has_position() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, "fn main() -> i32 {\n x : = 1\n}").expect("write source");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("--no-std")
        .assert()
        .failure()
        .stderr(predicate::str::contains(":2:"));
}

#[test]
fn test_optimization_levels_accepted() {
    for level in ["-O0", "-O1", "-O2", "-O3"] {
        let dir = tempfile::tempdir().expect("tempdir");
        let src_path = dir.path().join("prog.gly");
        std::fs::write(&src_path, "fn main() -> i32 { ret 5 }").expect("write source");
        let out_path = dir.path().join("prog.bin");

        CargoCommand::cargo_bin("glyphc")
            .expect("glyphc binary")
            .arg(&src_path)
            .arg("-o")
            .arg(&out_path)
            .arg("--no-std")
            .arg(level)
            .assert()
            .success();
        let status = Command::new(&out_path).status().expect("run output");
        assert_eq!(status.code(), Some(5), "level {}", level);
    }
}

#[test]
fn test_object_file_removed_after_link() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, "fn main() -> i32 { ret 0 }").expect("write source");
    let out_path = dir.path().join("prog.bin");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .arg("--no-std")
        .assert()
        .success();

    assert!(out_path.exists());
    let obj = PathBuf::from(format!("{}.o", out_path.display()));
    assert!(!obj.exists(), "temporary object must be removed");
}

#[test]
fn test_std_prelude_print() {
    // auto-loaded prelude supplies printf for the print builtin; the
    // prelude search is relative, so pin the working directory
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    std::fs::write(&src_path, "fn main() -> i32 {\n print 42\n ret 0\n}").expect("write source");
    let out_path = dir.path().join("prog.bin");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .current_dir(workspace_root())
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    let out = Command::new(&out_path).output().expect("run output");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "42\n");
}

#[test]
fn test_std_prelude_new_without_ext() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src_path = dir.path().join("prog.gly");
    let src = "st P { x: i32, y: i32 }\nfn main() -> i32 {\n p := nw P { x: 10, y: 20 }\n ret p.x + p.y\n}";
    std::fs::write(&src_path, src).expect("write source");
    let out_path = dir.path().join("prog.bin");

    CargoCommand::cargo_bin("glyphc")
        .expect("glyphc binary")
        .current_dir(workspace_root())
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    let status = Command::new(&out_path).status().expect("run output");
    assert_eq!(status.code(), Some(30));
}
