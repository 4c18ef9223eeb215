use backend::emit_assembly;

fn asm_of(src: &str) -> String {
    let p = parse::parse_program("t", src).expect("parse ok");
    let tab = sema::analyze("t", &p).expect("analyze ok");
    let prog = hir::generate(&tab, &p).expect("hir ok");
    emit_assembly(&prog).expect("emit ok")
}

fn frame_size(asm: &str) -> i64 {
    let line = asm
        .lines()
        .find(|l| l.trim_start().starts_with("subq $"))
        .expect("subq line present");
    let imm = line.trim_start().trim_start_matches("subq $");
    let imm = imm.split(',').next().expect("operand");
    imm.parse().expect("numeric frame size")
}

#[test]
fn frame_holds_locals_and_vreg_slots() {
    // x:=2+3*4; WRITE x -> 8 bytes of locals + 6 vreg slots = 56
    let asm = asm_of("VAR x : INTEGER; BEGIN x := 2+3*4; WRITE x END.");
    assert_eq!(frame_size(&asm), 56);
    assert!(asm.contains("/* 6 vregs used */"), "{asm}");
}

#[test]
fn sixteen_byte_multiples_get_padded() {
    // 16 bytes of locals + 2 vreg slots = 32, padded to 40
    let asm = asm_of("VAR a, b : INTEGER; BEGIN a := 1 END.");
    assert_eq!(frame_size(&asm), 40);
}

#[test]
fn frame_is_always_misaligned_by_eight() {
    let programs = [
        "BEGIN WRITE 1 END.",
        "VAR x : INTEGER; BEGIN x := 1 END.",
        "VAR a, b : INTEGER; BEGIN a := 1 END.",
        "VAR x : INTEGER; BEGIN READ x; WRITE x+1 END.",
        "VAR v : ARRAY 5 OF INTEGER; i : INTEGER; BEGIN v[0] := 1 END.",
    ];
    for src in programs {
        let asm = asm_of(src);
        assert_eq!(frame_size(&asm) % 16, 8, "frame misaligned for {src}");
    }
}

#[test]
fn entry_and_exit_adjust_rsp_symmetrically() {
    let asm = asm_of("VAR x : INTEGER; BEGIN x := 1 END.");
    let n = frame_size(&asm);
    assert!(asm.contains(&format!("subq ${n}, %rsp")), "{asm}");
    assert!(asm.contains(&format!("addq ${n}, %rsp")), "{asm}");
}

#[test]
fn epilogue_zeroes_eax_and_returns() {
    let asm = asm_of("BEGIN END.");
    let tail: Vec<&str> = asm.lines().rev().take(3).collect();
    assert_eq!(tail[0], "\tret");
    assert_eq!(tail[1], "\tmovl $0, %eax");
    assert!(tail[2].starts_with("\taddq $"), "{asm}");
}

#[test]
fn preamble_declares_format_strings_and_main() {
    let asm = asm_of("BEGIN END.");
    assert!(asm.contains("\t.section .rodata\n"), "{asm}");
    assert!(asm.contains("s_readint_fmt: .string \"%ld\"\n"), "{asm}");
    assert!(asm.contains("s_writeint_fmt: .string \"%ld\\n\"\n"), "{asm}");
    assert!(asm.contains("\t.globl main\nmain:\n"), "{asm}");
}
