//! Text Rendering
//!
//! Formal-notation descriptions of machines and programs. Every function here
//! is pure: the same input always renders the same text.

use std::fmt::{self, Write as _};

use crate::isa::{Instruction, OpCode, Program, Reg, TestKind};
use crate::machine::{InputMode, MachineConfig, OutputMode, RegisterSpec};

/// Placeholder for an empty component of the tuple
const EMPTY: &str = "-";

/// Render `config` as the 8-tuple `M_n = (R, M, X, Y, in, out, Ops, Tests)`
/// followed by the semantics of every function it names
pub fn describe_machine(config: &MachineConfig) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    write_machine(&mut out, config).ok();
    out
}

fn write_machine(out: &mut String, config: &MachineConfig) -> fmt::Result {
    let count = config.register_count();
    let vars = tuple_vars(count);
    let set = register_set(count);
    let tuple = format!("({})", vars.join(", "));

    let inputs: Vec<(Reg, &RegisterSpec)> = config
        .registers()
        .filter(|(_, spec)| spec.input != InputMode::None)
        .collect();
    let outputs: Vec<(Reg, &RegisterSpec)> = config
        .registers()
        .filter(|(_, spec)| spec.output != OutputMode::None)
        .collect();

    let in_symbols: Vec<String> = inputs.iter().map(|(r, _)| symbol("in", *r)).collect();
    let out_symbols: Vec<String> = outputs.iter().map(|(r, _)| symbol("out", *r)).collect();
    let op_symbols: Vec<String> = config
        .registers()
        .flat_map(|(r, spec)| spec.ops.iter().map(move |op| op_symbol(op, r)))
        .collect();
    let test_symbols: Vec<String> = config
        .registers()
        .flat_map(|(r, spec)| spec.tests.iter().map(move |test| test_symbol(test, r)))
        .collect();

    writeln!(
        out,
        "M_{} = ({}, M{}, X{}, Y{}, {}, {}, {}, {})",
        count,
        set,
        config.memory_size(),
        config.input_capacity(),
        config.output_capacity(),
        braced(&in_symbols),
        braced(&out_symbols),
        braced(&op_symbols),
        braced(&test_symbols),
    )?;
    out.push('\n');

    let registers: Vec<String> = (0..count).map(|i| Reg(i).to_string()).collect();
    writeln!(out, "{} - registers {}", set, registers.join(", "))?;
    match config.memory_size() {
        0 => out.push_str("M0 - no memory cells\n"),
        size => {
            writeln!(out, "M{} - memory cells M0..M{}", size, size - 1)?;
        }
    }
    writeln!(out, "X{} - input queue capacity", config.input_capacity())?;
    writeln!(out, "Y{} - output queue capacity", config.output_capacity())?;

    if !inputs.is_empty() {
        out.push('\n');
        for (reg, spec) in &inputs {
            let name = symbol("in", *reg);
            match spec.input {
                InputMode::Queue => {
                    writeln!(
                        out,
                        "{}: N → {} such that, ∀n∈N, {}(n) = {}",
                        name,
                        set,
                        name,
                        unit_tuple(count, *reg, "n")
                    )?;
                }
                InputMode::Const(value) => {
                    writeln!(
                        out,
                        "{}: → {}, {}() = {}",
                        name,
                        set,
                        name,
                        unit_tuple(count, *reg, &value.to_string())
                    )?;
                }
                InputMode::None => {}
            }
        }
    }

    if !outputs.is_empty() {
        out.push('\n');
        for (reg, spec) in &outputs {
            let name = symbol("out", *reg);
            let component = &vars[reg.0];
            match spec.output {
                OutputMode::Push => {
                    writeln!(
                        out,
                        "{}: {} → N such that, ∀{}∈{}, {}{} = {}",
                        name, set, tuple, set, name, tuple, component
                    )?;
                }
                OutputMode::Mem(cell) => {
                    writeln!(
                        out,
                        "{}: {} → {} such that, ∀{}∈{}, {}{} writes {} to {}",
                        name, set, cell, tuple, set, name, tuple, component, cell
                    )?;
                }
                OutputMode::None => {}
            }
        }
    }

    out.push_str("\nOperations:\n");
    if op_symbols.is_empty() {
        out.push_str("  (none)\n");
    }
    for (reg, spec) in config.registers() {
        if spec.ops.is_empty() {
            continue;
        }
        let names: Vec<&str> = spec.ops.iter().map(OpCode::mnemonic).collect();
        writeln!(out, "  {}: {}", reg, names.join(", "))?;
        for op in spec.ops.iter() {
            writeln!(out, "    {}", op_semantics(op, reg, &vars, &set))?;
        }
    }

    out.push_str("\nTests:\n");
    if test_symbols.is_empty() {
        out.push_str("  (none)\n");
    }
    for (reg, spec) in config.registers() {
        if spec.tests.is_empty() {
            continue;
        }
        let tags: Vec<&str> = spec.tests.iter().map(TestKind::tag).collect();
        writeln!(out, "  {}: {}", reg, tags.join(", "))?;
        for test in spec.tests.iter() {
            let name = test_symbol(test, reg);
            let var = &vars[reg.0];
            writeln!(
                out,
                "    {}: {} → {{true, false}} such that, ∀{}∈{}, {}{} = true iff {} = 0",
                name, set, tuple, set, name, tuple, var
            )?;
        }
    }

    Ok(())
}

/// Render a program listing with indices and the label table
pub fn describe_program(program: &Program) -> String {
    let mut out = String::new();
    write_program(&mut out, program).ok();
    out
}

fn write_program(out: &mut String, program: &Program) -> fmt::Result {
    writeln!(
        out,
        "Program: {} instruction(s), {} label(s)",
        program.len(),
        program.labels().len()
    )?;

    for (index, instr) in program.instructions().iter().enumerate() {
        writeln!(out, "{:>4}  {}", index, format_instruction(instr))?;
    }

    if !program.labels().is_empty() {
        out.push_str("Labels:\n");
        for (label, index) in program.labels() {
            writeln!(out, "  {} -> {}", label, index)?;
        }
    }

    Ok(())
}

/// `[label: ]MNEMONIC arg1, arg2`
pub fn format_instruction(instr: &Instruction) -> String {
    let mut out = String::new();
    if let Some(label) = &instr.label {
        out.push_str(label);
        out.push_str(": ");
    }
    out.push_str(&instr.mnemonic);
    if !instr.args.is_empty() {
        out.push(' ');
        out.push_str(&instr.args.join(", "));
    }
    out
}

/// Component names of a state tuple: `(n, m)` for two registers, else `x1..xn`
fn tuple_vars(count: usize) -> Vec<String> {
    if count == 2 {
        return vec!["n".to_string(), "m".to_string()];
    }
    (1..=count).map(|i| format!("x{}", i)).collect()
}

fn register_set(count: usize) -> String {
    if count == 1 {
        "N".to_string()
    } else {
        format!("N{}", count)
    }
}

/// Tuple with `value` at `reg` and zeros elsewhere
fn unit_tuple(count: usize, reg: Reg, value: &str) -> String {
    let parts: Vec<&str> = (0..count)
        .map(|i| if i == reg.0 { value } else { "0" })
        .collect();
    format!("({})", parts.join(", "))
}

fn braced(symbols: &[String]) -> String {
    if symbols.is_empty() {
        format!("{{{}}}", EMPTY)
    } else {
        format!("{{{}}}", symbols.join(", "))
    }
}

fn symbol(base: &str, reg: Reg) -> String {
    format!("{}_r{}", base, reg.0 + 1)
}

fn op_symbol(op: OpCode, reg: Reg) -> String {
    symbol(&op.mnemonic().to_ascii_lowercase(), reg)
}

fn test_symbol(test: TestKind, reg: Reg) -> String {
    match test {
        TestKind::Zero => format!("r{}_zero", reg.0 + 1),
    }
}

fn op_semantics(op: OpCode, reg: Reg, vars: &[String], set: &str) -> String {
    let name = op_symbol(op, reg);
    let tuple = format!("({})", vars.join(", "));
    let var = &vars[reg.0];
    let replaced = |component: &str| {
        let parts: Vec<&str> = vars
            .iter()
            .enumerate()
            .map(|(i, v)| if i == reg.0 { component } else { v.as_str() })
            .collect();
        format!("({})", parts.join(", "))
    };

    let effect = match op {
        OpCode::Inc => replaced(&format!("{}+1", var)),
        OpCode::Dec => replaced(&format!("{}-1", var)),
        OpCode::In => format!("reads the input of {} into {}", reg, var),
        OpCode::Out => format!("emits {} on the output of {}", var, reg),
        OpCode::Mov => format!("copies a register into {}", var),
        OpCode::Load => format!("loads a memory cell into {}", var),
        OpCode::Store => format!("stores {} into a memory cell", var),
        OpCode::Add => format!("adds a register to {}", var),
        OpCode::Sub => format!("subtracts a register from {}", var),
        OpCode::Jump | OpCode::Jz | OpCode::Jnz | OpCode::Halt => {
            format!("applies {} to {}", op, reg)
        }
    };

    match op {
        OpCode::Inc | OpCode::Dec => format!(
            "{}: {} → {} such that, ∀{}∈{}, {}{} = {}",
            name, set, set, tuple, set, name, tuple, effect
        ),
        _ => format!("{}: {} → {}, {}{} {}", name, set, set, name, tuple, effect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse;
    use crate::snapshot::{InputModeTag, MachineParams, OutputModeTag};

    fn two_register_machine() -> MachineConfig {
        let mut params = MachineParams::new(2);
        params.memory_size = 3;
        params.input_capacity = 2;
        params.output_capacity = 1;
        params.register_input_mode.insert("R2".into(), InputModeTag::None);
        params.register_output_mode.insert("R1".into(), OutputModeTag::Push);
        params.register_output_mode.insert("R2".into(), OutputModeTag::Mem);
        params.register_output_mem.insert("R2".into(), 2);
        params
            .allowed_ops
            .insert("R1".into(), vec!["INC".into(), "DEC".into()]);
        params.allowed_ops.insert("R2".into(), vec![]);
        params.allowed_tests.insert("R2".into(), vec![]);
        MachineConfig::build(&params).expect("config")
    }

    #[test]
    fn tuple_header() {
        let text = describe_machine(&two_register_machine());
        let header = text.lines().next().expect("header");
        assert_eq!(
            header,
            "M_2 = (N2, M3, X2, Y1, {in_r1}, {out_r1, out_r2}, {inc_r1, dec_r1}, {r1_zero})"
        );
    }

    #[test]
    fn semantics_lines() {
        let text = describe_machine(&two_register_machine());
        assert!(text.contains("in_r1: N → N2 such that, ∀n∈N, in_r1(n) = (n, 0)"));
        assert!(text.contains("inc_r1(n, m) = (n+1, m)"));
        assert!(text.contains("dec_r1(n, m) = (n-1, m)"));
        assert!(text.contains("out_r2: N2 → M2"));
        assert!(text.contains("r1_zero(n, m) = true iff n = 0"));
        assert!(!text.contains("r2_zero"));
    }

    #[test]
    fn empty_sets_render_as_dash() {
        let mut params = MachineParams::new(1);
        params.register_input_mode.insert("R1".into(), InputModeTag::None);
        params.allowed_ops.insert("R1".into(), vec![]);
        params.allowed_tests.insert("R1".into(), vec![]);
        let config = MachineConfig::build(&params).expect("config");

        let text = describe_machine(&config);
        assert!(text.starts_with("M_1 = (N, M0, X0, Y0, {-}, {-}, {-}, {-})"));
        assert!(text.contains("Operations:\n  (none)"));
    }

    #[test]
    fn describe_is_deterministic() {
        let config = two_register_machine();
        assert_eq!(describe_machine(&config), describe_machine(&config));
    }

    #[test]
    fn program_listing() {
        let program = parse("start: IN R1\nJZ R1, done\nJUMP start\ndone: HALT").expect("parse");
        let text = describe_program(&program);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Program: 4 instruction(s), 2 label(s)");
        assert_eq!(lines[1], "   0  start: IN R1");
        assert_eq!(lines[2], "   1  JZ R1, done");
        assert_eq!(lines[4], "   3  done: HALT");
        assert_eq!(lines[5], "Labels:");
        assert_eq!(lines[6], "  done -> 3");
        assert_eq!(lines[7], "  start -> 0");
    }
}
