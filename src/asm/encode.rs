//! Encoding pass: one resolved line to one 16-bit word.
//!
//! A-instructions are `0` + 15-bit unsigned value. C-instructions are
//! `111` + comp(7) + dest(3) + jump(3); the high "a" bit of comp selects
//! the A register (0) or memory (1) operand.

use crate::diagnostic::Diagnostic;

/// Encode one cleaned, symbol-free line.
pub fn encode_line(line: &str) -> Result<String, Diagnostic> {
    match line.strip_prefix('@') {
        Some(address) => encode_a(address),
        None => encode_c(line),
    }
}

fn encode_a(address: &str) -> Result<String, Diagnostic> {
    let value: u32 = address.parse().map_err(|_| {
        Diagnostic::stage("assemble", format!("invalid address '@{}'", address))
    })?;
    if value >= 1 << 15 {
        return Err(Diagnostic::stage(
            "assemble",
            format!("address '@{}' exceeds the 15-bit range", value),
        ));
    }
    Ok(format!("0{:015b}", value))
}

fn encode_c(line: &str) -> Result<String, Diagnostic> {
    let (dest, rest) = match line.split_once('=') {
        Some((dest, rest)) => (dest, rest),
        None => ("", line),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((comp, jump)) => (comp, jump),
        None => (rest, ""),
    };

    Ok(format!(
        "111{}{}{}",
        comp_bits(comp)?,
        dest_bits(dest)?,
        jump_bits(jump)?
    ))
}

/// The fixed computation table. Commutative spellings not present are
/// canonicalised by reversal (`M+D` → `D+M`) and retried.
fn comp_bits(comp: &str) -> Result<&'static str, Diagnostic> {
    fn lookup(comp: &str) -> Option<&'static str> {
        let bits = match comp {
            "0" => "0101010",
            "1" => "0111111",
            "-1" => "0111010",
            "D" => "0001100",
            "A" => "0110000",
            "!D" => "0001101",
            "!A" => "0110001",
            "-D" => "0001111",
            "-A" => "0110011",
            "D+1" => "0011111",
            "A+1" => "0110111",
            "D-1" => "0001110",
            "A-1" => "0110010",
            "D+A" => "0000010",
            "D-A" => "0010011",
            "A-D" => "0000111",
            "D&A" => "0000000",
            "D|A" => "0010101",
            "M" => "1110000",
            "!M" => "1110001",
            "-M" => "1110011",
            "M+1" => "1110111",
            "M-1" => "1110010",
            "D+M" => "1000010",
            "D-M" => "1010011",
            "M-D" => "1000111",
            "D&M" => "1000000",
            "D|M" => "1010101",
            _ => return None,
        };
        Some(bits)
    }

    if let Some(bits) = lookup(comp) {
        return Ok(bits);
    }
    let reversed: String = comp.chars().rev().collect();
    lookup(&reversed).ok_or_else(|| {
        Diagnostic::stage(
            "assemble",
            format!("unrecognised computation '{}'", comp),
        )
    })
}

/// Each of A, D, M contributes one destination bit.
fn dest_bits(dest: &str) -> Result<String, Diagnostic> {
    let mut a = false;
    let mut d = false;
    let mut m = false;
    for c in dest.chars() {
        let slot = match c {
            'A' => &mut a,
            'D' => &mut d,
            'M' => &mut m,
            _ => {
                return Err(Diagnostic::stage(
                    "assemble",
                    format!("unrecognised destination '{}'", dest),
                ))
            }
        };
        if *slot {
            return Err(Diagnostic::stage(
                "assemble",
                format!("destination '{}' repeats a register", dest),
            ));
        }
        *slot = true;
    }
    Ok(format!(
        "{}{}{}",
        u8::from(a),
        u8::from(d),
        u8::from(m)
    ))
}

fn jump_bits(jump: &str) -> Result<&'static str, Diagnostic> {
    let bits = match jump {
        "" => "000",
        "JGT" => "001",
        "JEQ" => "010",
        "JGE" => "011",
        "JLT" => "100",
        "JNE" => "101",
        "JLE" => "110",
        "JMP" => "111",
        _ => {
            return Err(Diagnostic::stage(
                "assemble",
                format!("unrecognised jump '{}'", jump),
            ))
        }
    };
    Ok(bits)
}
