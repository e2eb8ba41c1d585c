//! Symbol pass: label collection, variable allocation, and rewriting of
//! symbolic `@name` references to decimal addresses.

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;

/// Variables are allocated upward from 16; 0–15 are the named registers.
const FIRST_VARIABLE_ADDRESS: u16 = 16;

pub struct SymbolTable {
    map: HashMap<String, u16>,
    variables_assigned: u16,
}

impl SymbolTable {
    /// Table seeded with the predefined symbols.
    pub fn with_predefined() -> Self {
        let mut map = HashMap::new();
        map.insert("SP".to_string(), 0);
        map.insert("LCL".to_string(), 1);
        map.insert("ARG".to_string(), 2);
        map.insert("THIS".to_string(), 3);
        map.insert("THAT".to_string(), 4);
        for r in 0..16u16 {
            map.insert(format!("R{}", r), r);
        }
        map.insert("SCREEN".to_string(), 0x4000);
        map.insert("KBD".to_string(), 0x6000);
        Self {
            map,
            variables_assigned: 0,
        }
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.map.get(name).copied()
    }

    fn define_label(&mut self, name: &str, address: u16) -> Result<(), Diagnostic> {
        if self.map.contains_key(name) {
            return Err(Diagnostic::stage(
                "assemble",
                format!("label '{}' is already defined", name),
            ));
        }
        self.map.insert(name.to_string(), address);
        Ok(())
    }

    fn get_or_allocate(&mut self, name: &str) -> u16 {
        if let Some(addr) = self.map.get(name) {
            return *addr;
        }
        let addr = FIRST_VARIABLE_ADDRESS + self.variables_assigned;
        self.variables_assigned += 1;
        self.map.insert(name.to_string(), addr);
        addr
    }
}

/// Run the symbol pass over cleaned lines.
///
/// First sweep records every `(L)` at the index of the next real
/// instruction and drops the definition line. The remaining sweeps
/// allocate unknown non-numeric `@name`s as variables and rewrite every
/// symbolic reference to `@<decimal>`.
pub fn resolve(lines: Vec<String>) -> Result<Vec<String>, Diagnostic> {
    let mut table = SymbolTable::with_predefined();
    let mut instructions: Vec<String> = Vec::new();

    for line in &lines {
        if let Some(inner) = line.strip_prefix('(') {
            let name = inner.strip_suffix(')').ok_or_else(|| {
                Diagnostic::stage("assemble", format!("malformed label definition '{}'", line))
            })?;
            if name.is_empty() {
                return Err(Diagnostic::stage("assemble", "empty label definition '()'"));
            }
            table.define_label(name, instructions.len() as u16)?;
        } else {
            instructions.push(line.clone());
        }
    }

    for line in instructions.iter_mut() {
        if let Some(symbol) = line.strip_prefix('@') {
            if !symbol.is_empty() && !symbol.chars().all(|c| c.is_ascii_digit()) {
                let address = table.get_or_allocate(symbol);
                *line = format!("@{}", address);
            }
        }
    }

    Ok(instructions)
}
