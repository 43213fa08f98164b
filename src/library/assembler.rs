// MinVM: minimal instruction set virtual machine.
// SUBLEQ-family one, two, three and eight instruction computers.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

//! Text assembler and disassembler.
//!
//! Source is processed line by line. Anything after `;` or `#` is a comment. A line may start
//! with any number of `label:` definitions, followed by either an instruction mnemonic with
//! comma- or space-separated operands, or a `.word` directive listing raw data cells. Operands
//! are decimal or `0x`-prefixed hexadecimal integers, `rN` register numbers, or label names with
//! an optional `+N`/`-N` offset. Mnemonics are case-insensitive; labels are not.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::core::{Cell, Layout};
use crate::isa::{BytecodeRead, InstructionSet, Marshaller, MnemonicError};
use crate::library::Program;

/// Errors of the text assembler. The first field is always the one-based source line number.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum AsmError {
    /// line {0}: unknown mnemonic `{1}`.
    UnknownMnemonic(usize, String),

    /// line {0}: instruction `{1}` requires {2} operand(s), while {3} were given.
    OperandCount(usize, String, usize, usize),

    /// line {0}: invalid operand `{1}`.
    InvalidOperand(usize, String),

    /// line {0}: label `{1}` is already defined.
    DuplicateLabel(usize, String),

    /// line {0}: label `{1}` is not defined.
    UndefinedLabel(usize, String),

    /// line {0}: unknown directive `{1}`.
    UnknownDirective(usize, String),
}

#[derive(Clone, Eq, PartialEq, Debug)]
enum Stmt<'src> {
    Instr { line: usize, mnemonic: String, operands: Vec<&'src str> },
    Words { line: usize, values: Vec<&'src str> },
}

fn is_label(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '.') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return false;
    }
    reg_number(name).is_none()
}

fn reg_number(token: &str) -> Option<Cell> {
    let digits = token.strip_prefix('r').or_else(|| token.strip_prefix('R'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_int(token: &str) -> Option<Cell> {
    let (neg, body) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let value = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) => body.parse().ok()?,
        None => return None,
    };
    Some(if neg { value.wrapping_neg() } else { value })
}

fn resolve(token: &str, line: usize, labels: &BTreeMap<&str, usize>) -> Result<Cell, AsmError> {
    if let Some(value) = parse_int(token).or_else(|| reg_number(token)) {
        return Ok(value);
    }
    let (name, offset) = match token.find(['+', '-']) {
        Some(pos) => {
            let offset = parse_int(&token[pos..])
                .ok_or_else(|| AsmError::InvalidOperand(line, token.to_string()))?;
            (&token[..pos], offset)
        }
        None => (token, 0),
    };
    if !is_label(name) {
        return Err(AsmError::InvalidOperand(line, token.to_string()));
    }
    labels
        .get(name)
        .map(|addr| (*addr as Cell).wrapping_add(offset))
        .ok_or_else(|| AsmError::UndefinedLabel(line, name.to_string()))
}

fn parse<'src, Isa>(
    source: &'src str,
    base: usize,
    layout: Layout,
) -> Result<(Vec<Stmt<'src>>, BTreeMap<&'src str, usize>), AsmError>
where
    Isa: InstructionSet,
{
    let mut stmts = vec![];
    let mut labels = BTreeMap::new();
    let mut addr = base;

    for (no, line) in source.lines().enumerate() {
        let line_no = no + 1;
        let code = line.split([';', '#']).next().unwrap_or_default();
        let mut rest = code.trim();

        while let Some((head, tail)) = rest.split_once(':') {
            let name = head.trim();
            if !is_label(name) {
                return Err(AsmError::InvalidOperand(line_no, name.to_string()));
            }
            if labels.insert(name, addr).is_some() {
                return Err(AsmError::DuplicateLabel(line_no, name.to_string()));
            }
            rest = tail.trim();
        }
        if rest.is_empty() {
            continue;
        }

        let (head, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let operands = tail
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        if let Some(directive) = head.strip_prefix('.') {
            if !directive.eq_ignore_ascii_case("word") {
                return Err(AsmError::UnknownDirective(line_no, head.to_string()));
            }
            addr += operands.len();
            stmts.push(Stmt::Words { line: line_no, values: operands });
            continue;
        }

        // Operand values do not affect instruction width, so placeholders are enough here.
        let mnemonic = head.to_ascii_lowercase();
        let instr = Isa::from_mnemonic(&mnemonic, &vec![0; operands.len()])
            .map_err(|err| mnemonic_error(err, line_no, head, operands.len()))?;
        addr += instr.width(layout);
        stmts.push(Stmt::Instr { line: line_no, mnemonic, operands });
    }

    Ok((stmts, labels))
}

fn mnemonic_error(err: MnemonicError, line: usize, mnemonic: &str, given: usize) -> AsmError {
    match err {
        MnemonicError::Unknown => AsmError::UnknownMnemonic(line, mnemonic.to_string()),
        MnemonicError::OperandCount(expected, _) => {
            AsmError::OperandCount(line, mnemonic.to_ascii_lowercase(), expected, given)
        }
    }
}

/// Assembles source text for the `Isa` instruction set into a program image loaded at `base`.
///
/// Labels resolve to absolute addresses, i.e. already include `base`.
pub fn assemble<Isa>(source: &str, base: usize, layout: Layout) -> Result<Program, AsmError>
where Isa: InstructionSet {
    let (stmts, labels) = parse::<Isa>(source, base, layout)?;

    let mut program = Program::with(vec![], base);
    for stmt in stmts {
        match stmt {
            Stmt::Instr { line, mnemonic, operands } => {
                let args = operands
                    .iter()
                    .map(|token| resolve(token, line, &labels))
                    .collect::<Result<Vec<_>, _>>()?;
                let instr = Isa::from_mnemonic(&mnemonic, &args)
                    .map_err(|err| mnemonic_error(err, line, &mnemonic, args.len()))?;
                program.push_instr(instr, layout);
            }
            Stmt::Words { line, values } => {
                let cells = values
                    .iter()
                    .map(|token| resolve(token, line, &labels))
                    .collect::<Result<Vec<_>, _>>()?;
                program = program.with_data(&cells);
            }
        }
    }
    Ok(program)
}

/// Decodes instructions from `cells` (placed in memory at `base`) until the first cell which
/// can't be decoded, returning each instruction with its address.
pub fn disassemble<Isa>(cells: &[Cell], base: usize, layout: Layout) -> Vec<(usize, Isa)>
where Isa: InstructionSet {
    let mut code = vec![];
    let mut marshaller = Marshaller::with(cells, 0);
    while !marshaller.is_eof() {
        let pos = marshaller.pos();
        let Ok(instr) = Isa::decode_instr(&mut marshaller) else {
            break;
        };
        let width = instr.width(layout);
        code.push((base + pos, instr));
        marshaller.seek(pos + width);
    }
    code
}

impl Program {
    /// Disassembles program cells as `Isa` instructions.
    #[inline]
    pub fn disassemble<Isa>(&self, layout: Layout) -> Vec<(usize, Isa)>
    where Isa: InstructionSet {
        disassemble(self.cells(), self.base(), layout)
    }

    /// Writes disassembly listing of the program.
    #[cfg(feature = "std")]
    pub fn print_disassemble<Isa>(
        &self,
        layout: Layout,
        mut writer: impl std::io::Write,
    ) -> Result<(), std::io::Error>
    where
        Isa: InstructionSet,
    {
        for (addr, instr) in self.disassemble::<Isa>(layout) {
            writeln!(writer, "@x{addr:06X}: {instr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::isa::{OccamInstr, OiscInstr, TiscInstr};

    const SUB_PROGRAM: &str = "
        ; 5 - 3 into x
        start:  subleq y, x, done
                subleq z, z, done   # unreachable padding
        done:   subleq -1, 0, 0
        x:      .word 5
        y:      .word 3
        z:      .word 0
    ";

    #[test]
    fn labels_and_data() {
        let program = assemble::<OiscInstr>(SUB_PROGRAM, 0, Layout::Packed).unwrap();
        assert_eq!(program.cells(), &[10, 9, 6, 11, 11, 6, -1, 0, 0, 5, 3, 0]);
    }

    #[test]
    fn labels_include_base() {
        let program = assemble::<OiscInstr>(SUB_PROGRAM, 100, Layout::Packed).unwrap();
        assert_eq!(&program.cells()[..3], &[110, 109, 106]);
        assert_eq!(program.base(), 100);
        assert_eq!(program.entry(), 100);
    }

    #[test]
    fn registers_offsets_and_case() {
        let src = "
            LOAD r1, val
            add R2, val+1
            jz r1, 0x10
            halt
            val: .word -7, 0x0f
        ";
        let program = assemble::<OccamInstr>(src, 0, Layout::Packed).unwrap();
        assert_eq!(program.cells(), &[1, 1, 10, 5, 2, 11, 4, 1, 16, 6, -7, 15]);
    }

    #[test]
    fn padded_layout() {
        let src = "move 7, 8\nsubleq 1, 2, 3";
        let program = assemble::<TiscInstr>(src, 0, Layout::Padded).unwrap();
        assert_eq!(program.cells(), &[0, 7, 8, 0, 1, 1, 2, 3]);
    }

    #[test]
    fn errors() {
        assert_eq!(
            assemble::<OiscInstr>("\n  mov 1, 2", 0, Layout::Packed),
            Err(AsmError::UnknownMnemonic(2, s!("mov")))
        );
        assert_eq!(
            assemble::<OiscInstr>("subleq 1, 2", 0, Layout::Packed),
            Err(AsmError::OperandCount(1, s!("subleq"), 3, 2))
        );
        assert_eq!(
            assemble::<OiscInstr>("subleq 1, 2, 3\nsubleq 1, 2, nowhere", 0, Layout::Packed),
            Err(AsmError::UndefinedLabel(2, s!("nowhere")))
        );
        assert_eq!(
            assemble::<OiscInstr>("a: .word 1\na: .word 2", 0, Layout::Packed),
            Err(AsmError::DuplicateLabel(2, s!("a")))
        );
        assert_eq!(
            assemble::<OiscInstr>("subleq 1, 2, 3@", 0, Layout::Packed),
            Err(AsmError::InvalidOperand(1, s!("3@")))
        );
        assert_eq!(
            assemble::<OiscInstr>(".byte 1", 0, Layout::Packed),
            Err(AsmError::UnknownDirective(1, s!(".byte")))
        );
        assert_eq!(
            AsmError::UndefinedLabel(4, s!("loop")).to_string(),
            "line 4: label `loop` is not defined."
        );
    }

    #[test]
    fn disassembly() {
        let program =
            assemble::<TiscInstr>("move 7, 8\nsubleq 1, 2, 3", 0, Layout::Packed).unwrap();
        let code = program.disassemble::<TiscInstr>(Layout::Packed);
        assert_eq!(code, vec![(0, TiscInstr::Move(7, 8)), (3, TiscInstr::Subleq(1, 2, 3))]);

        let mut listing = Vec::new();
        program.print_disassemble::<TiscInstr>(Layout::Packed, &mut listing).unwrap();
        let listing = String::from_utf8(listing).unwrap();
        assert!(listing.starts_with("@x000000: move"));
    }

    #[test]
    fn disassembly_stops_at_data() {
        let code = disassemble::<TiscInstr>(&[0, 1, 2, 9, 9], 0, Layout::Packed);
        assert_eq!(code, vec![(0, TiscInstr::Move(1, 2))]);
    }
}
