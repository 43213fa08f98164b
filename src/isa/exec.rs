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

use alloc::vec::Vec;
use core::fmt::{Debug, Display};

use super::{Bytecode, OccamInstr, OiscInstr, TiscInstr, TriInstr};
use crate::core::{Cell, Core, Loc, Site, VmError};

/// Machine movement after instruction execution.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ExecStep {
    /// Halt flag was set; program counter is left at the halting instruction.
    Halt,

    /// Move to the instruction following the current one, located at the given address.
    Next(usize),

    /// Jump to the given address.
    Jump(usize),
}

impl ExecStep {
    /// Program counter value after the step, unless the machine halted.
    #[inline]
    pub fn pc(self) -> Option<usize> {
        match self {
            ExecStep::Halt => None,
            ExecStep::Next(pc) | ExecStep::Jump(pc) => Some(pc),
        }
    }
}

/// Error constructing an instruction from its mnemonic and operands.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum MnemonicError {
    /// mnemonic is not known to the instruction set
    Unknown,

    /// instruction requires {0} operand(s), but {1} were provided
    OperandCount(usize, usize),
}

/// Trait for instruction sets executable by a [`Core`].
pub trait InstructionSet: Bytecode + Copy + Display + Debug {
    /// Lower-case mnemonics of all instructions in the set.
    const MNEMONICS: &'static [&'static str];

    /// Constructs instruction from a lower-case mnemonic and its raw operands.
    fn from_mnemonic(mnemonic: &str, operands: &[Cell]) -> Result<Self, MnemonicError>;

    /// Lists memory cells and registers which the instruction reads or writes.
    ///
    /// Operands which can't be valid locations (for instance, negative ones) are omitted.
    fn locs(&self) -> Vec<Loc>;

    /// Executes the instruction at the given site.
    ///
    /// All the operands and the resulting program counter are validated before the first write to
    /// memory or registers, so an instruction either completes or leaves the core unchanged.
    ///
    /// # Errors
    ///
    /// [`VmError::AddressOutOfRange`] if an operand or the resulting program counter references a
    /// location outside of memory or register file.
    fn exec(&self, core: &mut Core, site: Site) -> Result<ExecStep, VmError>;
}

fn mem_loc(addr: Cell) -> Option<Loc> { usize::try_from(addr).ok().map(Loc::Mem) }

fn reg_loc(idx: Cell) -> Option<Loc> { usize::try_from(idx).ok().map(Loc::Reg) }

fn arity<I>(expected: usize, operands: &[Cell]) -> Result<I, MnemonicError> {
    Err(MnemonicError::OperandCount(expected, operands.len()))
}

/// `Mem[b] -= Mem[a]`, branching to `c` if the result is not positive. Shared by all the
/// profiles having `SUBLEQ`.
fn subleq(core: &mut Core, a: Cell, b: Cell, c: Cell, site: Site) -> Result<ExecStep, VmError> {
    if core.is_sentinel(&[a, b, c]) {
        core.halt();
        return Ok(ExecStep::Halt);
    }
    let dst = core.addr(b)?;
    let res = core.word().sub(core.mem(b)?, core.mem(a)?);
    let jump = res <= 0;
    let pc = core.branch(jump, c, site)?;
    core.put_mem(dst, res);
    Ok(if jump { ExecStep::Jump(pc) } else { ExecStep::Next(pc) })
}

/// Conditional jump which doesn't modify memory.
fn jump_if(core: &Core, cond: bool, target: Cell, site: Site) -> Result<ExecStep, VmError> {
    let pc = core.branch(cond, target, site)?;
    Ok(if cond { ExecStep::Jump(pc) } else { ExecStep::Next(pc) })
}

/// `Reg[reg] = Mem[addr]`.
fn load(core: &mut Core, reg: Cell, addr: Cell, site: Site) -> Result<ExecStep, VmError> {
    let idx = core.reg_idx(reg)?;
    let val = core.mem(addr)?;
    let pc = core.fallthrough(site)?;
    core.put_reg(idx, val);
    Ok(ExecStep::Next(pc))
}

impl InstructionSet for OiscInstr {
    const MNEMONICS: &'static [&'static str] = &["subleq"];

    fn from_mnemonic(mnemonic: &str, operands: &[Cell]) -> Result<Self, MnemonicError> {
        match (mnemonic, operands) {
            ("subleq", &[a, b, c]) => Ok(OiscInstr::Subleq(a, b, c)),
            ("subleq", _) => arity(3, operands),
            _ => Err(MnemonicError::Unknown),
        }
    }

    fn locs(&self) -> Vec<Loc> {
        let OiscInstr::Subleq(a, b, _) = *self;
        [mem_loc(a), mem_loc(b)].into_iter().flatten().collect()
    }

    fn exec(&self, core: &mut Core, site: Site) -> Result<ExecStep, VmError> {
        let OiscInstr::Subleq(a, b, c) = *self;
        subleq(core, a, b, c, site)
    }
}

impl InstructionSet for TiscInstr {
    const MNEMONICS: &'static [&'static str] = &["move", "subleq"];

    fn from_mnemonic(mnemonic: &str, operands: &[Cell]) -> Result<Self, MnemonicError> {
        match (mnemonic, operands) {
            ("move", &[dest, src]) => Ok(TiscInstr::Move(dest, src)),
            ("move", _) => arity(2, operands),
            ("subleq", &[a, b, c]) => Ok(TiscInstr::Subleq(a, b, c)),
            ("subleq", _) => arity(3, operands),
            _ => Err(MnemonicError::Unknown),
        }
    }

    fn locs(&self) -> Vec<Loc> {
        let locs = match *self {
            TiscInstr::Move(dest, src) => [mem_loc(dest), mem_loc(src)],
            TiscInstr::Subleq(a, b, _) => [mem_loc(a), mem_loc(b)],
        };
        locs.into_iter().flatten().collect()
    }

    fn exec(&self, core: &mut Core, site: Site) -> Result<ExecStep, VmError> {
        match *self {
            TiscInstr::Move(dest, src) => {
                if core.is_sentinel(&[dest]) {
                    core.halt();
                    return Ok(ExecStep::Halt);
                }
                let dst = core.addr(dest)?;
                let val = core.mem(src)?;
                let pc = core.fallthrough(site)?;
                core.put_mem(dst, val);
                Ok(ExecStep::Next(pc))
            }
            TiscInstr::Subleq(a, b, c) => subleq(core, a, b, c, site),
        }
    }
}

impl InstructionSet for TriInstr {
    const MNEMONICS: &'static [&'static str] = &["load", "sub", "jlz"];

    fn from_mnemonic(mnemonic: &str, operands: &[Cell]) -> Result<Self, MnemonicError> {
        match (mnemonic, operands) {
            ("load", &[reg, addr]) => Ok(TriInstr::Load(reg, addr)),
            ("load", _) => arity(2, operands),
            ("sub", &[r1, r2, addr]) => Ok(TriInstr::Sub(r1, r2, addr)),
            ("sub", _) => arity(3, operands),
            ("jlz", &[reg, addr]) => Ok(TriInstr::Jlz(reg, addr)),
            ("jlz", _) => arity(2, operands),
            _ => Err(MnemonicError::Unknown),
        }
    }

    fn locs(&self) -> Vec<Loc> {
        let locs = match *self {
            TriInstr::Load(reg, addr) => alloc::vec![reg_loc(reg), mem_loc(addr)],
            TriInstr::Sub(r1, r2, addr) => alloc::vec![reg_loc(r1), reg_loc(r2), mem_loc(addr)],
            TriInstr::Jlz(reg, _) => alloc::vec![reg_loc(reg)],
        };
        locs.into_iter().flatten().collect()
    }

    fn exec(&self, core: &mut Core, site: Site) -> Result<ExecStep, VmError> {
        match *self {
            TriInstr::Load(reg, addr) => {
                if core.is_sentinel(&[reg]) {
                    core.halt();
                    return Ok(ExecStep::Halt);
                }
                load(core, reg, addr, site)
            }
            TriInstr::Sub(r1, r2, addr) => {
                let idx = core.reg_idx(r1)?;
                let res = core.word().sub(core.reg(r1)?, core.reg(r2)?);
                let dst = core.addr(addr)?;
                let pc = core.fallthrough(site)?;
                core.put_reg(idx, res);
                core.put_mem(dst, res);
                Ok(ExecStep::Next(pc))
            }
            TriInstr::Jlz(reg, addr) => {
                let val = core.reg(reg)?;
                jump_if(core, val < 0, addr, site)
            }
        }
    }
}

impl InstructionSet for OccamInstr {
    const MNEMONICS: &'static [&'static str] =
        &["subleq", "load", "store", "jmp", "jz", "add", "halt", "nop"];

    fn from_mnemonic(mnemonic: &str, operands: &[Cell]) -> Result<Self, MnemonicError> {
        match (mnemonic, operands) {
            ("subleq", &[a, b, c]) => Ok(OccamInstr::Subleq(a, b, c)),
            ("subleq", _) => arity(3, operands),
            ("load", &[reg, addr]) => Ok(OccamInstr::Load(reg, addr)),
            ("store", &[reg, addr]) => Ok(OccamInstr::Store(reg, addr)),
            ("jz", &[reg, addr]) => Ok(OccamInstr::Jz(reg, addr)),
            ("add", &[reg, addr]) => Ok(OccamInstr::Add(reg, addr)),
            ("load" | "store" | "jz" | "add", _) => arity(2, operands),
            ("jmp", &[addr]) => Ok(OccamInstr::Jmp(addr)),
            ("jmp", _) => arity(1, operands),
            ("halt", &[]) => Ok(OccamInstr::Halt),
            ("nop", &[]) => Ok(OccamInstr::Nop),
            ("halt" | "nop", _) => arity(0, operands),
            _ => Err(MnemonicError::Unknown),
        }
    }

    fn locs(&self) -> Vec<Loc> {
        let locs = match *self {
            OccamInstr::Subleq(a, b, _) => alloc::vec![mem_loc(a), mem_loc(b)],
            OccamInstr::Load(reg, addr)
            | OccamInstr::Store(reg, addr)
            | OccamInstr::Add(reg, addr) => alloc::vec![reg_loc(reg), mem_loc(addr)],
            OccamInstr::Jz(reg, _) => alloc::vec![reg_loc(reg)],
            OccamInstr::Jmp(_) | OccamInstr::Halt | OccamInstr::Nop => alloc::vec![],
        };
        locs.into_iter().flatten().collect()
    }

    fn exec(&self, core: &mut Core, site: Site) -> Result<ExecStep, VmError> {
        match *self {
            OccamInstr::Subleq(a, b, c) => subleq(core, a, b, c, site),
            OccamInstr::Load(reg, addr) => load(core, reg, addr, site),
            OccamInstr::Store(reg, addr) => {
                let val = core.reg(reg)?;
                let dst = core.addr(addr)?;
                let pc = core.fallthrough(site)?;
                core.put_mem(dst, val);
                Ok(ExecStep::Next(pc))
            }
            OccamInstr::Jmp(addr) => Ok(ExecStep::Jump(core.addr(addr)?)),
            OccamInstr::Jz(reg, addr) => {
                let val = core.reg(reg)?;
                jump_if(core, val == 0, addr, site)
            }
            OccamInstr::Add(reg, addr) => {
                let idx = core.reg_idx(reg)?;
                let res = core.word().add(core.reg(reg)?, core.mem(addr)?);
                let pc = core.fallthrough(site)?;
                core.put_reg(idx, res);
                Ok(ExecStep::Next(pc))
            }
            OccamInstr::Halt => {
                core.halt();
                Ok(ExecStep::Halt)
            }
            OccamInstr::Nop => Ok(ExecStep::Next(core.fallthrough(site)?)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{CoreConfig, Space, WordSize};

    fn core_with(cells: &[Cell]) -> Core {
        let mut core = Core::with(CoreConfig::with_memory(16));
        core.load(cells, 0).unwrap();
        core
    }

    #[test]
    fn subleq_positive_falls_through() {
        let mut core = core_with(&[10, 11, 0]);
        core.load(&[3, 5], 10).unwrap();
        let step = OiscInstr::Subleq(10, 11, 0).exec(&mut core, Site::new(0, 3)).unwrap();
        assert_eq!(step, ExecStep::Next(3));
        assert_eq!(core.mem(11), Ok(2));
    }

    #[test]
    fn subleq_non_positive_jumps() {
        let mut core = core_with(&[10, 11, 7]);
        core.load(&[5, 5], 10).unwrap();
        let step = OiscInstr::Subleq(10, 11, 7).exec(&mut core, Site::new(0, 3)).unwrap();
        assert_eq!(step, ExecStep::Jump(7));
        assert_eq!(core.mem(11), Ok(0));
    }

    #[test]
    fn subleq_sentinel_halts_without_mutation() {
        let mut core = core_with(&[10, 11, -1]);
        let before = core.clone();
        let step = OiscInstr::Subleq(10, 11, -1).exec(&mut core, Site::new(0, 3)).unwrap();
        assert_eq!(step, ExecStep::Halt);
        assert!(core.is_halted());
        assert_eq!(core.memory(), before.memory());
    }

    #[test]
    fn subleq_bad_target_is_atomic() {
        let mut core = core_with(&[10, 11, 99]);
        core.load(&[5, 5], 10).unwrap();
        let before = core.clone();
        assert_eq!(
            OiscInstr::Subleq(10, 11, 99).exec(&mut core, Site::new(0, 3)),
            Err(VmError::AddressOutOfRange(Space::Memory, 99, 16))
        );
        assert_eq!(core, before);
    }

    #[test]
    fn subleq_wraps() {
        let mut core = Core::with(CoreConfig { word: WordSize::W8, ..CoreConfig::with_memory(8) });
        core.load(&[1, -128], 4).unwrap();
        let step = OiscInstr::Subleq(4, 5, 0).exec(&mut core, Site::new(0, 3)).unwrap();
        assert_eq!(core.mem(5), Ok(127));
        assert_eq!(step, ExecStep::Next(3));
    }

    #[test]
    fn tri_sub_stores_result() {
        let mut core = core_with(&[]);
        core.load(&[5, 7], 12).unwrap();
        TriInstr::Load(0, 12).exec(&mut core, Site::new(0, 3)).unwrap();
        TriInstr::Load(1, 13).exec(&mut core, Site::new(0, 3)).unwrap();
        let step = TriInstr::Sub(0, 1, 9).exec(&mut core, Site::new(0, 4)).unwrap();
        assert_eq!(step, ExecStep::Next(4));
        assert_eq!(core.reg(0), Ok(-2));
        assert_eq!(core.mem(9), Ok(-2));
    }

    #[test]
    fn tri_bad_register() {
        let mut core = core_with(&[]);
        assert_eq!(
            TriInstr::Load(4, 0).exec(&mut core, Site::new(0, 3)),
            Err(VmError::AddressOutOfRange(Space::Register, 4, 4))
        );
        assert_eq!(
            TriInstr::Jlz(-2, 0).exec(&mut core, Site::new(0, 3)),
            Err(VmError::AddressOutOfRange(Space::Register, -2, 4))
        );
    }

    #[test]
    fn occam_jumps() {
        let mut core = core_with(&[]);
        assert_eq!(OccamInstr::Jmp(12).exec(&mut core, Site::new(0, 2)), Ok(ExecStep::Jump(12)));
        assert_eq!(OccamInstr::Jz(0, 12).exec(&mut core, Site::new(0, 3)), Ok(ExecStep::Jump(12)));
        core.load(&[1], 10).unwrap();
        OccamInstr::Load(0, 10).exec(&mut core, Site::new(0, 3)).unwrap();
        assert_eq!(OccamInstr::Jz(0, 12).exec(&mut core, Site::new(0, 3)), Ok(ExecStep::Next(3)));
    }

    #[test]
    fn fallthrough_past_memory_end() {
        let mut core = core_with(&[]);
        assert_eq!(
            OccamInstr::Nop.exec(&mut core, Site::new(15, 1)),
            Err(VmError::AddressOutOfRange(Space::Memory, 16, 16))
        );
    }

    #[test]
    fn mnemonics() {
        assert_eq!(OccamInstr::from_mnemonic("jmp", &[4]), Ok(OccamInstr::Jmp(4)));
        assert_eq!(TiscInstr::from_mnemonic("move", &[1]), Err(MnemonicError::OperandCount(2, 1)));
        assert_eq!(TriInstr::from_mnemonic("halt", &[]), Err(MnemonicError::Unknown));
        for mnemonic in OccamInstr::MNEMONICS {
            assert_ne!(OccamInstr::from_mnemonic(mnemonic, &[]), Err(MnemonicError::Unknown));
        }
    }

    #[test]
    fn locations() {
        assert_eq!(OiscInstr::Subleq(3, -1, 0).locs(), [Loc::Mem(3)]);
        assert_eq!(TriInstr::Sub(0, 1, 9).locs(), [Loc::Reg(0), Loc::Reg(1), Loc::Mem(9)]);
    }
}
