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

//! Checked micro-operations over the core state used by instruction implementations.
//!
//! Instructions resolve every operand through these helpers *before* mutating anything, so a
//! failing instruction leaves the core untouched.

use super::{Cell, Core, Site, Space};
use crate::isa::Profile;

/// Fatal errors raised while loading or executing a program.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum VmError {
    /// {0} {1} is outside of the valid range 0..{2}
    ///
    /// The location is wide enough to hold both cell operands and host-side indexes.
    AddressOutOfRange(Space, i128, usize),

    /// opcode {0} is not defined by the {1} instruction set profile
    InvalidOpcode(Cell, Profile),

    /// program of {0} cells loaded at address {1} does not fit into memory of {2} cells
    ProgramTooLarge(usize, usize, usize),
}

impl VmError {
    /// Reports a host-side index lying outside of a space of `len` items.
    #[inline]
    pub(crate) fn index_out_of_range(space: Space, idx: usize, len: usize) -> Self {
        VmError::AddressOutOfRange(space, idx as i128, len)
    }
}

impl Core {
    /// Resolves operand into a memory address.
    #[inline]
    pub fn addr(&self, operand: Cell) -> Result<usize, VmError> {
        match usize::try_from(operand) {
            Ok(addr) if addr < self.mem.len() => Ok(addr),
            _ => Err(VmError::AddressOutOfRange(Space::Memory, operand.into(), self.mem.len())),
        }
    }

    /// Resolves operand into a register index.
    #[inline]
    pub fn reg_idx(&self, operand: Cell) -> Result<usize, VmError> {
        match usize::try_from(operand) {
            Ok(idx) if idx < self.regs.len() => Ok(idx),
            _ => Err(VmError::AddressOutOfRange(Space::Register, operand.into(), self.regs.len())),
        }
    }

    /// Reads memory cell addressed by an operand.
    #[inline]
    pub fn mem(&self, addr: Cell) -> Result<Cell, VmError> { Ok(self.mem[self.addr(addr)?]) }

    /// Reads register addressed by an operand.
    #[inline]
    pub fn reg(&self, idx: Cell) -> Result<Cell, VmError> { Ok(self.regs[self.reg_idx(idx)?]) }

    /// Reads memory cell by its index.
    #[inline]
    pub fn mem_at(&self, addr: usize) -> Result<Cell, VmError> {
        self.mem
            .get(addr)
            .copied()
            .ok_or(VmError::index_out_of_range(Space::Memory, addr, self.mem.len()))
    }

    /// Reads register by its index.
    #[inline]
    pub fn reg_at(&self, idx: usize) -> Result<Cell, VmError> {
        self.regs
            .get(idx)
            .copied()
            .ok_or(VmError::index_out_of_range(Space::Register, idx, self.regs.len()))
    }

    /// Writes a value to an already resolved memory address, normalizing it to the word size.
    #[inline]
    pub(crate) fn put_mem(&mut self, addr: usize, value: Cell) {
        self.mem[addr] = self.config().word.wrap(value);
    }

    /// Writes a value to an already resolved register, normalizing it to the word size.
    #[inline]
    pub(crate) fn put_reg(&mut self, idx: usize, value: Cell) {
        self.regs[idx] = self.config().word.wrap(value);
    }

    /// Checks whether any of the raw operands equals the configured halt sentinel.
    #[inline]
    pub fn is_sentinel(&self, operands: &[Cell]) -> bool {
        match self.config().halt_sentinel {
            Some(sentinel) => operands.contains(&sentinel),
            None => false,
        }
    }

    /// Resolves the program counter of the next instruction depending on the branch condition.
    #[inline]
    pub(crate) fn branch(&self, cond: bool, target: Cell, site: Site) -> Result<usize, VmError> {
        if cond {
            self.addr(target)
        } else {
            self.fallthrough(site)
        }
    }

    /// Resolves the address of the instruction following the current one.
    #[inline]
    pub(crate) fn fallthrough(&self, site: Site) -> Result<usize, VmError> {
        if site.next < self.mem.len() {
            Ok(site.next)
        } else {
            Err(VmError::index_out_of_range(Space::Memory, site.next, self.mem.len()))
        }
    }

    /// Copies cells into memory starting at `base`.
    ///
    /// # Errors
    ///
    /// [`VmError::AddressOutOfRange`] if `base` lies outside the memory and
    /// [`VmError::ProgramTooLarge`] if the cells do not fit into the memory from `base`. In both
    /// cases the memory is not modified.
    pub fn load(&mut self, cells: &[Cell], base: usize) -> Result<(), VmError> {
        let size = self.mem.len();
        if base >= size && !(base == size && cells.is_empty()) {
            return Err(VmError::index_out_of_range(Space::Memory, base, size));
        }
        let end = base
            .checked_add(cells.len())
            .filter(|end| *end <= size)
            .ok_or(VmError::ProgramTooLarge(cells.len(), base, size))?;
        let word = self.config().word;
        for (dst, src) in self.mem[base..end].iter_mut().zip(cells) {
            *dst = word.wrap(*src);
        }
        Ok(())
    }

    /// Sets program counter to a new value.
    ///
    /// # Errors
    ///
    /// [`VmError::AddressOutOfRange`] if `pc` does not point inside the memory; the program counter
    /// is left unchanged.
    pub fn set_pc(&mut self, pc: usize) -> Result<(), VmError> {
        if pc >= self.mem.len() {
            return Err(VmError::index_out_of_range(Space::Memory, pc, self.mem.len()));
        }
        self.pc = pc;
        Ok(())
    }

    /// Clears the halt flag, allowing a halted program to be resumed or re-run.
    #[inline]
    pub fn resume(&mut self) { self.halted = false; }

    /// Sets the halt flag.
    #[inline]
    pub(crate) fn halt(&mut self) { self.halted = true; }
}
