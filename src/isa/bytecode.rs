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

use super::opcodes::*;
use super::{OccamInstr, OiscInstr, Profile, TiscInstr, TriInstr};
use crate::core::{Cell, Layout, Space, VmError};

/// Encoding of instructions into memory cells.
///
/// An instruction is laid out as an opcode cell (omitted by the OISC profile) followed by its
/// operand cells. With [`Layout::Padded`] each instruction is extended with zero cells up to
/// [`Bytecode::MAX_WIDTH`].
pub trait Bytecode: Sized {
    /// Profile the instruction set implements.
    const PROFILE: Profile;

    /// Number of cells taken by the widest instruction of the profile, including opcode cell.
    const MAX_WIDTH: usize;

    /// Returns opcode cell value, if the profile uses opcodes.
    fn opcode(&self) -> Option<Cell>;

    /// Returns raw operand cells, in the order they are laid out in memory.
    fn operands(&self) -> Vec<Cell>;

    /// Number of cells the instruction occupies in memory.
    fn width(&self, layout: Layout) -> usize {
        match layout {
            Layout::Packed => self.opcode().is_some() as usize + self.operands().len(),
            Layout::Padded => Self::MAX_WIDTH,
        }
    }

    /// Write an instruction as a sequence of cells.
    fn encode_instr<W>(&self, writer: &mut W, layout: Layout)
    where W: BytecodeWrite {
        if let Some(opcode) = self.opcode() {
            writer.write_cell(opcode);
        }
        let operands = self.operands();
        for cell in &operands {
            writer.write_cell(*cell);
        }
        for _ in self.opcode().is_some() as usize + operands.len()..self.width(layout) {
            writer.write_cell(0);
        }
    }

    /// Reads an instruction from cells. Padding cells are not read.
    fn decode_instr<R>(reader: &mut R) -> Result<Self, VmError>
    where R: BytecodeRead;
}

/// Reader of memory cells for instruction decoding.
pub trait BytecodeRead {
    /// Address of the next cell to be read.
    fn pos(&self) -> usize;

    /// Reads a single cell, advancing the position.
    ///
    /// # Errors
    ///
    /// [`VmError::AddressOutOfRange`] when the instruction runs past the end of the memory.
    fn read_cell(&mut self) -> Result<Cell, VmError>;

    /// Reads a fixed number of operand cells.
    fn read_cells<const LEN: usize>(&mut self) -> Result<[Cell; LEN], VmError> {
        let mut cells = [0; LEN];
        for cell in &mut cells {
            *cell = self.read_cell()?;
        }
        Ok(cells)
    }
}

/// Writer converting instructions into memory cells.
pub trait BytecodeWrite {
    /// Writes a single cell.
    fn write_cell(&mut self, cell: Cell);
}

impl BytecodeWrite for Vec<Cell> {
    #[inline]
    fn write_cell(&mut self, cell: Cell) { self.push(cell) }
}

/// Cursor over a slice of memory cells.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Marshaller<'a> {
    cells: &'a [Cell],
    pos: usize,
}

impl<'a> Marshaller<'a> {
    /// Constructs cursor positioned at `pos`.
    #[inline]
    pub fn with(cells: &'a [Cell], pos: usize) -> Self { Marshaller { cells, pos } }

    /// Moves cursor to a new position. Positions past the end are allowed; reading from them
    /// fails.
    #[inline]
    pub fn seek(&mut self, pos: usize) { self.pos = pos }

    /// Whether the cursor reached the end of the cells.
    #[inline]
    pub fn is_eof(&self) -> bool { self.pos >= self.cells.len() }
}

impl BytecodeRead for Marshaller<'_> {
    #[inline]
    fn pos(&self) -> usize { self.pos }

    fn read_cell(&mut self) -> Result<Cell, VmError> {
        let cell = self
            .cells
            .get(self.pos)
            .copied()
            .ok_or(VmError::index_out_of_range(Space::Memory, self.pos, self.cells.len()))?;
        self.pos += 1;
        Ok(cell)
    }
}

impl Bytecode for OiscInstr {
    const PROFILE: Profile = Profile::Oisc;
    const MAX_WIDTH: usize = 3;

    #[inline]
    fn opcode(&self) -> Option<Cell> { None }

    fn operands(&self) -> Vec<Cell> {
        let OiscInstr::Subleq(a, b, c) = *self;
        alloc::vec![a, b, c]
    }

    fn decode_instr<R>(reader: &mut R) -> Result<Self, VmError>
    where R: BytecodeRead {
        let [a, b, c] = reader.read_cells()?;
        Ok(OiscInstr::Subleq(a, b, c))
    }
}

impl Bytecode for TiscInstr {
    const PROFILE: Profile = Profile::Tisc;
    const MAX_WIDTH: usize = 4;

    fn opcode(&self) -> Option<Cell> {
        Some(match self {
            TiscInstr::Move(..) => TISC_MOVE,
            TiscInstr::Subleq(..) => TISC_SUBLEQ,
        })
    }

    fn operands(&self) -> Vec<Cell> {
        match *self {
            TiscInstr::Move(dest, src) => alloc::vec![dest, src],
            TiscInstr::Subleq(a, b, c) => alloc::vec![a, b, c],
        }
    }

    fn decode_instr<R>(reader: &mut R) -> Result<Self, VmError>
    where R: BytecodeRead {
        Ok(match reader.read_cell()? {
            TISC_MOVE => {
                let [dest, src] = reader.read_cells()?;
                TiscInstr::Move(dest, src)
            }
            TISC_SUBLEQ => {
                let [a, b, c] = reader.read_cells()?;
                TiscInstr::Subleq(a, b, c)
            }
            opcode => return Err(VmError::InvalidOpcode(opcode, Self::PROFILE)),
        })
    }
}

impl Bytecode for TriInstr {
    const PROFILE: Profile = Profile::TriIsc;
    const MAX_WIDTH: usize = 4;

    fn opcode(&self) -> Option<Cell> {
        Some(match self {
            TriInstr::Load(..) => TRI_LOAD,
            TriInstr::Sub(..) => TRI_SUB,
            TriInstr::Jlz(..) => TRI_JLZ,
        })
    }

    fn operands(&self) -> Vec<Cell> {
        match *self {
            TriInstr::Load(reg, addr) | TriInstr::Jlz(reg, addr) => alloc::vec![reg, addr],
            TriInstr::Sub(r1, r2, addr) => alloc::vec![r1, r2, addr],
        }
    }

    fn decode_instr<R>(reader: &mut R) -> Result<Self, VmError>
    where R: BytecodeRead {
        Ok(match reader.read_cell()? {
            TRI_LOAD => {
                let [reg, addr] = reader.read_cells()?;
                TriInstr::Load(reg, addr)
            }
            TRI_SUB => {
                let [r1, r2, addr] = reader.read_cells()?;
                TriInstr::Sub(r1, r2, addr)
            }
            TRI_JLZ => {
                let [reg, addr] = reader.read_cells()?;
                TriInstr::Jlz(reg, addr)
            }
            opcode => return Err(VmError::InvalidOpcode(opcode, Self::PROFILE)),
        })
    }
}

impl Bytecode for OccamInstr {
    const PROFILE: Profile = Profile::Occam8;
    const MAX_WIDTH: usize = 4;

    fn opcode(&self) -> Option<Cell> {
        Some(match self {
            OccamInstr::Subleq(..) => OCCAM_SUBLEQ,
            OccamInstr::Load(..) => OCCAM_LOAD,
            OccamInstr::Store(..) => OCCAM_STORE,
            OccamInstr::Jmp(..) => OCCAM_JMP,
            OccamInstr::Jz(..) => OCCAM_JZ,
            OccamInstr::Add(..) => OCCAM_ADD,
            OccamInstr::Halt => OCCAM_HALT,
            OccamInstr::Nop => OCCAM_NOP,
        })
    }

    fn operands(&self) -> Vec<Cell> {
        match *self {
            OccamInstr::Subleq(a, b, c) => alloc::vec![a, b, c],
            OccamInstr::Load(reg, addr)
            | OccamInstr::Store(reg, addr)
            | OccamInstr::Jz(reg, addr)
            | OccamInstr::Add(reg, addr) => alloc::vec![reg, addr],
            OccamInstr::Jmp(addr) => alloc::vec![addr],
            OccamInstr::Halt | OccamInstr::Nop => alloc::vec![],
        }
    }

    fn decode_instr<R>(reader: &mut R) -> Result<Self, VmError>
    where R: BytecodeRead {
        Ok(match reader.read_cell()? {
            OCCAM_SUBLEQ => {
                let [a, b, c] = reader.read_cells()?;
                OccamInstr::Subleq(a, b, c)
            }
            OCCAM_LOAD => {
                let [reg, addr] = reader.read_cells()?;
                OccamInstr::Load(reg, addr)
            }
            OCCAM_STORE => {
                let [reg, addr] = reader.read_cells()?;
                OccamInstr::Store(reg, addr)
            }
            OCCAM_JMP => OccamInstr::Jmp(reader.read_cell()?),
            OCCAM_JZ => {
                let [reg, addr] = reader.read_cells()?;
                OccamInstr::Jz(reg, addr)
            }
            OCCAM_ADD => {
                let [reg, addr] = reader.read_cells()?;
                OccamInstr::Add(reg, addr)
            }
            OCCAM_HALT => OccamInstr::Halt,
            OCCAM_NOP => OccamInstr::Nop,
            opcode => return Err(VmError::InvalidOpcode(opcode, Self::PROFILE)),
        })
    }
}
