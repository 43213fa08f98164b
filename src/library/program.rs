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
use core::fmt::{self, Display, Formatter};

use amplify::Bytes32;
use sha2::{Digest, Sha256};

use crate::core::{Cell, Layout};
use crate::isa::{Bytecode, BytecodeWrite};

/// Tag used for computing [`ProgramId`] hashes.
pub const PROGRAM_ID_TAG: &str = "urn:minvm:program:v01#261019";

/// Content identifier of a program image: tagged SHA-256 hash of its base address, entry point
/// and cells.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, From)]
#[wrapper(Deref)]
pub struct ProgramId(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

impl ProgramId {
    fn commit(program: &Program) -> Self {
        let tag = Sha256::digest(PROGRAM_ID_TAG.as_bytes());
        let mut engine = Sha256::new();
        engine.update(tag);
        engine.update(tag);
        engine.update((program.base as u64).to_le_bytes());
        engine.update((program.entry as u64).to_le_bytes());
        engine.update((program.cells.len() as u64).to_le_bytes());
        for cell in &program.cells {
            engine.update(cell.to_le_bytes());
        }
        let hash: [u8; 32] = engine.finalize().into();
        ProgramId::from(hash)
    }
}

impl Display for ProgramId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.to_byte_array() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Program image: cells to be copied into memory starting from the base address, with an entry
/// point from which execution starts.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Program {
    cells: Vec<Cell>,
    base: usize,
    entry: usize,
}

impl Program {
    /// Constructs program loaded at address zero and starting from its first cell.
    #[inline]
    pub fn new(cells: Vec<Cell>) -> Self { Program::with(cells, 0) }

    /// Constructs program loaded at `base` address and starting from its first cell.
    #[inline]
    pub fn with(cells: Vec<Cell>, base: usize) -> Self {
        Program { cells, base, entry: base }
    }

    /// Assembles program from a sequence of instructions.
    pub fn assemble<Isa>(code: &[Isa], base: usize, layout: Layout) -> Self
    where Isa: Bytecode {
        let mut cells = Vec::new();
        for instr in code {
            instr.encode_instr(&mut cells, layout);
        }
        Program::with(cells, base)
    }

    /// Appends data cells after the already present cells.
    pub fn with_data(mut self, data: &[Cell]) -> Self {
        self.cells.extend_from_slice(data);
        self
    }

    /// Appends an instruction after the already present cells.
    pub fn push_instr<Isa>(&mut self, instr: Isa, layout: Layout)
    where Isa: Bytecode {
        instr.encode_instr(&mut self.cells, layout);
    }

    /// Changes the entry point.
    pub fn with_entry(mut self, entry: usize) -> Self {
        self.entry = entry;
        self
    }

    /// Cells of the program image.
    #[inline]
    pub fn cells(&self) -> &[Cell] { &self.cells }

    /// Address of the first program cell in memory.
    #[inline]
    pub fn base(&self) -> usize { self.base }

    /// Address from which the execution starts.
    #[inline]
    pub fn entry(&self) -> usize { self.entry }

    /// Number of cells in the program.
    #[inline]
    pub fn len(&self) -> usize { self.cells.len() }

    /// Whether the program has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    /// Address following the last cell of the program.
    #[inline]
    pub fn end(&self) -> usize { self.base + self.cells.len() }

    /// Computes content identifier of the program.
    pub fn id(&self) -> ProgramId { ProgramId::commit(self) }
}

impl BytecodeWrite for Program {
    #[inline]
    fn write_cell(&mut self, cell: Cell) { self.cells.push(cell) }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID:    {}", self.id())?;
        writeln!(f, "BASE:  {:#06X}", self.base)?;
        writeln!(f, "ENTRY: {:#06X}", self.entry)?;
        write!(f, "CELLS:")?;
        for (no, chunk) in self.cells.chunks(8).enumerate() {
            write!(f, "\n  {:#06X}", self.base + no * 8)?;
            for cell in chunk {
                write!(f, " {cell:>6}")?;
            }
        }
        writeln!(f)
    }
}
