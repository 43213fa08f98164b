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

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use super::{Cell, WordSize};

/// Default number of memory cells.
pub const MEMORY_SIZE_DEFAULT: usize = 256;

/// Default number of registers.
pub const REGISTERS_DEFAULT: u8 = 4;

/// Default value of the halt sentinel operand.
pub const HALT_SENTINEL_DEFAULT: Cell = -1;

/// How many cells an instruction occupies in memory.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Layout {
    /// Instruction occupies its opcode cell (if the profile has opcodes) followed by exactly as
    /// many cells as it has operands.
    #[default]
    #[display("packed")]
    Packed,

    /// Every instruction occupies the width of the widest instruction of the profile; unused
    /// trailing cells are ignored.
    #[display("padded")]
    Padded,
}

/// Configuration for [`Core`] initialization.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct CoreConfig {
    /// Number of memory cells shared by code and data.
    pub memory_size: usize,
    /// Number of registers; unused by profiles without registers.
    pub registers: u8,
    /// Width of the machine word.
    pub word: WordSize,
    /// Operand value which is interpreted as a halt request by `subleq` (any operand), TISC
    /// `move` (destination) and TriISC `load` (register). `None` disables sentinel detection.
    pub halt_sentinel: Option<Cell>,
    /// Instruction width convention.
    pub layout: Layout,
}

impl Default for CoreConfig {
    /// Sets
    /// - [`CoreConfig::memory_size`] to [`MEMORY_SIZE_DEFAULT`],
    /// - [`CoreConfig::registers`] to [`REGISTERS_DEFAULT`],
    /// - [`CoreConfig::word`] to [`WordSize::W32`],
    /// - [`CoreConfig::halt_sentinel`] to [`HALT_SENTINEL_DEFAULT`],
    /// - [`CoreConfig::layout`] to [`Layout::Packed`].
    fn default() -> Self {
        CoreConfig {
            memory_size: MEMORY_SIZE_DEFAULT,
            registers: REGISTERS_DEFAULT,
            word: WordSize::W32,
            halt_sentinel: Some(HALT_SENTINEL_DEFAULT),
            layout: Layout::Packed,
        }
    }
}

impl CoreConfig {
    /// Configuration with the given memory size and the rest of parameters set to defaults.
    pub fn with_memory(memory_size: usize) -> Self { CoreConfig { memory_size, ..default!() } }
}

/// State of a single VM core: memory, registers, program counter and halt flag.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Core {
    /// Main memory shared between code and data.
    pub(super) mem: Vec<Cell>,

    /// Register file. Its size is fixed at construction.
    pub(super) regs: Vec<Cell>,

    /// Program counter; always points inside `mem` unless the memory is empty.
    pub(super) pc: usize,

    /// Halt flag. Once set, no further instructions are executed.
    pub(super) halted: bool,

    pub(super) config: CoreConfig,
}

impl Core {
    /// Initializes a core with [`CoreConfig::default`]: memory and registers are zeroed, `pc`
    /// points to the first cell and the halt flag is cleared.
    #[inline]
    pub fn new() -> Self { Core::with(default!()) }

    /// Initializes a core using a configuration object [`CoreConfig`].
    pub fn with(config: CoreConfig) -> Self {
        Core {
            mem: vec![0; config.memory_size],
            regs: vec![0; config.registers as usize],
            pc: 0,
            halted: false,
            config,
        }
    }

    /// Configuration the core was created with.
    #[inline]
    pub fn config(&self) -> CoreConfig { self.config }

    /// Word width used for the arithmetic.
    #[inline]
    pub fn word(&self) -> WordSize { self.config.word }

    /// Current value of the program counter.
    #[inline]
    pub fn pc(&self) -> usize { self.pc }

    /// Whether the halt flag is set.
    #[inline]
    pub fn is_halted(&self) -> bool { self.halted }

    /// Read-only view of the whole memory.
    #[inline]
    pub fn memory(&self) -> &[Cell] { &self.mem }

    /// Read-only view of the register file.
    #[inline]
    pub fn registers(&self) -> &[Cell] { &self.regs }

    /// Zeroes memory and registers, resets `pc` and clears the halt flag.
    pub fn reset(&mut self) {
        self.mem.iter_mut().for_each(|cell| *cell = 0);
        self.regs.iter_mut().for_each(|reg| *reg = 0);
        self.pc = 0;
        self.halted = false;
    }
}

impl Default for Core {
    fn default() -> Self { Core::new() }
}

impl Debug for Core {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (sect, reg, val, reset) = if f.alternate() {
            ("\x1B[0;4;1m", "\x1B[0;1m", "\x1B[0;32m", "\x1B[0m")
        } else {
            ("", "", "", "")
        };

        writeln!(f, "{sect}C-regs:{reset}")?;
        write!(f, "{reg}pc{reset} {val}{:#06X}{reset}, ", self.pc)?;
        writeln!(f, "{reg}halt{reset} {val}{}{reset}", self.halted)?;

        if !self.regs.is_empty() {
            writeln!(f, "{sect}R-regs:{reset}")?;
            for (i, v) in self.regs.iter().enumerate() {
                write!(f, "{reg}r{i}{reset} {val}{v}{reset}  ")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{sect}Memory:{reset}")?;
        for (row, chunk) in self.mem.chunks(8).enumerate() {
            if chunk.iter().all(|cell| *cell == 0) {
                continue;
            }
            write!(f, "{reg}{:#06X}{reset}", row * 8)?;
            for cell in chunk {
                write!(f, " {val}{cell:>6}{reset}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
