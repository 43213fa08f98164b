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

use core::fmt::{self, Display, Formatter};

/// Location of the instruction being executed.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct Site {
    /// Address of the instruction (its first cell).
    pub pc: usize,
    /// Address of the cell following the last cell of the instruction.
    pub next: usize,
}

impl Site {
    /// Constructs site from the instruction address and its width in cells.
    #[inline]
    pub fn new(pc: usize, width: usize) -> Self { Site { pc, next: pc + width } }

    /// Number of cells occupied by the instruction.
    #[inline]
    pub fn width(self) -> usize { self.next - self.pc }
}

impl Display for Site {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { write!(f, "@x{:06X}", self.pc) }
}

/// Execution status of a core after a step.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum Status {
    /// Core can execute further instructions.
    #[display("running")]
    Running,

    /// Halt flag is set; no further instructions will be executed.
    #[display("halted")]
    Halted,
}

impl Status {
    /// Whether the core has halted.
    #[inline]
    pub fn is_halted(self) -> bool { self == Status::Halted }
}

/// Location inspected by [`crate::Vm::inspect`].
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum Loc {
    /// Memory cell address.
    #[display("[{0}]")]
    Mem(usize),

    /// Register index.
    #[display("r{0}")]
    Reg(usize),
}
