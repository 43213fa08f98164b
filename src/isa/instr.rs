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

use alloc::string::String;
use core::str::FromStr;

use crate::core::Cell;

/// Instruction set profiles supported by the virtual machine.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Profile {
    /// One instruction set computer: `SUBLEQ` only, no opcode cells.
    #[display("OISC")]
    Oisc,

    /// Two instruction set computer: `MOVE` and `SUBLEQ`.
    #[display("TISC")]
    Tisc,

    /// Three instruction set computer: `LOAD`, `SUB` and `JLZ` over a register file.
    #[display("TriISC")]
    TriIsc,

    /// Eight instructions addressable by a three bit opcode.
    #[display("Occam-8")]
    Occam8,
}

impl Profile {
    /// Enumerates all profiles.
    pub const fn all() -> [Profile; 4] {
        [Profile::Oisc, Profile::Tisc, Profile::TriIsc, Profile::Occam8]
    }

    /// Number of distinct instructions in the profile.
    pub const fn instr_count(self) -> usize {
        match self {
            Profile::Oisc => 1,
            Profile::Tisc => 2,
            Profile::TriIsc => 3,
            Profile::Occam8 => 8,
        }
    }

    /// Whether instructions start with an opcode cell.
    pub const fn has_opcodes(self) -> bool { !matches!(self, Profile::Oisc) }

    /// Whether the profile has a dedicated halt instruction, making halt sentinel unnecessary.
    pub const fn has_halt_opcode(self) -> bool { matches!(self, Profile::Occam8) }
}

/// Error parsing [`Profile`] from a string.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display("unknown instruction set profile '{0}'")]
pub struct ProfileParseError(pub String);

impl FromStr for Profile {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oisc" | "subleq" | "1" => Ok(Profile::Oisc),
            "tisc" | "2" => Ok(Profile::Tisc),
            "triisc" | "3" => Ok(Profile::TriIsc),
            "occam" | "occam8" | "occam-8" | "8" => Ok(Profile::Occam8),
            _ => Err(ProfileParseError(s.into())),
        }
    }
}

/// OISC instruction set. The only instruction is implicit, so no opcode cell is used.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum OiscInstr {
    /// `Mem[b] -= Mem[a]`; jumps to `c` if the result is less than or equal to zero.
    #[display("subleq  {0}, {1}, {2}")]
    Subleq(Cell, Cell, Cell),
}

/// TISC instruction set.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum TiscInstr {
    /// Copies `Mem[src]` into `Mem[dest]`. Operands are `dest, src`.
    #[display("move    {0}, {1}")]
    Move(Cell, Cell),

    /// `Mem[b] -= Mem[a]`; jumps to `c` if the result is less than or equal to zero.
    #[display("subleq  {0}, {1}, {2}")]
    Subleq(Cell, Cell, Cell),
}

/// TriISC instruction set operating over registers.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum TriInstr {
    /// Loads `Mem[addr]` into a register. Operands are `reg, addr`.
    #[display("load    r{0}, {1}")]
    Load(Cell, Cell),

    /// `Reg[r1] -= Reg[r2]`, storing the result also into `Mem[addr]`. Operands are
    /// `r1, r2, addr`.
    #[display("sub     r{0}, r{1}, {2}")]
    Sub(Cell, Cell, Cell),

    /// Jumps to `addr` if the register is negative. Operands are `reg, addr`.
    #[display("jlz     r{0}, {1}")]
    Jlz(Cell, Cell),
}

/// Occam-8 instruction set.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum OccamInstr {
    /// `Mem[b] -= Mem[a]`; jumps to `c` if the result is less than or equal to zero.
    #[display("subleq  {0}, {1}, {2}")]
    Subleq(Cell, Cell, Cell),

    /// `Reg[reg] = Mem[addr]`.
    #[display("load    r{0}, {1}")]
    Load(Cell, Cell),

    /// `Mem[addr] = Reg[reg]`.
    #[display("store   r{0}, {1}")]
    Store(Cell, Cell),

    /// Unconditional jump.
    #[display("jmp     {0}")]
    Jmp(Cell),

    /// Jumps to `addr` if the register is zero. Operands are `reg, addr`.
    #[display("jz      r{0}, {1}")]
    Jz(Cell, Cell),

    /// `Reg[reg] += Mem[addr]`.
    #[display("add     r{0}, {1}")]
    Add(Cell, Cell),

    /// Sets the halt flag.
    #[display("halt")]
    Halt,

    /// Does nothing.
    #[display("nop")]
    Nop,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn profile_names() {
        for profile in Profile::all() {
            assert_eq!(profile.to_string().parse(), Ok(profile));
        }
        assert_eq!(Profile::TriIsc.to_string(), "TriISC");
        assert_eq!("occam".parse(), Ok(Profile::Occam8));
        assert!("cisc".parse::<Profile>().is_err());
    }

    #[test]
    fn instr_display() {
        assert_eq!(OiscInstr::Subleq(3, 4, -1).to_string(), "subleq  3, 4, -1");
        assert_eq!(TriInstr::Sub(0, 1, 25).to_string(), "sub     r0, r1, 25");
        assert_eq!(OccamInstr::Halt.to_string(), "halt");
    }
}
