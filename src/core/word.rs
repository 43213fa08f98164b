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

//! Machine words and their wraparound arithmetic.

use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

/// Value stored in a single memory cell or register.
///
/// Storage is always 64 bits wide; the effective width is defined by the [`WordSize`] the core was
/// configured with, and every value written by the machine is normalized to it.
pub type Cell = i64;

/// Width of a machine word in bits.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum WordSize {
    /// 8-bit signed words.
    #[display("w8")]
    W8,

    /// 16-bit signed words.
    #[display("w16")]
    W16,

    /// 32-bit signed words.
    #[default]
    #[display("w32")]
    W32,

    /// 64-bit signed words.
    #[display("w64")]
    W64,
}

impl WordSize {
    /// Number of bits in the word.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            WordSize::W8 => 8,
            WordSize::W16 => 16,
            WordSize::W32 => 32,
            WordSize::W64 => 64,
        }
    }

    /// Smallest value representable by the word.
    #[inline]
    pub const fn min(self) -> Cell { Cell::MIN >> (64 - self.bits()) }

    /// Largest value representable by the word.
    #[inline]
    pub const fn max(self) -> Cell { Cell::MAX >> (64 - self.bits()) }

    /// Truncates value to the word width and sign-extends it back, i.e. performs two's complement
    /// wraparound.
    #[inline]
    pub const fn wrap(self, value: Cell) -> Cell {
        let shift = 64 - self.bits();
        (value << shift) >> shift
    }

    /// Wrapping subtraction `minuend - subtrahend` in the word width.
    #[inline]
    pub const fn sub(self, minuend: Cell, subtrahend: Cell) -> Cell {
        self.wrap(minuend.wrapping_sub(subtrahend))
    }

    /// Wrapping addition in the word width.
    #[inline]
    pub const fn add(self, a: Cell, b: Cell) -> Cell { self.wrap(a.wrapping_add(b)) }
}

/// Error parsing [`WordSize`] from a string.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display("unknown word size '{0}'; expected one of w8, w16, w32 or w64")]
pub struct WordSizeParseError(pub alloc::string::String);

impl FromStr for WordSize {
    type Err = WordSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w8" | "8" => Ok(WordSize::W8),
            "w16" | "16" => Ok(WordSize::W16),
            "w32" | "32" => Ok(WordSize::W32),
            "w64" | "64" => Ok(WordSize::W64),
            _ => Err(WordSizeParseError(s.into())),
        }
    }
}

/// Memory space addressed by an instruction operand.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Space {
    /// Main (code and data) memory.
    Memory,
    /// Register file.
    Register,
}

impl Display for Space {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Space::Memory => f.write_str("memory address"),
            Space::Register => f.write_str("register index"),
        }
    }
}
