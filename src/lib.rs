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

//! Minimal instruction set virtual machine.
//!
//! Emulates a family of SUBLEQ-based computers sharing a common memory and register model:
//! - **OISC**: a single `subleq a, b, c` instruction;
//! - **TISC**: `move` and `subleq`;
//! - **TriISC**: register-based `load`, `sub` and `jlz`;
//! - **Occam-8**: eight instructions including `subleq`, register loads and stores, jumps,
//!   addition and an explicit `halt`.
//!
//! Programs can be produced with the [`minasm!`] macro, the text [`library::assemble`]r or the
//! SUBLEQ [`library::Builder`], and are executed by [`Vm`] (or [`AnyVm`] when the profile is
//! selected at runtime).

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
extern crate amplify;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

#[doc(hidden)]
pub use paste::paste;

mod core;
#[macro_use]
pub mod isa;
pub mod library;
mod vm;

pub use self::core::{
    Cell, Core, CoreConfig, Layout, Loc, Site, Space, Status, VmError, WordSize,
    WordSizeParseError, HALT_SENTINEL_DEFAULT, MEMORY_SIZE_DEFAULT, REGISTERS_DEFAULT,
};
pub use self::isa::{InstructionSet, Profile};
pub use self::library::{Program, ProgramId};
pub use self::vm::{AnyVm, Run, Stop, Vm};
