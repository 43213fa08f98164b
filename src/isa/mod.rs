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

//! Instruction set profiles of the minimal virtual machine

#[macro_use]
mod masm;
mod bytecode;
mod exec;
mod instr;
pub mod opcodes;

pub use bytecode::{Bytecode, BytecodeRead, BytecodeWrite, Marshaller};
pub use exec::{ExecStep, InstructionSet, MnemonicError};
pub use instr::{OccamInstr, OiscInstr, Profile, ProfileParseError, TiscInstr, TriInstr};
