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

#![allow(missing_docs)]

//! Opcode cell values of the multi-instruction profiles.
//!
//! The OISC profile has no opcodes: every instruction is an implicit `SUBLEQ`.

use crate::core::Cell;

// TISC: two instruction set computer
pub const TISC_MOVE: Cell = 0;
pub const TISC_SUBLEQ: Cell = 1;

// TriISC: three instruction set computer
pub const TRI_LOAD: Cell = 0;
pub const TRI_SUB: Cell = 1;
pub const TRI_JLZ: Cell = 2;

// Occam-8: eight instructions addressable with a 3-bit opcode
pub const OCCAM_SUBLEQ: Cell = 0;
pub const OCCAM_LOAD: Cell = 1;
pub const OCCAM_STORE: Cell = 2;
pub const OCCAM_JMP: Cell = 3;
pub const OCCAM_JZ: Cell = 4;
pub const OCCAM_ADD: Cell = 5;
pub const OCCAM_HALT: Cell = 6;
pub const OCCAM_NOP: Cell = 7;
