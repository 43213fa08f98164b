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

//! Machine state of a minimal instruction set computer

#[allow(clippy::module_inception)]
mod core;
mod microcode;
mod regs;
mod word;

pub use self::core::{
    Core, CoreConfig, Layout, HALT_SENTINEL_DEFAULT, MEMORY_SIZE_DEFAULT, REGISTERS_DEFAULT,
};
pub use self::microcode::VmError;
pub use self::regs::{Loc, Site, Status};
pub use self::word::{Cell, Space, WordSize, WordSizeParseError};
