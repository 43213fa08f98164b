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

//! Virtual machine driving execution of a program loaded into a [`Core`].

use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};
use core::marker::PhantomData;

use crate::core::{Cell, Core, CoreConfig, Loc, Site, Status, VmError};
use crate::isa::{
    ExecStep, InstructionSet, Marshaller, OccamInstr, OiscInstr, Profile, TiscInstr,
    TriInstr,
};
use crate::library::{self, AsmError, Program, ProgramId};

/// Reason for which [`Vm::run`] returned.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub enum Stop {
    /// The program halted.
    #[display("halted")]
    Halted,

    /// The step limit was reached before the program halted.
    #[display("step limit exceeded")]
    StepLimitExceeded,
}

/// Outcome of a [`Vm::run`] call.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Run {
    /// Number of executed steps, including the halting one.
    pub steps: u64,

    /// Why the execution stopped.
    pub stop: Stop,
}

impl Display for Run {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} step(s)", self.stop, self.steps)
    }
}

/// Virtual machine for a specific instruction set profile.
#[derive(Getters, Clone, PartialEq, Eq, Debug)]
pub struct Vm<Isa = OiscInstr>
where Isa: InstructionSet
{
    /// Memory, registers and control state of the machine.
    core: Core,

    #[getter(skip)]
    phantom: PhantomData<Isa>,
}

impl<Isa> Vm<Isa>
where Isa: InstructionSet
{
    /// Constructs new virtual machine instance with default configuration.
    pub fn new() -> Self { Vm::with(default!()) }

    /// Constructs new virtual machine instance using the provided core configuration.
    pub fn with(config: CoreConfig) -> Self { Vm { core: Core::with(config), phantom: default!() } }

    /// Instruction set profile of the machine.
    #[inline]
    pub fn profile(&self) -> Profile { Isa::PROFILE }

    /// Copies `cells` into memory starting at `base`. Does not change the program counter or the
    /// halt flag.
    #[inline]
    pub fn load(&mut self, cells: &[Cell], base: usize) -> Result<(), VmError> {
        self.core.load(cells, base)
    }

    /// Loads program image, sets the program counter to its entry point and clears the halt
    /// flag.
    pub fn load_program(&mut self, program: &Program) -> Result<ProgramId, VmError> {
        self.core.load(program.cells(), program.base())?;
        self.core.set_pc(program.entry())?;
        self.core.resume();
        let id = program.id();
        #[cfg(feature = "log")]
        eprintln!(
            "loaded program {id} ({} cells at @x{:06X}) into {} machine",
            program.len(),
            program.base(),
            Isa::PROFILE
        );
        Ok(id)
    }

    /// Sets program counter. Does not clear the halt flag.
    #[inline]
    pub fn set_pc(&mut self, pc: usize) -> Result<(), VmError> { self.core.set_pc(pc) }

    /// Clears the halt flag, so the machine can continue from the current program counter.
    #[inline]
    pub fn resume(&mut self) { self.core.resume() }

    /// Zeroes memory and registers, resets the program counter and the halt flag.
    #[inline]
    pub fn reset(&mut self) { self.core.reset() }

    /// Decodes instruction located at the program counter.
    pub fn fetch(&self) -> Result<(Site, Isa), VmError> {
        let pc = self.core.pc();
        let mut marshaller = Marshaller::with(self.core.memory(), pc);
        let instr = Isa::decode_instr(&mut marshaller)?;
        Ok((Site::new(pc, instr.width(self.core.config().layout)), instr))
    }

    /// Executes a single instruction.
    ///
    /// Does nothing for a halted machine. On error neither memory, registers nor the program
    /// counter are modified.
    pub fn step(&mut self) -> Result<Status, VmError> {
        #[cfg(feature = "log")]
        let (m, w, d, g, r, y, z) = (
            "\x1B[0;35m",
            "\x1B[1;1m",
            "\x1B[0;37;2m",
            "\x1B[0;32m",
            "\x1B[0;31m",
            "\x1B[0;33m",
            "\x1B[0m",
        );

        if self.core.is_halted() {
            return Ok(Status::Halted);
        }

        let (site, instr) = match self.fetch() {
            Ok(fetched) => fetched,
            Err(err) => {
                #[cfg(feature = "log")]
                eprintln!("{m}{}{}:{z} {r}{err}{z}", Isa::PROFILE, Site::new(self.core.pc(), 0));
                return Err(err);
            }
        };

        #[cfg(feature = "log")]
        {
            eprint!("{m}{}{site}:{z} {: <24}; ", Isa::PROFILE, instr.to_string());
            for loc in instr.locs() {
                if let Ok(val) = self.inspect(loc) {
                    eprint!("{d}{loc} {z}{w}{val}{z}, ");
                }
            }
        }

        let step = match instr.exec(&mut self.core, site) {
            Ok(step) => step,
            Err(err) => {
                #[cfg(feature = "log")]
                eprintln!("{r}{err}{z}");
                return Err(err);
            }
        };

        #[cfg(feature = "log")]
        {
            eprint!("-> ");
            if step != ExecStep::Halt {
                for loc in instr.locs() {
                    if let Ok(val) = self.inspect(loc) {
                        eprint!("{g}{loc} {y}{val}{z}, ");
                    }
                }
            }
            match step {
                ExecStep::Halt => eprintln!("{r}halted{z}"),
                ExecStep::Next(pc) => eprintln!("{d}pc {z}{pc}"),
                ExecStep::Jump(pc) => eprintln!("{y}jump {z}{pc}"),
            }
        }

        match step {
            ExecStep::Halt => Ok(Status::Halted),
            ExecStep::Next(pc) | ExecStep::Jump(pc) => {
                self.core.set_pc(pc)?;
                Ok(Status::Running)
            }
        }
    }

    /// Executes instructions until the machine halts or `max_steps` instructions were executed.
    ///
    /// The halting instruction counts as a step. A machine which is already halted returns
    /// immediately with zero steps.
    pub fn run(&mut self, max_steps: u64) -> Result<Run, VmError> {
        let mut steps = 0u64;
        while !self.core.is_halted() {
            if steps >= max_steps {
                #[cfg(feature = "log")]
                eprintln!("step limit of {max_steps} exceeded at pc {}", self.core.pc());
                return Ok(Run { steps, stop: Stop::StepLimitExceeded });
            }
            self.step()?;
            steps += 1;
        }
        Ok(Run { steps, stop: Stop::Halted })
    }

    /// Reads memory cell or register value without modifying the machine state.
    pub fn inspect(&self, loc: Loc) -> Result<Cell, VmError> {
        match loc {
            Loc::Mem(addr) => self.core.mem_at(addr),
            Loc::Reg(idx) => self.core.reg_at(idx),
        }
    }

    /// Reads memory cell.
    #[inline]
    pub fn mem(&self, addr: usize) -> Result<Cell, VmError> { self.inspect(Loc::Mem(addr)) }

    /// Reads register.
    #[inline]
    pub fn reg(&self, idx: usize) -> Result<Cell, VmError> { self.inspect(Loc::Reg(idx)) }

    /// Current program counter.
    #[inline]
    pub fn pc(&self) -> usize { self.core.pc() }

    /// Whether the machine is halted.
    #[inline]
    pub fn is_halted(&self) -> bool { self.core.is_halted() }

    /// Full memory contents.
    #[inline]
    pub fn memory(&self) -> &[Cell] { self.core.memory() }

    /// Full register file contents.
    #[inline]
    pub fn registers(&self) -> &[Cell] { self.core.registers() }

    /// Assembles source text into a program using the machine layout.
    #[inline]
    pub fn assemble(&self, source: &str, base: usize) -> Result<Program, AsmError> {
        library::assemble::<Isa>(source, base, self.core.config().layout)
    }

    /// Decodes memory from `from` up to the first cell which is not a valid instruction.
    pub fn disassemble(&self, from: usize) -> Vec<(usize, Isa)> {
        let cells = self.core.memory().get(from..).unwrap_or_default();
        library::disassemble(cells, from, self.core.config().layout)
    }
}

impl<Isa> Default for Vm<Isa>
where Isa: InstructionSet
{
    fn default() -> Self { Vm::new() }
}

/// Virtual machine with an instruction set profile selected at runtime.
#[derive(Clone, PartialEq, Eq, Debug, From)]
pub enum AnyVm {
    /// One instruction set computer.
    #[from]
    Oisc(Vm<OiscInstr>),

    /// Two instruction set computer.
    #[from]
    Tisc(Vm<TiscInstr>),

    /// Three instruction set computer.
    #[from]
    TriIsc(Vm<TriInstr>),

    /// Occam-8 eight instruction computer.
    #[from]
    Occam8(Vm<OccamInstr>),
}

macro_rules! dispatch {
    ($self:ident, $vm:ident => $expr:expr) => {
        match $self {
            AnyVm::Oisc($vm) => $expr,
            AnyVm::Tisc($vm) => $expr,
            AnyVm::TriIsc($vm) => $expr,
            AnyVm::Occam8($vm) => $expr,
        }
    };
}

impl AnyVm {
    /// Constructs virtual machine for `profile` using the provided core configuration.
    pub fn with(profile: Profile, config: CoreConfig) -> Self {
        match profile {
            Profile::Oisc => AnyVm::Oisc(Vm::with(config)),
            Profile::Tisc => AnyVm::Tisc(Vm::with(config)),
            Profile::TriIsc => AnyVm::TriIsc(Vm::with(config)),
            Profile::Occam8 => AnyVm::Occam8(Vm::with(config)),
        }
    }

    /// Instruction set profile of the machine.
    pub fn profile(&self) -> Profile { dispatch!(self, vm => vm.profile()) }

    /// Memory, registers and control state of the machine.
    pub fn core(&self) -> &Core { dispatch!(self, vm => vm.core()) }

    /// See [`Vm::load`].
    pub fn load(&mut self, cells: &[Cell], base: usize) -> Result<(), VmError> {
        dispatch!(self, vm => vm.load(cells, base))
    }

    /// See [`Vm::load_program`].
    pub fn load_program(&mut self, program: &Program) -> Result<ProgramId, VmError> {
        dispatch!(self, vm => vm.load_program(program))
    }

    /// See [`Vm::set_pc`].
    pub fn set_pc(&mut self, pc: usize) -> Result<(), VmError> {
        dispatch!(self, vm => vm.set_pc(pc))
    }

    /// See [`Vm::resume`].
    pub fn resume(&mut self) { dispatch!(self, vm => vm.resume()) }

    /// See [`Vm::reset`].
    pub fn reset(&mut self) { dispatch!(self, vm => vm.reset()) }

    /// See [`Vm::step`].
    pub fn step(&mut self) -> Result<Status, VmError> { dispatch!(self, vm => vm.step()) }

    /// See [`Vm::run`].
    pub fn run(&mut self, max_steps: u64) -> Result<Run, VmError> {
        dispatch!(self, vm => vm.run(max_steps))
    }

    /// See [`Vm::inspect`].
    pub fn inspect(&self, loc: Loc) -> Result<Cell, VmError> {
        dispatch!(self, vm => vm.inspect(loc))
    }

    /// Current program counter.
    pub fn pc(&self) -> usize { self.core().pc() }

    /// Whether the machine is halted.
    pub fn is_halted(&self) -> bool { self.core().is_halted() }

    /// Assembles source text for the machine profile and layout.
    pub fn assemble(&self, source: &str, base: usize) -> Result<Program, AsmError> {
        dispatch!(self, vm => vm.assemble(source, base))
    }

    /// Disassembly listing of memory starting at `from`, one instruction per line.
    pub fn disassemble(&self, from: usize) -> Vec<(usize, alloc::string::String)> {
        dispatch!(self, vm => vm
            .disassemble(from)
            .into_iter()
            .map(|(addr, instr)| (addr, alloc::string::ToString::to_string(&instr)))
            .collect())
    }
}
