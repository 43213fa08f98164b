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

//! Composite operations expressed as SUBLEQ sequences.
//!
//! [`Builder`] emits packed OISC code followed by a data segment holding program variables and
//! a few reserved cells: `Z` (always zero between operations), `ONE`, `NEG_ONE` and a scratch
//! cell `T`. Every derived operation leaves `Z` zeroed on exit.
//!
//! Derived branches compare a single variable against zero over the whole word range. Operands of
//! `mul` and `divmod` must stay within the ranges documented on those methods.

use alloc::vec;
use alloc::vec::Vec;

use crate::core::{Cell, HALT_SENTINEL_DEFAULT};
use crate::isa::{Bytecode, OiscInstr};
use crate::library::Program;

/// Program variable: index of a cell in the data segment.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[display("var{0}")]
pub struct Var(usize);

/// Jump target inside the code segment.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[display("label{0}")]
pub struct Label(usize);

/// Third operand of a raw `subleq`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, From)]
pub enum Target {
    /// The instruction following the emitted one: no branch.
    Next,

    /// A label.
    #[from]
    Label(Label),

    /// An absolute address.
    #[from]
    Addr(Cell),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
enum Operand {
    Abs(Cell),
    Var(Var),
    Label(Label),
    Next,
}

/// Errors building program image.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum BuildError {
    /// {0} is used as a jump target but never bound to a code position.
    UnboundLabel(Label),
}

/// Builder of SUBLEQ programs out of composite operations.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Builder {
    base: usize,
    sentinel: Cell,
    code: Vec<[Operand; 3]>,
    data: Vec<Cell>,
    labels: Vec<Option<usize>>,
    z: Var,
    one: Var,
    neg_one: Var,
    t: Var,
}

impl Default for Builder {
    fn default() -> Self { Builder::new() }
}

impl Builder {
    /// Constructs builder placing code at address zero and using the default halt sentinel.
    pub fn new() -> Self { Builder::with(0, HALT_SENTINEL_DEFAULT) }

    /// Constructs builder placing code at `base` address and halting with `sentinel`.
    pub fn with(base: usize, sentinel: Cell) -> Self {
        let mut builder = Builder {
            base,
            sentinel,
            code: vec![],
            data: vec![],
            labels: vec![],
            z: Var(0),
            one: Var(0),
            neg_one: Var(0),
            t: Var(0),
        };
        builder.z = builder.var(0);
        builder.one = builder.var(1);
        builder.neg_one = builder.var(-1);
        builder.t = builder.var(0);
        builder
    }

    /// Allocates a new variable with an initial value.
    pub fn var(&mut self, init: Cell) -> Var {
        self.data.push(init);
        Var(self.data.len() - 1)
    }

    /// Creates label which is not yet bound to a code position.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Binds label to the position of the next emitted instruction. Labels created by other
    /// builders are ignored.
    pub fn bind(&mut self, label: Label) {
        let pos = self.code.len();
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(pos);
        }
    }

    /// Creates label bound to the position of the next emitted instruction.
    pub fn here(&mut self) -> Label {
        let label = self.label();
        self.bind(label);
        label
    }

    /// Zero cell reserved by the builder.
    #[inline]
    pub fn zero(&self) -> Var { self.z }

    /// Number of emitted instructions.
    #[inline]
    pub fn instr_count(&self) -> usize { self.code.len() }

    /// Address of a variable in the final image. Stable only once all the code is emitted.
    #[inline]
    pub fn addr(&self, var: Var) -> usize { self.data_start() + var.0 }

    fn data_start(&self) -> usize { self.base + self.code.len() * OiscInstr::MAX_WIDTH }

    fn emit(&mut self, a: Operand, b: Operand, c: Operand) { self.code.push([a, b, c]) }

    /// Emits raw `subleq a, b, c`.
    pub fn subleq(&mut self, a: Var, b: Var, c: impl Into<Target>) {
        let c = match c.into() {
            Target::Next => Operand::Next,
            Target::Label(label) => Operand::Label(label),
            Target::Addr(addr) => Operand::Abs(addr),
        };
        self.emit(Operand::Var(a), Operand::Var(b), c);
    }

    /// `dest = 0`
    pub fn clear(&mut self, dest: Var) { self.subleq(dest, dest, Target::Next) }

    /// `dest -= src`
    pub fn sub(&mut self, dest: Var, src: Var) { self.subleq(src, dest, Target::Next) }

    /// `dest += src`
    pub fn add(&mut self, dest: Var, src: Var) {
        let z = self.z;
        self.subleq(src, z, Target::Next);
        self.subleq(z, dest, Target::Next);
        self.subleq(z, z, Target::Next);
    }

    /// `dest = src`
    pub fn mov(&mut self, dest: Var, src: Var) {
        if dest == src {
            return;
        }
        self.clear(dest);
        self.add(dest, src);
    }

    /// `dest = -src`
    pub fn neg(&mut self, dest: Var, src: Var) {
        if dest == src {
            let t = self.t;
            self.mov(t, src);
            self.clear(dest);
            self.sub(dest, t);
        } else {
            self.clear(dest);
            self.sub(dest, src);
        }
    }

    /// `dest += 1`
    pub fn inc(&mut self, dest: Var) { self.subleq(self.neg_one, dest, Target::Next) }

    /// `dest -= 1`
    pub fn dec(&mut self, dest: Var) { self.subleq(self.one, dest, Target::Next) }

    /// Unconditional jump.
    pub fn jmp(&mut self, label: Label) { self.subleq(self.z, self.z, label) }

    /// Jumps if `a <= 0`.
    pub fn jle(&mut self, a: Var, label: Label) { self.subleq(self.z, a, label) }

    /// Jumps if `a > 0`.
    pub fn jg(&mut self, a: Var, label: Label) {
        let skip = self.label();
        self.jle(a, skip);
        self.jmp(label);
        self.bind(skip);
    }

    /// Jumps if `a < 0`, where `a <= 0` is already known. `a + 1` can't wrap for such values.
    fn jl_nonpos(&mut self, a: Var, label: Label) {
        let t = self.t;
        self.clear(t);
        self.add(t, a);
        self.subleq(self.neg_one, t, label);
    }

    /// Jumps if `a == 0`.
    pub fn jz(&mut self, a: Var, label: Label) {
        let skip = self.label();
        let nonpos = self.label();
        self.jle(a, nonpos);
        self.jmp(skip);
        self.bind(nonpos);
        self.jl_nonpos(a, skip);
        self.jmp(label);
        self.bind(skip);
    }

    /// Jumps if `a != 0`.
    pub fn jnz(&mut self, a: Var, label: Label) {
        let nonpos = self.label();
        self.jle(a, nonpos);
        self.jmp(label);
        self.bind(nonpos);
        self.jl_nonpos(a, label);
    }

    /// Jumps if `a < 0`.
    pub fn jl(&mut self, a: Var, label: Label) {
        let skip = self.label();
        let nonpos = self.label();
        self.jle(a, nonpos);
        self.jmp(skip);
        self.bind(nonpos);
        self.jl_nonpos(a, label);
        self.bind(skip);
    }

    /// Jumps if `a >= 0`.
    pub fn jge(&mut self, a: Var, label: Label) {
        let skip = self.label();
        let nonpos = self.label();
        self.jle(a, nonpos);
        self.jmp(label);
        self.bind(nonpos);
        self.jl_nonpos(a, skip);
        self.jmp(label);
        self.bind(skip);
    }

    /// `dest = a * b` by repeated addition; requires `b >= 0`. `dest` may alias the factors.
    pub fn mul(&mut self, dest: Var, a: Var, b: Var) {
        let acc = self.var(0);
        let count = self.var(0);
        self.clear(acc);
        self.mov(count, b);
        let looped = self.here();
        let done = self.label();
        self.jle(count, done);
        self.add(acc, a);
        self.dec(count);
        self.jmp(looped);
        self.bind(done);
        self.mov(dest, acc);
    }

    /// `quot = a / b` and `rem = a % b` by repeated subtraction; requires `a >= 0` and `b > 0`.
    ///
    /// With `b == 0` the emitted loop never terminates.
    pub fn divmod(&mut self, quot: Var, rem: Var, a: Var, b: Var) {
        let q = self.var(0);
        let r = self.var(0);
        let next = self.var(0);
        self.clear(q);
        self.mov(r, a);
        let looped = self.here();
        let done = self.label();
        self.mov(next, r);
        self.sub(next, b);
        self.jl(next, done);
        self.mov(r, next);
        self.inc(q);
        self.jmp(looped);
        self.bind(done);
        self.mov(quot, q);
        self.mov(rem, r);
    }

    /// Emits instruction halting the machine.
    pub fn halt(&mut self) {
        self.emit(Operand::Abs(self.sentinel), Operand::Abs(0), Operand::Abs(0));
    }

    /// Builds program image: code followed by the data segment.
    pub fn build(&self) -> Result<Program, BuildError> {
        let data_start = self.data_start() as Cell;
        let mut cells =
            Vec::with_capacity(self.code.len() * OiscInstr::MAX_WIDTH + self.data.len());
        for (no, instr) in self.code.iter().enumerate() {
            let mut operands = [0 as Cell; 3];
            for (operand, cell) in instr.iter().zip(&mut operands) {
                *cell = match *operand {
                    Operand::Abs(val) => val,
                    Operand::Var(var) => data_start + var.0 as Cell,
                    Operand::Next => (self.base + (no + 1) * OiscInstr::MAX_WIDTH) as Cell,
                    Operand::Label(label) => {
                        let pos = self
                            .labels
                            .get(label.0)
                            .copied()
                            .flatten()
                            .ok_or(BuildError::UnboundLabel(label))?;
                        (self.base + pos * OiscInstr::MAX_WIDTH) as Cell
                    }
                };
            }
            let [a, b, c] = operands;
            OiscInstr::Subleq(a, b, c).encode_instr(&mut cells, default!());
        }
        Ok(Program::with(cells, self.base).with_data(&self.data))
    }
}
