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

#[macro_use]
extern crate minvm;

use minvm::isa::{OccamInstr, OiscInstr, TiscInstr, TriInstr};
use minvm::{
    AnyVm, Cell, CoreConfig, InstructionSet, Layout, Loc, Profile, Program, Run, Space, Status,
    Stop, Vm, VmError, WordSize,
};

const STEPS: u64 = 10_000;

fn run<Isa: InstructionSet>(vm: &mut Vm<Isa>, program: &Program) -> Run {
    vm.load_program(program).unwrap();
    let run = vm.run(STEPS).unwrap();
    println!("\nVM core state:\n{:#?}", vm.core());
    run
}

#[test]
fn oisc_subtraction() {
    let code = minasm! { OiscInstr =>
        subleq  10, 9, 3;
        subleq  -1, 0, 0;
    };
    let program = Program::assemble(&code, 0, Layout::Packed).with_data(&[0, 0, 0, 5, 3]);
    let mut vm = Vm::<OiscInstr>::new();
    assert_eq!(run(&mut vm, &program), Run { steps: 2, stop: Stop::Halted });
    assert_eq!(vm.mem(9), Ok(2));
    assert_eq!(vm.mem(10), Ok(3));
    assert_eq!(vm.pc(), 3);
}

#[test]
fn oisc_addition() {
    let code = minasm! { OiscInstr =>
        subleq  12, 14, 3;
        subleq  14, 13, 6;
        subleq  14, 14, 9;
        subleq  -1, 0, 0;
    };
    let program = Program::assemble(&code, 0, Layout::Packed).with_data(&[5, 3, 0]);
    let mut vm = Vm::<OiscInstr>::new();
    assert_eq!(run(&mut vm, &program), Run { steps: 4, stop: Stop::Halted });
    assert_eq!(vm.mem(13), Ok(8));
    assert_eq!(vm.mem(14), Ok(0));
}

#[test]
fn sentinel_halts_without_mutation() {
    for (pos, operands) in [[-1, 9, 0], [9, -1, 0], [9, 10, -1]].into_iter().enumerate() {
        let mut vm = Vm::<OiscInstr>::new();
        vm.load(&operands, 0).unwrap();
        vm.load(&[4, 6], 9).unwrap();
        let memory = vm.memory().to_vec();
        assert_eq!(vm.step(), Ok(Status::Halted), "sentinel at operand {pos}");
        assert_eq!(vm.memory(), memory);
        assert_eq!(vm.pc(), 0);
    }
}

#[test]
fn disabled_sentinel() {
    let mut config = CoreConfig::default();
    config.halt_sentinel = None;
    let mut vm = Vm::<OiscInstr>::with(config);
    vm.load(&[-1, 0, 0], 0).unwrap();
    assert_eq!(vm.step(), Err(VmError::AddressOutOfRange(Space::Memory, -1, 256)));

    config.halt_sentinel = Some(-7);
    let mut vm = Vm::<OiscInstr>::with(config);
    vm.load(&[3, 3, -7], 0).unwrap();
    assert_eq!(vm.run(5), Ok(Run { steps: 1, stop: Stop::Halted }));
}

#[test]
fn self_jump_hits_step_limit() {
    let mut vm = Vm::<OiscInstr>::new();
    vm.load(&[3, 3, 0], 0).unwrap();
    assert_eq!(vm.run(1000), Ok(Run { steps: 1000, stop: Stop::StepLimitExceeded }));
    assert!(!vm.is_halted());
    assert_eq!(vm.pc(), 0);
}

#[test]
fn falling_off_memory_end() {
    let mut vm = Vm::<OiscInstr>::with(CoreConfig::with_memory(6));
    vm.load(&[5, 4, 0, 2, 1, 1], 0).unwrap();
    vm.set_pc(3).unwrap();
    assert_eq!(vm.step(), Err(VmError::AddressOutOfRange(Space::Memory, 6, 6)));
    assert_eq!(vm.pc(), 3);
    assert_eq!(vm.mem(1), Ok(4));
}

#[test]
fn program_too_large() {
    let mut vm = Vm::<OiscInstr>::with(CoreConfig::with_memory(4));
    assert_eq!(vm.load(&[1, 2, 3, 4, 5], 0), Err(VmError::ProgramTooLarge(5, 0, 4)));
    assert_eq!(vm.load(&[1, 2], 3), Err(VmError::ProgramTooLarge(2, 3, 4)));
    assert_eq!(vm.memory(), &[0, 0, 0, 0]);
}

#[test]
fn word_wraparound() {
    let mut config = CoreConfig::default();
    config.word = WordSize::W8;
    let mut vm = Vm::<OiscInstr>::with(config);
    vm.load(&[6, 7, 3, -1, 0, 0, -1, 127], 0).unwrap();
    vm.step().unwrap();
    assert_eq!(vm.mem(7), Ok(-128));
    assert_eq!(vm.pc(), 3);
}

#[test]
fn tisc_move_and_halt() {
    let src = "
            move    dst, src
            subleq  one, dst, done      ; 42 - 1 stays positive
            move    dst, src            ; executed on fall-through
    done:   move    -1, 0
    src:    .word   42
    dst:    .word   0
    one:    .word   1
    ";
    let mut vm = Vm::<TiscInstr>::new();
    let program = vm.assemble(src, 0).unwrap();
    assert_eq!(run(&mut vm, &program), Run { steps: 4, stop: Stop::Halted });
    assert_eq!(vm.mem(14), Ok(42));
    assert_eq!(vm.mem(13), Ok(42));
}

#[test]
fn invalid_opcode() {
    let mut vm = Vm::<TiscInstr>::new();
    vm.load(&[7, 0, 0], 0).unwrap();
    assert_eq!(vm.step(), Err(VmError::InvalidOpcode(7, Profile::Tisc)));
    assert_eq!(vm.pc(), 0);
    assert!(!vm.is_halted());

    let mut vm = Vm::<OccamInstr>::new();
    vm.load(&[8], 0).unwrap();
    assert_eq!(vm.run(10), Err(VmError::InvalidOpcode(8, Profile::Occam8)));
}

#[test]
fn padded_layout() {
    let code = minasm! { TiscInstr =>
        move    9, 8;
        move    -1, 0;
    };
    let program = Program::assemble(&code, 0, Layout::Padded);
    assert_eq!(program.cells(), &[0, 9, 8, 0, 0, -1, 0, 0]);
    let mut config = CoreConfig::default();
    config.layout = Layout::Padded;
    let mut vm = Vm::<TiscInstr>::with(config);
    vm.load(&[77], 8).unwrap();
    assert_eq!(run(&mut vm, &program), Run { steps: 2, stop: Stop::Halted });
    assert_eq!(vm.mem(9), Ok(77));
    assert_eq!(vm.pc(), 4);
}

#[test]
fn trisc_registers() {
    let code = minasm! { TriInstr =>
        load    0, 13;
        load    1, 14;
        sub     0, 1, 15;
        load    -1, 0;
    };
    let program = Program::assemble(&code, 0, Layout::Packed).with_data(&[9, 4, 0]);
    let mut vm = Vm::<TriInstr>::new();
    assert_eq!(run(&mut vm, &program), Run { steps: 4, stop: Stop::Halted });
    assert_eq!(vm.reg(0), Ok(5));
    assert_eq!(vm.reg(1), Ok(4));
    assert_eq!(vm.mem(15), Ok(5));
}

#[test]
fn failed_register_steps_leave_state_untouched() {
    let code = minasm! { TriInstr =>
        load    0, 13;
        load    1, 14;
        sub     0, 1, 999;
        load    -1, 0;
    };
    let program = Program::assemble(&code, 0, Layout::Packed).with_data(&[9, 4]);
    let mut vm = Vm::<TriInstr>::new();
    vm.load_program(&program).unwrap();
    assert_eq!(vm.run(2), Ok(Run { steps: 2, stop: Stop::StepLimitExceeded }));
    let core = vm.core().clone();
    assert_eq!(vm.step(), Err(VmError::AddressOutOfRange(Space::Memory, 999, 256)));
    assert_eq!(vm.core(), &core);
    assert_eq!(vm.reg(0), Ok(9));
    assert_eq!(vm.pc(), 6);

    let code = minasm! { OccamInstr =>
        load    0, 7;
        add     0, 999;
        halt;
    };
    let program = Program::assemble(&code, 0, Layout::Packed).with_data(&[5]);
    let mut vm = Vm::<OccamInstr>::new();
    vm.load_program(&program).unwrap();
    assert_eq!(vm.step(), Ok(Status::Running));
    let core = vm.core().clone();
    assert_eq!(vm.step(), Err(VmError::AddressOutOfRange(Space::Memory, 999, 256)));
    assert_eq!(vm.core(), &core);
    assert_eq!(vm.reg(0), Ok(5));
    assert_eq!(vm.pc(), 3);
}

#[test]
fn trisc_countdown() {
    let src = "
            load    r0, start
            load    r1, one
            load    r2, minus
    loop:   sub     r0, r1, counter
            jlz     r0, done
            jlz     r2, loop            ; r2 is always negative
    done:   load    -1, 0
    start:  .word   3
    one:    .word   1
    minus:  .word   -1
    counter: .word  0
    ";
    let mut vm = Vm::<TriInstr>::new();
    let program = vm.assemble(src, 0).unwrap();
    assert_eq!(run(&mut vm, &program), Run { steps: 15, stop: Stop::Halted });
    assert_eq!(vm.reg(0), Ok(-1));
    assert_eq!(vm.mem(program.end() - 1), Ok(-1));
}

#[test]
fn occam_multiplication() {
    let src = "
            load    r1, n
    loop:   jz      r1, end
            add     r0, factor
            add     r1, minus
            jmp     loop
    end:    store   r0, result
            nop
            halt
    n:      .word   4
    factor: .word   3
    minus:  .word   -1
    result: .word   0
    ";
    let mut vm = Vm::<OccamInstr>::new();
    let program = vm.assemble(src, 0).unwrap();
    let run = run(&mut vm, &program);
    assert_eq!(run, Run { steps: 1 + 4 * 4 + 1 + 3, stop: Stop::Halted });
    assert_eq!(vm.inspect(Loc::Reg(0)), Ok(12));
    assert_eq!(vm.mem(program.end() - 1), Ok(12));
}

#[test]
fn cross_profile_addition() {
    let sources = [
        (Profile::Oisc, "
                subleq  a, z, l1
        l1:     subleq  z, b, l2
        l2:     subleq  z, z, end
        end:    subleq  -1, 0, 0
        a:      .word   2
        b:      .word   3
        z:      .word   0
        "),
        (Profile::Tisc, "
                subleq  a, z, l1
        l1:     subleq  z, b, l2
        l2:     move    z, zero
                move    -1, 0
        a:      .word   2
        b:      .word   3
        z:      .word   0
        zero:   .word   0
        "),
        (Profile::TriIsc, "
                load    r0, zero
                load    r1, b
                sub     r0, r1, tmp
                load    r2, a
                sub     r2, r0, b
                load    -1, 0
        a:      .word   2
        b:      .word   3
        zero:   .word   0
        tmp:    .word   0
        "),
        (Profile::Occam8, "
                load    r0, a
                add     r0, b
                store   r0, b
                halt
        a:      .word   2
        b:      .word   3
        "),
    ];
    for (profile, src) in sources {
        let mut vm = AnyVm::with(profile, CoreConfig::default());
        let program = vm.assemble(src, 0).unwrap();
        vm.load_program(&program).unwrap();
        let run = vm.run(STEPS).unwrap();
        assert_eq!(run.stop, Stop::Halted, "{profile}");
        let result = match profile {
            Profile::Oisc => 13,
            Profile::Tisc => 15,
            Profile::TriIsc => 21,
            Profile::Occam8 => 11,
        };
        assert_eq!(vm.inspect(Loc::Mem(result)), Ok(5), "{profile}");
    }
}

#[test]
fn program_relocation() {
    let src = "
    start:  subleq  y, x, done
    done:   subleq  -1, 0, 0
    x:      .word   10
    y:      .word   4
    ";
    let mut vm = Vm::<OiscInstr>::new();
    let program = vm.assemble(src, 100).unwrap();
    let id = vm.load_program(&program).unwrap();
    assert_eq!(id, program.id());
    assert_eq!(vm.pc(), 100);
    assert_eq!(vm.run(STEPS).unwrap().stop, Stop::Halted);
    assert_eq!(vm.mem(106), Ok(6));
    assert_eq!(vm.memory()[..100], [0 as Cell; 100]);
}

#[test]
fn pc_stays_in_memory() {
    let mut vm = Vm::<OiscInstr>::with(CoreConfig::with_memory(16));
    vm.load(&[12, 13, 6, 14, 14, 0, 15, 15, 0, 0, 0, 0, 1, 100, 0, 0], 0).unwrap();
    for _ in 0..200 {
        match vm.step() {
            Ok(Status::Running) => assert!(vm.pc() < 16),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn inspect_is_idempotent() {
    let mut vm = Vm::<OccamInstr>::new();
    vm.load(&[1, 3, 4, 6, 11], 0).unwrap();
    vm.run(STEPS).unwrap();
    let state = vm.clone();
    for loc in [Loc::Reg(3), Loc::Mem(4), Loc::Mem(255)] {
        assert_eq!(vm.inspect(loc), vm.inspect(loc));
    }
    assert_eq!(vm.inspect(Loc::Reg(3)), Ok(11));
    assert_eq!(vm.inspect(Loc::Mem(256)), Err(VmError::AddressOutOfRange(Space::Memory, 256, 256)));
    assert_eq!(vm, state);
}

#[test]
fn reset_and_rerun() {
    let code = minasm! { OiscInstr =>
        subleq  4, 3, 0;
    };
    let mut vm = Vm::<OiscInstr>::new();
    vm.load_program(&Program::assemble(&code, 0, Layout::Packed).with_data(&[-1])).unwrap();
    assert_eq!(vm.run(3), Ok(Run { steps: 3, stop: Stop::StepLimitExceeded }));
    vm.reset();
    assert_eq!(vm.memory().iter().filter(|cell| **cell != 0).count(), 0);
    assert_eq!(vm.pc(), 0);
}
