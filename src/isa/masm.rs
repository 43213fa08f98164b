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

/// Macro assembler for the minimal instruction sets.
///
/// Takes the name of an instruction set type from [`crate::isa`] followed by `=>` and a list of
/// `mnemonic operands;` statements, producing a `Vec` of instructions. Operands are arbitrary
/// expressions evaluating to [`crate::Cell`].
///
/// # Example
///
/// ```
/// use minvm::isa::{OiscInstr, TiscInstr};
/// use minvm::minasm;
///
/// let code = minasm! { TiscInstr =>
///     move    20, 10;
///     subleq  21, 20, 9;
///     move    -1, 0;
/// };
/// assert_eq!(code[1], TiscInstr::Subleq(21, 20, 9));
///
/// let z = 9;
/// let code = minasm! { OiscInstr => subleq z, z, 0; };
/// assert_eq!(code, [OiscInstr::Subleq(9, 9, 0)]);
/// ```
#[macro_export]
macro_rules! minasm {
    ($isa:ident => $( $tt:tt )+) => {{
        #[allow(unused_mut)]
        let mut code: Vec<$crate::isa::$isa> = vec![];
        $crate::minasm_inner! { $isa, code => $( $tt )+ }
        code
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! minasm_inner {
    // end of program
    { $isa:ident, $code:ident => } => { };
    // no operands
    { $isa:ident, $code:ident => $op:ident ; $($tt:tt)* } => {
        $code.push($crate::paste! { $crate::isa::$isa::[<$op:camel>] });
        $crate::minasm_inner! { $isa, $code => $( $tt )* }
    };
    // operands are expressions
    { $isa:ident, $code:ident => $op:ident $( $arg:expr ),+ ; $($tt:tt)* } => {
        $code.push($crate::paste! { $crate::isa::$isa::[<$op:camel>]( $( $arg ),+ ) });
        $crate::minasm_inner! { $isa, $code => $( $tt )* }
    };
}
