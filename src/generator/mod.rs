// uDashBoard: featherweight dashboard application.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

//! Lowers an AST [`Program`] to bytecode, grounded on
//! `examples/original_source/src/bytecode/BytecodeGenerator.{h,cpp}` and the
//! per-node `generate`/`generateForTypeChecking` methods in
//! `examples/original_source/src/ast/Codegen{,TypeChecking}.cpp`.
//!
//! Two bytecode tables come out of one AST: a value-mode [`BytecodeBlock`]
//! per function (plus one rooting the top-level program) and a separate
//! type-check-mode block alongside each one. The original interleaves both
//! modes into a single instruction stream (`endTypeChecking` emits `End`
//! then re-emits `Enter` before the value-mode tail); this generator keeps
//! them as two independent blocks instead, since `Interpreter::run` and
//! `Interpreter::run_type_check` are already two separate dispatch loops
//! over two separate register files (see DESIGN.md).
//!
//! A function's *own* parameter types resolve lexically within its
//! type-check block (`scope`, built left-to-right as each parameter is
//! processed, so a later parameter's annotation can name an earlier
//! inferred one, e.g. `idT(%T: Type, x: T)`). A *call site* to a
//! statically-known top-level function instead re-lowers that callee's
//! declared signature fresh, in its own throwaway scope, giving every call
//! its own instantiation of any inferred parameter rather than publishing
//! one shared type into the runtime environment.

use crate::ast::{Block, Declaration, Expr, FunctionDecl, Param, Program, Statement, TypeExpr};
use crate::bytecode::instruction::PENDING_TARGET;
use crate::bytecode::{BytecodeBlock, Instruction, Register};
use crate::cells::GcString;
use crate::diagnostics::SourceLocation;
use crate::heap::{CellRef, Heap};
use crate::value::Value;
use std::collections::HashMap;

/// Everything `generate_program` produces: the top-level value-mode block
/// (every nested function's own value block hangs off it via `NewFunction`)
/// and one type-check block per function plus one for the top level itself.
pub struct GeneratedProgram {
    pub value_block: BytecodeBlock,
    pub type_check_blocks: Vec<BytecodeBlock>,
}

#[derive(Clone)]
struct FunctionSignature {
    params: Vec<Param>,
    return_type: Option<TypeExpr>,
}

/// Register allocator plus compile-time name resolution for a value-mode
/// block. `locals` covers both this function's own parameters (bound up
/// front) and any name the block itself introduces further to the left in
/// the same scope (a top-level `let`, or an earlier top-level `function`);
/// anything else falls back to `GetGlobal`.
struct ValueGen {
    next_local: u32,
    locals: HashMap<String, Register>,
}

impl ValueGen {
    fn new() -> Self {
        ValueGen { next_local: 1, locals: HashMap::new() }
    }

    fn new_local(&mut self) -> Register {
        let r = Register::for_local(self.next_local);
        self.next_local += 1;
        r
    }

    fn bind(&mut self, name: &str, r: Register) {
        self.locals.insert(name.to_string(), r);
    }

    fn lookup(&self, name: &str) -> Option<Register> {
        self.locals.get(name).copied()
    }
}

/// The same role as `ValueGen`, but for a type-check block: every register
/// is a plain local (type-check blocks never receive arguments the way a
/// value-mode call does, so there is no parameter-register convention to
/// honor here; see `Interpreter::run_type_check`'s flat register file).
struct TypeGen {
    next_local: u32,
}

impl TypeGen {
    fn new() -> Self {
        TypeGen { next_local: 1 }
    }

    fn new_local(&mut self) -> Register {
        let r = Register::for_local(self.next_local);
        self.next_local += 1;
        r
    }
}

/// A statement's lowered value plus whether control has already left the
/// enclosing block (an explicit `return`): once `terminated` is set, a
/// caller stops walking sibling statements since they're unreachable.
struct StmtResult {
    value: Register,
    terminated: bool,
}

pub struct BytecodeGenerator<'a> {
    heap: &'a mut Heap,
    jit_threshold: u32,
    function_sigs: HashMap<String, FunctionSignature>,
}

impl<'a> BytecodeGenerator<'a> {
    pub fn new(heap: &'a mut Heap, jit_threshold: u32) -> Self {
        BytecodeGenerator { heap, jit_threshold, function_sigs: HashMap::new() }
    }

    pub fn generate_program(&mut self, program: &Program) -> GeneratedProgram {
        for decl in &program.declarations {
            if let Declaration::Function(f) = decl {
                self.function_sigs.insert(f.name.clone(), FunctionSignature { params: f.params.clone(), return_type: f.return_type.clone() });
            }
        }

        let mut value_block = BytecodeBlock::new("<top-level>", self.jit_threshold);
        let mut vg = ValueGen::new();
        let mut type_check_blocks = Vec::new();
        let mut last_result: Option<Register> = None;

        for decl in &program.declarations {
            match decl {
                Declaration::Lexical(l) => {
                    let v = match &l.init {
                        Some(e) => self.gen_expr_value(&mut value_block, &mut vg, e),
                        None => self.unit_value(&mut value_block, &mut vg, &l.location),
                    };
                    vg.bind(&l.name, v);
                    let id = value_block.add_identifier(&l.name);
                    value_block.emit(Instruction::SetGlobal { name: id, value: v }, Some(l.location.clone()));
                    last_result = Some(v);
                }
                Declaration::Function(f) => {
                    let nested = self.generate_function_value_block(f);
                    let nested_ref = self.heap.allocate_block(nested, &[]).expect("block allocator exhausted during generation");
                    let fi = value_block.add_function(nested_ref);
                    let dst = vg.new_local();
                    value_block.emit(Instruction::NewFunction { dst, function_index: fi }, Some(f.location.clone()));
                    vg.bind(&f.name, dst);
                    let id = value_block.add_identifier(&f.name);
                    value_block.emit(Instruction::SetGlobal { name: id, value: dst }, Some(f.location.clone()));
                    last_result = Some(dst);

                    type_check_blocks.push(self.generate_function_type_check_block(f));
                }
                Declaration::Statement(s) => {
                    let result = self.gen_statement_value(&mut value_block, &mut vg, s);
                    last_result = Some(result.value);
                }
            }
        }

        let result_reg = match last_result {
            Some(r) => r,
            None => self.unit_value(&mut value_block, &mut vg, &SourceLocation::synthetic()),
        };
        value_block.set_num_locals(vg.next_local - 1);
        value_block.emit(Instruction::Return { value: result_reg }, None);

        type_check_blocks.push(self.generate_top_level_type_check_block(program));

        GeneratedProgram { value_block, type_check_blocks }
    }

    // --- value mode ---

    fn generate_function_value_block(&mut self, f: &FunctionDecl) -> BytecodeBlock {
        let mut block = BytecodeBlock::new(f.name.clone(), self.jit_threshold);
        let mut vg = ValueGen::new();
        for (i, p) in f.params.iter().enumerate() {
            vg.bind(&p.name, Register::for_parameter(i as u32));
        }
        let result = self.gen_block_value(&mut block, &mut vg, &f.body);
        block.set_num_locals(vg.next_local - 1);
        if !result.terminated {
            block.emit(Instruction::Return { value: result.value }, Some(f.location.clone()));
        }
        block
    }

    fn unit_value(&mut self, block: &mut BytecodeBlock, vg: &mut ValueGen, loc: &SourceLocation) -> Register {
        let dst = vg.new_local();
        let idx = block.add_constant(Value::unit());
        block.emit(Instruction::LoadConstant { dst, index: idx }, Some(loc.clone()));
        dst
    }

    fn gen_block_value(&mut self, block: &mut BytecodeBlock, vg: &mut ValueGen, b: &Block) -> StmtResult {
        let mut result = StmtResult { value: self.unit_value(block, vg, &b.location), terminated: false };
        for stmt in &b.statements {
            result = self.gen_statement_value(block, vg, stmt);
            if result.terminated {
                break;
            }
        }
        result
    }

    fn gen_statement_value(&mut self, block: &mut BytecodeBlock, vg: &mut ValueGen, stmt: &Statement) -> StmtResult {
        match stmt {
            Statement::Expression(e) => StmtResult { value: self.gen_expr_value(block, vg, e), terminated: false },
            Statement::Block(b) => self.gen_block_value(block, vg, b),
            Statement::If { condition, then_branch, else_branch, location } => {
                let cond = self.gen_expr_value(block, vg, condition);
                let result_reg = vg.new_local();
                let jf_idx = block.emit(Instruction::JumpIfFalse { condition: cond, target: PENDING_TARGET }, Some(location.clone()));

                let then_result = self.gen_block_value(block, vg, then_branch);
                if !then_result.terminated {
                    block.emit(Instruction::GetLocal { dst: result_reg, src: then_result.value }, Some(location.clone()));
                }
                let jmp_idx = block.emit(Instruction::Jump { target: PENDING_TARGET }, Some(location.clone()));

                let else_start = block.instructions().len();
                block.instructions_mut()[jf_idx].patch_target(else_start);
                let else_result = match else_branch {
                    Some(eb) => self.gen_block_value(block, vg, eb),
                    None => StmtResult { value: self.unit_value(block, vg, location), terminated: false },
                };
                if !else_result.terminated {
                    block.emit(Instruction::GetLocal { dst: result_reg, src: else_result.value }, Some(location.clone()));
                }

                let end = block.instructions().len();
                block.instructions_mut()[jmp_idx].patch_target(end);
                StmtResult { value: result_reg, terminated: then_result.terminated && else_result.terminated }
            }
            Statement::Return { value, location } => {
                let r = match value {
                    Some(e) => self.gen_expr_value(block, vg, e),
                    None => self.unit_value(block, vg, location),
                };
                block.emit(Instruction::Return { value: r }, Some(location.clone()));
                StmtResult { value: r, terminated: true }
            }
        }
    }

    fn gen_expr_value(&mut self, block: &mut BytecodeBlock, vg: &mut ValueGen, e: &Expr) -> Register {
        match e {
            Expr::Identifier(name, loc) => {
                if let Some(r) = vg.lookup(name) {
                    r
                } else {
                    let dst = vg.new_local();
                    let id = block.add_identifier(name);
                    block.emit(Instruction::GetGlobal { dst, name: id }, Some(loc.clone()));
                    dst
                }
            }
            Expr::Number(n, loc) => {
                let dst = vg.new_local();
                let idx = block.add_constant(Value::number(*n));
                block.emit(Instruction::LoadConstant { dst, index: idx }, Some(loc.clone()));
                dst
            }
            Expr::Str(s, loc) => {
                let dst = vg.new_local();
                let r = self.heap.allocate_string(GcString::new(s.clone()), &[]).expect("string allocator exhausted during generation");
                let idx = block.add_constant(Value::cell(CellRef::Str(r)));
                block.emit(Instruction::LoadConstant { dst, index: idx }, Some(loc.clone()));
                dst
            }
            Expr::Bool(b, loc) => {
                let dst = vg.new_local();
                let idx = block.add_constant(Value::bool(*b));
                block.emit(Instruction::LoadConstant { dst, index: idx }, Some(loc.clone()));
                dst
            }
            Expr::Paren(inner, _) => self.gen_expr_value(block, vg, inner),
            Expr::Array(items, loc) => {
                let regs: Vec<Register> = items.iter().map(|it| self.gen_expr_value(block, vg, it)).collect();
                let dst = vg.new_local();
                block.emit(Instruction::NewArray { dst, items: regs }, Some(loc.clone()));
                dst
            }
            Expr::Object(fields, loc) => {
                let dst = vg.new_local();
                block.emit(Instruction::NewObject { dst }, Some(loc.clone()));
                for (name, v) in fields {
                    let vr = self.gen_expr_value(block, vg, v);
                    let id = block.add_identifier(name);
                    block.emit(Instruction::SetField { object: dst, name: id, value: vr }, Some(loc.clone()));
                }
                dst
            }
            Expr::Tuple(items, loc) => {
                let regs: Vec<Register> = items.iter().map(|it| self.gen_expr_value(block, vg, it)).collect();
                let dst = vg.new_local();
                block.emit(Instruction::NewTuple { dst, items: regs }, Some(loc.clone()));
                dst
            }
            Expr::Member { object, property, location } => {
                let obj = self.gen_expr_value(block, vg, object);
                let dst = vg.new_local();
                let id = block.add_identifier(property);
                block.emit(Instruction::GetField { dst, object: obj, name: id }, Some(location.clone()));
                dst
            }
            Expr::Subscript { target, index, location } => {
                let t = self.gen_expr_value(block, vg, target);
                let i = self.gen_expr_value(block, vg, index);
                let dst = vg.new_local();
                block.emit(Instruction::GetArrayIndex { dst, array: t, index: i }, Some(location.clone()));
                dst
            }
            Expr::Call { callee, args, location } => self.gen_call_value(block, vg, callee, args, location),
            // A type used where a value is expected has no runtime
            // representation in this crate: nothing value-mode ever
            // inspects a first-class type (`idT` ignores its own `%T`
            // parameter), so it lowers to `Unit`.
            Expr::Type(_, loc) => self.unit_value(block, vg, loc),
        }
    }

    /// `obj.m(args)` desugars to `m(obj, args)`: method calls have no
    /// separate "bound method" value, the receiver is just the call's first
    /// argument.
    fn gen_call_value(&mut self, block: &mut BytecodeBlock, vg: &mut ValueGen, callee: &Expr, args: &[Expr], location: &SourceLocation) -> Register {
        let (callee_reg, mut arg_regs) = match callee {
            Expr::Member { object, property, .. } => {
                let recv = self.gen_expr_value(block, vg, object);
                let callee_reg = if let Some(r) = vg.lookup(property) {
                    r
                } else {
                    let dst = vg.new_local();
                    let id = block.add_identifier(property);
                    block.emit(Instruction::GetGlobal { dst, name: id }, Some(location.clone()));
                    dst
                };
                (callee_reg, vec![recv])
            }
            _ => (self.gen_expr_value(block, vg, callee), Vec::new()),
        };
        for a in args {
            arg_regs.push(self.gen_expr_value(block, vg, a));
        }
        let dst = vg.new_local();
        block.emit(Instruction::Call { dst, callee: callee_reg, args: arg_regs }, Some(location.clone()));
        dst
    }

    // --- type-check mode ---

    fn generate_function_type_check_block(&mut self, f: &FunctionDecl) -> BytecodeBlock {
        let mut block = BytecodeBlock::new(format!("{}#typecheck", f.name), self.jit_threshold);
        let mut tg = TypeGen::new();
        let mut scope: HashMap<String, Register> = HashMap::new();
        for p in &f.params {
            let r = lower_param_type(&mut block, &mut tg, &scope, p);
            scope.insert(p.name.clone(), r);
        }
        let ret_reg = match &f.return_type {
            Some(te) => lower_type_expr(&mut block, &mut tg, &scope, te),
            None => named_type(&mut block, &mut tg, "Void", &f.location),
        };
        let body_ty = self.gen_block_type_check(&mut block, &mut tg, &scope, &f.body);

        let ok = tg.new_local();
        block.emit(Instruction::PushUnificationScope, Some(f.location.clone()));
        block.emit(Instruction::Unify { lhs: body_ty, rhs: ret_reg }, Some(f.location.clone()));
        block.emit(Instruction::PopUnificationScope { dst: ok }, Some(f.location.clone()));

        block.set_num_locals(tg.next_local - 1);
        block
    }

    fn generate_top_level_type_check_block(&mut self, program: &Program) -> BytecodeBlock {
        let mut block = BytecodeBlock::new("<top-level>#typecheck", self.jit_threshold);
        let mut tg = TypeGen::new();
        let scope: HashMap<String, Register> = HashMap::new();
        for decl in &program.declarations {
            // `let`/`function` declarations aren't themselves checked here
            // (a function's own body is checked by its own block above);
            // only bare top-level statements can contain a call site.
            if let Declaration::Statement(s) = decl {
                self.gen_statement_type_check(&mut block, &mut tg, &scope, s);
            }
        }
        block.set_num_locals(tg.next_local - 1);
        block
    }

    fn gen_block_type_check(&mut self, block: &mut BytecodeBlock, tg: &mut TypeGen, scope: &HashMap<String, Register>, b: &Block) -> Register {
        let mut result = named_type(block, tg, "Void", &b.location);
        for stmt in &b.statements {
            let (r, terminated) = self.gen_statement_type_check(block, tg, scope, stmt);
            result = r;
            if terminated {
                break;
            }
        }
        result
    }

    fn gen_statement_type_check(&mut self, block: &mut BytecodeBlock, tg: &mut TypeGen, scope: &HashMap<String, Register>, stmt: &Statement) -> (Register, bool) {
        match stmt {
            Statement::Expression(e) => (self.gen_expr_type_check(block, tg, scope, e), false),
            Statement::Block(b) => (self.gen_block_type_check(block, tg, scope, b), false),
            Statement::If { condition, then_branch, else_branch, location } => {
                self.gen_expr_type_check(block, tg, scope, condition);
                let then_ty = self.gen_block_type_check(block, tg, scope, then_branch);
                if let Some(eb) = else_branch {
                    self.gen_block_type_check(block, tg, scope, eb);
                } else {
                    named_type(block, tg, "Void", location);
                }
                // The if-as-expression value is the consequent branch's
                // type; nothing needs the alternate branch's type to agree
                // with it, so it's never unified against.
                (then_ty, false)
            }
            Statement::Return { value, location } => {
                let r = match value {
                    Some(e) => self.gen_expr_type_check(block, tg, scope, e),
                    None => named_type(block, tg, "Void", location),
                };
                (r, true)
            }
        }
    }

    fn gen_expr_type_check(&mut self, block: &mut BytecodeBlock, tg: &mut TypeGen, scope: &HashMap<String, Register>, e: &Expr) -> Register {
        match e {
            Expr::Identifier(name, loc) => match scope.get(name) {
                Some(r) => {
                    let dst = tg.new_local();
                    block.emit(Instruction::ResolveType { dst, src: *r }, Some(loc.clone()));
                    dst
                }
                // Not one of this function's own parameters: a top-level
                // `let`, a builtin, or anything else this generator doesn't
                // track statically. Permissive: treat it as unconstrained.
                None => named_var(block, tg, name, loc),
            },
            Expr::Number(_, loc) => named_type(block, tg, "Number", loc),
            Expr::Str(_, loc) => named_type(block, tg, "String", loc),
            Expr::Bool(_, loc) => named_type(block, tg, "Bool", loc),
            Expr::Paren(inner, _) => self.gen_expr_type_check(block, tg, scope, inner),
            Expr::Type(te, _) => lower_type_expr(block, tg, scope, te),
            Expr::Array(items, loc) => {
                for it in items {
                    self.gen_expr_type_check(block, tg, scope, it);
                }
                named_var(block, tg, "_", loc)
            }
            Expr::Object(fields, loc) => {
                for (_, v) in fields {
                    self.gen_expr_type_check(block, tg, scope, v);
                }
                named_var(block, tg, "_", loc)
            }
            Expr::Tuple(items, loc) => {
                for it in items {
                    self.gen_expr_type_check(block, tg, scope, it);
                }
                named_var(block, tg, "_", loc)
            }
            Expr::Member { object, property, location } => {
                let obj = self.gen_expr_type_check(block, tg, scope, object);
                let id = block.add_identifier(property);
                let hole = tg.new_local();
                block.emit(Instruction::NewMemberHole { dst: hole, object: obj, property: id }, Some(location.clone()));
                hole_value_type(block, tg, hole, location)
            }
            Expr::Subscript { target, index, location } => {
                let t = self.gen_expr_type_check(block, tg, scope, target);
                let i = self.gen_expr_type_check(block, tg, scope, index);
                let hole = tg.new_local();
                block.emit(Instruction::NewSubscriptHole { dst: hole, target: t, index: i }, Some(location.clone()));
                hole_value_type(block, tg, hole, location)
            }
            Expr::Call { callee, args, location } => self.gen_call_type_check(block, tg, scope, callee, args, location),
        }
    }

    /// A call to a statically-known top-level function re-lowers that
    /// function's own declared signature fresh, in a scope private to this
    /// call site, then unifies each argument's type against the matching
    /// parameter. Anything else (a builtin, a call through a `let`-bound
    /// value, an unknown name) is walked for its own nested call sites but
    /// otherwise left unchecked.
    fn gen_call_type_check(
        &mut self,
        block: &mut BytecodeBlock,
        tg: &mut TypeGen,
        scope: &HashMap<String, Register>,
        callee: &Expr,
        args: &[Expr],
        location: &SourceLocation,
    ) -> Register {
        let (callee_name, effective_args): (Option<String>, Vec<&Expr>) = match callee {
            Expr::Member { object, property, .. } => (Some(property.clone()), std::iter::once(object.as_ref()).chain(args.iter()).collect()),
            Expr::Identifier(name, _) => (Some(name.clone()), args.iter().collect()),
            _ => (None, args.iter().collect()),
        };

        let sig = callee_name.as_deref().and_then(|n| self.function_sigs.get(n)).cloned();
        match sig {
            None => {
                let callee_ty = self.gen_expr_type_check(block, tg, scope, callee);
                let arg_tys: Vec<Register> = effective_args.iter().map(|a| self.gen_expr_type_check(block, tg, scope, a)).collect();
                let hole = tg.new_local();
                block.emit(Instruction::NewCallHole { dst: hole, callee: callee_ty, args: arg_tys }, Some(location.clone()));
                hole_value_type(block, tg, hole, location)
            }
            Some(sig) => {
                let mut call_scope: HashMap<String, Register> = HashMap::new();
                let mut param_regs = Vec::new();
                for p in &sig.params {
                    let r = lower_param_type(block, tg, &call_scope, p);
                    call_scope.insert(p.name.clone(), r);
                    param_regs.push(r);
                }
                let ret_reg = match &sig.return_type {
                    Some(te) => lower_type_expr(block, tg, &call_scope, te),
                    None => named_type(block, tg, "Void", location),
                };
                let fn_ty = tg.new_local();
                block.emit(Instruction::NewFunctionType { dst: fn_ty, params: param_regs.clone(), ret: ret_reg }, Some(location.clone()));

                let ok = tg.new_local();
                block.emit(Instruction::PushUnificationScope, Some(location.clone()));
                block.emit(Instruction::InferImplicitParameters { function: fn_ty }, Some(location.clone()));

                if effective_args.len() == param_regs.len() {
                    for (arg_expr, param_reg) in effective_args.iter().zip(param_regs.iter()) {
                        let arg_ty = self.gen_expr_type_check(block, tg, scope, arg_expr);
                        block.emit(Instruction::Unify { lhs: arg_ty, rhs: *param_reg }, Some(arg_expr.location().clone()));
                    }
                } else {
                    for a in &effective_args {
                        self.gen_expr_type_check(block, tg, scope, a);
                    }
                    let name = callee_name.unwrap_or_default();
                    block.emit(Instruction::TypeError { message: format!("wrong number of arguments to `{}`", name) }, Some(location.clone()));
                }
                block.emit(Instruction::PopUnificationScope { dst: ok }, Some(location.clone()));
                ret_reg
            }
        }
    }
}

fn named_type(block: &mut BytecodeBlock, tg: &mut TypeGen, name: &str, loc: &SourceLocation) -> Register {
    let dst = tg.new_local();
    let id = block.add_identifier(name);
    block.emit(Instruction::NewNameType { dst, name: id }, Some(loc.clone()));
    dst
}

fn named_var(block: &mut BytecodeBlock, tg: &mut TypeGen, display_name: &str, loc: &SourceLocation) -> Register {
    let dst = tg.new_local();
    block.emit(Instruction::NewVarType { dst, display_name: display_name.to_string(), rigid: false }, Some(loc.clone()));
    dst
}

/// Tags a freshly built hole as a symbolic operand and resolves it to the
/// type a `Unify` site can compare against: `NewValue` re-tags the hole
/// cell as abstract, `GetTypeForValue` then partially evaluates it against
/// the running environment, falling back to a fresh unconstrained type
/// variable for whatever part of it is still undecided.
fn hole_value_type(block: &mut BytecodeBlock, tg: &mut TypeGen, hole: Register, loc: &SourceLocation) -> Register {
    let tagged = tg.new_local();
    block.emit(Instruction::NewValue { dst: tagged, value: hole }, Some(loc.clone()));
    let dst = tg.new_local();
    block.emit(Instruction::GetTypeForValue { dst, value: tagged }, Some(loc.clone()));
    dst
}

fn lower_param_type(block: &mut BytecodeBlock, tg: &mut TypeGen, scope: &HashMap<String, Register>, p: &Param) -> Register {
    if p.inferred {
        let dst = tg.new_local();
        block.emit(Instruction::NewVarType { dst, display_name: p.name.clone(), rigid: false }, Some(p.location.clone()));
        dst
    } else {
        match &p.type_annotation {
            Some(te) => lower_type_expr(block, tg, scope, te),
            None => named_type(block, tg, "Top", &p.location),
        }
    }
}

/// Lowers a type expression into type-check instructions. `scope` resolves
/// a `Named` reference to an earlier parameter's own type register before
/// falling back to a nominal/interned lookup (`idT(%T: Type, x: T)`'s `x`
/// parameter names `T`, not the builtin `Number`/`String`/etc.).
fn lower_type_expr(block: &mut BytecodeBlock, tg: &mut TypeGen, scope: &HashMap<String, Register>, te: &TypeExpr) -> Register {
    match te {
        TypeExpr::Named(name, loc) => match scope.get(name) {
            Some(r) => {
                let dst = tg.new_local();
                block.emit(Instruction::ResolveType { dst, src: *r }, Some(loc.clone()));
                dst
            }
            None => named_type(block, tg, name, loc),
        },
        TypeExpr::Array(inner, loc) => {
            let item = lower_type_expr(block, tg, scope, inner);
            let dst = tg.new_local();
            block.emit(Instruction::NewArrayType { dst, item }, Some(loc.clone()));
            dst
        }
        TypeExpr::Tuple(items, loc) => {
            let regs: Vec<Register> = items.iter().map(|t| lower_type_expr(block, tg, scope, t)).collect();
            let dst = tg.new_local();
            block.emit(Instruction::NewTupleType { dst, items: regs }, Some(loc.clone()));
            dst
        }
        TypeExpr::Function { params, ret, location } => {
            let p: Vec<Register> = params.iter().map(|t| lower_type_expr(block, tg, scope, t)).collect();
            let r = lower_type_expr(block, tg, scope, ret);
            let dst = tg.new_local();
            block.emit(Instruction::NewFunctionType { dst, params: p, ret: r }, Some(location.clone()));
            dst
        }
        TypeExpr::Union(a, b, loc) => {
            let la = lower_type_expr(block, tg, scope, a);
            let lb = lower_type_expr(block, tg, scope, b);
            let dst = tg.new_local();
            block.emit(Instruction::NewUnionType { dst, lhs: la, rhs: lb }, Some(loc.clone()));
            dst
        }
        TypeExpr::Record(fields, loc) => {
            let resolved: Vec<(u32, Register)> = fields.iter().map(|(n, t)| (block.add_identifier(n), lower_type_expr(block, tg, scope, t))).collect();
            let dst = tg.new_local();
            block.emit(Instruction::NewRecordType { dst, fields: resolved }, Some(loc.clone()));
            dst
        }
    }
}
