//! Mutable program construction.
//!
//! [`ProgramBuilder`] is how frontends (and tests) assemble a [`Program`]:
//! allocate packages, functions, types, and values, wire callsites, then
//! `finish()` into the immutable form with its referrer index computed.

use crate::{
    CallSite, FuncId, Function, Package, PackageId, Param, Program, Span, TypeId, TypeKind,
    UnaryOp, ValueId, ValueKind,
};

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_package(&mut self, path: impl Into<String>, name: impl Into<String>) -> PackageId {
        let id = self.program.packages.len() as PackageId;
        self.program.packages.push(Package {
            path: path.into(),
            name: name.into(),
            functions: Vec::new(),
        });
        id
    }

    /// Declare a function. Package membership is recorded on both sides.
    pub fn add_function(&mut self, package: Option<PackageId>, name: impl Into<String>) -> FuncId {
        let id = self.program.functions.len() as FuncId;
        self.program.functions.push(Function {
            name: name.into(),
            package,
            pos: None,
            params: Vec::new(),
            has_receiver: false,
            is_thunk: false,
            parent: None,
            free_vars: Vec::new(),
            call_sites: Vec::new(),
        });
        if let Some(pkg) = package {
            self.program.packages[pkg as usize].functions.push(id);
        }
        id
    }

    pub fn set_pos(&mut self, func: FuncId, pos: Span) {
        self.program.functions[func as usize].pos = Some(pos);
    }

    pub fn set_parent(&mut self, func: FuncId, parent: FuncId) {
        self.program.functions[func as usize].parent = Some(parent);
    }

    pub fn mark_thunk(&mut self, func: FuncId) {
        self.program.functions[func as usize].is_thunk = true;
    }

    /// Install a method receiver as the first parameter.
    pub fn set_receiver(&mut self, func: FuncId, name: impl Into<String>, ty: TypeId) {
        let f = &mut self.program.functions[func as usize];
        f.params.insert(
            0,
            Param {
                name: name.into(),
                ty,
            },
        );
        f.has_receiver = true;
    }

    pub fn add_param(&mut self, func: FuncId, name: impl Into<String>, ty: TypeId) {
        self.program.functions[func as usize].params.push(Param {
            name: name.into(),
            ty,
        });
    }

    pub fn add_free_var(&mut self, func: FuncId, name: impl Into<String>, ty: TypeId) {
        self.program.functions[func as usize].free_vars.push(Param {
            name: name.into(),
            ty,
        });
    }

    pub fn named_type(&mut self, package: impl Into<String>, name: impl Into<String>) -> TypeId {
        self.add_type(TypeKind::Named {
            package: package.into(),
            name: name.into(),
        })
    }

    pub fn pointer_type(&mut self, elem: TypeId) -> TypeId {
        self.add_type(TypeKind::Pointer { elem })
    }

    pub fn struct_type(&mut self) -> TypeId {
        self.add_type(TypeKind::Struct)
    }

    pub fn opaque_type(&mut self, display: impl Into<String>) -> TypeId {
        self.add_type(TypeKind::Opaque {
            display: display.into(),
        })
    }

    pub fn func_ref(&mut self, func: FuncId) -> ValueId {
        self.add_value(ValueKind::FuncRef { func })
    }

    pub fn make_interface(&mut self, operand: ValueId) -> ValueId {
        self.add_value(ValueKind::MakeInterface { operand })
    }

    pub fn phi(&mut self, edges: &[ValueId]) -> ValueId {
        self.add_value(ValueKind::Phi {
            edges: edges.to_vec(),
        })
    }

    pub fn un_op(&mut self, op: UnaryOp, operand: ValueId) -> ValueId {
        self.add_value(ValueKind::UnOp { op, operand })
    }

    pub fn parameter(&mut self, func: FuncId, name: impl Into<String>) -> ValueId {
        self.add_value(ValueKind::Parameter {
            func,
            name: name.into(),
        })
    }

    pub fn make_closure(&mut self, func: FuncId, bindings: &[ValueId]) -> ValueId {
        self.add_value(ValueKind::MakeClosure {
            func,
            bindings: bindings.to_vec(),
        })
    }

    pub fn slice(&mut self, base: ValueId) -> ValueId {
        self.add_value(ValueKind::Slice { base })
    }

    pub fn alloc(&mut self) -> ValueId {
        self.add_value(ValueKind::Alloc)
    }

    pub fn index_addr(&mut self, base: ValueId, index: Option<ValueId>) -> ValueId {
        self.add_value(ValueKind::IndexAddr { base, index })
    }

    pub fn store(&mut self, addr: ValueId, value: ValueId) -> ValueId {
        self.add_value(ValueKind::Store { addr, value })
    }

    pub fn opaque_value(&mut self, display: impl Into<String>) -> ValueId {
        self.add_value(ValueKind::Opaque {
            display: display.into(),
        })
    }

    /// Record a call from `caller` to `callee`. The callee-slot operand is
    /// created automatically; `args` are the actual arguments, receiver
    /// first for method calls.
    pub fn add_call(&mut self, caller: FuncId, pos: Span, callee: FuncId, args: &[ValueId]) {
        let slot = self.func_ref(callee);
        let mut operands = Vec::with_capacity(args.len() + 1);
        operands.push(slot);
        operands.extend_from_slice(args);
        self.program.functions[caller as usize].call_sites.push(CallSite {
            pos,
            callee,
            operands,
        });
    }

    pub fn finish(mut self) -> Program {
        self.program.rebuild_referrers();
        self.program
    }

    fn add_value(&mut self, value: ValueKind) -> ValueId {
        let id = self.program.values.len() as ValueId;
        self.program.values.push(value);
        id
    }

    fn add_type(&mut self, ty: TypeKind) -> TypeId {
        let id = self.program.types.len() as TypeId;
        self.program.types.push(ty);
        id
    }
}
