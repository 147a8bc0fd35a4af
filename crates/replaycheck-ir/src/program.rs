//! The program handed to the analyses.
//!
//! A [`Program`] owns four arenas (packages, functions, values, types) plus
//! a reverse referrer index over the value graph. It is immutable once
//! finalized; the analyses only ever read it.

use serde::{Deserialize, Serialize};

use crate::{FuncId, PackageId, Span, TypeId, TypeKind, ValueId, ValueKind};

/// A formal parameter or free variable: a name paired with a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
}

/// One callsite inside a function body.
///
/// Operand layout: `operands[0]` is the callee slot (a function reference),
/// actual arguments start at index 1, and for method calls the receiver is
/// the first actual argument. Registration-argument extraction and
/// parameter back-propagation both rely on this layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub pos: Span,
    pub callee: FuncId,
    pub operands: Vec<ValueId>,
}

/// A function in the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub package: Option<PackageId>,
    #[serde(default)]
    pub pos: Option<Span>,
    /// The full runtime parameter list; for methods the receiver is
    /// `params[0]`.
    #[serde(default)]
    pub params: Vec<Param>,
    /// True when `params[0]` is a method receiver.
    #[serde(default)]
    pub has_receiver: bool,
    /// True for synthetic method-expression wrappers.
    #[serde(default)]
    pub is_thunk: bool,
    /// The enclosing function; set exactly for anonymous functions.
    #[serde(default)]
    pub parent: Option<FuncId>,
    /// Captured variables, for closures.
    #[serde(default)]
    pub free_vars: Vec<Param>,
    #[serde(default)]
    pub call_sites: Vec<CallSite>,
}

impl Function {
    /// The receiver parameter, when this function is a method.
    pub fn receiver(&self) -> Option<&Param> {
        if self.has_receiver {
            self.params.first()
        } else {
            None
        }
    }

    /// True for anonymous (nested) functions.
    pub fn is_anonymous(&self) -> bool {
        self.parent.is_some()
    }

    /// Position of `name` in the full parameter list.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

/// A package groups functions under an import path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FuncId>,
}

/// An immutable whole-program IR.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub(crate) packages: Vec<Package>,
    #[serde(default)]
    pub(crate) functions: Vec<Function>,
    #[serde(default)]
    pub(crate) values: Vec<ValueKind>,
    #[serde(default)]
    pub(crate) types: Vec<TypeKind>,
    /// For each value, the nodes that mention it as an operand. Computed on
    /// finalization, not serialized.
    #[serde(skip)]
    pub(crate) referrers: Vec<Vec<ValueId>>,
}

impl Program {
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(id, pkg)| (id as PackageId, pkg))
    }

    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(id, f)| (id as FuncId, f))
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &ValueKind)> {
        self.values
            .iter()
            .enumerate()
            .map(|(id, v)| (id as ValueId, v))
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeKind)> {
        self.types
            .iter()
            .enumerate()
            .map(|(id, t)| (id as TypeId, t))
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id as usize]
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id as usize]
    }

    pub fn value(&self, id: ValueId) -> &ValueKind {
        &self.values[id as usize]
    }

    pub fn ty(&self, id: TypeId) -> &TypeKind {
        &self.types[id as usize]
    }

    /// The function named `name` declared directly in `pkg`, if any.
    pub fn package_function(&self, pkg: PackageId, name: &str) -> Option<FuncId> {
        self.package(pkg)
            .functions
            .iter()
            .copied()
            .find(|&f| self.function(f).name == name)
    }

    /// The callsite at `index` inside `func`.
    pub fn call_site(&self, func: FuncId, index: u32) -> &CallSite {
        &self.function(func).call_sites[index as usize]
    }

    /// Referrers of `value`: every node that mentions it as an operand.
    pub fn referrers(&self, value: ValueId) -> &[ValueId] {
        self.referrers
            .get(value as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Package-qualified display name: `pkg.func` for package-level
    /// functions, `(pkg.Type).method` for methods, the bare name for
    /// synthetic functions without a package.
    pub fn qualified_name(&self, func: FuncId) -> String {
        let f = self.function(func);
        if let Some(recv) = f.receiver() {
            return format!("({}).{}", self.type_display(recv.ty), f.name);
        }
        match f.package {
            Some(pkg) => format!("{}.{}", self.package(pkg).path, f.name),
            None => f.name.clone(),
        }
    }

    /// Human-readable rendering of a type.
    pub fn type_display(&self, ty: TypeId) -> String {
        let mut prefix = String::new();
        let mut current = ty;
        // Pointer chains are finite in well-formed programs; cap the walk
        // anyway since loader input is untrusted.
        for _ in 0..32 {
            match self.ty(current) {
                TypeKind::Pointer { elem } => {
                    prefix.push('*');
                    current = *elem;
                }
                TypeKind::Named { package, name } => {
                    return if package.is_empty() {
                        format!("{prefix}{name}")
                    } else {
                        format!("{prefix}{package}.{name}")
                    };
                }
                TypeKind::Struct => return format!("{prefix}struct{{..}}"),
                TypeKind::Opaque { display } => return format!("{prefix}{display}"),
            }
        }
        format!("{prefix}...")
    }

    /// Rebuild the referrer index after the value arena is complete.
    pub(crate) fn rebuild_referrers(&mut self) {
        let mut referrers = vec![Vec::new(); self.values.len()];
        for (id, value) in self.values.iter().enumerate() {
            for operand in value.operands() {
                referrers[operand as usize].push(id as ValueId);
            }
        }
        self.referrers = referrers;
    }
}
