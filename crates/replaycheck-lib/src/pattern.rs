//! Function patterns and their derivation from IR functions.
//!
//! A pattern names a function family as (package path, optional receiver
//! type, function name). Package paths are vendor-stripped at construction
//! so a library referenced through a vendored copy classifies identically
//! to the upstream one.

use std::fmt;

use replaycheck_ir::{FuncId, Program, TypeId, TypeKind};

/// Name suffix carried by synthetic bound-method closures.
const BOUND_SUFFIX: &str = "$bound";

/// Errors hit while deriving a pattern from a function.
///
/// These are recoverable: callers log them as warnings and keep going.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    /// The receiver has a shape patterns cannot name.
    #[error("unsupported receiver type {0}")]
    UnsupportedReceiver(String),
    /// The function has neither a receiver nor a defining package.
    #[error("function has no defining package")]
    NoPackage,
}

/// Identifies a function family in the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub package: String,
    /// Receiver type name; empty for package-level functions.
    pub receiver: String,
    pub method: String,
}

impl Pattern {
    /// A package-level function pattern.
    pub fn function(package: &str, method: &str) -> Self {
        Self {
            package: strip_vendor(package).to_string(),
            receiver: String::new(),
            method: method.to_string(),
        }
    }

    /// A method pattern on a named receiver type.
    pub fn method(package: &str, receiver: &str, method: &str) -> Self {
        Self {
            package: strip_vendor(package).to_string(),
            receiver: receiver.to_string(),
            method: method.to_string(),
        }
    }

    /// Derive the pattern `func` matches under, if any.
    ///
    /// Returns `Ok(None)` for functions that are never pattern-matchable:
    /// anonymous functions, and wrappers whose receiver is an anonymous
    /// struct. Both are still traversed as pass-through call-graph edges.
    ///
    /// The receiver type is taken from the first applicable source: an
    /// explicit receiver, the first parameter of a thunk, or the single
    /// free variable of a `$bound` closure.
    pub fn from_function(program: &Program, func: FuncId) -> Result<Option<Pattern>, PatternError> {
        let f = program.function(func);
        if f.is_anonymous() {
            return Ok(None);
        }

        let receiver_ty = if let Some(recv) = f.receiver() {
            Some(recv.ty)
        } else if f.is_thunk {
            f.params.first().map(|p| p.ty)
        } else if f.free_vars.len() == 1 && f.name.ends_with(BOUND_SUFFIX) {
            Some(f.free_vars[0].ty)
        } else {
            None
        };

        if let Some(ty) = receiver_ty {
            return match named_receiver(program, ty)? {
                Some((package, name)) => Ok(Some(Pattern {
                    package: strip_vendor(&package).to_string(),
                    receiver: name,
                    method: f.name.clone(),
                })),
                None => Ok(None),
            };
        }

        match f.package {
            Some(pkg) => Ok(Some(Pattern::function(&program.package(pkg).path, &f.name))),
            None => Err(PatternError::NoPackage),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.receiver.is_empty() {
            write!(f, "{}.{}", self.package, self.method)
        } else {
            write!(f, "{}.{}.{}", self.package, self.receiver, self.method)
        }
    }
}

/// Walk a receiver type through pointers to its named form.
///
/// `Ok(None)` for anonymous structs: those are bound-method wrappers whose
/// edges the call graph resolves to the method itself.
fn named_receiver(
    program: &Program,
    ty: TypeId,
) -> Result<Option<(String, String)>, PatternError> {
    let mut current = ty;
    for _ in 0..32 {
        match program.ty(current) {
            TypeKind::Named { package, name } => return Ok(Some((package.clone(), name.clone()))),
            TypeKind::Pointer { elem } => current = *elem,
            TypeKind::Struct => return Ok(None),
            TypeKind::Opaque { .. } => {
                return Err(PatternError::UnsupportedReceiver(program.type_display(ty)));
            }
        }
    }
    Err(PatternError::UnsupportedReceiver(program.type_display(ty)))
}

/// Strip any `…/vendor/` prefix so vendored copies match upstream paths.
pub fn strip_vendor(package: &str) -> &str {
    match package.rsplit_once("/vendor/") {
        Some((_, rest)) => rest,
        None => package,
    }
}
