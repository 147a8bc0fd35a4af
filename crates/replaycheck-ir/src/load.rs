//! Loading program files.
//!
//! A program file is the JSON serialization of [`Program`] as exported by a
//! frontend. Loading validates every cross-arena index up front so the
//! analyses can use plain indexing afterwards.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::{Program, TypeKind, ValueKind};

/// Errors produced while loading a program file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("unable to read program file: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid program JSON.
    #[error("malformed program file: {0}")]
    Json(#[from] serde_json::Error),
    /// The program refers to arena slots that do not exist, or is
    /// structurally inconsistent.
    #[error("ill-formed program: {0}")]
    Invalid(String),
}

/// Load and finalize the program at `path`.
pub fn load_program(path: &Path) -> Result<Program, LoadError> {
    let file = File::open(path)?;
    read_program(BufReader::new(file))
}

/// Load and finalize a program from any reader.
pub fn read_program(reader: impl Read) -> Result<Program, LoadError> {
    let mut program: Program = serde_json::from_reader(reader)?;
    validate(&program).map_err(LoadError::Invalid)?;
    program.rebuild_referrers();
    Ok(program)
}

fn validate(program: &Program) -> Result<(), String> {
    let packages = program.packages().count() as u32;
    let functions = program.functions().count() as u32;
    let values = program.values().count() as u32;
    let types = program.types().count() as u32;

    for (_, pkg) in program.packages() {
        for &func in &pkg.functions {
            if func >= functions {
                return Err(format!(
                    "package {} lists unknown function {func}",
                    pkg.path
                ));
            }
        }
    }

    for (id, f) in program.functions() {
        if let Some(pkg) = f.package
            && pkg >= packages
        {
            return Err(format!("function {} names unknown package {pkg}", f.name));
        }
        if let Some(parent) = f.parent
            && parent >= functions
        {
            return Err(format!("function {} names unknown parent {parent}", f.name));
        }
        if f.has_receiver && f.params.is_empty() {
            return Err(format!(
                "function {} is marked as a method but has no parameters",
                f.name
            ));
        }
        for param in f.params.iter().chain(&f.free_vars) {
            if param.ty >= types {
                return Err(format!(
                    "function {} refers to unknown type {}",
                    f.name, param.ty
                ));
            }
        }
        for (index, site) in f.call_sites.iter().enumerate() {
            if site.callee >= functions {
                return Err(format!(
                    "callsite {index} of function {id} calls unknown function {}",
                    site.callee
                ));
            }
            if site.operands.is_empty() {
                return Err(format!(
                    "callsite {index} of function {id} is missing its callee operand"
                ));
            }
            for &operand in &site.operands {
                if operand >= values {
                    return Err(format!(
                        "callsite {index} of function {id} refers to unknown value {operand}"
                    ));
                }
            }
        }
    }

    for (id, value) in program.values() {
        for operand in value.operands() {
            if operand >= values {
                return Err(format!("value {id} refers to unknown value {operand}"));
            }
        }
        match value {
            ValueKind::FuncRef { func }
            | ValueKind::Parameter { func, .. }
            | ValueKind::MakeClosure { func, .. }
                if *func >= functions =>
            {
                return Err(format!("value {id} refers to unknown function {func}"));
            }
            _ => {}
        }
    }

    for (id, ty) in program.types() {
        if let TypeKind::Pointer { elem } = ty
            && *elem >= types
        {
            return Err(format!("type {id} points at unknown type {elem}"));
        }
    }

    Ok(())
}
