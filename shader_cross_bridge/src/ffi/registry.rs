//! Process-wide compiler handle arena
//!
//! Handles are slotmap keys packed into a `u64`. Each slot holds its compiler
//! behind its own mutex, so the arena lock is only held for lookups and calls
//! on different handles run in parallel. A deleted handle keeps failing with
//! `InvalidHandle` because its slot generation no longer matches.

use std::sync::{Arc, Mutex, OnceLock};

use shader_cross::{Compiler, Result};
use slotmap::{new_key_type, Key, KeyData, SlotMap};

use super::types::ScInternalCompilerHandle;

const SOURCE: &str = "shader_cross_bridge::ffi::registry";

new_key_type! {
    struct CompilerKey;
}

type SharedCompiler = Arc<Mutex<Compiler>>;

// ===== INTERNAL STATE =====

static REGISTRY: OnceLock<Mutex<SlotMap<CompilerKey, SharedCompiler>>> = OnceLock::new();

fn registry() -> &'static Mutex<SlotMap<CompilerKey, SharedCompiler>> {
    REGISTRY.get_or_init(|| Mutex::new(SlotMap::with_key()))
}

fn key_of(handle: ScInternalCompilerHandle) -> CompilerKey {
    CompilerKey::from(KeyData::from_ffi(handle))
}

fn poisoned(what: &str) -> shader_cross::Error {
    shader_cross::cross_err!(SOURCE, Internal, "{} lock poisoned", what)
}

// ===== PUBLIC API =====

/// Register `compiler` and return its handle (never 0)
pub(super) fn insert(compiler: Compiler) -> Result<ScInternalCompilerHandle> {
    let mut arena = registry().lock().map_err(|_| poisoned("Compiler registry"))?;
    let key = arena.insert(Arc::new(Mutex::new(compiler)));
    let handle = key.data().as_ffi();
    shader_cross::cross_debug!(SOURCE, "Registered compiler handle {:#x} ({} live)", handle, arena.len());
    Ok(handle)
}

/// Drop the compiler behind `handle`
pub(super) fn remove(handle: ScInternalCompilerHandle) -> Result<()> {
    let mut arena = registry().lock().map_err(|_| poisoned("Compiler registry"))?;
    match arena.remove(key_of(handle)) {
        Some(_) => {
            shader_cross::cross_debug!(SOURCE, "Deleted compiler handle {:#x} ({} live)", handle, arena.len());
            Ok(())
        }
        None => shader_cross::cross_bail!(SOURCE, InvalidHandle, "Invalid compiler handle {:#x}", handle),
    }
}

/// Run `f` with exclusive access to the compiler behind `handle`
pub(super) fn with_compiler<R>(
    handle: ScInternalCompilerHandle,
    f: impl FnOnce(&mut Compiler) -> Result<R>,
) -> Result<R> {
    let shared = {
        let arena = registry().lock().map_err(|_| poisoned("Compiler registry"))?;
        match arena.get(key_of(handle)) {
            Some(shared) => Arc::clone(shared),
            None => shader_cross::cross_bail!(SOURCE, InvalidHandle, "Invalid compiler handle {:#x}", handle),
        }
    };
    let mut compiler = shared.lock().map_err(|_| poisoned("Compiler"))?;
    f(&mut compiler)
}

pub(super) fn live_count() -> usize {
    registry().lock().map_or(0, |arena| arena.len())
}
