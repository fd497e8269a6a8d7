//! Form runtime: program text -> executable module.
//!
//! Forms are WebAssembly (text or binary). Compilation and linking happen
//! once per cache entry; every render gets a fresh `Store` with a fuel
//! budget, so a form cannot keep state between renders or spin forever.
//!
//! Host interface offered to forms:
//! - `ui.heading|text|field|button(ptr, len)` append a node
//! - `host.param(key_ptr, key_len, out_ptr, out_cap) -> i32` copies an
//!   advisory dashboard parameter into form memory (`-1` when absent)

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use wasmtime::{Caller, Config, Engine, ExternType, InstancePre, Linker, Memory, Module, Store};

use formhost_core::error::{FormHostError, FormLoadError, LoadFailure, Result};
use formhost_core::model::DashboardParameters;

/// Name of the required entry export.
pub const DEFAULT_EXPORT: &str = "default";

/// One UI primitive emitted by a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiNode {
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderOutput {
    pub nodes: Vec<UiNode>,
}

/// Advisory context handed to a render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub parameters: Option<DashboardParameters>,
}

/// An instantiated form, ready to render.
pub trait FormModule: Send + Sync {
    fn form(&self) -> &str;
    fn render(&self, ctx: &RenderContext) -> Result<RenderOutput>;
}

impl fmt::Debug for dyn FormModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormModule").field("form", &self.form()).finish()
    }
}

/// Converts program text into a module handle.
pub trait FormRuntime: Send + Sync {
    fn instantiate(
        &self,
        form: &str,
        code: &[u8],
    ) -> std::result::Result<Arc<dyn FormModule>, FormLoadError>;
}

struct RenderState {
    parameters: Option<DashboardParameters>,
    nodes: Vec<UiNode>,
}

fn guest_memory(caller: &mut Caller<'_, RenderState>) -> Option<Memory> {
    caller.get_export("memory").and_then(|e| e.into_memory())
}

fn read_guest_str(caller: &mut Caller<'_, RenderState>, ptr: i32, len: i32) -> Option<String> {
    let memory = guest_memory(caller)?;
    let start = usize::try_from(ptr).ok()?;
    let end = start.checked_add(usize::try_from(len).ok()?)?;
    let bytes = memory.data(&*caller).get(start..end)?;
    String::from_utf8(bytes.to_vec()).ok()
}

fn push_node(caller: &mut Caller<'_, RenderState>, kind: &'static str, ptr: i32, len: i32) {
    match read_guest_str(caller, ptr, len) {
        Some(text) => caller.data_mut().nodes.push(UiNode { kind, text }),
        None => tracing::warn!(kind, ptr, len, "form passed an invalid string to the host"),
    }
}

fn copy_param(caller: &mut Caller<'_, RenderState>, key: (i32, i32), out: (i32, i32)) -> i32 {
    let Some(name) = read_guest_str(caller, key.0, key.1) else { return -1 };
    let value = caller
        .data()
        .parameters
        .as_ref()
        .and_then(|p| p.get(&name))
        .map(|v| v.as_bytes().to_vec());
    let Some(value) = value else { return -1 };

    let (Ok(offset), Ok(cap)) = (usize::try_from(out.0), usize::try_from(out.1)) else {
        return -1;
    };
    if value.len() > cap {
        return -1;
    }
    let Some(memory) = guest_memory(caller) else { return -1 };
    if memory.write(&mut *caller, offset, &value).is_err() {
        return -1;
    }
    i32::try_from(value.len()).unwrap_or(-1)
}

fn build_linker(engine: &Engine) -> wasmtime::Result<Linker<RenderState>> {
    let mut linker = Linker::new(engine);
    for kind in ["heading", "text", "field", "button"] {
        linker.func_wrap(
            "ui",
            kind,
            move |mut caller: Caller<'_, RenderState>, ptr: i32, len: i32| {
                push_node(&mut caller, kind, ptr, len);
            },
        )?;
    }
    linker.func_wrap(
        "host",
        "param",
        |mut caller: Caller<'_, RenderState>, kp: i32, kl: i32, op: i32, oc: i32| -> i32 {
            copy_param(&mut caller, (kp, kl), (op, oc))
        },
    )?;
    Ok(linker)
}

/// wasmtime-backed runtime. One engine and linker shared by all forms.
pub struct WasmFormRuntime {
    engine: Engine,
    linker: Linker<RenderState>,
    fuel: u64,
}

impl WasmFormRuntime {
    pub fn new(fuel: u64) -> Result<Self> {
        let mut config = Config::new();
        config.consume_fuel(true);
        let engine = Engine::new(&config)
            .map_err(|e| FormHostError::Internal(format!("wasm engine init failed: {e}")))?;
        let linker = build_linker(&engine)
            .map_err(|e| FormHostError::Internal(format!("wasm linker init failed: {e}")))?;
        Ok(Self {
            engine,
            linker,
            fuel,
        })
    }
}

impl FormRuntime for WasmFormRuntime {
    fn instantiate(
        &self,
        form: &str,
        code: &[u8],
    ) -> std::result::Result<Arc<dyn FormModule>, FormLoadError> {
        let module = Module::new(&self.engine, code)
            .map_err(|e| FormLoadError::new(form, LoadFailure::Compile, e.to_string()))?;

        let has_default = module
            .exports()
            .any(|e| e.name() == DEFAULT_EXPORT && matches!(e.ty(), ExternType::Func(_)));
        if !has_default {
            return Err(FormLoadError::malformed(form));
        }

        let pre = self
            .linker
            .instantiate_pre(&module)
            .map_err(|e| FormLoadError::new(form, LoadFailure::Instantiate, e.to_string()))?;

        Ok(Arc::new(WasmFormModule {
            form: form.to_string(),
            engine: self.engine.clone(),
            pre,
            fuel: self.fuel,
        }))
    }
}

struct WasmFormModule {
    form: String,
    engine: Engine,
    pre: InstancePre<RenderState>,
    fuel: u64,
}

impl WasmFormModule {
    fn run(&self, ctx: &RenderContext) -> wasmtime::Result<RenderOutput> {
        let mut store = Store::new(
            &self.engine,
            RenderState {
                parameters: ctx.parameters.clone(),
                nodes: Vec::new(),
            },
        );
        store.set_fuel(self.fuel)?;

        let instance = self.pre.instantiate(&mut store)?;
        let entry = instance.get_typed_func::<(), ()>(&mut store, DEFAULT_EXPORT)?;
        entry.call(&mut store, ())?;

        Ok(RenderOutput {
            nodes: store.into_data().nodes,
        })
    }
}

impl FormModule for WasmFormModule {
    fn form(&self) -> &str {
        &self.form
    }

    fn render(&self, ctx: &RenderContext) -> Result<RenderOutput> {
        self.run(ctx).map_err(|e| {
            tracing::warn!(form = %self.form, error = %e, "form render failed");
            FormHostError::Internal(format!("render of form '{}' failed: {e}", self.form))
        })
    }
}
