//! Shared generic helpers used by the `sqlfixture-core` and `sqlfixture` crates.

use std::cell::RefCell;
use std::hash::BuildHasherDefault;
use std::panic;
use std::sync::Once;

/// An [`indexmap::IndexMap`] keyed by the `ahash` hasher, used to get
/// insertion-order iteration (first-occurrence ordering of columns,
/// parameters, CTE names) without paying for a `BTreeMap`'s ordering.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<ahash::AHasher>>;

/// An [`indexmap::IndexSet`] keyed by the `ahash` hasher.
pub type IndexSet<V> = indexmap::IndexSet<V, BuildHasherDefault<ahash::AHasher>>;

/// Builder-style configuration: `Thing::default().config(|t| t.field = x)`.
pub trait Config: Sized {
    fn config(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl<T> Config for T {}

/// Pushes a context frame that gets printed if a panic unwinds through it.
/// Rewriters use this around each pipeline stage (coverage check, shadow
/// synthesis, per-statement lowering) so a panic on malformed input names
/// the stage it happened in.
pub fn enter_panic(context: String) -> PanicContext {
    static ONCE: Once = Once::new();
    ONCE.call_once(PanicContext::init);

    with_ctx(|ctx| ctx.push(context));
    PanicContext { _priv: () }
}

#[must_use]
pub struct PanicContext {
    _priv: (),
}

impl PanicContext {
    #[allow(clippy::print_stderr)]
    fn init() {
        let default_hook = panic::take_hook();
        let hook = move |panic_info: &panic::PanicHookInfo<'_>| {
            with_ctx(|ctx| {
                if !ctx.is_empty() {
                    eprintln!("Panic context:");
                    for frame in ctx.iter() {
                        eprintln!("> {frame}\n");
                    }
                }
                default_hook(panic_info);
            });
        };
        panic::set_hook(Box::new(hook));
    }
}

impl Drop for PanicContext {
    fn drop(&mut self) {
        with_ctx(|ctx| assert!(ctx.pop().is_some()));
    }
}

fn with_ctx(f: impl FnOnce(&mut Vec<String>)) {
    thread_local! {
        static CTX: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }
    CTX.with(|ctx| f(&mut ctx.borrow_mut()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Widget {
        count: u32,
    }

    #[test]
    fn config_mutates_inline() {
        let widget = Widget::default().config(|w| w.count = 4);
        assert_eq!(widget.count, 4);
    }
}
