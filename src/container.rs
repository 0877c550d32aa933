//! String-keyed service container.
//!
//! Bindings map a key to a factory plus a singleton flag; aliases map an
//! alternate name through to a canonical key. Values are stored type-erased
//! as `Arc<dyn Any + Send + Sync>` and recovered with
//! [`Container::resolve_as`].
//!
//! The container is only mutated during the register phase of the
//! application lifecycle (plus singleton caching on first resolve); after
//! the application reaches `Running` it is effectively read-only, so
//! resolution during dispatch contends on nothing.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::{KernelError, KernelResult};

/// Type-erased service value shared out of the container.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Type-erased factory stored in a binding.
pub type Factory = Arc<dyn Fn(&Container) -> KernelResult<Service> + Send + Sync>;

/// Maximum alias hops followed before the chain is declared cyclic.
const MAX_ALIAS_HOPS: usize = 32;

// Thread-local resolution stack for circular factory detection. Factories
// run on the caller's thread, so a key reappearing on this stack means two
// factories are resolving each other.
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct StackGuard;

impl StackGuard {
    fn push(key: &str) -> KernelResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|k| k == key) {
                let mut path = stack.clone();
                path.push(key.to_string());
                return Err(KernelError::Circular(path));
            }
            stack.push(key.to_string());
            Ok(StackGuard)
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Policy applied when a key that is already bound is bound again.
///
/// Two providers declaring the same service name is usually a packaging
/// mistake, but an intentional override (a test doubling a real service)
/// is also legitimate, so the policy is configurable rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebindPolicy {
    /// Replace the existing binding, logging a warning (last write wins).
    #[default]
    Override,
    /// Reject the new binding with [`KernelError::AlreadyBound`].
    Deny,
}

struct Binding {
    factory: Factory,
    singleton: bool,
    /// Lock-free singleton cache, set at most once per container lifetime.
    cached: OnceCell<Service>,
}

/// String-keyed dependency injection container.
///
/// Binds keys to factories or pre-resolved instances, resolves alias chains,
/// and caches singletons. Factories receive the container itself so they can
/// resolve their own dependencies.
///
/// # Examples
///
/// ```rust
/// use launchkit::{Container, KernelResult};
/// use std::sync::Arc;
///
/// struct Config {
///     plugin_dir: String,
/// }
///
/// struct PluginIndex {
///     dir: String,
/// }
///
/// # fn main() -> KernelResult<()> {
/// let container = Container::new();
/// container.instance("config", Config {
///     plugin_dir: "/opt/launcher/plugins".to_string(),
/// })?;
/// container.bind_singleton("plugin.index", |c| {
///     let config = c.resolve_as::<Config>("config")?;
///     Ok(PluginIndex { dir: config.plugin_dir.clone() })
/// })?;
/// container.alias("plugins", "plugin.index")?;
///
/// let index = container.resolve_as::<PluginIndex>("plugins")?;
/// assert_eq!(index.dir, "/opt/launcher/plugins");
/// # Ok(())
/// # }
/// ```
pub struct Container {
    bindings: RwLock<HashMap<String, Binding>>,
    aliases: RwLock<HashMap<String, String>>,
    rebind: RebindPolicy,
}

impl Container {
    /// Creates an empty container with the default rebind policy.
    pub fn new() -> Self {
        Self::with_rebind_policy(RebindPolicy::default())
    }

    /// Creates an empty container with an explicit rebind policy.
    pub fn with_rebind_policy(rebind: RebindPolicy) -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            rebind,
        }
    }

    /// Binds `key` to a transient factory: every resolve runs the factory
    /// and returns a fresh value.
    pub fn bind<T, F>(&self, key: impl Into<String>, factory: F) -> KernelResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> KernelResult<T> + Send + Sync + 'static,
    {
        self.insert(key.into(), erase(factory), false)
    }

    /// Binds `key` to a singleton factory: the factory runs at most once and
    /// every resolve returns the identical cached value.
    pub fn bind_singleton<T, F>(&self, key: impl Into<String>, factory: F) -> KernelResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> KernelResult<T> + Send + Sync + 'static,
    {
        self.insert(key.into(), erase(factory), true)
    }

    /// Binds `key` to an already-constructed value, equivalent to a
    /// pre-resolved singleton.
    pub fn instance<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        value: T,
    ) -> KernelResult<()> {
        self.instance_arc(key, Arc::new(value))
    }

    /// Like [`instance`](Container::instance) for values already behind an `Arc`.
    pub fn instance_arc<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        value: Arc<T>,
    ) -> KernelResult<()> {
        let cached: Service = value;
        let for_factory = cached.clone();
        let binding = Binding {
            factory: Arc::new(move |_| Ok(for_factory.clone())),
            singleton: true,
            cached: OnceCell::with_value(cached),
        };
        self.insert_binding(key.into(), binding)
    }

    /// Registers `alias` as an alternate name for `key`.
    ///
    /// Chains are followed at resolve time with a bounded number of hops;
    /// a chain that revisits a name fails with [`KernelError::AliasCycle`]
    /// rather than looping.
    pub fn alias(&self, alias: impl Into<String>, key: impl Into<String>) -> KernelResult<()> {
        let alias = alias.into();
        let key = key.into();
        self.aliases.write().insert(alias, key);
        Ok(())
    }

    /// Resolves `key` to its bound value.
    ///
    /// Follows the alias chain to a canonical key, then runs the factory
    /// (or returns the cached singleton). The factory is invoked with no
    /// container lock held, so it may resolve its own dependencies; a
    /// factory cycle is reported as [`KernelError::Circular`] instead of
    /// overflowing the stack.
    pub fn resolve(&self, key: &str) -> KernelResult<Service> {
        let canonical = self.canonical_key(key)?;

        let (factory, singleton) = {
            let bindings = self.bindings.read();
            let binding = bindings
                .get(&canonical)
                .ok_or_else(|| KernelError::BindingNotFound(canonical.clone()))?;
            if let Some(cached) = binding.cached.get() {
                return Ok(cached.clone());
            }
            (binding.factory.clone(), binding.singleton)
        };

        let _guard = StackGuard::push(&canonical)?;
        let value = (factory)(self)?;

        if singleton {
            let bindings = self.bindings.read();
            if let Some(binding) = bindings.get(&canonical) {
                // A recursive resolve may already have populated the cell;
                // whoever got there first wins and everyone shares it.
                return Ok(binding.cached.get_or_init(|| value).clone());
            }
        }
        Ok(value)
    }

    /// Alias of [`resolve`](Container::resolve) intended for provider call sites.
    pub fn make(&self, key: &str) -> KernelResult<Service> {
        self.resolve(key)
    }

    /// Resolves `key` and downcasts the value to `T`.
    pub fn resolve_as<T: Send + Sync + 'static>(&self, key: &str) -> KernelResult<Arc<T>> {
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| KernelError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Returns true if `key` (or the alias chain it starts) ends at a binding.
    pub fn contains(&self, key: &str) -> bool {
        match self.canonical_key(key) {
            Ok(canonical) => self.bindings.read().contains_key(&canonical),
            Err(_) => false,
        }
    }

    fn canonical_key(&self, key: &str) -> KernelResult<String> {
        let aliases = self.aliases.read();
        let mut current = key.to_string();
        let mut path = vec![current.clone()];
        while let Some(target) = aliases.get(&current) {
            if path.iter().any(|seen| seen == target) || path.len() > MAX_ALIAS_HOPS {
                path.push(target.clone());
                return Err(KernelError::AliasCycle(path));
            }
            current = target.clone();
            path.push(current.clone());
        }
        Ok(current)
    }

    fn insert(&self, key: String, factory: Factory, singleton: bool) -> KernelResult<()> {
        self.insert_binding(
            key,
            Binding {
                factory,
                singleton,
                cached: OnceCell::new(),
            },
        )
    }

    fn insert_binding(&self, key: String, binding: Binding) -> KernelResult<()> {
        let mut bindings = self.bindings.write();
        if bindings.contains_key(&key) {
            match self.rebind {
                RebindPolicy::Override => {
                    tracing::warn!(key = %key, "rebinding already-bound key, last write wins");
                }
                RebindPolicy::Deny => return Err(KernelError::AlreadyBound(key)),
            }
        }
        bindings.insert(key, binding);
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

fn erase<T, F>(factory: F) -> Factory
where
    T: Send + Sync + 'static,
    F: Fn(&Container) -> KernelResult<T> + Send + Sync + 'static,
{
    Arc::new(move |container| factory(container).map(|value| Arc::new(value) as Service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_singleton_cached_once() {
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let container = Container::new();
        container
            .bind_singleton("counter", move |_| {
                let mut c = counter_clone.lock().unwrap();
                *c += 1;
                Ok(*c)
            })
            .unwrap();

        let a = container.resolve_as::<i32>("counter").unwrap();
        let b = container.resolve_as::<i32>("counter").unwrap();

        assert_eq!(*a, 1);
        assert!(Arc::ptr_eq(&a, &b)); // Same instance
        assert_eq!(*counter.lock().unwrap(), 1); // Factory ran once
    }

    #[test]
    fn test_transient_creates_new_instances() {
        let container = Container::new();
        container
            .bind("fresh", |_| Ok(String::from("value")))
            .unwrap();

        let a = container.resolve_as::<String>("fresh").unwrap();
        let b = container.resolve_as::<String>("fresh").unwrap();
        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
    }

    #[test]
    fn test_alias_chain_resolves_to_binding() {
        let container = Container::new();
        container.instance("window.manager", 7usize).unwrap();
        container.alias("windows", "window.manager").unwrap();
        container.alias("wm", "windows").unwrap();

        let direct = container.resolve_as::<usize>("window.manager").unwrap();
        let via_alias = container.resolve_as::<usize>("wm").unwrap();
        assert!(Arc::ptr_eq(&direct, &via_alias));
    }

    #[test]
    fn test_alias_cycle_detected() {
        let container = Container::new();
        container.alias("a", "b").unwrap();
        container.alias("b", "a").unwrap();

        match container.resolve("a") {
            Err(KernelError::AliasCycle(path)) => {
                assert_eq!(path.first().map(String::as_str), Some("a"));
            }
            other => panic!("expected alias cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_circular_factories_detected() {
        let container = Container::new();
        container
            .bind("ping", |c| c.resolve("pong").map(|_| ()))
            .unwrap();
        container
            .bind("pong", |c| c.resolve("ping").map(|_| ()))
            .unwrap();

        match container.resolve("ping") {
            Err(KernelError::Circular(path)) => {
                assert_eq!(path, vec!["ping", "pong", "ping"]);
            }
            other => panic!("expected circular error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_rebind_deny_policy() {
        let container = Container::with_rebind_policy(RebindPolicy::Deny);
        container.instance("ai.chat", 1u8).unwrap();
        let err = container.instance("ai.chat", 2u8).unwrap_err();
        assert_eq!(err, KernelError::AlreadyBound("ai.chat".to_string()));
    }

    #[test]
    fn test_rebind_override_last_write_wins() {
        let container = Container::new();
        container.instance("ai.chat", 1u8).unwrap();
        container.instance("ai.chat", 2u8).unwrap();
        assert_eq!(*container.resolve_as::<u8>("ai.chat").unwrap(), 2);
    }
}
