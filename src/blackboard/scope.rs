//! Blackboard — a hierarchical, thread-safe variable scope.
//!
//! Every subtree instance gets its own blackboard. A child can remap one of
//! its local keys to a key of its parent, so the same subtree can be reused
//! against different variable names at each call site. Reads, writes and
//! declarations of a remapped key are forwarded to the parent, recursively,
//! until a blackboard with no matching remapping is reached.
//!
//! # Locking
//!
//! Each blackboard has a single mutex guarding its entries and remappings.
//! Forwarding to the parent acquires the parent's lock while the child's is
//! still held. This cannot deadlock because locks are only ever taken in
//! child-to-parent order and the parent link is fixed at construction: a
//! blackboard can never become its own ancestor. Entry values sit behind
//! their own mutex, which is never held while a blackboard lock is acquired.
//!
//! The parent link is a [`Weak`] reference. A child never keeps its parent
//! alive; once the parent is dropped, remappings into it are ignored and the
//! child behaves like a root.

use std::any::Any;
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

use super::any_value::AnyValue;
use super::config::BlackboardConfig;
use super::converter::{ConversionService, TypeConverter};
use super::entry::Entry;
use super::error::{BlackboardError, Result};
use super::port_info::{PortInfo, TypeInfo};

/// Shared handle to a blackboard entry.
pub type EntryRef = Arc<Mutex<Entry>>;

struct ScopeState {
    entries: HashMap<String, EntryRef>,
    /// Local key -> key in the parent blackboard. First mapping wins.
    remappings: HashMap<String, String>,
    /// Captured by entries created from now on.
    converter: Arc<dyn ConversionService>,
}

/// A nestable, named variable store.
///
/// # Example
///
/// ```
/// use behavior_blackboard::blackboard::Blackboard;
///
/// let root = Blackboard::with_defaults();
/// let subtree = Blackboard::create_child(&root).unwrap();
/// subtree.add_subtree_remapping("target", "goal_pose");
///
/// subtree.set("target", 7i32).unwrap();
/// assert_eq!(root.get::<i32>("goal_pose").unwrap(), 7);
/// ```
pub struct Blackboard {
    id: Uuid,
    state: Mutex<ScopeState>,
    parent: Option<Weak<Blackboard>>,
    depth: usize,
    config: BlackboardConfig,
}

impl Blackboard {
    /// Create a root blackboard with an explicit conversion service.
    pub fn create(converter: Arc<dyn ConversionService>, config: BlackboardConfig) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            state: Mutex::new(ScopeState {
                entries: HashMap::new(),
                remappings: HashMap::new(),
                converter,
            }),
            parent: None,
            depth: 0,
            config,
        })
    }

    /// Create a root blackboard using [`TypeConverter::with_defaults`] and the
    /// default config.
    pub fn with_defaults() -> Arc<Self> {
        Self::create(
            Arc::new(TypeConverter::with_defaults()),
            BlackboardConfig::default(),
        )
    }

    /// Create a child of `parent`, inheriting its conversion service and
    /// config. The child holds only a weak reference to the parent.
    pub fn create_child(parent: &Arc<Blackboard>) -> Result<Arc<Self>> {
        let depth = parent.depth + 1;
        if depth > parent.config.max_depth {
            return Err(BlackboardError::DepthExceeded {
                depth,
                max: parent.config.max_depth,
            });
        }
        let converter = parent.state.lock().converter.clone();

        let child = Arc::new(Self {
            id: Uuid::new_v4(),
            state: Mutex::new(ScopeState {
                entries: HashMap::new(),
                remappings: HashMap::new(),
                converter,
            }),
            parent: Some(Arc::downgrade(parent)),
            depth,
            config: parent.config.clone(),
        });
        log::debug!(
            "Created blackboard {} (depth {}) under {}",
            child.id,
            depth,
            parent.id
        );
        Ok(child)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Nesting depth; the root is 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &BlackboardConfig {
        &self.config
    }

    /// The parent, if this is a child and the parent still exists.
    pub fn parent(&self) -> Option<Arc<Blackboard>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    // --- Declarations ---

    /// Declare (or merge) port metadata for `key`.
    ///
    /// A remapped key is declared in the parent as well, so every ancestor
    /// that ends up storing the value knows its type. A local placeholder
    /// entry is created either way. Both sides are always applied; the first
    /// conflict encountered is returned.
    pub fn declare_port_info(&self, key: &str, info: &PortInfo) -> Result<()> {
        let mut guard = self.state.lock();

        let upstream = match guard.remappings.get(key) {
            Some(external) => match self.parent() {
                Some(parent) => {
                    log::trace!("Declaring [{}] in parent as [{}]", key, external);
                    parent
                        .declare_port_info(external, info)
                        .map_err(|e| attribute_to_key(e, key))
                }
                None => Ok(()),
            },
            None => Ok(()),
        };

        let state = &mut *guard;
        let local = match state.entries.entry(key.to_string()) {
            MapEntry::Occupied(slot) => slot.get().lock().declare(key, info),
            MapEntry::Vacant(slot) => {
                log::debug!("Blackboard {}: new entry [{}]", self.id, key);
                slot.insert(Arc::new(Mutex::new(Entry::new(
                    info.clone(),
                    state.converter.clone(),
                ))));
                Ok(())
            }
        };

        upstream.and(local)
    }

    /// Forward `internal` to the parent's `external` key.
    ///
    /// Remappings are set once, when the subtree is instantiated. A second
    /// call for the same internal key is ignored.
    pub fn add_subtree_remapping(&self, internal: impl Into<String>, external: impl Into<String>) {
        let internal = internal.into();
        let external = external.into();
        let mut state = self.state.lock();
        match state.remappings.entry(internal) {
            MapEntry::Occupied(existing) => {
                if *existing.get() != external {
                    log::warn!(
                        "Ignoring remapping [{}] -> [{}]: already remapped to [{}]",
                        existing.key(),
                        external,
                        existing.get()
                    );
                }
            }
            MapEntry::Vacant(slot) => {
                slot.insert(external);
            }
        }
    }

    /// Replace the conversion service used by entries created from now on.
    /// Existing entries keep the service they were created with.
    pub fn set_types_converter(&self, converter: Arc<dyn ConversionService>) {
        self.state.lock().converter = converter;
    }

    // --- Resolution ---

    /// Resolve `key` to its entry, following remappings up the parent chain.
    pub fn get_entry(&self, key: &str) -> Result<EntryRef> {
        let state = self.state.lock();

        if let Some(external) = state.remappings.get(key) {
            match self.parent() {
                Some(parent) => {
                    log::trace!("Resolving [{}] in parent as [{}]", key, external);
                    return parent.get_entry(external).map_err(|e| attribute_to_key(e, key));
                }
                None => log::warn!(
                    "Parent of blackboard {} is gone; resolving [{}] locally",
                    self.id,
                    key
                ),
            }
        }

        state
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| BlackboardError::NotFound {
                key: key.to_string(),
            })
    }

    /// Like [`get_entry`](Self::get_entry), but creates a missing entry in the
    /// blackboard that ends the chain when the config allows it.
    fn resolve_for_write(&self, key: &str) -> Result<EntryRef> {
        let mut guard = self.state.lock();

        if let Some(external) = guard.remappings.get(key) {
            if let Some(parent) = self.parent() {
                log::trace!("Writing [{}] through parent as [{}]", key, external);
                return parent
                    .resolve_for_write(external)
                    .map_err(|e| attribute_to_key(e, key));
            }
        }

        let state = &mut *guard;
        match state.entries.entry(key.to_string()) {
            MapEntry::Occupied(slot) => Ok(slot.get().clone()),
            MapEntry::Vacant(slot) if self.config.create_on_set => {
                log::debug!("Blackboard {}: new entry [{}] on write", self.id, key);
                let entry = Arc::new(Mutex::new(Entry::new(
                    PortInfo::default(),
                    state.converter.clone(),
                )));
                Ok(slot.insert(entry).clone())
            }
            MapEntry::Vacant(_) => Err(BlackboardError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    // --- Values ---

    /// Read `key` as `requested`, converting if needed.
    pub fn get_value(&self, key: &str, requested: &TypeInfo) -> Result<AnyValue> {
        let entry = self.get_entry(key)?;
        let entry = entry.lock();
        entry.read(key, requested)
    }

    /// Read `key` as a `T`.
    pub fn get<T: Any + Clone>(&self, key: &str) -> Result<T> {
        let requested = TypeInfo::of::<T>();
        let value = self.get_value(key, &requested)?;
        value
            .downcast::<T>()
            .ok_or_else(|| BlackboardError::TypeMismatch {
                key: key.to_string(),
                stored: value.type_info().name(),
                requested: requested.name(),
            })
    }

    /// Write an already type-erased value.
    pub fn set_value(&self, key: &str, value: AnyValue) -> Result<()> {
        let entry = self.resolve_for_write(key)?;
        let mut entry = entry.lock();
        entry.write(key, value)
    }

    /// Write `value` to `key`. The first write to an undeclared key fixes its
    /// type.
    pub fn set<T: Any + Send + Sync>(&self, key: &str, value: T) -> Result<()> {
        self.set_value(key, AnyValue::new(value))
    }

    // --- Introspection ---

    /// Merged port metadata of the entry `key` resolves to.
    pub fn port_info(&self, key: &str) -> Result<PortInfo> {
        Ok(self.get_entry(key)?.lock().port_info().clone())
    }

    /// Whether `key` resolves to an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.get_entry(key).is_ok()
    }

    /// Keys of the local entries, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// The parent key `key` is remapped to, if any.
    pub fn remapped(&self, key: &str) -> Option<String> {
        self.state.lock().remappings.get(key).cloned()
    }

    /// Human-readable listing of the local entries, one per line.
    pub fn debug_dump(&self) -> String {
        let state = self.state.lock();
        let parent_alive = self.parent().is_some();

        let mut keys: Vec<&String> = state.entries.keys().collect();
        keys.sort();

        let mut out = String::new();
        for key in keys {
            let entry = state.entries[key].lock();
            let type_name = entry.effective_type().map_or("unknown", |t| t.name());
            let _ = write!(out, "{} ({}) -> ", key, type_name);
            match state.remappings.get(key) {
                Some(external) if parent_alive => {
                    let _ = writeln!(out, "remapped to parent [{}]", external);
                }
                _ => {
                    let _ = writeln!(out, "{}", if entry.is_empty() { "empty" } else { "full" });
                }
            }
        }
        log::debug!("Blackboard {}:\n{}", self.id, out);
        out
    }
}

/// Report an error raised further up the chain under the key the caller
/// actually used.
fn attribute_to_key(err: BlackboardError, key: &str) -> BlackboardError {
    match err {
        BlackboardError::NotFound { .. } => BlackboardError::NotFound {
            key: key.to_string(),
        },
        BlackboardError::ConflictingDeclaration {
            existing,
            requested,
            ..
        } => BlackboardError::ConflictingDeclaration {
            key: key.to_string(),
            existing,
            requested,
        },
        other => other,
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("has_parent", &self.parent.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
