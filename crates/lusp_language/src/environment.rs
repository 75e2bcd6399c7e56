//! The global environment.
//!
//! Maps interned symbols to mutable slots. Slots are created the first time
//! a name is referenced and live as long as the environment. Compiled code
//! holds slot handles directly, so lookups happen once at compile time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use lusp_foundation::{Interner, Symbol, SymbolId};

use crate::value::{NativeFn, NativeProcedure, Value};

/// Handle to one global variable's storage.
#[derive(Clone)]
pub struct GlobalSlot(Rc<SlotCell>);

struct SlotCell {
    symbol: Symbol,
    value: RefCell<Value>,
}

impl GlobalSlot {
    fn new(symbol: Symbol) -> Self {
        Self(Rc::new(SlotCell {
            symbol,
            value: RefCell::new(Value::Null),
        }))
    }

    /// Returns the symbol this slot is bound to.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.0.symbol
    }

    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> Value {
        self.0.value.borrow().clone()
    }

    /// Replaces the current value.
    pub fn set(&self, value: Value) {
        *self.0.value.borrow_mut() = value;
    }

    /// Returns true if both handles refer to the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for GlobalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalSlot({})", self.0.symbol)
    }
}

/// Symbol table and global variables of one language instance.
#[derive(Default)]
pub struct Environment {
    interner: Interner,
    slots: HashMap<SymbolId, GlobalSlot>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`.
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Returns the interner.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Returns the slot for `symbol`, creating an empty one if needed.
    pub fn get_or_create_slot(&mut self, symbol: &Symbol) -> GlobalSlot {
        self.slots
            .entry(symbol.id())
            .or_insert_with(|| GlobalSlot::new(symbol.clone()))
            .clone()
    }

    /// Returns the slot for `name` if it has been referenced.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<GlobalSlot> {
        let symbol = self.interner.lookup(name)?;
        self.slots.get(&symbol.id()).cloned()
    }

    /// Returns the value of global `name`, or null if it was never set.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        self.slot(name).map(|slot| slot.get()).unwrap_or_default()
    }

    /// Sets global `name`, creating its slot if needed.
    pub fn set(&mut self, name: &str, value: Value) {
        let symbol = self.intern(name);
        self.get_or_create_slot(&symbol).set(value);
    }

    /// Binds a host function to global `name`.
    pub fn define_native(&mut self, name: &'static str, func: NativeFn) {
        self.set(name, Value::Procedure(NativeProcedure::new(name, func)));
    }

    /// Iterates over the names of every global slot, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.values().map(|slot| slot.symbol().name())
    }

    /// Returns the number of global slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no global has been referenced yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("symbols", &self.interner.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}
