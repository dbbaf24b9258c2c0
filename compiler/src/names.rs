// names.rs — Naming table for one emission pass
//
// Assigns every emitted value a C++ identifier `val<N>`, where N is the
// number of entries (declarations plus aliases) the table held at the time.
// Aliases share the identifier of an existing value instead of declaring a
// new variable. Constant scalars are never declared; looking them up yields
// their literal text.
//
// Preconditions: `values` is the module's value arena.
// Postconditions: each value is declared or aliased at most once.
// Failure modes: `NameError` on double declaration or aliasing an undeclared
//                value; callers report these as E0103.
// Side effects: none.

use std::collections::HashMap;

use thiserror::Error;

use crate::id::ValueId;
use crate::ir::ValueInfo;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("value %{0} is already declared")]
    AlreadyDeclared(u32),
    #[error("value %{0} has no name to alias")]
    Undeclared(u32),
}

/// Naming table owned by one module-emission pass.
#[derive(Debug)]
pub struct NameTable<'m> {
    values: &'m [ValueInfo],
    names: HashMap<ValueId, String>,
    /// alias -> value that owns the name
    aliases: HashMap<ValueId, ValueId>,
}

impl<'m> NameTable<'m> {
    pub fn new(values: &'m [ValueInfo]) -> Self {
        Self {
            values,
            names: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    fn entries(&self) -> usize {
        self.names.len() + self.aliases.len()
    }

    /// Whether `id` already has a name, directly or through an alias.
    pub fn is_declared(&self, id: ValueId) -> bool {
        self.names.contains_key(&id) || self.aliases.contains_key(&id)
    }

    /// Give `id` a fresh name, `*`-prefixed when it is passed by pointer.
    pub fn declare(&mut self, id: ValueId, is_ptr: bool) -> Result<String, NameError> {
        if self.is_declared(id) {
            return Err(NameError::AlreadyDeclared(id.0));
        }
        let name = if is_ptr {
            format!("*val{}", self.entries())
        } else {
            format!("val{}", self.entries())
        };
        self.names.insert(id, name.clone());
        Ok(name)
    }

    /// Make `new` share the name of `existing`.
    pub fn alias(&mut self, existing: ValueId, new: ValueId) -> Result<String, NameError> {
        if self.is_declared(new) {
            return Err(NameError::AlreadyDeclared(new.0));
        }
        let owner = self.owner(existing).ok_or(NameError::Undeclared(existing.0))?;
        let name = self.names.get(&owner).cloned().unwrap_or_default();
        self.aliases.insert(new, owner);
        Ok(name)
    }

    fn owner(&self, id: ValueId) -> Option<ValueId> {
        if self.names.contains_key(&id) {
            Some(id)
        } else {
            self.aliases.get(&id).copied()
        }
    }

    /// Text for a use of `id`: the literal of a constant scalar, otherwise
    /// the assigned name, otherwise the empty string.
    pub fn lookup_name(&self, id: ValueId) -> String {
        if let Some(text) = self.values.get(id.index()).and_then(ValueInfo::constant_text) {
            return text;
        }
        self.owner(id)
            .and_then(|owner| self.names.get(&owner))
            .cloned()
            .unwrap_or_default()
    }

    /// The name without its pointer marker, as interface pragmas spell it.
    pub fn port_name(&self, id: ValueId) -> String {
        self.lookup_name(id).trim_start_matches('*').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ElemType, Literal};

    fn arena(n: usize) -> Vec<ValueInfo> {
        vec![ValueInfo::scalar(ElemType::F32); n]
    }

    #[test]
    fn names_count_every_entry() {
        let values = arena(4);
        let mut names = NameTable::new(&values);
        assert_eq!(names.declare(ValueId(2), false).unwrap(), "val0");
        assert_eq!(names.alias(ValueId(2), ValueId(3)).unwrap(), "val0");
        assert_eq!(names.declare(ValueId(0), true).unwrap(), "*val2");
        assert_eq!(names.lookup_name(ValueId(3)), "val0");
        assert_eq!(names.port_name(ValueId(0)), "val2");
    }

    #[test]
    fn double_declaration_is_rejected() {
        let values = arena(2);
        let mut names = NameTable::new(&values);
        names.declare(ValueId(0), false).unwrap();
        assert_eq!(
            names.declare(ValueId(0), false),
            Err(NameError::AlreadyDeclared(0))
        );
        assert_eq!(
            names.alias(ValueId(1), ValueId(0)),
            Err(NameError::AlreadyDeclared(0))
        );
    }

    #[test]
    fn alias_of_undeclared_value_fails() {
        let values = arena(2);
        let mut names = NameTable::new(&values);
        assert_eq!(
            names.alias(ValueId(0), ValueId(1)),
            Err(NameError::Undeclared(0))
        );
        assert!(!names.is_declared(ValueId(1)));
    }

    #[test]
    fn constants_render_as_literals() {
        let values = vec![
            ValueInfo::scalar(ElemType::F32).with_constant(Literal::Float(3.5)),
            ValueInfo::scalar(ElemType::Index),
        ];
        let names = NameTable::new(&values);
        assert_eq!(names.lookup_name(ValueId(0)), "3.5");
        assert_eq!(names.lookup_name(ValueId(1)), "");
        assert_eq!(names.lookup_name(ValueId(9)), "");
    }
}
