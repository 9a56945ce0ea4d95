//! File-local symbol table: maps receiver expressions to declaring types.
//!
//! Resolution never looks outside the file. A name bound to two different
//! types is ambiguous and resolves to nothing, as does anything only a
//! wildcard import could explain.

use std::collections::HashMap;

use callgate_core::OwnerType;

use crate::extractor::{is_identifier, starts_uppercase, FileFacts, ImportKind};

/// `Some(value)` when bound once (or always to the same value), `None` when ambiguous.
type Binding = Option<String>;

fn bind(map: &mut HashMap<String, Binding>, name: &str, value: String) {
    map.entry(name.to_owned())
        .and_modify(|existing| {
            if existing.as_deref() != Some(value.as_str()) {
                *existing = None;
            }
        })
        .or_insert(Some(value));
}

/// Resolves receivers of one file.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Simple (or aliased) type name → fully-qualified name.
    types: HashMap<String, Binding>,
    /// Member-imported name → declaring type.
    members: HashMap<String, Binding>,
    /// Variable name → declared type as written.
    variables: HashMap<String, Binding>,
    implicit: &'static [(&'static str, &'static str)],
}

impl SymbolTable {
    /// Builds the table from extracted facts.
    #[must_use]
    pub fn new(facts: &FileFacts, implicit: &'static [(&'static str, &'static str)]) -> Self {
        let mut table = Self {
            implicit,
            ..Self::default()
        };

        for import in &facts.imports {
            match import.kind {
                ImportKind::Type => bind(&mut table.types, import.local_name(), import.path.clone()),
                ImportKind::Member => {
                    if let Some(owner) = import.member_owner() {
                        bind(&mut table.members, import.local_name(), owner.to_owned());
                    }
                }
                ImportKind::Wildcard => {}
            }
        }

        for decl in &facts.declarations {
            let qualified = match &facts.package {
                Some(pkg) if !pkg.is_empty() => format!("{pkg}.{}", decl.nested_name),
                _ => decl.nested_name.clone(),
            };
            bind(&mut table.types, &decl.name, qualified.clone());
            if decl.nested_name != decl.name {
                bind(&mut table.types, &decl.nested_name, qualified);
            }
        }

        for var in &facts.variables {
            bind(&mut table.variables, &var.name, var.type_name.clone());
        }

        table
    }

    /// Resolves a type name as written in this file.
    #[must_use]
    pub fn resolve_type(&self, name: &str) -> Option<String> {
        if let Some(binding) = self.types.get(name) {
            return binding.clone();
        }
        if let Some((head, rest)) = name.split_once('.') {
            if let Some(binding) = self.types.get(head) {
                return binding.as_ref().map(|outer| format!("{outer}.{rest}"));
            }
            let segments_ok = name.split('.').all(is_identifier);
            let looks_qualified = !starts_uppercase(head)
                && name.rsplit('.').next().is_some_and(starts_uppercase);
            return (segments_ok && looks_qualified).then(|| name.to_owned());
        }
        self.implicit
            .iter()
            .find(|(simple, _)| *simple == name)
            .map(|(_, qualified)| (*qualified).to_owned())
    }

    /// Resolves the declaring type of a call on `receiver`.
    ///
    /// Variables shadow types of the same name.
    #[must_use]
    pub fn resolve_receiver(&self, receiver: &str) -> OwnerType {
        let to_owner =
            |resolved: Option<String>| resolved.map_or(OwnerType::Unresolved, OwnerType::Resolved);

        if let Some(field) = receiver.strip_prefix("this.") {
            return to_owner(self.variable_type(field));
        }
        if !receiver.split('.').all(is_identifier) {
            return OwnerType::Unresolved;
        }
        if is_identifier(receiver) {
            if self.variables.contains_key(receiver) {
                return to_owner(self.variable_type(receiver));
            }
            return to_owner(self.resolve_type(receiver));
        }

        let head = receiver.split('.').next().unwrap_or(receiver);
        if self.variables.contains_key(head) {
            return OwnerType::Unresolved;
        }
        to_owner(self.resolve_type(receiver))
    }

    /// Resolves the declaring type of a receiver-less call to `method`.
    #[must_use]
    pub fn resolve_bare(&self, method: &str) -> OwnerType {
        self.members
            .get(method)
            .and_then(Clone::clone)
            .map_or(OwnerType::Unresolved, OwnerType::Resolved)
    }

    fn variable_type(&self, name: &str) -> Option<String> {
        let written = self.variables.get(name)?.as_deref()?;
        self.resolve_type(written)
    }
}
