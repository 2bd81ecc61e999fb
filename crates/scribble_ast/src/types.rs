//! The type registry: primitive and composite type descriptors referenced
//! by id so composite types (structs containing themselves through a
//! pointer-shaped field, mutually recursive variants) are representable
//! without ownership cycles.

use std::collections::HashMap;

use scribble_base::Symbol;

/// Opaque reference into a [`TypeRegistry`]. Primitive kinds encode
/// signedness in the id's sign the way `spec.md` describes ("signedness
/// encoded in the upper bits of the id") would for a hand-rolled integer
/// id; here that's simply a field on [`TypeKind::Primitive`] instead, since
/// Rust has no reason to steal bits from an opaque handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive { signed: bool, width_bytes: u8 },
    Bool,
    Struct { fields: Vec<(Symbol, TypeId)> },
    Enumeration { underlying: TypeId, values: Vec<(Symbol, i64)> },
    Variant { options: Vec<(Symbol, Option<TypeId>)> },
    Alias(TypeId),
}

#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: Symbol,
    pub kind: TypeKind,
}

/// Owns every type descriptor reachable from a compilation unit, keyed by
/// [`TypeId`]. Primitive types are pre-registered at construction so every
/// `TypeRegistry` starts from the same well-known ids.
pub struct TypeRegistry {
    descriptors: Vec<TypeDescriptor>,
    by_name: HashMap<Symbol, TypeId>,
}

pub const INT_ID: TypeId = TypeId(0);
pub const BOOL_ID: TypeId = TypeId(1);
pub const STRING_ID: TypeId = TypeId(2);
pub const DECIMAL_ID: TypeId = TypeId(3);

impl TypeRegistry {
    pub fn new(interner: &mut scribble_base::Interner) -> Self {
        let mut registry = TypeRegistry {
            descriptors: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.register_builtin(interner, "int", TypeKind::Primitive { signed: true, width_bytes: 4 });
        registry.register_builtin(interner, "bool", TypeKind::Bool);
        registry.register_builtin(interner, "string", TypeKind::Primitive { signed: false, width_bytes: 8 });
        registry.register_builtin(interner, "decimal", TypeKind::Primitive { signed: true, width_bytes: 8 });
        registry
    }

    fn register_builtin(&mut self, interner: &mut scribble_base::Interner, name: &str, kind: TypeKind) {
        let symbol = interner.intern(name);
        let id = self.push(TypeDescriptor { name: symbol, kind });
        self.by_name.insert(symbol, id);
    }

    fn push(&mut self, descriptor: TypeDescriptor) -> TypeId {
        let id = TypeId(self.descriptors.len() as u32);
        self.descriptors.push(descriptor);
        id
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) -> TypeId {
        let name = descriptor.name;
        let id = self.push(descriptor);
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.descriptors[id.0 as usize]
    }

    pub fn lookup(&self, name: Symbol) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    /// Follows `Alias` chains to the underlying non-alias type id.
    pub fn resolve_alias(&self, mut id: TypeId) -> TypeId {
        loop {
            match &self.get(id).kind {
                TypeKind::Alias(target) => id = *target,
                _ => return id,
            }
        }
    }

    pub fn size_of(&self, id: TypeId) -> u8 {
        match &self.get(self.resolve_alias(id)).kind {
            TypeKind::Primitive { width_bytes, .. } => *width_bytes,
            TypeKind::Bool => 1,
            TypeKind::Enumeration { underlying, .. } => self.size_of(*underlying),
            TypeKind::Struct { fields } => fields.iter().map(|(_, t)| self.size_of(*t) as u32).sum::<u32>().min(255) as u8,
            TypeKind::Variant { .. } => 8,
            TypeKind::Alias(_) => unreachable!("resolve_alias already followed the chain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_base::Interner;

    #[test]
    fn builtins_are_preregistered() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new(&mut interner);
        assert_eq!(registry.get(INT_ID).kind, TypeKind::Primitive { signed: true, width_bytes: 4 });
        assert_eq!(registry.size_of(BOOL_ID), 1);
    }

    #[test]
    fn lookup_by_name_finds_registered_type() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new(&mut interner);
        let sym = interner.intern("int");
        assert_eq!(registry.lookup(sym), Some(INT_ID));
    }

    #[test]
    fn alias_resolves_to_underlying_type() {
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new(&mut interner);
        let name = interner.intern("MyInt");
        let alias_id = registry.register(TypeDescriptor { name, kind: TypeKind::Alias(INT_ID) });
        assert_eq!(registry.resolve_alias(alias_id), INT_ID);
        assert_eq!(registry.size_of(alias_id), 4);
    }

    #[test]
    fn struct_size_sums_field_sizes() {
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new(&mut interner);
        let name = interner.intern("Point");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let id = registry.register(TypeDescriptor {
            name,
            kind: TypeKind::Struct { fields: vec![(x, INT_ID), (y, INT_ID)] },
        });
        assert_eq!(registry.size_of(id), 8);
    }
}
