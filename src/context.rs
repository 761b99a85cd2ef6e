//! Per-document compiler context.
//!
//! A [`ContextBuilder`] collects every keyword and type registration up front. Calling
//! [`ContextBuilder::finish`] closes the configuration phase and resolves the fields of every
//! structure, so registration order does not matter. The resulting [`Context`] only grows
//! afterwards through map types synthesized while resolving expressions.

use crate::error::Result;
use crate::tags::{KeywordCategory, KeywordRegistry};
use crate::type_resolver::{
    collect_layouts, EnumLayout, Facets, Resolved, StructLayout, TypeDefinition, TypeLayout,
    TypeRegistry,
};
use log::{debug, info};

/// Configuration phase of a [`Context`]
#[derive(Debug, Default)]
pub struct ContextBuilder {
    keywords: KeywordRegistry,
    types: TypeRegistry,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `@name` a valid tag of the given category
    pub fn register_keyword(&mut self, name: &str, category: KeywordCategory) -> Result<&mut Self> {
        self.keywords.register(name, category)?;
        Ok(self)
    }

    /// Registers a structured type under `name` from a struct layout.
    ///
    /// When the struct identifier differs from `name`, the identifier becomes an alias.
    pub fn define_type(&mut self, name: &str, layout: &StructLayout) -> Result<&mut Self> {
        self.types.define_structure(name, layout)?;
        Ok(self)
    }

    /// Registers a fieldless enum as an enumerated string type
    pub fn define_enum(&mut self, name: &str, layout: &EnumLayout) -> Result<&mut Self> {
        self.types.define_enum(name, layout)?;
        Ok(self)
    }

    /// Registers every struct and fieldless enum declared in `source`
    pub fn define_types_from_source(&mut self, source: &str) -> Result<usize> {
        let file = syn::parse_file(source)?;
        Ok(self.define_layouts(&collect_layouts(&file)))
    }

    /// Registers struct and enum layouts under their own names.
    ///
    /// # Returns
    ///
    /// The number of types registered. Types whose name is already taken are left alone.
    pub fn define_layouts(&mut self, layouts: &[TypeLayout]) -> usize {
        let mut count = 0;
        for layout in layouts {
            let registered = match layout {
                TypeLayout::Struct(layout) => self.types.define_structure(&layout.name, layout),
                TypeLayout::Enum(layout) => self.types.define_enum(&layout.name, layout),
            };
            match registered {
                Ok(()) => count += 1,
                Err(e) => debug!("Not registering source type: {}", e),
            }
        }
        debug!("Registered {} types from source", count);
        count
    }

    /// Registers `name` as an API primitive built on `base`
    pub fn define_primitive(&mut self, name: &str, base: &str, facets: Facets) -> Result<&mut Self> {
        self.types.define_primitive(name, base, facets)?;
        Ok(self)
    }

    pub fn define_alias(&mut self, alias: &str, target: &str) -> Result<&mut Self> {
        self.types.define_alias(alias, target)?;
        Ok(self)
    }

    /// Closes the configuration phase and resolves structure fields against everything
    /// registered so far
    pub fn finish(mut self) -> Context {
        self.types.resolve_structures();
        info!("Context ready with {} type definitions", self.types.len());
        Context {
            keywords: self.keywords,
            types: self.types,
        }
    }
}

/// Keyword and type registries used while assembling one document
#[derive(Debug, Default)]
pub struct Context {
    keywords: KeywordRegistry,
    types: TypeRegistry,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn keywords(&self) -> &KeywordRegistry {
        &self.keywords
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Resolves a type expression, registering synthesized map types on first sight
    pub fn resolve(&mut self, expr: &str) -> Result<Resolved> {
        self.types.resolve(expr)
    }

    pub fn definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.definition(name)
    }

    pub fn dependents_of(&mut self, name: &str) -> Vec<String> {
        self.types.dependents_of(name)
    }
}
