//! Schema derivation engine — descriptor → structural schema.
//!
//! Derivation rules, in priority order:
//! 1. enumeration → string node with `enum` values
//! 2. primitives → mapped kind (date-time gets `format="date-time"`)
//! 3. arrays → array node with element schema
//! 4. string-keyed maps → object node with `additionalProperties`
//! 5. named records → object node with per-field properties/required
//!
//! Named-record schemas are memoized; callers always get a clone so mutating
//! a returned schema never corrupts the cache. A record encountered while it
//! is already being expanded collapses to an empty object schema, which
//! keeps cyclic record graphs from recursing forever.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::schema::descriptor::{FieldDesc, ObjectDesc, TypeDesc};
use crate::schema::{AdditionalProps, StructuralSchema};
use crate::types::{Error, Result};

/// Derives and caches structural schemas for registered descriptors.
///
/// Shared-read: one engine instance is meant to live for the process and be
/// shared across registries and calls.
#[derive(Debug, Default)]
pub struct SchemaEngine {
    objects: RwLock<HashMap<String, Arc<ObjectDesc>>>,
    cache: RwLock<HashMap<String, StructuralSchema>>,
}

impl SchemaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named record descriptor.
    ///
    /// # Errors
    ///
    /// Rejects redefinition of an existing name and duplicate field names.
    pub fn define(&self, desc: ObjectDesc) -> Result<()> {
        if desc.name.trim().is_empty() {
            return Err(Error::registration("record name cannot be empty"));
        }
        let mut seen = HashSet::new();
        for field in &desc.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::registration(format!(
                    "record '{}' declares field '{}' more than once",
                    desc.name, field.name
                )));
            }
        }

        let mut objects = self.objects.write().expect("schema engine poisoned");
        if objects.contains_key(&desc.name) {
            return Err(Error::registration(format!(
                "record '{}' is already defined",
                desc.name
            )));
        }
        objects.insert(desc.name.clone(), Arc::new(desc));
        Ok(())
    }

    /// Whether a named record is defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(name))
            .unwrap_or(false)
    }

    /// Derive the structural schema for a type descriptor.
    ///
    /// # Errors
    ///
    /// Fails on unsupported shapes and unresolved record references; both are
    /// registration-time conditions, never call-time ones.
    pub fn schema_for(&self, desc: &TypeDesc) -> Result<StructuralSchema> {
        desc.check_bridgeable().map_err(Error::registration)?;
        let mut visiting = HashSet::new();
        self.expand(desc, &mut visiting)
    }

    fn expand(
        &self,
        desc: &TypeDesc,
        visiting: &mut HashSet<String>,
    ) -> Result<StructuralSchema> {
        let schema = match desc {
            TypeDesc::Bool => StructuralSchema::boolean(),
            TypeDesc::Integer => StructuralSchema::integer(),
            TypeDesc::Number | TypeDesc::Decimal => StructuralSchema::number(),
            TypeDesc::String | TypeDesc::Char | TypeDesc::Uuid => StructuralSchema::string(),
            TypeDesc::DateTime => {
                let mut schema = StructuralSchema::string();
                schema.format = Some("date-time".to_string());
                schema
            }
            TypeDesc::Enumeration {
                variants,
                description,
                ..
            } => {
                let mut schema = StructuralSchema::string();
                schema.enum_values = Some(variants.clone());
                schema.description = Some(
                    description
                        .clone()
                        .unwrap_or_else(|| format!("One of: {}", variants.join(", "))),
                );
                schema
            }
            TypeDesc::Array(element) => {
                StructuralSchema::array_of(self.expand(element, visiting)?)
            }
            TypeDesc::Map(value) => {
                let mut schema = StructuralSchema::empty_object();
                schema.additional = Some(AdditionalProps::Schema(Box::new(
                    self.expand(value, visiting)?,
                )));
                schema
            }
            TypeDesc::Optional(inner) => self.expand(inner, visiting)?,
            TypeDesc::Object(name) => self.expand_object(name, visiting)?,
            TypeDesc::Cancellation => {
                return Err(Error::registration(
                    "cancellation slot has no schema representation",
                ));
            }
            TypeDesc::Unsupported(reason) => {
                return Err(Error::registration(reason.clone()));
            }
        };
        Ok(schema)
    }

    fn expand_object(
        &self,
        name: &str,
        visiting: &mut HashSet<String>,
    ) -> Result<StructuralSchema> {
        // Cycle: collapse to an opaque object instead of recursing.
        if visiting.contains(name) {
            tracing::debug!("record '{}' is cyclic, collapsing to empty object", name);
            return Ok(StructuralSchema::empty_object());
        }

        if let Some(cached) = self
            .cache
            .read()
            .expect("schema cache poisoned")
            .get(name)
        {
            return Ok(cached.clone());
        }

        let desc = {
            let objects = self.objects.read().expect("schema engine poisoned");
            objects.get(name).cloned().ok_or_else(|| {
                Error::registration(format!("record '{}' is not defined", name))
            })?
        };

        // A record expanded while another record is in flight may have
        // collapsed at the outer record's cycle point, so its schema is only
        // partial relative to that context. The memo must hold each record's
        // own schema, never a context-dependent one.
        let memoize = visiting.is_empty();
        visiting.insert(name.to_string());
        let result = self.expand_fields(&desc, visiting);
        visiting.remove(name);
        let schema = result?;

        if memoize {
            self.cache
                .write()
                .expect("schema cache poisoned")
                .insert(name.to_string(), schema.clone());
        }
        Ok(schema)
    }

    fn expand_fields(
        &self,
        desc: &ObjectDesc,
        visiting: &mut HashSet<String>,
    ) -> Result<StructuralSchema> {
        let mut schema = StructuralSchema::empty_object();
        schema.description = desc.description.clone();
        for field in &desc.fields {
            if field.excluded {
                continue;
            }
            let node = self.field_schema(field, visiting)?;
            if field.is_required() {
                schema.required.push(field.name.clone());
            }
            schema.properties.push((field.name.clone(), node));
        }
        Ok(schema)
    }

    fn field_schema(
        &self,
        field: &FieldDesc,
        visiting: &mut HashSet<String>,
    ) -> Result<StructuralSchema> {
        let mut node = self.expand(&field.ty, visiting)?;
        if let Some(desc) = &field.description {
            node.description = Some(desc.clone());
        }
        let c = &field.constraints;
        if c.min_length.is_some() {
            node.min_length = c.min_length;
        }
        if c.max_length.is_some() {
            node.max_length = c.max_length;
        }
        if c.minimum.is_some() {
            node.minimum = c.minimum;
        }
        if c.maximum.is_some() {
            node.maximum = c.maximum;
        }
        if c.pattern.is_some() {
            node.pattern = c.pattern.clone();
        }
        if c.format.is_some() {
            node.format = c.format.clone();
        }
        Ok(node)
    }
}
