mod pointer;
mod schema;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

pub use pointer::{ComponentPointer, component_name, parse_pointer};
pub use schema::{ReferenceKind, ResolvedSchema, SchemaKind};

use crate::error::ResolveError;
use crate::parse::OpenApiSpec;
use crate::parse::document::Components;
use crate::parse::operation::{
    Parameter, ParameterOrRef, RequestBody, RequestBodyOrRef, Response, ResponseOrRef,
};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};

/// A reference cycle found while resolving, as the chain of component names
/// from the first repeated component back to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    pub chain: Vec<String>,
}

impl fmt::Display for CycleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chain.join(" → "))
    }
}

/// Resolution state for one generation run.
///
/// Every schema component is expanded at most once; later references get a
/// clone of the same `Arc`. A reference met again while it is still being
/// expanded becomes a [`ReferenceKind::Cycle`] marker.
pub struct ResolutionContext<'a> {
    components: Option<&'a Components>,
    cache: HashMap<String, Arc<ResolvedSchema>>,
    stack: Vec<String>,
    cycles: Vec<CycleRecord>,
    max_depth: usize,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(spec: &'a OpenApiSpec, max_depth: usize) -> Self {
        Self {
            components: spec.components.as_ref(),
            cache: HashMap::new(),
            stack: Vec::new(),
            cycles: Vec::new(),
            max_depth,
        }
    }

    /// Resolve a `#/components/schemas/...` reference.
    pub fn resolve_ref(&mut self, ref_path: &str) -> Result<Arc<ResolvedSchema>, ResolveError> {
        let name = component_name(ref_path, "schemas")?;
        self.resolve_component(&name, ref_path)
    }

    pub fn resolve_schema_or_ref(
        &mut self,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<Arc<ResolvedSchema>, ResolveError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => self.resolve_ref(ref_path),
            SchemaOrRef::Schema(schema) => Ok(Arc::new(self.build(schema)?)),
        }
    }

    /// Resolve a schema component by its (decoded) name.
    pub fn resolve_named(&mut self, name: &str) -> Result<Arc<ResolvedSchema>, ResolveError> {
        self.resolve_component(name, &format!("#/components/schemas/{name}"))
    }

    pub fn resolve_parameter(
        &self,
        param: &'a ParameterOrRef,
    ) -> Result<&'a Parameter, ResolveError> {
        self.follow(
            param,
            "parameters",
            |p| match p {
                ParameterOrRef::Parameter(p) => Ok(p),
                ParameterOrRef::Ref { ref_path } => Err(ref_path),
            },
            |c, name| c.parameters.get(name),
        )
    }

    pub fn resolve_request_body(
        &self,
        body: &'a RequestBodyOrRef,
    ) -> Result<&'a RequestBody, ResolveError> {
        self.follow(
            body,
            "requestBodies",
            |b| match b {
                RequestBodyOrRef::RequestBody(b) => Ok(b),
                RequestBodyOrRef::Ref { ref_path } => Err(ref_path),
            },
            |c, name| c.request_bodies.get(name),
        )
    }

    pub fn resolve_response(
        &self,
        response: &'a ResponseOrRef,
    ) -> Result<&'a Response, ResolveError> {
        self.follow(
            response,
            "responses",
            |r| match r {
                ResponseOrRef::Response(r) => Ok(r),
                ResponseOrRef::Ref { ref_path } => Err(ref_path),
            },
            |c, name| c.responses.get(name),
        )
    }

    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    fn resolve_component(
        &mut self,
        name: &str,
        ref_path: &str,
    ) -> Result<Arc<ResolvedSchema>, ResolveError> {
        if let Some(hit) = self.cache.get(name) {
            return Ok(Arc::clone(hit));
        }

        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(name.to_string());
            let record = CycleRecord { chain };
            if !self.cycles.contains(&record) {
                debug!("reference cycle: {record}");
                self.cycles.push(record);
            }
            return Ok(Arc::new(ResolvedSchema::reference(
                name,
                ReferenceKind::Cycle,
            )));
        }

        if self.stack.len() >= self.max_depth {
            debug!("depth limit {} reached at {name}", self.max_depth);
            return Ok(Arc::new(ResolvedSchema::reference(
                name,
                ReferenceKind::DepthLimit,
            )));
        }

        let schema = self
            .components
            .and_then(|c| c.schemas.get(name))
            .ok_or_else(|| ResolveError::Unresolvable(ref_path.to_string()))?;

        self.stack.push(name.to_string());
        let result = match schema {
            // An alias component shares its target's instance.
            SchemaOrRef::Ref { ref_path: target } => self.resolve_ref(target),
            SchemaOrRef::Schema(schema) => self.build(schema).map(|mut resolved| {
                resolved.name = Some(name.to_string());
                Arc::new(resolved)
            }),
        };
        self.stack.pop();

        let resolved = result?;
        self.cache.insert(name.to_string(), Arc::clone(&resolved));
        Ok(resolved)
    }

    fn build(&mut self, schema: &Schema) -> Result<ResolvedSchema, ResolveError> {
        Ok(ResolvedSchema {
            name: None,
            description: schema.description.clone(),
            nullable: schema.is_nullable(),
            kind: self.build_kind(schema)?,
        })
    }

    fn build_kind(&mut self, schema: &Schema) -> Result<SchemaKind, ResolveError> {
        if !schema.all_of.is_empty() {
            return Ok(SchemaKind::Intersection(self.resolve_all(&schema.all_of)?));
        }
        let variants = if schema.one_of.is_empty() {
            &schema.any_of
        } else {
            &schema.one_of
        };
        if !variants.is_empty() {
            return Ok(SchemaKind::Union(self.resolve_all(variants)?));
        }
        if !schema.enum_values.is_empty() {
            let values = schema
                .enum_values
                .iter()
                .filter(|v| !v.is_null())
                .cloned()
                .collect();
            return Ok(SchemaKind::Enum(values));
        }
        if let Some(value) = &schema.const_value {
            return Ok(SchemaKind::Enum(vec![value.clone()]));
        }

        let Some(types) = schema.schema_type.as_ref().map(TypeSet::non_null) else {
            return self.infer_kind(schema);
        };
        match types.as_slice() {
            [] => Ok(SchemaKind::Null),
            [single] => self.kind_for_type(*single, schema),
            many => {
                let mut members = Vec::with_capacity(many.len());
                for t in many {
                    let kind = self.kind_for_type(*t, schema)?;
                    members.push(Arc::new(ResolvedSchema::anonymous(kind)));
                }
                Ok(SchemaKind::Union(members))
            }
        }
    }

    fn infer_kind(&mut self, schema: &Schema) -> Result<SchemaKind, ResolveError> {
        if !schema.properties.is_empty() || schema.additional_properties.is_some() {
            self.kind_for_type(SchemaType::Object, schema)
        } else if schema.items.is_some() {
            self.kind_for_type(SchemaType::Array, schema)
        } else {
            Ok(SchemaKind::Any)
        }
    }

    fn kind_for_type(
        &mut self,
        schema_type: SchemaType,
        schema: &Schema,
    ) -> Result<SchemaKind, ResolveError> {
        Ok(match schema_type {
            SchemaType::String => SchemaKind::String {
                format: schema.format.clone(),
            },
            SchemaType::Integer => SchemaKind::Integer,
            SchemaType::Number => SchemaKind::Number,
            SchemaType::Boolean => SchemaKind::Boolean,
            SchemaType::Null => SchemaKind::Null,
            SchemaType::Array => {
                let item = match &schema.items {
                    Some(items) => self.resolve_schema_or_ref(items)?,
                    None => Arc::new(ResolvedSchema::anonymous(SchemaKind::Any)),
                };
                SchemaKind::Array(item)
            }
            SchemaType::Object => {
                let mut properties = indexmap::IndexMap::new();
                for (prop, value) in &schema.properties {
                    properties.insert(prop.clone(), self.resolve_schema_or_ref(value)?);
                }
                let additional = match &schema.additional_properties {
                    Some(AdditionalProperties::Bool(true)) => {
                        Some(Arc::new(ResolvedSchema::anonymous(SchemaKind::Any)))
                    }
                    Some(AdditionalProperties::Schema(s)) => Some(self.resolve_schema_or_ref(s)?),
                    Some(AdditionalProperties::Bool(false)) | None => None,
                };
                match additional {
                    Some(values) if properties.is_empty() => SchemaKind::Map(values),
                    additional => SchemaKind::Object {
                        properties,
                        required: schema.required.clone(),
                        additional,
                    },
                }
            }
        })
    }

    fn resolve_all(
        &mut self,
        members: &[SchemaOrRef],
    ) -> Result<Vec<Arc<ResolvedSchema>>, ResolveError> {
        members
            .iter()
            .map(|m| self.resolve_schema_or_ref(m))
            .collect()
    }

    /// Follow `$ref` hops through one component section until an inline item is found.
    fn follow<T, U>(
        &self,
        start: &'a T,
        section: &str,
        split: fn(&'a T) -> Result<&'a U, &'a String>,
        lookup: fn(&'a Components, &str) -> Option<&'a T>,
    ) -> Result<&'a U, ResolveError> {
        let mut current = start;
        let mut last_ref = String::new();
        for _ in 0..=self.max_depth {
            match split(current) {
                Ok(item) => return Ok(item),
                Err(ref_path) => {
                    let name = component_name(ref_path, section)?;
                    current = self
                        .components
                        .and_then(|c| lookup(c, &name))
                        .ok_or_else(|| ResolveError::Unresolvable(ref_path.clone()))?;
                    last_ref = ref_path.clone();
                }
            }
        }
        Err(ResolveError::Unresolvable(last_ref))
    }
}
