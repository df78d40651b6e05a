//! Composite types: structures, tagged unions and services.
//!
//! A [`CompositeType`] is the semantic model of one DSDL definition. Construction runs a
//! single validate-then-derive pipeline shared by every kind:
//!
//! 1. name (namespaced, every component well-formed, length bound unless synthesized)
//! 2. version numbers
//! 3. attribute names (padding excluded) must be unique
//! 4. fixed port ID against the subject or service range
//! 5. no dependency on deprecated types unless deprecated itself
//! 6. alignment requirement
//! 7. aggregate bit-length set, kind-specific, and the minimal extent
//! 8. extent resolution and validation
//!
//! All derived properties are computed once here and never change afterwards, so a
//! constructed type can be shared freely between threads behind an [`Arc`].
//!
//! ## Kinds
//!
//! | Kind | Aggregate bit-length set | Field offsets |
//! |------|--------------------------|---------------|
//! | structure | ordered pointwise sum, each field pre-aligned | running sum |
//! | union | union of variants plus the tag width | identical for all variants |
//! | service | not serializable | not serializable |
//!
//! Services own two synthesized halves, `<Name>.Request` and `<Name>.Response`, which
//! point back at the service through a weak reference.

use crate::attribute::{Attribute, Constant, Field};
use crate::bit_length_set::{BitLengthSet, MAX_LEN};
use crate::error::{Error, ErrorKind, Result};
use crate::name::check_name;
use crate::port_id;
use crate::types::{CastMode, DataType, SerializableType, UnsignedIntegerType, BITS_PER_BYTE};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Name of the synthetic attribute that exposes the extent to expressions.
pub const EXTENT_ATTRIBUTE_NAME: &str = "_extent_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Version { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Declaration metadata and attributes of a message definition.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub version: Version,
    pub attributes: Vec<Attribute>,
    /// Explicit extent in bits; `None` lets it be derived.
    pub extent: Option<u64>,
    pub is_final: bool,
    pub deprecated: bool,
    pub fixed_port_id: Option<u32>,
    /// Empty for synthesized types.
    pub source_file_path: String,
}

impl Declaration {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Declaration {
            name: name.into(),
            version,
            attributes: Vec::new(),
            extent: None,
            is_final: false,
            deprecated: false,
            fixed_port_id: None,
            source_file_path: String::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_attributes<I, A>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Attribute>,
    {
        self.attributes.extend(attributes.into_iter().map(Into::into));
        self
    }

    pub fn with_extent(mut self, extent: u64) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_fixed_port_id(mut self, port_id: u32) -> Self {
        self.fixed_port_id = Some(port_id);
        self
    }

    pub fn with_source_file_path(mut self, path: impl Into<String>) -> Self {
        self.source_file_path = path.into();
        self
    }
}

/// Schema of one half (request or response) of a service.
#[derive(Debug, Clone, Default)]
pub struct SchemaParams {
    pub attributes: Vec<Attribute>,
    pub extent: Option<u64>,
    pub is_union: bool,
    pub is_final: bool,
}

impl SchemaParams {
    pub fn new<I, A>(attributes: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Attribute>,
    {
        SchemaParams {
            attributes: attributes.into_iter().map(Into::into).collect(),
            ..SchemaParams::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceDeclaration {
    pub name: String,
    pub version: Version,
    pub request: SchemaParams,
    pub response: SchemaParams,
    pub deprecated: bool,
    pub fixed_port_id: Option<u32>,
    pub source_file_path: String,
}

impl ServiceDeclaration {
    pub fn new(name: impl Into<String>, version: Version, request: SchemaParams, response: SchemaParams) -> Self {
        ServiceDeclaration {
            name: name.into(),
            version,
            request,
            response,
            deprecated: false,
            fixed_port_id: None,
            source_file_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Structure,
    Union,
    Service,
}

impl fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeKind::Structure => write!(f, "structure"),
            CompositeKind::Union => write!(f, "union"),
            CompositeKind::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug)]
enum Layout {
    Structure,
    Union {
        tag_field_type: UnsignedIntegerType,
    },
    Service {
        request: Arc<CompositeType>,
        response: Arc<CompositeType>,
    },
}

/// The semantic model of one definition. Immutable once constructed.
#[derive(Debug)]
pub struct CompositeType {
    name: String,
    version: Version,
    attributes: Vec<Attribute>,
    attributes_by_name: HashMap<String, usize>,
    is_final: bool,
    deprecated: bool,
    fixed_port_id: Option<u32>,
    source_file_path: String,
    parent_service: OnceLock<Weak<CompositeType>>,
    layout: Layout,
    alignment_requirement: u64,
    extent: u64,
    /// Kind-specific aggregate without the outer padding.
    aggregate: BitLengthSet,
    bit_length_set: BitLengthSet,
    delimiter_header_type: Option<UnsignedIntegerType>,
}

impl CompositeType {
    pub const MAX_NAME_LENGTH: usize = 50;
    pub const MAX_VERSION_NUMBER: u32 = 255;
    pub const NAME_COMPONENT_SEPARATOR: char = '.';
    pub const DEFAULT_DELIMITER_HEADER_BIT_LENGTH: u64 = 32;
    pub const MIN_NUMBER_OF_VARIANTS: usize = 2;

    /// Builds a plain structure.
    pub fn structure(declaration: Declaration) -> Result<Arc<CompositeType>> {
        Self::build(declaration, Pending::Structure, false).map(Arc::new)
    }

    /// Builds a tagged union; needs at least two variants and no padding.
    pub fn union(declaration: Declaration) -> Result<Arc<CompositeType>> {
        Self::build(declaration, Pending::Union, false).map(Arc::new)
    }

    /// Builds a service and its two synthesized halves.
    pub fn service(declaration: ServiceDeclaration) -> Result<Arc<CompositeType>> {
        let ServiceDeclaration {
            name,
            version,
            request,
            response,
            deprecated,
            fixed_port_id,
            source_file_path,
        } = declaration;
        let name = name.trim().to_string();
        let locate = |mut e: Error| {
            e.set_location_if_unknown(Some(&source_file_path), None);
            e
        };

        let request = Self::synthesize(&name, "Request", version, request, deprecated).map_err(locate)?;
        let response = Self::synthesize(&name, "Response", version, response, deprecated).map_err(locate)?;

        let container = Declaration {
            name,
            version,
            attributes: vec![
                Field::new(request.clone(), "request").into(),
                Field::new(response.clone(), "response").into(),
            ],
            extent: None,
            is_final: true,
            deprecated,
            fixed_port_id,
            source_file_path: source_file_path.clone(),
        };
        let service = Arc::new(Self::build(
            container,
            Pending::Service {
                request: request.clone(),
                response: response.clone(),
            },
            false,
        )?);

        for half in [&request, &response] {
            half.parent_service
                .set(Arc::downgrade(&service))
                .map_err(|_| Error::internal(format!("{} already belongs to a service", half)))?;
        }
        Ok(service)
    }

    fn synthesize(
        service_name: &str,
        suffix: &str,
        version: Version,
        params: SchemaParams,
        deprecated: bool,
    ) -> Result<Arc<CompositeType>> {
        let declaration = Declaration {
            name: format!("{}{}{}", service_name, Self::NAME_COMPONENT_SEPARATOR, suffix),
            version,
            attributes: params.attributes,
            extent: params.extent,
            is_final: params.is_final,
            deprecated,
            fixed_port_id: None,
            source_file_path: String::new(),
        };
        let pending = if params.is_union {
            Pending::Union
        } else {
            Pending::Structure
        };
        Self::build(declaration, pending, true).map(Arc::new)
    }

    fn build(declaration: Declaration, pending: Pending, synthesized: bool) -> Result<CompositeType> {
        let path = declaration.source_file_path.clone();
        Self::build_unlocated(declaration, pending, synthesized).map_err(|mut e| {
            e.set_location_if_unknown(Some(&path), None);
            e
        })
    }

    fn build_unlocated(declaration: Declaration, pending: Pending, synthesized: bool) -> Result<CompositeType> {
        let Declaration {
            name,
            version,
            attributes,
            extent,
            is_final,
            deprecated,
            fixed_port_id,
            source_file_path,
        } = declaration;
        let kind = pending.kind();

        let name = name.trim().to_string();
        check_composite_name(&name, synthesized)?;
        check_version(version)?;
        let attributes_by_name = index_attributes(&attributes)?;
        if let Some(port_id) = fixed_port_id {
            check_fixed_port_id(port_id, kind)?;
        }
        if !deprecated {
            check_deprecated_dependencies(&attributes)?;
        }

        let field_types: Vec<&DataType> = attributes
            .iter()
            .filter(|a| a.is_serialized())
            .map(Attribute::data_type)
            .collect();
        let alignment_requirement = field_types
            .iter()
            .map(|t| t.alignment_requirement())
            .fold(BITS_PER_BYTE, u64::max);

        let aggregate = match kind {
            CompositeKind::Union => Self::union_aggregate_bit_length_set(&field_types)?,
            // A service is laid out as a final structure of its two halves.
            CompositeKind::Structure | CompositeKind::Service => {
                Self::structure_aggregate_bit_length_set(&field_types)?
            }
        };
        let aggregate_max = aggregate
            .max()
            .ok_or_else(|| Error::internal(format!("empty aggregate bit length set of {}", name)))?;
        let minimal_extent = aggregate_max
            .checked_next_multiple_of(alignment_requirement)
            .ok_or_else(length_overflow)?;

        let extent = match extent {
            Some(explicit) => explicit,
            None if is_final => minimal_extent,
            // Double first, then align.
            None => aggregate_max
                .checked_mul(2)
                .and_then(|x| x.checked_next_multiple_of(alignment_requirement))
                .ok_or_else(length_overflow)?,
        };
        if let Err(e) = check_extent(extent, minimal_extent, alignment_requirement, is_final) {
            tracing::debug!(name = %name, extent, minimal_extent, "extent rejected");
            return Err(e);
        }

        if kind == CompositeKind::Union {
            check_union_attributes(&attributes, field_types.len())?;
        }

        let delimiter_header_type = if is_final {
            None
        } else {
            let bits = Self::DEFAULT_DELIMITER_HEADER_BIT_LENGTH.max(alignment_requirement);
            Some(
                UnsignedIntegerType::new(bits, CastMode::Saturated)
                    .map_err(|e| Error::internal(format!("delimiter header of {} bits: {}", bits, e)))?,
            )
        };

        let bit_length_set = match &delimiter_header_type {
            None => aggregate
                .clone()
                .checked_padded_to(alignment_requirement)
                .ok_or_else(length_overflow)?,
            // The extent is aligned, so padding 0..=extent leaves exactly its aligned points.
            Some(header) => {
                if extent / alignment_requirement >= MAX_LEN as u64 {
                    return Err(ErrorKind::InvalidExtent(format!(
                        "The extent of {} bits is too large; a delimited type supports at most {} bits",
                        extent,
                        (MAX_LEN as u64 - 1).saturating_mul(alignment_requirement)
                    ))
                    .into());
                }
                let step = usize::try_from(alignment_requirement)
                    .map_err(|_| Error::internal("alignment requirement does not fit in usize"))?;
                (0..=extent)
                    .step_by(step)
                    .collect::<BitLengthSet>()
                    .checked_shift(header.bit_length())
                    .ok_or_else(length_overflow)?
            }
        };

        let layout = match pending {
            Pending::Structure => Layout::Structure,
            Pending::Union => {
                let bits = Self::tag_bit_length(&field_types)?;
                let tag_field_type = UnsignedIntegerType::new(bits, CastMode::Truncated)
                    .map_err(|e| Error::internal(format!("union tag of {} bits: {}", bits, e)))?;
                Layout::Union { tag_field_type }
            }
            Pending::Service { request, response } => Layout::Service { request, response },
        };

        check_derived_invariants(extent, minimal_extent, alignment_requirement, is_final, &bit_length_set)?;

        tracing::debug!(
            name = %name,
            version = %version,
            kind = %kind,
            extent,
            alignment_requirement,
            bit_lengths = bit_length_set.len(),
            "composite type constructed"
        );

        Ok(CompositeType {
            name,
            version,
            attributes,
            attributes_by_name,
            is_final,
            deprecated,
            fixed_port_id,
            source_file_path,
            parent_service: OnceLock::new(),
            layout,
            alignment_requirement,
            extent,
            aggregate,
            bit_length_set,
            delimiter_header_type,
        })
    }

    /// Aggregate of a structure with fields of the given types, before the outer padding.
    /// Each field starts at its own alignment; an empty structure yields `{0}`.
    pub fn structure_aggregate_bit_length_set(field_types: &[&DataType]) -> Result<BitLengthSet> {
        let mut bls = BitLengthSet::from(0);
        for t in field_types {
            bls = bls
                .checked_padded_to(t.alignment_requirement())
                .and_then(|b| b.checked_add(&t.bit_length_set()))
                .ok_or_else(length_overflow)?;
        }
        Ok(bls)
    }

    /// Aggregate of a tagged union with variants of the given types, before the outer padding.
    /// Degenerate inputs are accepted: no variants yields `{0}`, one variant yields its own set.
    pub fn union_aggregate_bit_length_set(field_types: &[&DataType]) -> Result<BitLengthSet> {
        match field_types {
            [] => Ok(BitLengthSet::from(0)),
            [only] => Ok(only.bit_length_set()),
            _ => {
                let mut out = BitLengthSet::new();
                for t in field_types {
                    out |= &t.bit_length_set();
                }
                out.checked_shift(Self::tag_bit_length(field_types)?)
                    .ok_or_else(length_overflow)
            }
        }
    }

    /// Width of the implicit union tag: enough bits to enumerate the variants, rounded up
    /// to a power of two of at least one byte, and to the largest variant alignment.
    pub fn tag_bit_length(field_types: &[&DataType]) -> Result<u64> {
        if field_types.len() < Self::MIN_NUMBER_OF_VARIANTS {
            return Err(ErrorKind::MalformedUnion(format!(
                "Invalid number of variants: {}",
                field_types.len()
            ))
            .into());
        }
        let max_index = (field_types.len() - 1) as u64;
        let unaligned = u64::from(u64::BITS - max_index.leading_zeros());
        let tag = unaligned
            .max(BITS_PER_BYTE)
            .next_power_of_two()
            .max(field_types.iter().map(|t| t.alignment_requirement()).max().unwrap_or(1));
        if !matches!(tag, 8 | 16 | 32 | 64) {
            return Err(Error::internal(format!("union tag width {} is not a standard width", tag)));
        }
        Ok(tag)
    }

    pub fn full_name(&self) -> &str {
        &self.name
    }

    /// `["uavcan", "node", "Heartbeat"]` for `uavcan.node.Heartbeat`.
    pub fn name_components(&self) -> Vec<&str> {
        self.name.split(Self::NAME_COMPONENT_SEPARATOR).collect()
    }

    pub fn short_name(&self) -> &str {
        self.name
            .rsplit_once(Self::NAME_COMPONENT_SEPARATOR)
            .map_or(self.name.as_str(), |(_, short)| short)
    }

    /// The full name without the short name.
    pub fn full_namespace(&self) -> &str {
        self.name
            .rsplit_once(Self::NAME_COMPONENT_SEPARATOR)
            .map_or("", |(namespace, _)| namespace)
    }

    pub fn root_namespace(&self) -> &str {
        self.name
            .split(Self::NAME_COMPONENT_SEPARATOR)
            .next()
            .unwrap_or_default()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn kind(&self) -> CompositeKind {
        match self.layout {
            Layout::Structure => CompositeKind::Structure,
            Layout::Union { .. } => CompositeKind::Union,
            Layout::Service { .. } => CompositeKind::Service,
        }
    }

    pub fn is_union(&self) -> bool {
        self.kind() == CompositeKind::Union
    }

    pub fn is_service(&self) -> bool {
        self.kind() == CompositeKind::Service
    }

    /// Final types are serialized without a delimiter header and cannot change their layout.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn fixed_port_id(&self) -> Option<u32> {
        self.fixed_port_id
    }

    pub fn has_fixed_port_id(&self) -> bool {
        self.fixed_port_id.is_some()
    }

    /// Empty for synthesized request/response types.
    pub fn source_file_path(&self) -> &str {
        &self.source_file_path
    }

    /// Bits of storage a receiver needs for any minor-version-compatible serialization.
    ///
    /// For a final type this is the aligned maximum of the aggregate; otherwise it is either
    /// the explicit value or twice the unaligned maximum, aligned.
    pub fn extent(&self) -> u64 {
        self.extent
    }

    /// Length prefix used when this type is nested; `None` for final types.
    pub fn delimiter_header_type(&self) -> Option<&UnsignedIntegerType> {
        self.delimiter_header_type.as_ref()
    }

    /// Implicit tag of a union; `None` for other kinds.
    pub fn tag_field_type(&self) -> Option<&UnsignedIntegerType> {
        match &self.layout {
            Layout::Union { tag_field_type } => Some(tag_field_type),
            _ => None,
        }
    }

    pub fn number_of_variants(&self) -> usize {
        self.attributes.iter().filter(|a| a.is_serialized()).count()
    }

    pub fn request_type(&self) -> Option<&Arc<CompositeType>> {
        match &self.layout {
            Layout::Service { request, .. } => Some(request),
            _ => None,
        }
    }

    pub fn response_type(&self) -> Option<&Arc<CompositeType>> {
        match &self.layout {
            Layout::Service { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The service this type is the request or response of.
    pub fn parent_service(&self) -> Option<Arc<CompositeType>> {
        self.parent_service.get().and_then(Weak::upgrade)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Fields and padding fields in declaration order.
    pub fn fields(&self) -> Vec<&Attribute> {
        self.attributes.iter().filter(|a| a.is_serialized()).collect()
    }

    pub fn fields_except_padding(&self) -> Vec<&Field> {
        self.attributes.iter().filter_map(Attribute::as_field).collect()
    }

    pub fn constants(&self) -> Vec<&Constant> {
        self.attributes.iter().filter_map(Attribute::as_constant).collect()
    }

    /// Looks up a field or constant by name. Padding fields cannot be looked up.
    pub fn attribute(&self, name: &str) -> Result<&Attribute> {
        self.attributes_by_name
            .get(name)
            .map(|&i| &self.attributes[i])
            .ok_or_else(|| ErrorKind::UnknownAttribute(name.to_string()).into())
    }

    /// Resolves `name` for the expression evaluator: a constant, then `_extent_`,
    /// then whatever `fallback` makes of it.
    pub fn expression_attribute<F>(&self, name: &str, fallback: F) -> Result<Value>
    where
        F: FnOnce(&str) -> Result<Value>,
    {
        if let Some(c) = self.constants().into_iter().find(|c| c.name() == name) {
            return Ok(c.value().clone());
        }
        if name == EXTENT_ATTRIBUTE_NAME {
            return Ok(Value::from(self.extent));
        }
        fallback(name)
    }

    /// Kind-specific aggregate of the field bit-length sets without the outer padding.
    pub fn aggregate_bit_length_set(&self) -> Result<BitLengthSet> {
        self.ensure_serializable()?;
        Ok(self.aggregate.clone())
    }

    /// Every field (constants excluded, padding included) with its offset from the start
    /// of the outermost serialized object.
    ///
    /// `base_offset` defaults to `{0}` and is padded to [`Self::alignment_requirement`] first.
    /// A union yields the same offset, just past the tag, for every variant. Each yielded
    /// set is an independent copy.
    pub fn iterate_fields_with_offsets(&self, base_offset: Option<&BitLengthSet>) -> Result<FieldOffsets<'_>> {
        self.ensure_serializable()?;
        let base = match base_offset {
            Some(b) if !b.is_empty() => b.clone(),
            _ => BitLengthSet::from(0),
        };
        let mut offset = base
            .checked_padded_to(self.alignment_requirement)
            .ok_or_else(length_overflow)?;
        // Every offset the iterator computes stays within base plus aggregate.
        offset
            .max()
            .zip(self.aggregate.max())
            .and_then(|(base_max, aggregate_max)| base_max.checked_add(aggregate_max))
            .ok_or_else(length_overflow)?;
        let sequential = match &self.layout {
            Layout::Union { tag_field_type } => {
                offset += tag_field_type.bit_length();
                false
            }
            _ => true,
        };
        Ok(FieldOffsets {
            attributes: self.attributes.iter(),
            offset,
            sequential,
        })
    }

    fn ensure_serializable(&self) -> Result<()> {
        if self.is_service() {
            return Err(ErrorKind::NotSerializable(
                "Service types are not directly serializable. Use either request or response.".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

impl SerializableType for CompositeType {
    /// For a final type, the aligned aggregate. Otherwise every aligned length up to the
    /// extent plus the delimiter header: nesting types must not rely on internal offsets
    /// that a later minor version may change.
    fn bit_length_set(&self) -> BitLengthSet {
        self.bit_length_set.clone()
    }

    fn alignment_requirement(&self) -> u64 {
        self.alignment_requirement
    }
}

/// `uavcan.node.Heartbeat.1.0`
impl fmt::Display for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.version)
    }
}

/// Iterator returned by [`CompositeType::iterate_fields_with_offsets`].
pub struct FieldOffsets<'a> {
    attributes: std::slice::Iter<'a, Attribute>,
    offset: BitLengthSet,
    /// Structures advance the offset past each field; unions keep it fixed.
    sequential: bool,
}

impl<'a> Iterator for FieldOffsets<'a> {
    type Item = (&'a Attribute, BitLengthSet);

    fn next(&mut self) -> Option<Self::Item> {
        let field = self.attributes.by_ref().find(|a| a.is_serialized())?;
        let data_type = field.data_type();
        let alignment = data_type.alignment_requirement();
        if self.sequential {
            self.offset.pad_to_alignment(alignment);
        }
        let offset = self.offset.clone();
        let aligned = offset.is_aligned_at(alignment);
        if !aligned {
            tracing::warn!(field = field.name(), offset = %offset, alignment, "field offset is not aligned");
        }
        debug_assert!(aligned, "offset {} of {:?} is not aligned at {}", offset, field.name(), alignment);
        if self.sequential {
            self.offset += &data_type.bit_length_set();
        }
        tracing::trace!(field = field.name(), offset = %offset, "field offset");
        Some((field, offset))
    }
}

enum Pending {
    Structure,
    Union,
    Service {
        request: Arc<CompositeType>,
        response: Arc<CompositeType>,
    },
}

impl Pending {
    fn kind(&self) -> CompositeKind {
        match self {
            Pending::Structure => CompositeKind::Structure,
            Pending::Union => CompositeKind::Union,
            Pending::Service { .. } => CompositeKind::Service,
        }
    }
}

fn check_composite_name(name: &str, synthesized: bool) -> Result<()> {
    if name.is_empty() {
        return Err(ErrorKind::InvalidName("Composite type name cannot be empty".to_string()).into());
    }
    if !name.contains(CompositeType::NAME_COMPONENT_SEPARATOR) {
        return Err(ErrorKind::InvalidName("Root namespace is not specified".to_string()).into());
    }
    if name.chars().count() > CompositeType::MAX_NAME_LENGTH && !synthesized {
        return Err(ErrorKind::InvalidName(format!(
            "Name is too long: {:?} is longer than {} characters",
            name,
            CompositeType::MAX_NAME_LENGTH
        ))
        .into());
    }
    name.split(CompositeType::NAME_COMPONENT_SEPARATOR)
        .try_for_each(check_name)
}

fn length_overflow() -> Error {
    ErrorKind::InvalidExtent("The serialized length of this data type does not fit in 64 bits".to_string()).into()
}

fn check_version(version: Version) -> Result<()> {
    let in_range = |x: u32| x <= CompositeType::MAX_VERSION_NUMBER;
    if !in_range(version.major) || !in_range(version.minor) || (version.major == 0 && version.minor == 0) {
        return Err(ErrorKind::InvalidVersion(format!("Invalid version numbers: {}", version)).into());
    }
    Ok(())
}

fn index_attributes(attributes: &[Attribute]) -> Result<HashMap<String, usize>> {
    let mut by_name = HashMap::new();
    for (i, a) in attributes.iter().enumerate() {
        if a.is_padding() {
            continue;
        }
        if by_name.insert(a.name().to_string(), i).is_some() {
            return Err(ErrorKind::AttributeNameCollision(format!(
                "Multiple attributes under the same name: {:?}",
                a.name()
            ))
            .into());
        }
    }
    Ok(by_name)
}

fn check_fixed_port_id(port_id: u32, kind: CompositeKind) -> Result<()> {
    let (valid, what) = match kind {
        CompositeKind::Service => (port_id::is_valid_service_id(port_id), "service"),
        _ => (port_id::is_valid_subject_id(port_id), "subject"),
    };
    if !valid {
        return Err(ErrorKind::InvalidFixedPortId(format!("Fixed {} ID {} is not valid", what, port_id)).into());
    }
    Ok(())
}

fn check_deprecated_dependencies(attributes: &[Attribute]) -> Result<()> {
    fn deprecated_dependency(t: &DataType) -> Option<&CompositeType> {
        match t {
            DataType::Composite(c) if c.deprecated() => Some(c),
            DataType::FixedLengthArray(a) => deprecated_dependency(a.element_type()),
            DataType::VariableLengthArray(a) => deprecated_dependency(a.element_type()),
            _ => None,
        }
    }
    for a in attributes {
        if let Some(dependency) = deprecated_dependency(a.data_type()) {
            return Err(ErrorKind::DeprecatedDependency(format!(
                "A type cannot depend on deprecated types unless it is also deprecated: {:?} is of {}",
                a.name(),
                dependency
            ))
            .into());
        }
    }
    Ok(())
}

fn check_extent(extent: u64, minimal_extent: u64, alignment: u64, is_final: bool) -> Result<()> {
    if extent % alignment != 0 {
        return Err(ErrorKind::InvalidExtent(format!(
            "The specified extent of {} bits is not a multiple of {} bits",
            extent, alignment
        ))
        .into());
    }
    if extent < minimal_extent {
        return Err(ErrorKind::InvalidExtent(format!(
            "The specified extent of {} bits is too small for this data type. \
             Either compactify the data type or increase the extent at least to {} bits. \
             Beware that the latter option may break wire compatibility.",
            extent, minimal_extent
        ))
        .into());
    }
    if is_final && extent > minimal_extent {
        return Err(ErrorKind::InvalidExtent(format!(
            "Cannot override the extent because the type is final. \
             Either remove the explicit extent specification or change it from {} bits to {} bits.",
            extent, minimal_extent
        ))
        .into());
    }
    Ok(())
}

fn check_union_attributes(attributes: &[Attribute], number_of_variants: usize) -> Result<()> {
    if number_of_variants < CompositeType::MIN_NUMBER_OF_VARIANTS {
        return Err(ErrorKind::MalformedUnion(format!(
            "A tagged union cannot contain fewer than {} variants",
            CompositeType::MIN_NUMBER_OF_VARIANTS
        ))
        .into());
    }
    if attributes.iter().any(|a| a.is_padding() || a.data_type().is_void()) {
        return Err(ErrorKind::MalformedUnion("Padding fields not allowed in unions".to_string()).into());
    }
    Ok(())
}

fn check_derived_invariants(
    extent: u64,
    minimal_extent: u64,
    alignment: u64,
    is_final: bool,
    bit_length_set: &BitLengthSet,
) -> Result<()> {
    if alignment < BITS_PER_BYTE || alignment % BITS_PER_BYTE != 0 {
        return Err(Error::internal(format!("alignment requirement of {} bits", alignment)));
    }
    if extent % BITS_PER_BYTE != 0 || extent < minimal_extent || (is_final && extent != minimal_extent) {
        return Err(Error::internal(format!(
            "extent of {} bits against minimal extent of {} bits",
            extent, minimal_extent
        )));
    }
    if bit_length_set.is_empty() || !bit_length_set.is_aligned_at(alignment) {
        return Err(Error::internal(format!("bit length set {} is not aligned", bit_length_set)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn composite_types_are_shareable() {
        assert_send_sync::<CompositeType>();
        assert_send_sync::<Arc<CompositeType>>();
    }

    #[test]
    fn tag_width_grows_with_variants() {
        let u8t: DataType = UnsignedIntegerType::new(8, CastMode::Truncated).unwrap().into();
        let widths: Vec<u64> = [2usize, 256, 257, 65_536, 65_537]
            .iter()
            .map(|&n| CompositeType::tag_bit_length(&vec![&u8t; n]).unwrap())
            .collect();
        assert_eq!(widths, vec![8, 8, 16, 16, 32]);
        assert!(CompositeType::tag_bit_length(&[&u8t]).is_err());
    }

    #[test]
    fn degenerate_union_aggregates() {
        let u16t: DataType = UnsignedIntegerType::new(16, CastMode::Truncated).unwrap().into();
        assert_eq!(
            CompositeType::union_aggregate_bit_length_set(&[]).unwrap(),
            BitLengthSet::from(0)
        );
        assert_eq!(
            CompositeType::union_aggregate_bit_length_set(&[&u16t]).unwrap(),
            BitLengthSet::from(16)
        );
    }

    #[test]
    fn version_display_and_checks() {
        assert_eq!(Version::new(1, 0).to_string(), "1.0");
        assert!(check_version(Version::new(0, 1)).is_ok());
        assert!(check_version(Version::new(0, 0)).is_err());
        assert!(check_version(Version::new(256, 0)).is_err());
        assert!(check_version(Version::new(1, 256)).is_err());
        assert!(check_version(Version::new(255, 255)).is_ok());
    }
}
