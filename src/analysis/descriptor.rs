//! Descriptors: the structured result of classifying one class.
//!
//! A descriptor records how a class can be configured from a build file:
//! its attributes, the nested elements it accepts, and whether it takes
//! text content or nested tasks. Referenced types appear as `TypeRef`
//! keys only; a descriptor never embeds another class's descriptor, so
//! building one is never recursive.

use std::collections::BTreeMap;

use crate::model::{ClassId, CtorRef, MethodRef, TypeRef};

/// The configuration surface of one class, immutable once built.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub qualified_name: String,
    pub simple_name: String,
    /// Whether the class is a subtype of the framework task base class.
    pub is_task: bool,
    /// Attributes keyed by their lowercase build-file name.
    pub attributes: BTreeMap<String, AttributeDescriptor>,
    /// Nested elements keyed by their build-file name.
    pub named_elements: BTreeMap<String, ElementDescriptor>,
    /// Nested element types accepted without a fixed name.
    pub unnamed_elements: Vec<ElementDescriptor>,
    /// The method accepting arbitrary nested tasks, when the class is a
    /// task container.
    pub add_task_method: Option<MethodRef>,
    /// The method accepting free text content.
    pub add_text_method: Option<MethodRef>,
    /// Public static nested classes, candidates for their own entries.
    pub nested_classes: Vec<ClassId>,
}

impl TypeDescriptor {
    pub fn supports_text(&self) -> bool {
        self.add_text_method.is_some()
    }

    pub fn accepts_tasks(&self) -> bool {
        self.add_task_method.is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    pub fn named_element(&self, name: &str) -> Option<&ElementDescriptor> {
        self.named_elements.get(name)
    }
}

/// One settable attribute.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    pub name: String,
    /// The primary declared type (first setter discovered).
    pub ty: TypeRef,
    /// Every declared setter type, discovery order, deduplicated.
    pub all_types: Vec<TypeRef>,
    /// The method whose documentation describes this attribute.
    pub defining_method: MethodRef,
    /// Legal values, when the attribute type is a closed string enumeration.
    pub enum_values: Option<Vec<String>>,
}

/// One nested element, named or not.
#[derive(Debug, Clone)]
pub struct ElementDescriptor {
    /// Build-file name; `None` for elements accepted by type alone.
    pub name: Option<String>,
    /// Accepted types, discovery order, deduplicated.
    pub types: Vec<TypeRef>,
    /// The method whose documentation describes this element.
    pub defining_method: MethodRef,
    /// The constructor used to instantiate the element, when the host
    /// configures the instance before handing it over.
    pub constructor: Option<CtorRef>,
}
