//! Incremental descriptor construction.
//!
//! The classifier feeds method-level findings into a `DescriptorBuilder`
//! one at a time; the builder merges findings that describe the same
//! logical attribute or element (overloaded setters, inherited
//! duplicates) and reports conflicts. `finish` resolves the merged state
//! into an immutable `TypeDescriptor`.

use std::collections::BTreeMap;

use crate::analysis::descriptor::{AttributeDescriptor, ElementDescriptor, TypeDescriptor};
use crate::model::{ClassId, CtorRef, ElementRef, MethodRef, ProgramModel, TypeRef};
use crate::report::Reporter;

pub struct DescriptorBuilder<'a> {
    model: &'a ProgramModel,
    reporter: &'a Reporter,
    class: ClassId,
    attributes: BTreeMap<String, PendingAttribute>,
    named: BTreeMap<String, PendingElement>,
    unnamed: Vec<PendingElement>,
    add_task: Option<MethodRef>,
    add_text: Option<MethodRef>,
    nested_classes: Vec<ClassId>,
}

struct PendingAttribute {
    /// Declared setter types, discovery order, deduplicated.
    types: Vec<TypeRef>,
    /// Every setter seen, discovery order.
    methods: Vec<MethodRef>,
}

struct PendingElement {
    types: Vec<TypeRef>,
    methods: Vec<MethodRef>,
    constructor: Option<CtorRef>,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn new(model: &'a ProgramModel, reporter: &'a Reporter, class: ClassId) -> Self {
        DescriptorBuilder {
            model,
            reporter,
            class,
            attributes: BTreeMap::new(),
            named: BTreeMap::new(),
            unnamed: Vec::new(),
            add_task: None,
            add_text: None,
            nested_classes: Vec::new(),
        }
    }

    /// Record a setter for the named attribute. Overloads merge into one
    /// attribute; the first discovered type stays primary.
    pub fn found_attribute(&mut self, name: &str, method: MethodRef, ty: TypeRef) {
        let pending = self
            .attributes
            .entry(name.to_string())
            .or_insert_with(|| PendingAttribute { types: Vec::new(), methods: Vec::new() });
        if !pending.types.contains(&ty) {
            pending.types.push(ty);
        }
        pending.methods.push(method);
    }

    /// Record a creator or adder for a named nested element. A repeated
    /// name merges; a later finding with a constructor wins the slot.
    pub fn found_named_element(
        &mut self,
        name: &str,
        method: MethodRef,
        ty: TypeRef,
        constructor: Option<CtorRef>,
    ) {
        let pending = self.named.entry(name.to_string()).or_insert_with(|| PendingElement {
            types: Vec::new(),
            methods: Vec::new(),
            constructor: None,
        });
        if !pending.types.contains(&ty) {
            pending.types.push(ty);
        }
        pending.methods.push(method);
        if constructor.is_some() {
            pending.constructor = constructor;
        }
    }

    /// Record an adder that accepts nested elements by type alone.
    pub fn found_unnamed_element(&mut self, method: MethodRef, ty: TypeRef) {
        if let Some(pending) = self.unnamed.iter_mut().find(|p| p.types.contains(&ty)) {
            pending.methods.push(method);
            return;
        }
        self.unnamed.push(PendingElement {
            types: vec![ty],
            methods: vec![method],
            constructor: None,
        });
    }

    /// Record the task-container acceptor. The first one wins; a second
    /// is a structural conflict.
    pub fn found_add_task(&mut self, method: MethodRef) {
        if self.add_task.is_some() {
            self.reporter.error_at(
                self.model.display(ElementRef::Method(method)),
                "Duplicate addTask method",
            );
            return;
        }
        self.add_task = Some(method);
    }

    /// Record the free-text acceptor. Same conflict policy as `found_add_task`.
    pub fn found_add_text(&mut self, method: MethodRef) {
        if self.add_text.is_some() {
            self.reporter.error_at(
                self.model.display(ElementRef::Method(method)),
                "Duplicate addText method",
            );
            return;
        }
        self.add_text = Some(method);
    }

    pub fn found_nested_class(&mut self, class: ClassId) {
        if !self.nested_classes.contains(&class) {
            self.nested_classes.push(class);
        }
    }

    /// Resolve the accumulated state. Multi-type attributes are reported
    /// here, once per attribute, after every setter has been seen.
    pub fn finish(self, is_task: bool) -> TypeDescriptor {
        let class = self.model.class(self.class);

        let mut attributes = BTreeMap::new();
        for (name, pending) in self.attributes {
            let defining = pick_defining(self.model, &pending.methods);
            if pending.types.len() > 1 {
                let listed = pending
                    .types
                    .iter()
                    .map(|t| t.simple_name())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.reporter.warn_at(
                    self.model.display(ElementRef::Method(defining)),
                    format!("Attribute {} has multiple declared types: {}", name, listed),
                );
            }
            let ty = pending.types[0].clone();
            let enum_values = ty
                .declared_name()
                .and_then(|n| self.model.lookup(n))
                .and_then(|id| self.model.class(id).string_enum_values.clone());
            attributes.insert(
                name.clone(),
                AttributeDescriptor {
                    name,
                    ty,
                    all_types: pending.types,
                    defining_method: defining,
                    enum_values,
                },
            );
        }

        let mut named_elements = BTreeMap::new();
        for (name, pending) in self.named {
            let defining = pick_defining(self.model, &pending.methods);
            named_elements.insert(
                name.clone(),
                ElementDescriptor {
                    name: Some(name),
                    types: pending.types,
                    defining_method: defining,
                    constructor: pending.constructor,
                },
            );
        }

        let unnamed_elements = self
            .unnamed
            .into_iter()
            .map(|pending| {
                let defining = pick_defining(self.model, &pending.methods);
                ElementDescriptor {
                    name: None,
                    types: pending.types,
                    defining_method: defining,
                    constructor: pending.constructor,
                }
            })
            .collect();

        TypeDescriptor {
            qualified_name: class.name.clone(),
            simple_name: class.simple_name().to_string(),
            is_task,
            attributes,
            named_elements,
            unnamed_elements,
            add_task_method: self.add_task,
            add_text_method: self.add_text,
            nested_classes: self.nested_classes,
        }
    }
}

/// The defining method is the first discovered one carrying a
/// documentation comment, or the first discovered one outright.
fn pick_defining(model: &ProgramModel, methods: &[MethodRef]) -> MethodRef {
    methods
        .iter()
        .copied()
        .find(|&m| model.method(m).doc.is_some())
        .unwrap_or(methods[0])
}
