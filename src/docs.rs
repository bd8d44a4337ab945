//! Documentation-tag reconciliation.
//!
//! The structural classification says what a class *can* do; the `ant.*`
//! documentation tags say what its authors *meant*. This module joins
//! the two views into `EntityDoc`, the complete picture of one
//! documented task or type: display name, category, per-attribute
//! required/optional annotations, element descriptions with fallbacks,
//! and the global properties and references the class declares through
//! string constants.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::analysis::classify::{JAVA_STRING, TASK_CONTAINER};
use crate::analysis::descriptor::{AttributeDescriptor, ElementDescriptor, TypeDescriptor};
use crate::model::{plain_text, ClassId, DocComment, DocNode, ElementRef, FieldRef};
use crate::session::Session;
use crate::tags::{parse_tag, TagInfo};

pub const TAG_TASK: &str = "ant.task";
pub const TAG_TYPE: &str = "ant.type";
pub const TAG_PROP: &str = "ant.prop";
pub const TAG_REF: &str = "ant.ref";

/// Tags that mark a class as a documented entity, in precedence order.
pub const ANT_TAG_FAMILY: &[&str] = &[TAG_TASK, TAG_TYPE, TAG_PROP, TAG_REF];

pub const TAG_REQUIRED: &str = "ant.required";
pub const TAG_OPTIONAL: &str = "ant.optional";
/// Legacy spelling of `ant.optional`, still honored.
pub const TAG_NOT_REQUIRED: &str = "ant.not-required";

/// The analyzed documentation comment of one program element.
///
/// Only `ant.`-prefixed block tags are retained; everything else belongs
/// to the standard toolchain. The first occurrence of a repeated tag
/// name wins.
#[derive(Debug, Clone, Default)]
pub struct DocInfo {
    pub body: Vec<DocNode>,
    pub first_sentence: Vec<DocNode>,
    tags: BTreeMap<String, TagInfo>,
}

impl DocInfo {
    pub fn analyze(doc: &DocComment) -> DocInfo {
        let mut tags = BTreeMap::new();
        for tag in &doc.tags {
            if !tag.name.starts_with("ant.") {
                continue;
            }
            tags.entry(tag.name.clone())
                .or_insert_with(|| parse_tag(&tag.name, &tag.content));
        }
        DocInfo {
            body: doc.body.clone(),
            first_sentence: doc.first_sentence.clone(),
            tags,
        }
    }

    pub fn tag(&self, name: &str) -> Option<&TagInfo> {
        self.tags.get(name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// All retained tags, in name order.
    pub fn tags(&self) -> impl Iterator<Item = &TagInfo> {
        self.tags.values()
    }

    /// The entity-marking tag, when one is present.
    pub fn ant_tag(&self) -> Option<&TagInfo> {
        ANT_TAG_FAMILY.iter().find_map(|name| self.tags.get(*name))
    }

    pub fn description(&self) -> String {
        plain_text(&self.body)
    }

    pub fn short_description(&self) -> String {
        plain_text(&self.first_sentence)
    }
}

/// A global property declared through a tagged string constant.
#[derive(Debug, Clone)]
pub struct PropertyDoc {
    pub name: String,
    pub type_name: String,
    pub field: FieldRef,
}

/// A global reference declared through a tagged string constant.
#[derive(Debug, Clone)]
pub struct ReferenceDoc {
    pub id: String,
    pub type_name: String,
    pub field: FieldRef,
}

/// Per-class facts gathered from tagged fields, source-line ordered.
#[derive(Debug, Clone, Default)]
pub struct EntityFacts {
    pub properties: Vec<PropertyDoc>,
    pub references: Vec<ReferenceDoc>,
}

impl EntityFacts {
    pub fn discover(session: &Session, class: ClassId) -> EntityFacts {
        let model = session.model();
        let data = model.class(class);
        let mut facts = EntityFacts::default();

        for (index, field) in data.fields.iter().enumerate() {
            let mods = field.modifiers;
            if !(mods.is_public && mods.is_static && mods.is_final) {
                continue;
            }
            if !field.ty.is_declared(JAVA_STRING) {
                continue;
            }
            let field_ref = FieldRef { class, index };
            let info = session.doc_info(ElementRef::Field(field_ref));

            if let Some(tag) = info.tag(TAG_PROP) {
                let name = declared_key(session, field_ref, tag, "name", "property names");
                let type_name = tag.attribute("type").unwrap_or("String").to_string();
                facts.properties.push(PropertyDoc { name, type_name, field: field_ref });
            }

            if let Some(tag) = info.tag(TAG_REF) {
                let id = declared_key(session, field_ref, tag, "name", "reference IDs");
                let type_name = match tag.attribute("type") {
                    Some(t) => t.to_string(),
                    None => {
                        session.reporter().error_at(
                            model.display(ElementRef::Field(field_ref)),
                            format!("Reference lacks type: {}", id),
                        );
                        "Object".to_string()
                    }
                };
                facts.references.push(ReferenceDoc { id, type_name, field: field_ref });
            }
        }

        facts
            .properties
            .sort_by_key(|p| model.line_of(ElementRef::Field(p.field)));
        facts
            .references
            .sort_by_key(|r| model.line_of(ElementRef::Field(r.field)));
        facts
    }
}

/// The property name / reference id is the field's constant value; a
/// disagreeing `name` attribute on the tag is reported and the constant
/// wins. Fields without a constant fall back to the attribute, then to
/// the field name.
fn declared_key(
    session: &Session,
    field_ref: FieldRef,
    tag: &TagInfo,
    attr: &str,
    what: &str,
) -> String {
    let model = session.model();
    let field = model.field(field_ref);
    let declared = tag.attribute(attr);
    if let Some(constant) = &field.constant {
        if let Some(declared) = declared {
            if declared != constant {
                session.reporter().warn_at(
                    model.display(ElementRef::Field(field_ref)),
                    format!("Inconsistent {}: {} and {}", what, constant, declared),
                );
            }
        }
        return constant.clone();
    }
    declared
        .map(str::to_string)
        .unwrap_or_else(|| field.name.clone())
}

/// Everything the rendering layer needs to know about one entity.
pub struct EntityDoc<'a> {
    session: &'a Session,
    class: ClassId,
    descriptor: Rc<TypeDescriptor>,
    facts: Rc<EntityFacts>,
}

impl<'a> EntityDoc<'a> {
    pub(crate) fn new(
        session: &'a Session,
        class: ClassId,
        descriptor: Rc<TypeDescriptor>,
        facts: Rc<EntityFacts>,
    ) -> EntityDoc<'a> {
        EntityDoc { session, class, descriptor, facts }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn class_info(&self) -> Rc<DocInfo> {
        self.session.doc_info(ElementRef::Class(self.class))
    }

    /// Whether the class carries any entity-marking tag.
    pub fn is_tagged(&self) -> bool {
        self.class_info().ant_tag().is_some()
    }

    /// An `ignore="true"` attribute (case-insensitive) on the marking
    /// tag excludes the class from documentation.
    pub fn is_ignored(&self) -> bool {
        self.class_info()
            .ant_tag()
            .and_then(|tag| tag.attribute("ignore"))
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
    }

    pub fn is_task(&self) -> bool {
        if self.class_info().has_tag(TAG_TASK) {
            return true;
        }
        !self.class_info().has_tag(TAG_TYPE) && self.descriptor.is_task
    }

    pub fn is_type(&self) -> bool {
        !self.is_task()
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_task() {
            "task"
        } else {
            "type"
        }
    }

    pub fn is_task_container(&self) -> bool {
        self.descriptor.accepts_tasks() || self.session.is_subtype_of(self.class, TASK_CONTAINER)
    }

    /// The build-file name: the marking tag's `name` attribute, or for a
    /// nested class the enclosing entity's name joined with a dot, or
    /// the simple class name.
    pub fn display_name(&self) -> String {
        entity_name(self.session, self.class)
    }

    /// The category, inherited from the nearest enclosing entity when
    /// the class does not declare one.
    pub fn category(&self) -> Option<String> {
        entity_category(self.session, self.class)
    }

    pub fn description(&self) -> Option<String> {
        non_empty(self.class_info().description())
    }

    pub fn short_description(&self) -> Option<String> {
        non_empty(self.class_info().short_description())
    }

    /// Attributes in source order of their defining setters.
    pub fn attributes(&self) -> Vec<&AttributeDescriptor> {
        let model = self.session.model();
        let mut out: Vec<_> = self.descriptor.attributes.values().collect();
        out.sort_by_key(|a| model.line_of(ElementRef::Method(a.defining_method)));
        out
    }

    /// Named nested elements in source order of their defining methods.
    pub fn named_elements(&self) -> Vec<&ElementDescriptor> {
        let model = self.session.model();
        let mut out: Vec<_> = self.descriptor.named_elements.values().collect();
        out.sort_by_key(|e| model.line_of(ElementRef::Method(e.defining_method)));
        out
    }

    pub fn unnamed_elements(&self) -> Vec<&ElementDescriptor> {
        let model = self.session.model();
        let mut out: Vec<_> = self.descriptor.unnamed_elements.iter().collect();
        out.sort_by_key(|e| model.line_of(ElementRef::Method(e.defining_method)));
        out
    }

    fn method_info(&self, e: &ElementDescriptor) -> Rc<DocInfo> {
        self.session.doc_info(ElementRef::Method(e.defining_method))
    }

    /// A `name` attribute of an `ant.type` tag on the defining method
    /// overrides the structural element name.
    pub fn element_display_name(&self, e: &ElementDescriptor) -> String {
        if let Some(name) = self
            .method_info(e)
            .tag(TAG_TYPE)
            .and_then(|tag| tag.attribute("name"))
        {
            return name.to_string();
        }
        match &e.name {
            Some(name) => name.clone(),
            None => e.types[0].simple_name().to_lowercase(),
        }
    }

    /// The `ant.required` annotation of an attribute's defining setter;
    /// the value is the tag content (possibly empty, meaning
    /// unconditionally required).
    pub fn attribute_required(&self, a: &AttributeDescriptor) -> Option<String> {
        self.session
            .doc_info(ElementRef::Method(a.defining_method))
            .tag(TAG_REQUIRED)
            .map(TagInfo::content_text)
    }

    pub fn attribute_optional(&self, a: &AttributeDescriptor) -> Option<String> {
        let info = self.session.doc_info(ElementRef::Method(a.defining_method));
        info.tag(TAG_OPTIONAL)
            .or_else(|| info.tag(TAG_NOT_REQUIRED))
            .map(TagInfo::content_text)
    }

    pub fn attribute_description(&self, a: &AttributeDescriptor) -> Option<String> {
        let info = self.session.doc_info(ElementRef::Method(a.defining_method));
        non_empty(info.description())
    }

    /// Element descriptions fall back from the defining method to the
    /// element constructor to the element type itself.
    pub fn element_description(&self, e: &ElementDescriptor) -> Option<String> {
        if let Some(text) = non_empty(self.method_info(e).description()) {
            return Some(text);
        }
        if let Some(ctor) = e.constructor {
            let info = self.session.doc_info(ElementRef::Ctor(ctor));
            if let Some(text) = non_empty(info.description()) {
                return Some(text);
            }
        }
        let model = self.session.model();
        for ty in &e.types {
            if let Some(id) = ty.declared_name().and_then(|n| model.lookup(n)) {
                let info = self.session.doc_info(ElementRef::Class(id));
                if let Some(text) = non_empty(info.short_description()) {
                    return Some(text);
                }
            }
        }
        None
    }

    pub fn field_description(&self, f: FieldRef) -> Option<String> {
        non_empty(self.session.doc_info(ElementRef::Field(f)).description())
    }

    pub fn properties(&self) -> &[PropertyDoc] {
        &self.facts.properties
    }

    pub fn references(&self) -> &[ReferenceDoc] {
        &self.facts.references
    }

    /// Display names of the public static nested classes, for
    /// cross-linking by the rendering layer.
    pub fn nested_class_names(&self) -> Vec<String> {
        self.descriptor
            .nested_classes
            .iter()
            .map(|&id| entity_name(self.session, id))
            .collect()
    }
}

fn entity_name(session: &Session, class: ClassId) -> String {
    let info = session.doc_info(ElementRef::Class(class));
    if let Some(name) = info.ant_tag().and_then(|tag| tag.attribute("name")) {
        return name.to_string();
    }
    let model = session.model();
    let data = model.class(class);
    if let Some(enclosing) = data.enclosing.as_deref().and_then(|n| model.lookup(n)) {
        return format!("{}.{}", entity_name(session, enclosing), data.simple_name());
    }
    data.simple_name().to_string()
}

fn entity_category(session: &Session, class: ClassId) -> Option<String> {
    let info = session.doc_info(ElementRef::Class(class));
    if let Some(category) = info.ant_tag().and_then(|tag| tag.attribute("category")) {
        return Some(category.to_string());
    }
    let model = session.model();
    model
        .class(class)
        .enclosing
        .as_deref()
        .and_then(|n| model.lookup(n))
        .and_then(|id| entity_category(session, id))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutil::*;
    use crate::model::BlockTag;

    pub(crate) fn doc_with_tags(body: &str, tags: &[(&str, &str)]) -> DocComment {
        DocComment {
            body: vec![DocNode::Text(body.to_string())],
            first_sentence: vec![DocNode::Text(body.to_string())],
            tags: tags
                .iter()
                .map(|(name, content)| BlockTag {
                    name: name.to_string(),
                    content: vec![DocNode::Text(content.to_string())],
                })
                .collect(),
        }
    }

    #[test]
    fn test_only_ant_tags_are_retained() {
        let doc = doc_with_tags(
            "Fetches a resource.",
            &[("param", "url the URL"), ("ant.task", r#"name="httpfetch""#)],
        );
        let info = DocInfo::analyze(&doc);
        assert!(info.has_tag("ant.task"));
        assert!(!info.has_tag("param"));
        assert_eq!(info.ant_tag().unwrap().attribute("name"), Some("httpfetch"));
        assert_eq!(info.description(), "Fetches a resource.");
    }

    #[test]
    fn test_first_repeated_tag_wins() {
        let doc = doc_with_tags(
            "",
            &[("ant.task", r#"name="first""#), ("ant.task", r#"name="second""#)],
        );
        let info = DocInfo::analyze(&doc);
        assert_eq!(info.tag("ant.task").unwrap().attribute("name"), Some("first"));
    }

    #[test]
    fn test_family_precedence() {
        let doc = doc_with_tags(
            "",
            &[("ant.type", r#"name="t""#), ("ant.task", r#"name="k""#)],
        );
        let info = DocInfo::analyze(&doc);
        // ant.task outranks ant.type regardless of declaration order
        assert_eq!(info.ant_tag().unwrap().name, "ant.task");
    }

    mod entity {
        use super::*;
        use crate::analysis::classify::{JAVA_STRING, TASK};
        use crate::model::ClassData;
        use crate::session::Session;

        fn session_with(classes: Vec<ClassData>) -> Session {
            let mut all = framework_classes();
            all.extend(classes);
            Session::new(model(all))
        }

        fn fetch_task() -> ClassData {
            let mut c = class("org.acme.HttpFetch");
            c.superclass = Some(TASK.to_string());
            c.doc = Some(doc_with_tags(
                "Fetches a resource over HTTP.",
                &[("ant.task", r#"name="httpfetch" category="network""#)],
            ));
            c
        }

        #[test]
        fn test_display_name_and_category_from_tag() {
            let session = session_with(vec![fetch_task()]);
            let id = session.model().lookup("org.acme.HttpFetch").unwrap();
            let entity = session.entity(id);

            assert_eq!(entity.display_name(), "httpfetch");
            assert_eq!(entity.category().as_deref(), Some("network"));
            assert_eq!(entity.kind_label(), "task");
            assert!(entity.is_tagged());
            assert!(!entity.is_ignored());
        }

        #[test]
        fn test_untagged_task_uses_simple_name() {
            let mut c = class("org.acme.Copy");
            c.superclass = Some(TASK.to_string());
            let session = session_with(vec![c]);
            let id = session.model().lookup("org.acme.Copy").unwrap();
            let entity = session.entity(id);

            assert_eq!(entity.display_name(), "Copy");
            assert!(entity.category().is_none());
            assert!(!entity.is_tagged());
        }

        #[test]
        fn test_nested_entity_name_and_inherited_category() {
            let mut outer = fetch_task();
            outer.nested.push("org.acme.HttpFetch$Auth".to_string());
            let mut inner = class("org.acme.HttpFetch$Auth");
            inner.enclosing = Some("org.acme.HttpFetch".to_string());
            let session = session_with(vec![outer, inner]);
            let id = session.model().lookup("org.acme.HttpFetch$Auth").unwrap();
            let entity = session.entity(id);

            assert_eq!(entity.display_name(), "httpfetch.Auth");
            assert_eq!(entity.category().as_deref(), Some("network"));
        }

        #[test]
        fn test_ignore_attribute() {
            let mut c = class("org.acme.Internal");
            c.doc = Some(doc_with_tags("", &[("ant.type", r#"ignore="true""#)]));
            let session = session_with(vec![c]);
            let id = session.model().lookup("org.acme.Internal").unwrap();
            assert!(session.entity(id).is_ignored());
        }

        #[test]
        fn test_required_and_optional_annotations() {
            let mut c = fetch_task();
            let mut set_url = method("setUrl", &[JAVA_STRING], "void", 10);
            set_url.doc = Some(doc_with_tags("The resource URL.", &[("ant.required", "")]));
            let mut set_timeout = method("setTimeout", &["int"], "void", 11);
            set_timeout.doc =
                Some(doc_with_tags("Read timeout.", &[("ant.not-required", "Defaults to 30s.")]));
            c.methods.push(set_url);
            c.methods.push(set_timeout);
            let session = session_with(vec![c]);
            let id = session.model().lookup("org.acme.HttpFetch").unwrap();
            let entity = session.entity(id);

            let attrs = entity.attributes();
            assert_eq!(attrs.len(), 2);
            assert_eq!(attrs[0].name, "url");
            assert_eq!(entity.attribute_required(attrs[0]), Some(String::new()));
            assert_eq!(entity.attribute_optional(attrs[0]), None);
            assert_eq!(
                entity.attribute_optional(attrs[1]).as_deref(),
                Some("Defaults to 30s.")
            );
            assert_eq!(
                entity.attribute_description(attrs[0]).as_deref(),
                Some("The resource URL.")
            );
        }

        #[test]
        fn test_element_name_override_and_description_fallback() {
            let mut header = class("org.acme.Header");
            header.constructors.push(ctor(&[]));
            header.doc = Some(doc_with_tags("A request header.", &[]));

            let mut c = fetch_task();
            let mut adder = method("addConfiguredHeader", &["org.acme.Header"], "void", 10);
            adder.doc = Some(doc_with_tags("", &[("ant.type", r#"name="hdr""#)]));
            c.methods.push(adder);

            let session = session_with(vec![c, header]);
            let id = session.model().lookup("org.acme.HttpFetch").unwrap();
            let entity = session.entity(id);

            let elements = entity.named_elements();
            assert_eq!(elements.len(), 1);
            assert_eq!(entity.element_display_name(elements[0]), "hdr");
            // method doc is empty: the element type's doc is used
            assert_eq!(
                entity.element_description(elements[0]).as_deref(),
                Some("A request header.")
            );
        }

        #[test]
        fn test_properties_and_references_from_constants() {
            let mut c = fetch_task();
            let mut prop = string_field("PROXY_PROP", "acme.http.proxy", 5);
            prop.doc = Some(doc_with_tags(
                "Proxy host property.",
                &[("ant.prop", r#"name="acme.http.proxy" type="String""#)],
            ));
            let mut bad_prop = string_field("RETRIES_PROP", "acme.http.retries", 6);
            bad_prop.doc = Some(doc_with_tags("", &[("ant.prop", r#"name="acme.retries""#)]));
            let mut reference = string_field("POOL_REF", "acme.http.pool", 7);
            reference.doc = Some(doc_with_tags("", &[("ant.ref", r#"name="acme.http.pool""#)]));
            c.fields.push(prop);
            c.fields.push(bad_prop);
            c.fields.push(reference);

            let session = session_with(vec![c]);
            let id = session.model().lookup("org.acme.HttpFetch").unwrap();
            let entity = session.entity(id);

            let props = entity.properties();
            assert_eq!(props.len(), 2);
            assert_eq!(props[0].name, "acme.http.proxy");
            assert_eq!(props[0].type_name, "String");
            // the constant wins over the disagreeing tag attribute
            assert_eq!(props[1].name, "acme.http.retries");

            let refs = entity.references();
            assert_eq!(refs.len(), 1);
            assert_eq!(refs[0].id, "acme.http.pool");
            assert_eq!(refs[0].type_name, "Object");

            let diags = session.reporter().diagnostics();
            assert!(diags.iter().any(|d| d.message.contains("Inconsistent property names")));
            assert!(diags.iter().any(|d| d.message.contains("Reference lacks type")));
        }
    }
}
