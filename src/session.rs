//! The analysis run.
//!
//! A `Session` owns everything with per-run lifetime: the loaded model,
//! the diagnostic sink, and the three caches (descriptors, analyzed doc
//! comments, per-class field facts). Dropping the session drops all
//! derived state; nothing lives in globals. The run is single-threaded,
//! so the caches use plain interior mutability.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::analysis::classify::{self, PROJECT_COMPONENT};
use crate::analysis::{DescriptorCache, TypeDescriptor};
use crate::docs::{DocInfo, EntityDoc, EntityFacts};
use crate::model::{ClassId, ElementRef, ProgramModel};
use crate::report::Reporter;

pub struct Session {
    model: ProgramModel,
    reporter: Reporter,
    descriptors: DescriptorCache,
    docs: RefCell<HashMap<ElementRef, Rc<DocInfo>>>,
    facts: RefCell<HashMap<ClassId, Rc<EntityFacts>>>,
}

impl Session {
    pub fn new(model: ProgramModel) -> Session {
        Session {
            model,
            reporter: Reporter::new(),
            descriptors: DescriptorCache::new(),
            docs: RefCell::new(HashMap::new()),
            facts: RefCell::new(HashMap::new()),
        }
    }

    pub fn model(&self) -> &ProgramModel {
        &self.model
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// The descriptor of a class, classified at most once per run.
    pub fn descriptor(&self, class: ClassId) -> Rc<TypeDescriptor> {
        self.descriptors
            .get_or_compute(class, || classify::classify(&self.model, &self.reporter, class))
    }

    /// The analyzed documentation of any element, cached.
    pub fn doc_info(&self, element: ElementRef) -> Rc<DocInfo> {
        if let Some(found) = self.docs.borrow().get(&element) {
            return Rc::clone(found);
        }
        let info = Rc::new(
            self.model
                .doc_of(element)
                .map(DocInfo::analyze)
                .unwrap_or_default(),
        );
        Rc::clone(
            self.docs
                .borrow_mut()
                .entry(element)
                .or_insert(info),
        )
    }

    /// Subtype test with the degrading warning behavior of the engine.
    pub fn is_subtype_of(&self, class: ClassId, qualified_name: &str) -> bool {
        classify::subtype_of(&self.model, &self.reporter, class, qualified_name)
    }

    fn entity_facts(&self, class: ClassId) -> Rc<EntityFacts> {
        if let Some(found) = self.facts.borrow().get(&class) {
            return Rc::clone(found);
        }
        let facts = Rc::new(EntityFacts::discover(self, class));
        Rc::clone(
            self.facts
                .borrow_mut()
                .entry(class)
                .or_insert(facts),
        )
    }

    /// The complete documentation view of one class.
    pub fn entity(&self, class: ClassId) -> EntityDoc<'_> {
        let descriptor = self.descriptor(class);
        let facts = self.entity_facts(class);
        EntityDoc::new(self, class, descriptor, facts)
    }

    /// The classes to document, in snapshot order: included, not marked
    /// `ignore`, and either tagged or a framework component subtype.
    pub fn candidates(&self) -> Vec<ClassId> {
        self.model
            .classes()
            .filter(|&id| {
                if !self.model.class(id).included {
                    return false;
                }
                let info = self.doc_info(ElementRef::Class(id));
                let ignored = info
                    .ant_tag()
                    .and_then(|tag| tag.attribute("ignore"))
                    .map_or(false, |v| v.eq_ignore_ascii_case("true"));
                if ignored {
                    return false;
                }
                info.ant_tag().is_some() || self.model.is_subtype_of(id, PROJECT_COMPONENT)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify::TASK;
    use crate::docs::TAG_TASK;
    use crate::model::testutil::*;
    use crate::model::{BlockTag, DocComment, DocNode};

    fn tagged(tag: &str, content: &str) -> DocComment {
        DocComment {
            body: Vec::new(),
            first_sentence: Vec::new(),
            tags: vec![BlockTag {
                name: tag.to_string(),
                content: vec![DocNode::Text(content.to_string())],
            }],
        }
    }

    fn sample_session() -> Session {
        let mut task = class("org.acme.HttpFetch");
        task.superclass = Some(TASK.to_string());

        let mut tagged_type = class("org.acme.Header");
        tagged_type.doc = Some(tagged(TAG_TASK, r#"name="header""#));

        let mut ignored = class("org.acme.Internal");
        ignored.superclass = Some(TASK.to_string());
        ignored.doc = Some(tagged(TAG_TASK, r#"ignore="true""#));

        let mut excluded = class("org.acme.External");
        excluded.superclass = Some(TASK.to_string());
        excluded.included = false;

        let plain = class("org.acme.Helper");

        let mut classes = framework_classes();
        classes.extend([task, tagged_type, ignored, excluded, plain]);
        Session::new(model(classes))
    }

    #[test]
    fn test_candidate_selection() {
        let session = sample_session();
        let names: Vec<_> = session
            .candidates()
            .into_iter()
            .map(|id| session.model().class(id).simple_name().to_string())
            .collect();
        assert!(names.contains(&"HttpFetch".to_string()));
        assert!(names.contains(&"Header".to_string()));
        assert!(!names.contains(&"Internal".to_string()));
        assert!(!names.contains(&"External".to_string()));
        assert!(!names.contains(&"Helper".to_string()));
    }

    #[test]
    fn test_descriptor_is_computed_once() {
        let session = sample_session();
        let id = session.model().lookup("org.acme.HttpFetch").unwrap();
        let first = session.descriptor(id);
        let diagnostics_after_first = session.reporter().len();
        let second = session.descriptor(id);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(session.reporter().len(), diagnostics_after_first);
    }

    #[test]
    fn test_doc_info_is_cached() {
        let session = sample_session();
        let id = session.model().lookup("org.acme.Header").unwrap();
        let first = session.doc_info(ElementRef::Class(id));
        let second = session.doc_info(ElementRef::Class(id));
        assert!(Rc::ptr_eq(&first, &second));
        assert!(first.has_tag(TAG_TASK));
    }

    #[test]
    fn test_undocumented_element_yields_empty_info() {
        let session = sample_session();
        let id = session.model().lookup("org.acme.Helper").unwrap();
        let info = session.doc_info(ElementRef::Class(id));
        assert!(info.ant_tag().is_none());
        assert_eq!(info.description(), "");
    }
}
