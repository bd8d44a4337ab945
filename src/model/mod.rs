//! Structural snapshot of the analyzed program.
//!
//! The host toolchain exports one JSON document describing every class it
//! wants documented (plus the framework base classes needed for supertype
//! tests): members, supertype names, modifiers, source lines, string
//! constants, and raw documentation comments. This module loads that
//! document and answers the structural queries the analysis needs. It is
//! a read-only view; nothing here mutates after loading.

mod types;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use types::TypeRef;

/// Errors raised while loading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate class in snapshot: {0}")]
    DuplicateClass(String),
}

/// One content node of a documentation comment.
///
/// Attribute parsing only ever looks at `Text` nodes; `Markup` nodes are
/// opaque rich text (HTML or inline tags) rendered by the output layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocNode {
    Text(String),
    Markup(String),
}

impl DocNode {
    pub fn as_text(&self) -> &str {
        match self {
            DocNode::Text(s) => s,
            DocNode::Markup(s) => s,
        }
    }
}

/// Flatten content nodes to plain text, for diagnostics and text reports.
pub fn plain_text(nodes: &[DocNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(node.as_text());
    }
    out.trim().to_string()
}

/// A block tag of a documentation comment (`@ant.task ...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTag {
    pub name: String,
    #[serde(default)]
    pub content: Vec<DocNode>,
}

/// The raw documentation comment of one program element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocComment {
    #[serde(default)]
    pub body: Vec<DocNode>,
    #[serde(default)]
    pub first_sentence: Vec<DocNode>,
    #[serde(default)]
    pub tags: Vec<BlockTag>,
}

/// Element modifiers relevant to classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default, rename = "public")]
    pub is_public: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

/// A method declared by a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default = "TypeRef::void_default")]
    pub return_type: TypeRef,
    #[serde(default)]
    pub parameters: Vec<TypeRef>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// A constructor declared by a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constructor {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub parameters: Vec<TypeRef>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// A field declared by a class. `constant` carries the compile-time value
/// of `static final String` fields, which declare properties/references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub constant: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// One class in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassData {
    /// Qualified name; nested classes use `$` before the inner name.
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub line: u32,
    /// Whether the host toolchain includes this class in the documented set.
    #[serde(default)]
    pub included: bool,
    #[serde(default)]
    pub enclosing: Option<String>,
    /// Qualified names of nested classes declared by this class.
    #[serde(default)]
    pub nested: Vec<String>,
    #[serde(default)]
    pub doc: Option<DocComment>,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub constructors: Vec<Constructor>,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Legal values, when the type is a closed string enumeration.
    #[serde(default)]
    pub string_enum_values: Option<Vec<String>>,
    /// Simple name, computed on load.
    #[serde(skip)]
    simple: String,
}

impl ClassData {
    pub fn simple_name(&self) -> &str {
        &self.simple
    }
}

/// The snapshot document as written by the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub classes: Vec<ClassData>,
}

/// Identifies a class within one loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

/// Identifies a declared method: owner class plus declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtorRef {
    pub class: ClassId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: ClassId,
    pub index: usize,
}

/// Any program element that can carry a documentation comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Class(ClassId),
    Method(MethodRef),
    Ctor(CtorRef),
    Field(FieldRef),
}

/// The loaded, indexed snapshot: the query interface of the analysis.
pub struct ProgramModel {
    classes: Vec<ClassData>,
    index: HashMap<String, ClassId>,
}

impl ProgramModel {
    /// Load a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ProgramModel, SnapshotError> {
        let data = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        ProgramModel::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<ProgramModel, SnapshotError> {
        let mut classes = snapshot.classes;
        let mut index = HashMap::new();
        for (i, class) in classes.iter_mut().enumerate() {
            let last = class.name.rsplit('.').next().unwrap_or(&class.name);
            let simple = last.rsplit('$').next().unwrap_or(last);
            class.simple = simple.to_string();
            if index.insert(class.name.clone(), ClassId(i)).is_some() {
                return Err(SnapshotError::DuplicateClass(class.name.clone()));
            }
        }
        Ok(ProgramModel { classes, index })
    }

    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.0]
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<ClassId> {
        self.index.get(qualified_name).copied()
    }

    /// All classes, in snapshot order.
    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(ClassId)
    }

    pub fn method(&self, m: MethodRef) -> &Method {
        &self.classes[m.class.0].methods[m.index]
    }

    pub fn constructor(&self, c: CtorRef) -> &Constructor {
        &self.classes[c.class.0].constructors[c.index]
    }

    pub fn field(&self, f: FieldRef) -> &Field {
        &self.classes[f.class.0].fields[f.index]
    }

    /// All member methods of a class, inherited members included.
    ///
    /// Enumeration order is the classification order: the class's own
    /// declarations first, in declaration order, then each superclass up
    /// the chain. A superclass method overridden lower in the chain (same
    /// name and parameter types) is skipped.
    pub fn all_methods(&self, id: ClassId) -> Vec<MethodRef> {
        let mut result = Vec::new();
        let mut seen: Vec<(&str, &[TypeRef])> = Vec::new();
        let mut current = Some(id);
        while let Some(cid) = current {
            let class = self.class(cid);
            for (i, m) in class.methods.iter().enumerate() {
                let sig = (m.name.as_str(), m.parameters.as_slice());
                if seen.contains(&sig) {
                    continue;
                }
                seen.push(sig);
                result.push(MethodRef { class: cid, index: i });
            }
            current = class
                .superclass
                .as_deref()
                .and_then(|name| self.lookup(name));
        }
        result
    }

    /// Test whether a class is a subtype of the named type. The test is
    /// reflexive and follows both superclasses and interfaces; supertypes
    /// absent from the snapshot are matched by name but not expanded.
    pub fn is_subtype_of(&self, id: ClassId, qualified_name: &str) -> bool {
        let mut pending = vec![self.class(id).name.as_str()];
        let mut visited: Vec<&str> = Vec::new();
        while let Some(name) = pending.pop() {
            if name == qualified_name {
                return true;
            }
            if visited.contains(&name) {
                continue;
            }
            visited.push(name);
            if let Some(cid) = self.lookup(name) {
                let class = self.class(cid);
                if let Some(s) = &class.superclass {
                    pending.push(s);
                }
                pending.extend(class.interfaces.iter().map(|s| s.as_str()));
            }
        }
        false
    }

    pub fn doc_of(&self, e: ElementRef) -> Option<&DocComment> {
        match e {
            ElementRef::Class(id) => self.class(id).doc.as_ref(),
            ElementRef::Method(m) => self.method(m).doc.as_ref(),
            ElementRef::Ctor(c) => self.constructor(c).doc.as_ref(),
            ElementRef::Field(f) => self.field(f).doc.as_ref(),
        }
    }

    pub fn line_of(&self, e: ElementRef) -> u32 {
        match e {
            ElementRef::Class(id) => self.class(id).line,
            ElementRef::Method(m) => self.method(m).line,
            ElementRef::Ctor(c) => self.constructor(c).line,
            ElementRef::Field(f) => self.field(f).line,
        }
    }

    /// Human-readable element path for diagnostics, e.g. `Copy.setFile(File)`.
    pub fn display(&self, e: ElementRef) -> String {
        match e {
            ElementRef::Class(id) => self.class(id).simple_name().to_string(),
            ElementRef::Method(m) => {
                let owner = self.class(m.class).simple_name();
                let method = self.method(m);
                format!("{}.{}({})", owner, method.name, param_list(&method.parameters))
            }
            ElementRef::Ctor(c) => {
                let owner = self.class(c.class).simple_name();
                let ctor = self.constructor(c);
                format!("{}({})", owner, param_list(&ctor.parameters))
            }
            ElementRef::Field(f) => {
                let owner = self.class(f.class).simple_name();
                format!("{}.{}", owner, self.field(f).name)
            }
        }
    }
}

fn param_list(params: &[TypeRef]) -> String {
    params
        .iter()
        .map(|t| t.simple_name())
        .collect::<Vec<_>>()
        .join(", ")
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;

    #[test]
    fn test_simple_names() {
        let m = model(vec![class("org.acme.Copy"), class("org.acme.Copy$Inner")]);
        let copy = m.lookup("org.acme.Copy").unwrap();
        let inner = m.lookup("org.acme.Copy$Inner").unwrap();
        assert_eq!(m.class(copy).simple_name(), "Copy");
        assert_eq!(m.class(inner).simple_name(), "Inner");
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let err = ProgramModel::from_snapshot(Snapshot {
            classes: vec![class("org.acme.A"), class("org.acme.A")],
        });
        assert!(matches!(err, Err(SnapshotError::DuplicateClass(_))));
    }

    #[test]
    fn test_inherited_methods_after_own() {
        let mut base = class("org.acme.Base");
        base.methods.push(method("setX", &["java.lang.String"], "void", 10));
        base.methods.push(method("setY", &["int"], "void", 11));
        let mut sub = class("org.acme.Sub");
        sub.superclass = Some("org.acme.Base".to_string());
        sub.methods.push(method("setY", &["int"], "void", 5));
        let m = model(vec![base, sub]);
        let sub_id = m.lookup("org.acme.Sub").unwrap();

        let methods = m.all_methods(sub_id);
        let names: Vec<_> = methods
            .iter()
            .map(|&r| (m.class(r.class).simple_name(), m.method(r).name.as_str()))
            .collect();
        // own declaration first; the overridden base setY is suppressed
        assert_eq!(names, vec![("Sub", "setY"), ("Base", "setX")]);
    }

    #[test]
    fn test_subtype_through_interfaces() {
        let mut seq = class("org.acme.Sequence");
        seq.superclass = Some("org.apache.tools.ant.Task".to_string());
        seq.interfaces.push("org.apache.tools.ant.TaskContainer".to_string());
        let mut classes = framework_classes();
        classes.push(seq);
        let m = model(classes);
        let id = m.lookup("org.acme.Sequence").unwrap();

        assert!(m.is_subtype_of(id, "org.acme.Sequence"));
        assert!(m.is_subtype_of(id, "org.apache.tools.ant.Task"));
        assert!(m.is_subtype_of(id, "org.apache.tools.ant.ProjectComponent"));
        assert!(m.is_subtype_of(id, "org.apache.tools.ant.TaskContainer"));
        assert!(!m.is_subtype_of(id, "java.lang.Thread"));
    }

    #[test]
    fn test_display_paths() {
        let mut c = class("org.acme.Copy");
        c.methods.push(method("setFile", &["java.io.File"], "void", 3));
        c.fields.push(string_field("PROP", "acme.prop", 2));
        let m = model(vec![c]);
        let id = m.lookup("org.acme.Copy").unwrap();
        let mr = MethodRef { class: id, index: 0 };
        let fr = FieldRef { class: id, index: 0 };
        assert_eq!(m.display(ElementRef::Method(mr)), "Copy.setFile(File)");
        assert_eq!(m.display(ElementRef::Field(fr)), "Copy.PROP");
        assert_eq!(m.display(ElementRef::Class(id)), "Copy");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"{
          "classes": [
            {
              "name": "org.acme.Echo",
              "modifiers": {"public": true},
              "superclass": "org.apache.tools.ant.Task",
              "line": 12,
              "included": true,
              "methods": [
                {
                  "name": "setMessage",
                  "modifiers": {"public": true},
                  "return_type": "void",
                  "parameters": ["java.lang.String"],
                  "line": 20,
                  "doc": {
                    "body": [{"text": "The message. "}, {"markup": "<i>Optional.</i>"}],
                    "tags": [{"name": "ant.optional", "content": [{"text": "Defaults to empty."}]}]
                  }
                }
              ]
            }
          ]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let m = ProgramModel::from_snapshot(snapshot).unwrap();
        let id = m.lookup("org.acme.Echo").unwrap();
        let method = &m.class(id).methods[0];
        assert_eq!(method.parameters, vec![TypeRef::parse("java.lang.String")]);
        assert!(method.return_type.is_void());
        let doc = method.doc.as_ref().unwrap();
        assert_eq!(doc.tags[0].name, "ant.optional");
        assert_eq!(plain_text(&doc.body), "The message. <i>Optional.</i>");
    }
}
