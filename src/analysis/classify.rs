//! The introspection engine: method-pattern classification.
//!
//! Every public instance method of a class (inherited members included)
//! is run through an ordered rule table; the first matching rule consumes
//! the method. The rules mirror the configuration conventions of the host
//! build framework: `setX` declares an attribute, `createX`/`addX`/
//! `addConfiguredX` declare nested elements, `addText` accepts text
//! content, and `addTask` on a task container accepts nested tasks.

use crate::analysis::builder::DescriptorBuilder;
use crate::analysis::descriptor::TypeDescriptor;
use crate::model::{ClassId, CtorRef, ElementRef, Method, MethodRef, ProgramModel, TypeRef};
use crate::report::Reporter;

pub const TASK: &str = "org.apache.tools.ant.Task";
pub const PROJECT_COMPONENT: &str = "org.apache.tools.ant.ProjectComponent";
pub const TASK_CONTAINER: &str = "org.apache.tools.ant.TaskContainer";
pub const PROJECT: &str = "org.apache.tools.ant.Project";
pub const LOCATION: &str = "org.apache.tools.ant.Location";
pub const TARGET: &str = "org.apache.tools.ant.Target";
pub const RUNTIME_CONFIGURABLE: &str = "org.apache.tools.ant.RuntimeConfigurable";
pub const REFERENCE: &str = "org.apache.tools.ant.types.Reference";
pub const JAVA_STRING: &str = "java.lang.String";

/// Setters the framework invokes itself on tasks; never attributes.
const HIDDEN_TASK_SETTERS: &[(&str, &str)] = &[
    ("setLocation", LOCATION),
    ("setTaskType", JAVA_STRING),
    ("setProject", PROJECT),
    ("setOwningTarget", TARGET),
    ("setTaskName", JAVA_STRING),
    ("setRuntimeConfigurableWrapper", RUNTIME_CONFIGURABLE),
];

/// Setters the framework invokes itself on any project component.
const HIDDEN_COMPONENT_SETTERS: &[(&str, &str)] = &[
    ("setChecked", "boolean"),
    ("setRefid", REFERENCE),
    ("setDescription", JAVA_STRING),
    ("setLocation", LOCATION),
    ("setProject", PROJECT),
];

/// Subtype test that degrades on unresolvable names: a warning plus a
/// negative answer, never an abort.
pub(crate) fn subtype_of(
    model: &ProgramModel,
    reporter: &Reporter,
    class: ClassId,
    qualified_name: &str,
) -> bool {
    if model.is_subtype_of(class, qualified_name) {
        return true;
    }
    if model.lookup(qualified_name).is_none() {
        reporter.warn(format!("Type not found: {}", qualified_name));
    }
    false
}

/// Classify one class into a `TypeDescriptor`.
pub fn classify(model: &ProgramModel, reporter: &Reporter, class: ClassId) -> TypeDescriptor {
    let is_task = subtype_of(model, reporter, class, TASK);
    let is_component = is_task || subtype_of(model, reporter, class, PROJECT_COMPONENT);
    let is_container = subtype_of(model, reporter, class, TASK_CONTAINER);

    let mut c = Classifier {
        model,
        reporter,
        builder: DescriptorBuilder::new(model, reporter, class),
        is_task,
        is_component,
        is_container,
    };

    for method_ref in model.all_methods(class) {
        let method = model.method(method_ref);
        if !method.modifiers.is_public || method.modifiers.is_static {
            continue;
        }
        for rule in RULES {
            if rule(&mut c, method_ref, method) {
                break;
            }
        }
    }

    for nested_name in &model.class(class).nested {
        if let Some(id) = model.lookup(nested_name) {
            let nested = model.class(id);
            if nested.modifiers.is_public && nested.modifiers.is_static {
                c.builder.found_nested_class(id);
            }
        }
    }

    c.builder.finish(is_task)
}

struct Classifier<'a> {
    model: &'a ProgramModel,
    reporter: &'a Reporter,
    builder: DescriptorBuilder<'a>,
    is_task: bool,
    is_component: bool,
    is_container: bool,
}

/// A rule consumes the method and returns true, or declines.
type Rule = fn(&mut Classifier<'_>, MethodRef, &Method) -> bool;

/// Classification order. The first matching rule wins, so the specific
/// framework patterns sit ahead of the generic prefix rules.
const RULES: &[Rule] = &[
    rule_unnamed_adder,
    rule_hidden_setter,
    rule_task_acceptor,
    rule_text_acceptor,
    rule_attribute_setter,
    rule_element_creator,
    rule_configured_adder,
    rule_plain_adder,
];

/// Exact `add`/`addConfigured` with one parameter: the class accepts any
/// instance of the parameter type, no element name attached.
fn rule_unnamed_adder(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    if method.name != "add" && method.name != "addConfigured" {
        return false;
    }
    if method.parameters.len() != 1 || !method.return_type.is_void() {
        return false;
    }
    c.builder.found_unnamed_element(m, method.parameters[0].clone());
    true
}

/// Framework-invoked setters are consumed without producing anything.
fn rule_hidden_setter(c: &mut Classifier<'_>, _m: MethodRef, method: &Method) -> bool {
    if method.parameters.len() != 1 {
        return false;
    }
    let matches_table = |table: &[(&str, &str)]| {
        table
            .iter()
            .any(|&(name, param)| method.name == name && method.parameters[0] == TypeRef::parse(param))
    };
    (c.is_task && matches_table(HIDDEN_TASK_SETTERS))
        || (c.is_component && matches_table(HIDDEN_COMPONENT_SETTERS))
}

/// `addTask(Task)` on a task container accepts arbitrary nested tasks.
fn rule_task_acceptor(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    if !c.is_container || method.name != "addTask" {
        return false;
    }
    if method.parameters.len() != 1
        || !method.parameters[0].is_declared(TASK)
        || !method.return_type.is_void()
    {
        return false;
    }
    c.builder.found_add_task(m);
    true
}

/// `addText(String)` accepts free text content.
fn rule_text_acceptor(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    if method.name != "addText" {
        return false;
    }
    if method.parameters.len() != 1
        || !method.parameters[0].is_declared(JAVA_STRING)
        || !method.return_type.is_void()
    {
        return false;
    }
    c.builder.found_add_text(m);
    true
}

/// `setX(T)` declares attribute `x`. Array parameters are not settable
/// from a build file.
fn rule_attribute_setter(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    let Some(suffix) = method.name.strip_prefix("set") else {
        return false;
    };
    if suffix.is_empty()
        || method.parameters.len() != 1
        || !method.return_type.is_void()
        || method.parameters[0].is_array()
    {
        return false;
    }
    c.builder
        .found_attribute(&suffix.to_lowercase(), m, method.parameters[0].clone());
    true
}

/// `createX()` returning a declared type makes element `x`; the class
/// instantiates the element itself, so no constructor is needed.
fn rule_element_creator(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    let Some(suffix) = method.name.strip_prefix("create") else {
        return false;
    };
    if suffix.is_empty() || !method.parameters.is_empty() {
        return false;
    }
    if method.return_type.declared_name().is_none() {
        return false;
    }
    c.builder
        .found_named_element(&suffix.to_lowercase(), m, method.return_type.clone(), None);
    true
}

/// `addConfiguredX(T)` makes element `x` when `T` offers a constructor
/// the framework can call. A match without such a constructor is still
/// consumed, with a warning; the element is not documentable.
fn rule_configured_adder(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    named_adder(c, m, method, "addConfigured")
}

/// `addX(T)`, same shape as `addConfiguredX`.
fn rule_plain_adder(c: &mut Classifier<'_>, m: MethodRef, method: &Method) -> bool {
    named_adder(c, m, method, "add")
}

fn named_adder(c: &mut Classifier<'_>, m: MethodRef, method: &Method, prefix: &str) -> bool {
    let Some(suffix) = method.name.strip_prefix(prefix) else {
        return false;
    };
    if suffix.is_empty() || method.parameters.len() != 1 || !method.return_type.is_void() {
        return false;
    }
    let param = &method.parameters[0];
    if param.is_declared(JAVA_STRING) || param.declared_name().is_none() {
        return false;
    }
    match find_element_constructor(c.model, param) {
        Some(ctor) => {
            c.builder
                .found_named_element(&suffix.to_lowercase(), m, param.clone(), Some(ctor));
        }
        None => {
            c.reporter.warn_at(
                c.model.display(ElementRef::Method(m)),
                format!("No usable constructor for nested element type {}", param.simple_name()),
            );
        }
    }
    true
}

/// Pick the constructor the framework would use to instantiate a nested
/// element: a public zero-argument constructor, or failing that one
/// taking the project as its only argument.
fn find_element_constructor(model: &ProgramModel, ty: &TypeRef) -> Option<CtorRef> {
    let class = ty.declared_name().and_then(|n| model.lookup(n))?;
    let ctors = &model.class(class).constructors;
    for (i, ctor) in ctors.iter().enumerate() {
        if ctor.modifiers.is_public && ctor.parameters.is_empty() {
            return Some(CtorRef { class, index: i });
        }
    }
    for (i, ctor) in ctors.iter().enumerate() {
        if ctor.modifiers.is_public
            && ctor.parameters.len() == 1
            && ctor.parameters[0].is_declared(PROJECT)
        {
            return Some(CtorRef { class, index: i });
        }
    }
    None
}
