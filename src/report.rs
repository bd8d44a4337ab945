//! Diagnostics and output formatting.
//!
//! The analysis never aborts on bad input: structural ambiguity and
//! resolution failures degrade to a partial result plus a diagnostic
//! collected here. Two output formats are supported:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output consumed by the page-rendering layer

use std::cell::RefCell;
use std::fmt;

use colored::*;
use serde::{Deserialize, Serialize};

use crate::docs::EntityDoc;
use crate::session::Session;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A single collected message, optionally tied to a source element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    pub message: String,
}

/// The reporting channel shared by every analysis component.
///
/// One reporter exists per run, owned by the `Session`. The run is
/// single-threaded, so interior mutability is enough.
#[derive(Default)]
pub struct Reporter {
    entries: RefCell<Vec<Diagnostic>>,
}

impl Reporter {
    pub fn new() -> Reporter {
        Reporter::default()
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(Severity::Warning, None, message.into());
    }

    pub fn warn_at(&self, element: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, Some(element.into()), message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Severity::Error, None, message.into());
    }

    pub fn error_at(&self, element: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, Some(element.into()), message.into());
    }

    fn push(&self, severity: Severity, element: Option<String>, message: String) {
        self.entries.borrow_mut().push(Diagnostic { severity, element, message });
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

// =============================================================================
// JSON report
// =============================================================================

/// The full analysis report handed to the rendering layer.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub snapshot: String,
    pub entities: Vec<JsonEntity>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One documented task or type.
#[derive(Serialize, Deserialize)]
pub struct JsonEntity {
    /// Display name from the `ant.*` tag, or the class name.
    pub name: String,
    pub class_name: String,
    /// "task" or "type".
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub task_container: bool,
    pub supports_text: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<JsonAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<JsonElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_types: Vec<JsonElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<JsonProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<JsonReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_classes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// All declared setter types, when overloads disagree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonReference {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Build the report for every candidate class of a session.
pub fn build_report(session: &Session, snapshot: &str) -> JsonReport {
    let mut entities = Vec::new();
    for id in session.candidates() {
        let entity = session.entity(id);
        entities.push(entity_to_json(&entity));
    }
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        snapshot: snapshot.to_string(),
        entities,
        diagnostics: session.reporter().diagnostics(),
    }
}

fn entity_to_json(entity: &EntityDoc<'_>) -> JsonEntity {
    let descriptor = entity.descriptor();

    let attributes = entity
        .attributes()
        .iter()
        .map(|a| JsonAttribute {
            name: a.name.clone(),
            type_name: a.ty.simple_name(),
            all_types: if a.all_types.len() > 1 {
                a.all_types.iter().map(|t| t.simple_name()).collect()
            } else {
                Vec::new()
            },
            values: a.enum_values.clone(),
            required: entity.attribute_required(a),
            optional: entity.attribute_optional(a),
            description: entity.attribute_description(a),
        })
        .collect();

    let elements = entity
        .named_elements()
        .iter()
        .map(|e| JsonElement {
            name: Some(entity.element_display_name(e)),
            types: e.types.iter().map(|t| t.simple_name()).collect(),
            description: entity.element_description(e),
        })
        .collect();

    let element_types = entity
        .unnamed_elements()
        .iter()
        .map(|e| JsonElement {
            name: None,
            types: e.types.iter().map(|t| t.simple_name()).collect(),
            description: entity.element_description(e),
        })
        .collect();

    let properties = entity
        .properties()
        .iter()
        .map(|p| JsonProperty {
            name: p.name.clone(),
            type_name: p.type_name.clone(),
            description: entity.field_description(p.field),
        })
        .collect();

    let references = entity
        .references()
        .iter()
        .map(|r| JsonReference {
            id: r.id.clone(),
            type_name: r.type_name.clone(),
            description: entity.field_description(r.field),
        })
        .collect();

    JsonEntity {
        name: entity.display_name(),
        class_name: descriptor.qualified_name.clone(),
        kind: entity.kind_label().to_string(),
        category: entity.category(),
        task_container: entity.is_task_container(),
        supports_text: descriptor.supports_text(),
        description: entity.description(),
        attributes,
        elements,
        element_types,
        properties,
        references,
        nested_classes: entity.nested_class_names(),
    }
}

/// Write the report as pretty JSON to the given writer.
pub fn write_json<W: std::io::Write>(report: &JsonReport, out: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Write a colored, human-readable summary to stdout.
pub fn write_pretty(report: &JsonReport) {
    for entity in &report.entities {
        let kind = if entity.kind == "task" {
            entity.kind.cyan()
        } else {
            entity.kind.magenta()
        };
        print!("{} {}", kind, entity.name.bold());
        if let Some(category) = &entity.category {
            print!(" [{}]", category);
        }
        println!("  ({})", entity.class_name.dimmed());

        for a in &entity.attributes {
            let mut extra = String::new();
            if a.required.is_some() {
                extra.push_str(" required");
            }
            if let Some(values) = &a.values {
                extra.push_str(&format!(" [{}]", values.join(", ")));
            }
            println!("  attribute {} : {}{}", a.name.green(), a.type_name, extra);
        }
        for e in &entity.elements {
            let name = e.name.as_deref().unwrap_or("?");
            println!("  element   <{}> : {}", name.green(), e.types.join(", "));
        }
        for e in &entity.element_types {
            println!("  accepts   {}", e.types.join(", "));
        }
        for p in &entity.properties {
            println!("  property  {} : {}", p.name.yellow(), p.type_name);
        }
        for r in &entity.references {
            println!("  reference {} : {}", r.id.yellow(), r.type_name);
        }
        if entity.supports_text {
            println!("  accepts text content");
        }
        if entity.task_container {
            println!("  accepts nested tasks");
        }
        println!();
    }

    if report.diagnostics.is_empty() {
        println!("{}", "No diagnostics.".green());
    } else {
        for d in &report.diagnostics {
            let tag = match d.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Note => "note".normal(),
            };
            match &d.element {
                Some(element) => println!("{}: {}: {}", tag, element, d.message),
                None => println!("{}: {}", tag, d.message),
            }
        }
        println!(
            "{} diagnostic(s), {} entit{} documented",
            report.diagnostics.len(),
            report.entities.len(),
            if report.entities.len() == 1 { "y" } else { "ies" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_collects_in_order() {
        let reporter = Reporter::new();
        reporter.warn("first");
        reporter.error_at("Copy.setFile(File)", "second");

        let diags = reporter.diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].element, None);
        assert_eq!(diags[1].severity, Severity::Error);
        assert_eq!(diags[1].element.as_deref(), Some("Copy.setFile(File)"));
        assert!(reporter.has_errors());
    }

    #[test]
    fn test_severity_serialization() {
        let d = Diagnostic {
            severity: Severity::Warning,
            element: None,
            message: "m".to_string(),
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(!json.contains("element"));
    }
}
