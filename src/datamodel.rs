// src/datamodel.rs
//! Report data model. Field names and inclusion rules are part of the
//! output contract: PascalCase keys, no columns in locations, and
//! `EmbedFiles`/`EmbedPatterns`/`Calls` omitted when empty.

use serde::Serialize;

/// A `file:line` position. Filenames in the final report are relative to
/// the module root; absolute paths outside the root pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Location {
    pub filename: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// Empty for unnamed parameters.
    pub name: String,
    #[serde(rename = "Type")]
    pub ty: String,
    pub is_pointer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Method {
    pub name: String,
    pub signature: String,
    pub parameters: Vec<Parameter>,
    pub return_types: Vec<String>,
    pub doc_comment: String,
    pub location: Location,
}

/// A concrete named type that satisfies an interface, in value or
/// pointer form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Implementation {
    pub type_name: String,
    pub package_path: String,
    pub package_name: String,
    pub is_pointer: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Interface {
    pub name: String,
    /// Package where the interface is defined.
    pub package_name: String,
    /// Import path of the defining package.
    pub package_path: String,
    pub location: Location,
    pub doc_comment: String,
    pub methods: Vec<Method>,
    /// Display names of embedded interfaces, first-occurrence order.
    pub embeds: Vec<String>,
    pub implementations: Vec<Implementation>,
}

/// Call flavor. Closed set; the serialized names are part of the output
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallType {
    Static,
    Dynamic,
    Interface,
    #[serde(rename = "Concurrent-Spawn")]
    ConcurrentSpawn,
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallSite {
    pub caller_func_desc: String,
    pub callee_desc: String,
    pub call_type: CallType,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageReport {
    pub name: String,
    pub path: String,
    /// Module-relative source files.
    pub files: Vec<String>,
    /// Sorted import paths.
    pub imports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embed_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embed_patterns: Vec<String>,
    pub interfaces: Vec<Interface>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectReport {
    pub module_path: String,
    pub module_dir: String,
    pub packages: Vec<PackageReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_serializes_without_column() {
        let location = Location {
            filename: "pkg/a.go".into(),
            line: 12,
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["Filename"], "pkg/a.go");
        assert_eq!(json["Line"], 12);
        assert!(json.get("Column").is_none());
    }

    #[test]
    fn empty_collections_are_omitted() {
        let report = PackageReport {
            name: "demo".into(),
            path: "example.com/m/demo".into(),
            files: vec![],
            imports: vec![],
            embed_files: vec![],
            embed_patterns: vec![],
            interfaces: vec![],
            calls: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("EmbedFiles").is_none());
        assert!(json.get("EmbedPatterns").is_none());
        assert!(json.get("Calls").is_none());
        // Always-present collections stay present even when empty.
        assert!(json.get("Files").is_some());
        assert!(json.get("Imports").is_some());
        assert!(json.get("Interfaces").is_some());
    }

    #[test]
    fn call_type_names_match_contract() {
        assert_eq!(
            serde_json::to_string(&CallType::ConcurrentSpawn).unwrap(),
            "\"Concurrent-Spawn\""
        );
        assert_eq!(serde_json::to_string(&CallType::Deferred).unwrap(), "\"Deferred\"");
        assert_eq!(serde_json::to_string(&CallType::Static).unwrap(), "\"Static\"");
    }

    #[test]
    fn parameter_keys() {
        let param = Parameter {
            name: "ctx".into(),
            ty: "context.Context".into(),
            is_pointer: false,
        };
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["Name"], "ctx");
        assert_eq!(json["Type"], "context.Context");
        assert_eq!(json["IsPointer"], false);
    }
}
