//! Swagger 2.0 document assembly

use super::schema::RouteSchema;
use crate::autoload::MountPath;
use crate::config::AppConfig;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const SWAGGER_VERSION: &str = "2.0";
const DEFAULT_RESPONSE: &str = "Default Response";

/// Static document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsInfo {
    pub title: String,
    pub version: String,
    pub external_docs: ExternalDocs,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

impl Default for DocsInfo {
    fn default() -> Self {
        Self {
            title: "Twilio Segment Calculator API".to_string(),
            version: "1.0.0".to_string(),
            external_docs: ExternalDocs {
                url: "https://github.com/skyePBX/twilio-segment-api".to_string(),
                description: "GitHub".to_string(),
            },
            consumes: vec!["application/json".to_string()],
            produces: vec!["application/json".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    pub description: String,
}

/// A route as seen by the documentation generator.
#[derive(Debug, Clone)]
pub struct DocEntry {
    pub method: Method,
    pub path: MountPath,
    pub schema: Option<RouteSchema>,
}

/// Accumulates route metadata during registration.
///
/// [`materialize`](Self::materialize) consumes the collector, so a snapshot
/// is produced at most once per collector.
#[derive(Debug, Default)]
pub struct DocsCollector {
    info: DocsInfo,
    entries: Vec<DocEntry>,
}

impl DocsCollector {
    pub fn new(info: DocsInfo) -> Self {
        Self {
            info,
            entries: Vec::new(),
        }
    }

    /// Record one route; hidden routes are dropped here.
    pub fn collect(&mut self, entry: DocEntry) {
        if entry.schema.as_ref().is_some_and(|s| s.hide) {
            tracing::trace!(path = %entry.path, "route hidden from documentation");
            return;
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn materialize(self, config: &AppConfig) -> DocumentationSnapshot {
        let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
        for entry in &self.entries {
            paths
                .entry(entry.path.router_path())
                .or_default()
                .insert(entry.method.as_str().to_ascii_lowercase(), Operation::from_entry(entry));
        }

        DocumentationSnapshot {
            swagger: SWAGGER_VERSION.to_string(),
            info: Info {
                title: self.info.title,
                version: self.info.version,
            },
            external_docs: self.info.external_docs,
            host: config.docs_host.clone(),
            schemes: vec![config.docs_scheme.as_str().to_string()],
            consumes: self.info.consumes,
            produces: self.info.produces,
            paths,
            definitions: BTreeMap::new(),
        }
    }
}

/// The generated API description, frozen once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationSnapshot {
    pub swagger: String,
    pub info: Info,
    pub external_docs: ExternalDocs,
    pub host: String,
    pub schemes: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
    pub definitions: BTreeMap<String, Value>,
}

impl DocumentationSnapshot {
    /// Number of documented method + path pairs.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(BTreeMap::len).sum()
    }

    /// Look up an operation by router-syntax path and method.
    pub fn operation(&self, path: &str, method: &Method) -> Option<&Operation> {
        self.paths
            .get(path)?
            .get(&method.as_str().to_ascii_lowercase())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    pub responses: BTreeMap<String, ResponseDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: String,

    pub required: bool,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDoc {
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl Operation {
    fn from_entry(entry: &DocEntry) -> Self {
        let empty = RouteSchema::default();
        let schema = entry.schema.as_ref().unwrap_or(&empty);

        let mut parameters: Vec<Parameter> = entry
            .path
            .params()
            .map(|name| {
                let property = property(schema.params.as_ref(), name);
                Parameter {
                    name: name.to_string(),
                    location: "path".to_string(),
                    required: true,
                    kind: Some(property_type(property).unwrap_or("string").to_string()),
                    description: property_description(property),
                    schema: None,
                }
            })
            .collect();

        if let Some(query) = &schema.querystring {
            let required = required_names(query);
            let properties = query.get("properties").and_then(Value::as_object);
            for (name, property) in properties.into_iter().flatten() {
                parameters.push(Parameter {
                    name: name.clone(),
                    location: "query".to_string(),
                    required: required.contains(&name.as_str()),
                    kind: property_type(Some(property)).map(str::to_string),
                    description: property_description(Some(property)),
                    schema: None,
                });
            }
        }

        if let Some(body) = &schema.body {
            parameters.push(Parameter {
                name: "body".to_string(),
                location: "body".to_string(),
                required: true,
                kind: None,
                description: None,
                schema: Some(body.clone()),
            });
        }

        let responses = if schema.response.is_empty() {
            BTreeMap::from([(
                "200".to_string(),
                ResponseDoc {
                    description: DEFAULT_RESPONSE.to_string(),
                    schema: None,
                },
            )])
        } else {
            schema
                .response
                .iter()
                .map(|(status, body)| {
                    let description = property_description(Some(body))
                        .unwrap_or_else(|| DEFAULT_RESPONSE.to_string());
                    (
                        status.clone(),
                        ResponseDoc {
                            description,
                            schema: Some(body.clone()),
                        },
                    )
                })
                .collect()
        };

        Operation {
            summary: schema.summary.clone(),
            description: schema.description.clone(),
            tags: schema.tags.clone(),
            operation_id: schema.operation_id.clone(),
            parameters,
            responses,
        }
    }
}

fn property<'a>(object: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    object?.get("properties")?.get(name)
}

fn property_type(property: Option<&Value>) -> Option<&str> {
    property?.get("type")?.as_str()
}

fn property_description(property: Option<&Value>) -> Option<String> {
    property?.get("description")?.as_str().map(str::to_string)
}

fn required_names(object: &Value) -> Vec<&str> {
    object
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
