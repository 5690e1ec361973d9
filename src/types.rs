//! Core types and constants for the wireframe converter

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// Store tables, in the order they are read
pub const TABLE_BRANCHES: &str = "BRANCHES";
pub const TABLE_RESOURCES: &str = "RESOURCES";
pub const TABLE_COMMENTS: &str = "COMMENTS";
pub const TABLE_USERS: &str = "USERS";
pub const TABLE_THUMBNAILS: &str = "THUMBNAILS";
pub const TABLE_INFO: &str = "INFO";

pub const STORE_TABLES: [&str; 6] = [
    TABLE_BRANCHES,
    TABLE_RESOURCES,
    TABLE_COMMENTS,
    TABLE_USERS,
    TABLE_THUMBNAILS,
    TABLE_INFO,
];

// Markup output
pub const MARKUP_EXTENSION: &str = "ui";
pub const UI_FORMAT_VERSION: &str = "4.0";
pub const DEFAULT_FORM_NAME: &str = "Form";
pub const ROOT_WIDGET_CLASS: &str = "QWidget";
pub const GENERIC_WIDGET_CLASS: &str = "QWidget";

/// Control type the mockup tool uses for the window frame itself.
pub const ROOT_WINDOW_TYPE: &str = "TitleWindow";

/// Name the mockup tool gives to unnamed scratch documents.
pub const SCRATCH_DOCUMENT_SENTINEL: &str = "New Wireframe";

/// A named revision node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// One wireframe document (or asset) stored in a branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub branch_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl Resource {
    /// The document name from the resource attributes, empty when absent.
    pub fn name(&self) -> &str {
        self.attributes
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The mockup carried in `data`, or `None` for resources without one.
    pub fn mockup(&self) -> Option<serde_json::Result<MockupDocument>> {
        if self.data.get("mockup").is_none() {
            return None;
        }
        Some(MockupDocument::deserialize(&self.data))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub branch_id: String,
    pub resource_id: String,
    #[serde(default)]
    pub data: String,
    pub user_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// The normalized, fully decoded form of one wireframe project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub info: Map<String, Value>,
}

impl CanonicalDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.branches.len()
            + self.resources.len()
            + self.comments.len()
            + self.users.len()
            + self.thumbnails.len()
            + self.info.len()
    }
}

/// The `data` payload of a resource that holds a mockup screen.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MockupDocument {
    pub mockup: Mockup,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Mockup {
    #[serde(default)]
    pub attributes: MockupAttributes,
    #[serde(default, deserialize_with = "controls_or_empty")]
    pub controls: Vec<Control>,
    #[serde(default, rename = "resourceID", deserialize_with = "lenient_string")]
    pub resource_id: Option<String>,
    #[serde(default, rename = "mockupW", deserialize_with = "lenient_string")]
    pub mockup_w: Option<String>,
    #[serde(default, rename = "mockupH", deserialize_with = "lenient_string")]
    pub mockup_h: Option<String>,
    #[serde(default, rename = "measuredW", deserialize_with = "lenient_string")]
    pub measured_w: Option<String>,
    #[serde(default, rename = "measuredH", deserialize_with = "lenient_string")]
    pub measured_h: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MockupAttributes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<Value>,
    #[serde(default, rename = "parentID")]
    pub parent_id: Option<Value>,
}

/// One element of a mockup screen. Geometry is kept as the strings the
/// mockup tool writes; numbers are accepted and stringified.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Control {
    #[serde(default, rename = "ID", deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "typeID")]
    pub type_id: String,
    #[serde(default, rename = "zOrder", deserialize_with = "lenient_string")]
    pub z_order: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub w: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub h: Option<String>,
    #[serde(default, rename = "measuredW", deserialize_with = "lenient_string")]
    pub measured_w: Option<String>,
    #[serde(default, rename = "measuredH", deserialize_with = "lenient_string")]
    pub measured_h: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub x: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub y: Option<String>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Control {
    /// `properties.text`, when it is a string.
    pub fn text(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|props| props.get("text"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_enum(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "Qt::Horizontal",
            Orientation::Vertical => "Qt::Vertical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: "0".to_string(),
            y: "0".to_string(),
            width: "0".to_string(),
            height: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetNode {
    pub class: String,
    pub name: String,
    pub geometry: Geometry,
    pub orientation: Option<Orientation>,
    pub text: Option<String>,
    pub window_title: Option<String>,
    pub children: Vec<WidgetNode>,
}

impl WidgetNode {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            geometry: Geometry::default(),
            orientation: None,
            text: None,
            window_title: None,
            children: Vec::new(),
        }
    }
}

/// A complete form: the `<class>` name plus its root widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetTree {
    pub form_class: String,
    pub root: WidgetNode,
}

/// A built form keyed by the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedTree {
    pub name: String,
    pub tree: WidgetTree,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

// The mockup tool writes `{"control": [...]}`, a bare object for a single
// control, or an empty list/object when the screen is blank.
fn controls_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Control>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<Value>::deserialize(deserializer)?;
    let control = match value {
        Some(Value::Object(mut map)) => map.remove("control"),
        _ => None,
    };
    match control {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        Some(item @ Value::Object(_)) => serde_json::from_value(item)
            .map(|control| vec![control])
            .map_err(D::Error::custom),
        _ => Ok(Vec::new()),
    }
}
