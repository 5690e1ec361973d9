//! Mapping of mockup controls onto a widget tree
//!
//! One mockup screen becomes one form. Controls are appended to the root in
//! list order; the window-frame control is folded into the root instead of
//! becoming a child. Geometry comes from the explicit size when both axes
//! are set, otherwise from the measured size, and sliders, scroll bars and
//! splitters (any type starting with `H` or `V`) take their cross axis from
//! the measured size and carry an orientation.

use crate::types::*;

/// Widget class for a mockup control type. Unknown types become a plain
/// container.
pub fn widget_class_for(type_id: &str) -> &'static str {
    match type_id {
        "Button" => "QPushButton",
        "RadioButton" => "QRadioButton",
        "CheckBox" => "QCheckBox",
        "ComboBox" => "QComboBox",
        "Label" | "Title" | "SubTitle" | "Icon" | "Webcam" => "QLabel",
        "TextInput" => "QLineEdit",
        "TextArea" => "QPlainTextEdit",
        "HSlider" | "VSlider" => "QSlider",
        "HSplitter" | "VSplitter" => "Line",
        "HorizontalScrollBar" | "VerticalScrollBar" => "QScrollBar",
        "MenuBar" => "QMenuBar",
        "TabBar" => "QTabWidget",
        "List" => "QListView",
        "Tooltip" => "QToolTip",
        "Calendar" => "QCalendarWidget",
        "ProgressBar" => "QProgressBar",
        "Image" => "QGraphicsView",
        "NumericStepper" => "QSpinBox",
        "FieldSet" => "QGroupBox",
        "Canvas" => GENERIC_WIDGET_CLASS,
        _ => GENERIC_WIDGET_CLASS,
    }
}

/// Orientation implied by a control type's leading letter.
pub fn orientation_for(type_id: &str) -> Option<Orientation> {
    if type_id.starts_with('H') {
        Some(Orientation::Horizontal)
    } else if type_id.starts_with('V') {
        Some(Orientation::Vertical)
    } else {
        None
    }
}

pub struct WidgetTreeBuilder {
    default_form_name: String,
}

impl Default for WidgetTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetTreeBuilder {
    pub fn new() -> Self {
        Self::with_form_name(DEFAULT_FORM_NAME)
    }

    pub fn with_form_name(name: impl Into<String>) -> Self {
        Self {
            default_form_name: name.into(),
        }
    }

    /// Build the form for one mockup screen. Never fails: missing geometry
    /// becomes `0` and unknown control types become plain containers.
    pub fn build(&self, document: &MockupDocument) -> WidgetTree {
        let mockup = &document.mockup;
        let mut form_class = self.default_form_name.clone();

        let mut root = WidgetNode::new(ROOT_WIDGET_CLASS, self.default_form_name.as_str());
        root.geometry.width = present(&mockup.mockup_w).unwrap_or("0").to_string();
        root.geometry.height = present(&mockup.mockup_h).unwrap_or("0").to_string();
        root.window_title = mockup.attributes.name.clone().filter(|name| !name.is_empty());

        for (index, control) in mockup.controls.iter().enumerate() {
            if control.type_id == ROOT_WINDOW_TYPE {
                if let Some(title) = control.text() {
                    // With several window frames the last one wins.
                    form_class = title.to_string();
                    root.name = title.to_string();
                    if let Some(width) = present(&control.w) {
                        root.geometry.width = width.to_string();
                    }
                    if let Some(height) = present(&control.measured_h) {
                        root.geometry.height = height.to_string();
                    }
                    continue;
                }
            }
            root.children.push(self.build_control(control, index));
        }

        log::debug!(
            "Built form '{}' with {} widgets",
            form_class,
            root.children.len()
        );
        WidgetTree { form_class, root }
    }

    fn build_control(&self, control: &Control, index: usize) -> WidgetNode {
        let type_id = control.type_id.as_str();
        let name = match present(&control.id) {
            Some(id) => format!("{}_{}", type_id, id),
            None => format!("{}_{}", type_id, index),
        };
        let mut node = WidgetNode::new(widget_class_for(type_id), name);

        let (mut width, mut height) = match (present(&control.w), present(&control.h)) {
            (Some(w), Some(h)) => (Some(w), Some(h)),
            _ => (present(&control.measured_w), present(&control.measured_h)),
        };

        node.orientation = orientation_for(type_id);
        match node.orientation {
            Some(Orientation::Horizontal) => {
                width = present(&control.w).or(width);
                height = present(&control.measured_h).or(height);
            }
            Some(Orientation::Vertical) => {
                width = present(&control.measured_w).or(width);
                height = present(&control.h).or(height);
            }
            None => {}
        }

        node.geometry = Geometry {
            x: present(&control.x).unwrap_or("0").to_string(),
            y: present(&control.y).unwrap_or("0").to_string(),
            width: width.unwrap_or("0").to_string(),
            height: height.unwrap_or("0").to_string(),
        };
        node.text = control.text().map(str::to_string);
        node
    }
}

// Empty strings count as missing, as they do in the mockup tool.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(controls: serde_json::Value) -> MockupDocument {
        serde_json::from_value(json!({
            "mockup": {
                "attributes": {"name": "Login", "order": 1, "parentID": null},
                "controls": {"control": controls},
                "mockupW": "640",
                "mockupH": "480"
            }
        }))
        .unwrap()
    }

    fn child_names(tree: &WidgetTree) -> Vec<&str> {
        tree.root.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_children_keep_list_order() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "7", "typeID": "Label", "zOrder": "2", "x": "1", "y": "1", "measuredW": "10", "measuredH": "10"},
            {"ID": "3", "typeID": "Button", "zOrder": "0", "x": "2", "y": "2", "measuredW": "10", "measuredH": "10"},
            {"ID": "5", "typeID": "CheckBox", "zOrder": "1", "x": "3", "y": "3", "measuredW": "10", "measuredH": "10"}
        ])));
        assert_eq!(child_names(&tree), vec!["Label_7", "Button_3", "CheckBox_5"]);
        assert_eq!(tree.root.children[1].class, "QPushButton");
    }

    #[test]
    fn test_title_window_is_absorbed_into_root() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "1", "typeID": "Button", "measuredW": "80", "measuredH": "24"},
            {"ID": "2", "typeID": "TitleWindow", "w": "800", "h": "600", "measuredW": "800",
             "measuredH": "620", "properties": {"text": "Form1"}},
            {"ID": "3", "typeID": "TextInput", "measuredW": "120", "measuredH": "24"}
        ])));
        assert_eq!(tree.form_class, "Form1");
        assert_eq!(tree.root.name, "Form1");
        assert_eq!(tree.root.class, ROOT_WIDGET_CLASS);
        assert_eq!(tree.root.children.len(), 2);
        assert_eq!(tree.root.geometry.width, "800");
        assert_eq!(tree.root.geometry.height, "620");
    }

    #[test]
    fn test_title_window_without_text_is_a_child() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "2", "typeID": "TitleWindow", "measuredW": "300", "measuredH": "200"}
        ])));
        assert_eq!(tree.root.name, DEFAULT_FORM_NAME);
        assert_eq!(tree.root.children.len(), 1);
        assert_eq!(tree.root.children[0].class, GENERIC_WIDGET_CLASS);
    }

    #[test]
    fn test_last_title_window_wins() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "1", "typeID": "TitleWindow", "properties": {"text": "First"}},
            {"ID": "2", "typeID": "TitleWindow", "properties": {"text": "Second"}}
        ])));
        assert_eq!(tree.root.name, "Second");
        assert!(tree.root.children.is_empty());
    }

    #[test]
    fn test_horizontal_orientation_overrides_height() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "4", "typeID": "HSlider", "x": "5", "y": "6", "w": "100", "h": "55",
             "measuredW": "90", "measuredH": "20"}
        ])));
        let slider = &tree.root.children[0];
        assert_eq!(slider.class, "QSlider");
        assert_eq!(slider.orientation, Some(Orientation::Horizontal));
        assert_eq!(slider.geometry.width, "100");
        assert_eq!(slider.geometry.height, "20");
        assert_eq!(slider.geometry.x, "5");
    }

    #[test]
    fn test_vertical_orientation_overrides_width() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "4", "typeID": "VerticalScrollBar", "h": "300", "measuredW": "16", "measuredH": "100"}
        ])));
        let bar = &tree.root.children[0];
        assert_eq!(bar.class, "QScrollBar");
        assert_eq!(bar.orientation, Some(Orientation::Vertical));
        assert_eq!(bar.geometry.width, "16");
        assert_eq!(bar.geometry.height, "300");
    }

    #[test]
    fn test_geometry_falls_back_to_measured_size() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "1", "typeID": "Button", "w": "200", "measuredW": "80", "measuredH": "24"},
            {"ID": "2", "typeID": "Label"}
        ])));
        let button = &tree.root.children[0];
        assert_eq!((button.geometry.width.as_str(), button.geometry.height.as_str()), ("80", "24"));
        assert_eq!(button.orientation, None);
        let label = &tree.root.children[1];
        assert_eq!(label.geometry, Geometry::default());
    }

    #[test]
    fn test_unknown_type_is_generic_container() {
        let tree = WidgetTreeBuilder::new().build(&document(json!([
            {"ID": "9", "typeID": "FooBarWidget", "measuredW": "1", "measuredH": "1",
             "properties": {"text": "hello"}}
        ])));
        let node = &tree.root.children[0];
        assert_eq!(node.class, GENERIC_WIDGET_CLASS);
        assert_eq!(node.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_empty_control_list_is_root_only() {
        let doc: MockupDocument =
            serde_json::from_value(json!({"mockup": {"controls": {}, "mockupW": "320"}})).unwrap();
        let tree = WidgetTreeBuilder::new().build(&doc);
        assert!(tree.root.children.is_empty());
        assert_eq!(tree.root.name, DEFAULT_FORM_NAME);
        assert_eq!(tree.root.geometry.width, "320");
        assert_eq!(tree.root.geometry.height, "0");
        assert_eq!(tree.root.window_title, None);
    }

    #[test]
    fn test_root_takes_window_title_from_mockup_name() {
        let tree = WidgetTreeBuilder::with_form_name("Dialog").build(&document(json!([])));
        assert_eq!(tree.form_class, "Dialog");
        assert_eq!(tree.root.window_title.as_deref(), Some("Login"));
        assert_eq!(tree.root.geometry.width, "640");
    }

    #[test]
    fn test_mapping_table() {
        let expected = [
            ("Title", "QLabel"),
            ("Webcam", "QLabel"),
            ("TextArea", "QPlainTextEdit"),
            ("NumericStepper", "QSpinBox"),
            ("FieldSet", "QGroupBox"),
            ("Image", "QGraphicsView"),
            ("List", "QListView"),
            ("Canvas", "QWidget"),
            ("VSplitter", "Line"),
        ];
        for (type_id, class) in expected {
            assert_eq!(widget_class_for(type_id), class, "{}", type_id);
        }
    }
}
