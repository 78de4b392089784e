use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

/// Get element by ID
pub fn get_element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Element not found: {}", id)))
}

/// Get HTML element by ID
pub fn get_html_element_by_id(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
    let element = get_element_by_id(document, id)?;
    element
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str(&format!("Element is not HtmlElement: {}", id)))
}

/// The message box, which pages build either as a textarea or a single-line input
#[derive(Clone)]
pub enum TextInput {
    Area(HtmlTextAreaElement),
    Line(HtmlInputElement),
}

impl TextInput {
    pub fn by_id(document: &Document, id: &str) -> Result<Self, JsValue> {
        let element = get_element_by_id(document, id)?;
        let element = match element.dyn_into::<HtmlTextAreaElement>() {
            Ok(area) => return Ok(TextInput::Area(area)),
            Err(element) => element,
        };
        element
            .dyn_into::<HtmlInputElement>()
            .map(TextInput::Line)
            .map_err(|_| JsValue::from_str(&format!("Element is not a text input: {}", id)))
    }

    pub fn value(&self) -> String {
        match self {
            TextInput::Area(area) => area.value(),
            TextInput::Line(line) => line.value(),
        }
    }

    pub fn clear(&self) {
        match self {
            TextInput::Area(area) => area.set_value(""),
            TextInput::Line(line) => line.set_value(""),
        }
    }

    /// Read-only keeps the text selectable while blocking edits
    pub fn set_read_only(&self, read_only: bool) {
        match self {
            TextInput::Area(area) => area.set_read_only(read_only),
            TextInput::Line(line) => line.set_read_only(read_only),
        }
    }

    pub fn focus(&self) {
        let result = match self {
            TextInput::Area(area) => area.focus(),
            TextInput::Line(line) => line.focus(),
        };
        if let Err(e) = result {
            log::debug!("Could not focus input: {:?}", e);
        }
    }

    pub fn as_element(&self) -> &Element {
        match self {
            TextInput::Area(area) => area.as_ref(),
            TextInput::Line(line) => line.as_ref(),
        }
    }
}

/// Create element with class
pub fn create_element_with_class(
    document: &Document,
    tag: &str,
    class: &str,
) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    element.set_class_name(class);
    Ok(element)
}

/// Add click listener to element
pub fn add_click_listener<F>(element: &Element, callback: F) -> Result<(), JsValue>
where
    F: FnMut(web_sys::MouseEvent) + 'static,
{
    let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(web_sys::MouseEvent)>);
    element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget(); // Keep the closure alive
    Ok(())
}

/// Show element
pub fn show_element(element: &HtmlElement) {
    let _ = element.style().set_property("display", "block");
}

/// Hide element
pub fn hide_element(element: &HtmlElement) {
    let _ = element.style().set_property("display", "none");
}

/// Remove children from the end until `keep` (or nothing) is left
pub fn truncate_children(container: &Element, keep: Option<&Element>) {
    while let Some(last) = container.last_element_child() {
        let node: &web_sys::Node = &last;
        if keep.is_some_and(|k| k.is_same_node(Some(node))) {
            break;
        }
        last.remove();
    }
}

/// Scroll element to bottom
pub fn scroll_to_bottom(element: &Element) {
    element.set_scroll_top(element.scroll_height());
}
