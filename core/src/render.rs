//! HTML rendering of list views.
//!
//! Each item becomes a `<div class="{item_class}">` holding one
//! `<p><strong>Label:</strong> value</p>` per display field, followed by
//! Delete and Edit buttons. The buttons carry `data-action` / `data-id`
//! attributes that `ItemAction::from_control` turns back into an action.

use std::sync::{Arc, Mutex};

use build_html::{escape_html, Html, HtmlContainer, HtmlElement, HtmlTag};

use crate::views::{ItemAction, ListRenderer, Resource};

/// Render one item's block.
pub fn render_item<E: Resource>(item: &E) -> HtmlElement {
    let mut block = HtmlElement::new(HtmlTag::Div).with_attribute("class", E::ITEM_CLASS);
    for (label, value) in item.display_fields() {
        block.add_child(
            HtmlElement::new(HtmlTag::ParagraphText)
                .with_raw(format!("<strong>{label}:</strong> {}", escape_html(&value)))
                .into(),
        );
    }
    for action in [ItemAction::Delete(item.id()), ItemAction::Edit(item.id())] {
        block.add_raw(control(action));
    }
    block
}

/// Render a whole list as the container's inner HTML.
pub fn render_items<E: Resource>(items: &[E]) -> String {
    items
        .iter()
        .map(|item| render_item(item).to_html_string())
        .collect()
}

fn control(action: ItemAction) -> String {
    let label = match action {
        ItemAction::Edit(_) => "Edit",
        ItemAction::Delete(_) => "Delete",
    };
    format!(
        r#"<button data-action="{}" data-id="{}">{label}</button>"#,
        action.name(),
        action.id()
    )
}

/// `ListRenderer` that writes into an in-memory HTML container.
///
/// Clones share the container, so a host can keep one handle to read the
/// markup while the list view owns another.
#[derive(Clone, Debug, Default)]
pub struct HtmlListRenderer {
    container: Arc<Mutex<String>>,
}

impl HtmlListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the container.
    pub fn html(&self) -> String {
        self.container
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<E: Resource> ListRenderer<E> for HtmlListRenderer {
    fn render_list(&self, items: &[E]) {
        let markup = render_items(items);
        *self.container.lock().unwrap_or_else(|e| e.into_inner()) = markup;
    }
}
