use orrery_engine::{Display, SceneError, Surface};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

/// The page document as seen by the viewport.
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The surface of the current page, if there is one.
    pub fn current() -> Result<Self, SceneError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| SceneError::MissingElement("document".into()))?;
        Ok(Self::new(document))
    }

    pub fn element(&self, id: &str) -> Result<HtmlElement, SceneError> {
        self.document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| SceneError::MissingElement(id.to_string()))
    }
}

impl Surface for DomSurface {
    fn has_element(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_display(&mut self, id: &str, display: Display) -> Result<(), SceneError> {
        let element = self.element(id)?;
        if let Err(e) = element.style().set_property("display", display.as_css()) {
            log::warn!("#{}: could not set display: {:?}", id, e);
        }
        Ok(())
    }
}
