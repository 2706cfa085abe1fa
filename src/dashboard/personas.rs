use std::collections::BTreeSet;
use tracing::{info, warn};

use super::{Loadable, Screen, clamp_selection};
use crate::ai::AiService;
use crate::api::{ApiClient, Result};
use crate::model::Persona;

/// Temperature change per key press.
pub const TEMPERATURE_STEP: f64 = 0.1;

/// AI personality editor. Edits stay local until saved.
#[derive(Debug, Default)]
pub struct PersonasScreen {
    pub personas: Loadable<Vec<Persona>>,
    pub selected: usize,
    unsaved: BTreeSet<usize>,
}

impl PersonasScreen {
    pub fn list(&self) -> &[Persona] {
        self.personas.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn current(&self) -> Option<&Persona> {
        self.list().get(self.selected)
    }

    pub fn is_unsaved(&self, index: usize) -> bool {
        self.unsaved.contains(&index)
    }

    pub fn has_unsaved(&self) -> bool {
        !self.unsaved.is_empty()
    }

    pub fn select_next(&mut self) {
        let len = self.list().len();
        super::select_next(&mut self.selected, len);
    }

    pub fn select_prev(&mut self) {
        super::select_prev(&mut self.selected);
    }

    pub fn raise_temperature(&mut self) {
        self.edit_current(|p| p.adjust_temperature(TEMPERATURE_STEP));
    }

    pub fn lower_temperature(&mut self) {
        self.edit_current(|p| p.adjust_temperature(-TEMPERATURE_STEP));
    }

    pub fn toggle_active(&mut self) {
        self.edit_current(|p| p.active = !p.active);
    }

    fn edit_current(&mut self, edit: impl FnOnce(&mut Persona)) {
        let index = self.selected;
        if let Some(persona) = self.personas.loaded_mut().and_then(|l| l.get_mut(index)) {
            edit(persona);
            self.unsaved.insert(index);
        }
    }

    /// Save the selected persona (PUT, or POST when it has no id yet).
    pub fn save_current(&mut self, api: &ApiClient) -> Result<bool> {
        let index = self.selected;
        let Some(persona) = self.current() else {
            return Ok(false);
        };
        let saved = api
            .update_persona(persona)
            .inspect_err(|err| warn!("saving persona {} failed: {err}", persona.name))?;
        info!("saved persona {}", saved.name);
        if let Some(slot) = self.personas.loaded_mut().and_then(|l| l.get_mut(index)) {
            *slot = saved;
        }
        self.unsaved.remove(&index);
        Ok(true)
    }

    /// Generate a draft persona from document text and select it, unsaved.
    pub fn generate(&mut self, api: &ApiClient, name: &str, document_context: &str) -> Result<()> {
        let generated = AiService::new(api).generate_persona_config(document_context)?;
        let persona = Persona::from_generated(name.trim(), generated);
        if self.personas.loaded().is_none() {
            self.personas = Loadable::Loaded(Vec::new());
        }
        let Some(list) = self.personas.loaded_mut() else {
            return Ok(());
        };
        list.push(persona);
        self.selected = list.len() - 1;
        self.unsaved.insert(self.selected);
        Ok(())
    }
}

impl Screen for PersonasScreen {
    fn begin_load(&mut self) {
        self.personas = Loadable::Loading;
    }

    fn wants_load(&self) -> bool {
        self.personas.is_loading()
    }

    fn load(&mut self, api: &ApiClient) {
        self.personas = Loadable::from_result(api.personas());
        self.unsaved.clear();
        let len = self.list().len();
        clamp_selection(&mut self.selected, len);
    }

    fn error(&self) -> Option<&str> {
        self.personas.error()
    }
}
