use crate::debugger::Debugger;
use itertools::Itertools;
use log::debug;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

type Factory = Rc<dyn Fn() -> Rc<Debugger>>;

/// Debugger backend provider.
#[derive(Clone)]
pub struct DebuggerPlugin {
    pub module_name: String,
    /// Source languages the backend can debug, empty if unknown.
    pub languages: Vec<String>,
    factory: Factory,
}

impl Debug for DebuggerPlugin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebuggerPlugin")
            .field("module_name", &self.module_name)
            .field("languages", &self.languages)
            .finish()
    }
}

impl DebuggerPlugin {
    pub fn new(
        module_name: impl Into<String>,
        factory: impl Fn() -> Rc<Debugger> + 'static,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            languages: vec![],
            factory: Rc::new(factory),
        }
    }

    pub fn with_languages(
        mut self,
        languages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Set languages from a comma separated plugin manifest value, like `"c,cpp,rust"`.
    pub fn with_languages_manifest(self, manifest: &str) -> Self {
        self.with_languages(
            manifest
                .split(',')
                .map(str::trim)
                .filter(|lang| !lang.is_empty()),
        )
    }

    /// Return false only if both the plugin languages and the language are known and the
    /// plugin does not declare it.
    pub fn matches_language(&self, language: Option<&str>) -> bool {
        match language {
            Some(language) if !self.languages.is_empty() => {
                self.languages.iter().any(|l| l == language)
            }
            _ => true,
        }
    }

    /// Create a new debugger instance.
    pub fn create(&self) -> Rc<Debugger> {
        (self.factory)()
    }
}

#[derive(Default)]
struct RegistryState {
    plugins: Vec<Rc<DebuggerPlugin>>,
    /// Union of plugin languages, sorted, may contain duplicates.
    languages: Vec<String>,
}

/// Set of available debugger backends.
#[derive(Default)]
pub struct DebuggerRegistry {
    state: RefCell<RegistryState>,
}

impl Debug for DebuggerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DebuggerRegistry")
            .field(
                "plugins",
                &state.plugins.iter().map(|p| &p.module_name).join(", "),
            )
            .field("languages", &state.languages)
            .finish()
    }
}

impl DebuggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. Plugins are enumerated in load order.
    pub fn load(&self, plugin: DebuggerPlugin) {
        debug!(
            target: "debugger",
            "load debugger plugin {} ({})",
            plugin.module_name,
            plugin.languages.iter().join(",")
        );
        let mut state = self.state.borrow_mut();
        state.languages.extend(plugin.languages.iter().cloned());
        state.languages.sort_unstable();
        state.plugins.push(Rc::new(plugin));
    }

    /// Unregister a plugin, return false if it is not loaded. One occurrence of each plugin
    /// language leaves the supported language set, so languages shared with other plugins
    /// stay supported.
    pub fn unload(&self, module_name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state
            .plugins
            .iter()
            .position(|p| p.module_name == module_name)
        else {
            return false;
        };
        let plugin = state.plugins.remove(pos);
        for language in &plugin.languages {
            if let Some(idx) = state.languages.iter().position(|l| l == language) {
                state.languages.remove(idx);
            }
        }
        debug!(target: "debugger", "unload debugger plugin {module_name}");
        true
    }

    pub fn plugins(&self) -> Vec<Rc<DebuggerPlugin>> {
        self.state.borrow().plugins.clone()
    }

    /// Return true if any loaded plugin declares the language.
    pub fn supports_language(&self, language: &str) -> bool {
        self.state
            .borrow()
            .languages
            .binary_search_by(|l| l.as_str().cmp(language))
            .is_ok()
    }
}
