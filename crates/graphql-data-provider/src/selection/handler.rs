use std::{collections::HashMap, fmt, sync::Arc};

use crate::{introspection::IntrospectionType, type_index::TypeIndex};

use super::{compile_selection, FieldSetting};

/// The handler key consulted when no handler is registered for a field name.
pub const DEFAULT_HANDLER: &str = "__default";

/// Renders the selection fragment of a single field. An empty fragment leaves the field out.
pub trait FieldHandler: Send + Sync {
    /// `arguments` is either empty or the parenthesized argument list, ready to be appended to the
    /// field name.
    fn render(&self, field: &IntrospectionType, arguments: &str, ctx: &SelectionContext<'_>) -> String;
}

/// What a handler gets to see besides the field itself.
pub struct SelectionContext<'a> {
    pub types: &'a TypeIndex,
    pub handlers: &'a FieldHandlers,
    /// The setting found for the field, never `Enabled(false)`.
    pub setting: &'a FieldSetting,
}

impl SelectionContext<'_> {
    /// Compiles the sub-selection of the named type a field resolves to, `None` if the type is not
    /// part of the index.
    pub fn sub_selection(&self, field: &IntrospectionType, settings: &super::SelectionSettings) -> Option<String> {
        let target = field.named_type()?;

        if !self.types.contains(target.name()) {
            return None;
        }

        Some(compile_selection(target.name(), self.types, self.handlers, settings))
    }
}

/// Selects enabled fields by name and nested fields with their sub-selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFieldHandler;

impl FieldHandler for SimpleFieldHandler {
    fn render(&self, field: &IntrospectionType, arguments: &str, ctx: &SelectionContext<'_>) -> String {
        match ctx.setting {
            FieldSetting::Enabled(true) => format!("{}{arguments}", field.name()),
            FieldSetting::Nested(settings) => match ctx.sub_selection(field, settings) {
                Some(selection) => format!("{}{arguments} {{ {selection} }}", field.name()),
                None => String::new(),
            },
            FieldSetting::Enabled(false) | FieldSetting::Aliased(_) => String::new(),
        }
    }
}

struct FnHandler<F>(F);

impl<F> FieldHandler for FnHandler<F>
where
    F: Fn(&IntrospectionType, &str, &SelectionContext<'_>) -> String + Send + Sync,
{
    fn render(&self, field: &IntrospectionType, arguments: &str, ctx: &SelectionContext<'_>) -> String {
        (self.0)(field, arguments, ctx)
    }
}

/// Handlers by field name, with [`DEFAULT_HANDLER`] as the fallback entry.
#[derive(Clone)]
pub struct FieldHandlers {
    handlers: HashMap<String, Arc<dyn FieldHandler>>,
}

impl FieldHandlers {
    /// No handlers at all, not even a default one: nothing gets selected.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, handler: impl FieldHandler + 'static) -> Self {
        self.insert(name, handler);
        self
    }

    pub fn with_fn<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&IntrospectionType, &str, &SelectionContext<'_>) -> String + Send + Sync + 'static,
    {
        self.with(name, FnHandler(handler))
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: impl FieldHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// The handler for `field_name`, falling back to the default one.
    pub fn get(&self, field_name: &str) -> Option<&dyn FieldHandler> {
        self.handlers
            .get(field_name)
            .or_else(|| self.handlers.get(DEFAULT_HANDLER))
            .map(Arc::as_ref)
    }
}

impl Default for FieldHandlers {
    fn default() -> Self {
        Self::empty().with(DEFAULT_HANDLER, SimpleFieldHandler)
    }
}

impl fmt::Debug for FieldHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();

        f.debug_struct("FieldHandlers").field("handlers", &names).finish()
    }
}
