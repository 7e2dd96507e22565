//! Compiles selection settings into the body of a GraphQL selection set.

mod handler;
mod settings;

pub use handler::{FieldHandler, FieldHandlers, SelectionContext, SimpleFieldHandler, DEFAULT_HANDLER};
pub use settings::{AliasedField, FieldSetting, SelectionSettings, ALIAS_PREFIX};

use crate::{introspection::IntrospectionType, type_index::TypeIndex};

/// Builds the selection of `type_name` described by `settings`.
///
/// Every selected field is rendered by its handler and prefixed with a single space, so the
/// result can be placed between braces as is. Settings keys are visited in sorted order, keys that
/// are not fields of the type are skipped. An unknown type, or one without fields, selects nothing.
pub fn compile_selection(
    type_name: &str,
    types: &TypeIndex,
    handlers: &FieldHandlers,
    settings: &SelectionSettings,
) -> String {
    let Some(fields) = types.get(type_name).and_then(|ty| ty.fields.as_deref()) else {
        return String::new();
    };

    let mut selection = String::new();

    for (key, setting) in settings.iter() {
        let (alias, field_name, arguments, setting) = match setting {
            FieldSetting::Aliased(aliased) => (
                key.strip_prefix(ALIAS_PREFIX),
                aliased.field.as_str(),
                aliased.arguments.as_deref(),
                aliased.setting.as_ref(),
            ),
            setting => (None, key, None, setting),
        };

        if matches!(setting, FieldSetting::Enabled(false)) {
            continue;
        }

        let Some(field) = fields.iter().find(|field| field.name() == field_name) else {
            tracing::trace!("skipping unknown field `{field_name}` in the selection of `{type_name}`");
            continue;
        };

        let Some(handler) = handlers.get(field_name) else {
            tracing::trace!("no handler for `{field_name}` in the selection of `{type_name}`");
            continue;
        };

        let arguments = arguments.map(|arguments| format!("({arguments})")).unwrap_or_default();
        let ctx = SelectionContext {
            types,
            handlers,
            setting,
        };

        let fragment = handler.render(field, &arguments, &ctx);

        if fragment.is_empty() {
            continue;
        }

        selection.push(' ');

        if let Some(alias) = alias {
            selection.push_str(alias);
            selection.push_str(": ");
        }

        selection.push_str(&fragment);
    }

    selection
}

/// Settings selecting every field of `ty` that resolves to a leaf type.
///
/// Fields whose type is an object, interface or union, either by its declared kind or by the kind
/// of the indexed type, are left out as they would need a sub-selection.
pub fn leaf_settings(ty: &IntrospectionType, types: &TypeIndex) -> SelectionSettings {
    let leaves = ty.fields().iter().filter(|field| {
        let Some(target) = field.named_type() else {
            return false;
        };

        let kind = target
            .kind()
            .or_else(|| types.get(target.name()).and_then(|ty| ty.kind.as_ref()));

        let has_fields = types.get(target.name()).is_some_and(|ty| ty.fields.is_some());

        !kind.is_some_and(|kind| kind.is_composite()) && !has_fields
    });

    SelectionSettings::new().fields(leaves.map(|field| field.name().to_owned()))
}
