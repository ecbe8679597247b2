use super::{AssociationOptions, AssociationReflection, MacroKind, TargetResolver};
use crate::core::{Attributes, ResourceError, Result, Value};
use crate::inflect::{self, Inflections};

const SHARED_OPTIONS: &[&str] = &["class_name", "foreign_key"];
const BELONGS_TO_OPTIONS: &[&str] = &["class_name", "foreign_key", "polymorphic"];

/// Turns a declaration call into a reusable reflection: validates the
/// option mapping against the per-macro whitelist, computes the
/// deferred target-class name, and packages both.
pub fn build(
    macro_kind: MacroKind,
    name: &str,
    options: &Attributes,
    inflections: &Inflections,
) -> Result<AssociationReflection> {
    let allowed = match macro_kind {
        MacroKind::BelongsTo => BELONGS_TO_OPTIONS,
        MacroKind::HasMany | MacroKind::HasOne => SHARED_OPTIONS,
    };

    for key in options.keys() {
        if !allowed.contains(&key) {
            return Err(ResourceError::InvalidOption {
                option: key.to_string(),
                macro_kind: macro_kind.as_str().to_string(),
            });
        }
    }

    let parsed = AssociationOptions {
        class_name: text_option(options, "class_name"),
        foreign_key: text_option(options, "foreign_key"),
        polymorphic: options
            .get("polymorphic")
            .map(Value::is_truthy)
            .unwrap_or(false),
    };

    let expected = match &parsed.class_name {
        Some(class_name) => class_name.clone(),
        None => inflections.camelize(&inflect::singularize(name)),
    };

    Ok(AssociationReflection::new(
        macro_kind,
        name,
        parsed,
        TargetResolver::new(expected),
    ))
}

fn text_option(options: &Attributes, key: &str) -> Option<String> {
    options.get(key).and_then(|v| v.as_str()).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_derives_target_from_name() {
        let reflection = build(
            MacroKind::HasMany,
            "comments",
            &Attributes::new(),
            &Inflections::new(),
        )
        .unwrap();
        assert_eq!(reflection.resolver().expected_class_name(), "Comment");
    }

    #[test]
    fn test_class_name_option_wins() {
        let reflection = build(
            MacroKind::BelongsTo,
            "author",
            &options(&[("class_name", Value::Text("Person".into()))]),
            &Inflections::new(),
        )
        .unwrap();
        assert_eq!(reflection.resolver().expected_class_name(), "Person");
    }

    #[test]
    fn test_unknown_option_rejected_at_declaration() {
        let err = build(
            MacroKind::HasMany,
            "x",
            &options(&[("bogus", Value::Boolean(true))]),
            &Inflections::new(),
        )
        .unwrap_err();

        match err {
            ResourceError::InvalidOption { option, macro_kind } => {
                assert_eq!(option, "bogus");
                assert_eq!(macro_kind, "has_many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_polymorphic_only_for_belongs_to() {
        assert!(build(
            MacroKind::BelongsTo,
            "owner",
            &options(&[("polymorphic", Value::Boolean(true))]),
            &Inflections::new(),
        )
        .is_ok());

        assert!(matches!(
            build(
                MacroKind::HasOne,
                "owner",
                &options(&[("polymorphic", Value::Boolean(true))]),
                &Inflections::new(),
            ),
            Err(ResourceError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_default_foreign_key() {
        let reflection = build(
            MacroKind::BelongsTo,
            "author",
            &Attributes::new(),
            &Inflections::new(),
        )
        .unwrap();
        assert_eq!(reflection.foreign_key(), "author_id");
    }
}
