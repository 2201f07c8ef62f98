//! Walks a dotted member path from a target's root to the leaf's container.

use super::catalog::Catalog;
use super::members::ObjectRef;
use super::registry::HostedTarget;
use crate::{RemoteError, Result};

/// Split `path` into the object holding the leaf member and the leaf name.
///
/// Every intermediate segment must name an object member. Each hop runs
/// through the target's evaluate wrapper.
pub(crate) fn resolve(
    target: &HostedTarget,
    catalog: &Catalog,
    path: &str,
) -> Result<(ObjectRef, String)> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or_default();
    if leaf.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(RemoteError::MemberNotFound {
            member: path.to_string(),
            container: target.root().type_name().to_string(),
        });
    }

    let mut current = target.root().clone();
    for segment in segments {
        let table = catalog.members(current.type_name())?;
        let object = current.clone();
        let member = segment.to_string();
        current = target.evaluate(move || table.navigate(&object, &member))??;
    }

    Ok((current, leaf.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AnyObject;
    use crate::host::{shared, Exposed, Members, Shared, Wrappers};
    use crate::ipc::TargetKey;
    use crate::path::{Child, Property};

    struct Window {
        context: Shared<Model>,
    }

    struct Model {
        label: String,
    }

    crate::impl_type_name!(Window => "test::Window");
    crate::impl_type_name!(Model => "test::Model");

    const CONTEXT: Child<Window, AnyObject> = Child::new("DataContext");
    const LABEL: Property<Model, String> = Property::new("Label");

    impl Exposed for Window {
        fn members() -> Members<Self> {
            Members::new().child_object(CONTEXT, |w| ObjectRef::new(&w.context))
        }
    }

    impl Exposed for Model {
        fn members() -> Members<Self> {
            Members::new().read_only(LABEL, |m| m.label.clone())
        }
    }

    fn fixture() -> (HostedTarget, Catalog) {
        let window = shared(Window {
            context: shared(Model { label: "hi".into() }),
        });
        let mut catalog = Catalog::new();
        catalog.register_members::<Window>();
        catalog.register_members::<Model>();
        let target = HostedTarget::new(
            TargetKey::new("test::Window", "main"),
            ObjectRef::new(&window),
            Wrappers::inline(),
        );
        (target, catalog)
    }

    #[test]
    fn test_single_segment_is_root_member() {
        let (target, catalog) = fixture();
        let (container, leaf) = resolve(&target, &catalog, "Top").unwrap();
        assert_eq!(container.type_name(), "test::Window");
        assert_eq!(leaf, "Top");
    }

    #[test]
    fn test_walks_through_children() {
        let (target, catalog) = fixture();
        let (container, leaf) = resolve(&target, &catalog, "DataContext.Label").unwrap();
        assert_eq!(container.type_name(), "test::Model");
        assert_eq!(leaf, "Label");
    }

    #[test]
    fn test_missing_intermediate_member() {
        let (target, catalog) = fixture();
        let err = resolve(&target, &catalog, "Nope.Label").unwrap_err();
        assert!(matches!(err, RemoteError::MemberNotFound { ref member, .. } if member == "Nope"));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let (target, catalog) = fixture();
        assert!(resolve(&target, &catalog, "").is_err());
        assert!(resolve(&target, &catalog, "DataContext..Label").is_err());
    }
}
