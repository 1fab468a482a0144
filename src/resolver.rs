//! Module resolution.
//!
//! Maps the requested capability names onto detection-module paths. Exclusions
//! are subtracted first, the custom catalog is consulted before the built-in
//! one, and every consumed name leaves the working set so no name resolves
//! twice. Names that no catalog satisfies produce no output.

use crate::anchor::ResolverAnchor;
use crate::catalog::ModuleMetadata;
use std::collections::BTreeSet;

/// Ordered, duplicate-free module paths handed to the bundle compiler.
pub type ResolvedModuleList = Vec<String>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolver-relative module paths, custom modules first.
    pub modules: ResolvedModuleList,
    /// Requested names no catalog entry satisfied, sorted.
    pub unresolved: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    anchor: &'a ResolverAnchor,
}

impl<'a> Resolver<'a> {
    pub fn new(anchor: &'a ResolverAnchor) -> Self {
        Self { anchor }
    }

    pub fn resolve<R, E>(
        &self,
        requested: R,
        excluded: E,
        custom: &[ModuleMetadata],
        builtin: &[ModuleMetadata],
    ) -> ResolvedModuleList
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        self.resolve_detailed(requested, excluded, custom, builtin)
            .modules
    }

    /// Resolve and also report which requested names went unresolved.
    pub fn resolve_detailed<R, E>(
        &self,
        requested: R,
        excluded: E,
        custom: &[ModuleMetadata],
        builtin: &[ModuleMetadata],
    ) -> Resolution
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let excluded: BTreeSet<String> = excluded
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        let mut working: BTreeSet<String> = requested
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .filter(|name| !excluded.contains(name))
            .collect();

        let mut modules = ResolvedModuleList::new();

        for entry in custom {
            if working.remove(&entry.property) {
                push_unique(&mut modules, self.anchor.rewrite(&entry.module_path));
            }
        }

        for entry in builtin {
            if working.is_empty() {
                break;
            }
            if working.remove(&entry.property) {
                push_unique(&mut modules, entry.module_path.clone());
            }
        }

        for name in &working {
            tracing::warn!(test = %name, "no detection module found; dropping");
        }

        Resolution {
            modules,
            unresolved: working.into_iter().collect(),
        }
    }
}

fn push_unique(modules: &mut ResolvedModuleList, path: String) {
    if !modules.contains(&path) {
        modules.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> Vec<ModuleMetadata> {
        vec![
            ModuleMetadata::new("touchevents", "feature-detects/touchevents"),
            ModuleMetadata::new("svg", "feature-detects/svg"),
        ]
    }

    #[test]
    fn exclusion_dominates_inclusion() {
        let anchor = ResolverAnchor::from_relative("../../..");
        let resolved =
            Resolver::new(&anchor).resolve(["touchevents", "svg"], ["svg"], &[], &builtin());
        assert_eq!(resolved, vec!["feature-detects/touchevents"]);
    }

    #[test]
    fn custom_module_shadows_builtin() {
        let anchor = ResolverAnchor::from_relative("../../..");
        let custom = vec![ModuleMetadata::new("svg", "my-tests/svg")];
        let resolved =
            Resolver::new(&anchor).resolve(["svg"], Vec::<String>::new(), &custom, &builtin());
        assert_eq!(resolved, vec!["../../../my-tests/svg"]);
    }

    #[test]
    fn unresolved_names_are_reported_not_raised() {
        let anchor = ResolverAnchor::from_relative("");
        let resolution = Resolver::new(&anchor).resolve_detailed(
            ["missing", "touchevents", "Svg"],
            Vec::<String>::new(),
            &[],
            &builtin(),
        );
        assert_eq!(resolution.modules, vec!["feature-detects/touchevents"]);
        assert_eq!(resolution.unresolved, vec!["Svg", "missing"]);
    }

    #[test]
    fn shared_module_path_is_emitted_once() {
        let anchor = ResolverAnchor::from_relative("");
        let catalog = vec![
            ModuleMetadata::new("inputtypes", "feature-detects/inputtypes"),
            ModuleMetadata::new("inputsearchevent", "feature-detects/inputtypes"),
        ];
        let resolved = Resolver::new(&anchor).resolve(
            ["inputsearchevent", "inputtypes"],
            Vec::<String>::new(),
            &[],
            &catalog,
        );
        assert_eq!(resolved, vec!["feature-detects/inputtypes"]);
    }

    #[test]
    fn duplicate_property_uses_first_entry() {
        let anchor = ResolverAnchor::from_relative("");
        let catalog = vec![
            ModuleMetadata::new("svg", "feature-detects/svg"),
            ModuleMetadata::new("svg", "feature-detects/svg-legacy"),
        ];
        let resolved =
            Resolver::new(&anchor).resolve(["svg"], Vec::<String>::new(), &[], &catalog);
        assert_eq!(resolved, vec!["feature-detects/svg"]);
    }
}
