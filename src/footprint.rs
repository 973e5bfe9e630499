//! Project-level footprint estimation

use crate::types::Module;
use serde::{Deserialize, Serialize};

/// Size of the project's resolved dependency set.
///
/// Per-module footprint needs the module graph edges, which are not
/// collected; only project totals are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFootprint {
    /// All resolved modules except the main module
    pub total_modules: usize,
    /// Modules required directly by the project
    pub direct: usize,
    /// Modules pulled in transitively
    pub transitive: usize,
}

impl ProjectFootprint {
    /// Count direct and transitive modules of a resolved list
    pub fn from_modules(modules: &[Module]) -> Self {
        let deps = modules.iter().filter(|m| !m.main && !m.path.is_empty());

        let (direct, transitive) = deps.fold((0, 0), |(direct, transitive), module| {
            if module.indirect {
                (direct, transitive + 1)
            } else {
                (direct + 1, transitive)
            }
        });

        Self {
            total_modules: direct + transitive,
            direct,
            transitive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_footprint() {
        let modules = vec![
            Module {
                path: "example.com/app".to_string(),
                main: true,
                ..Module::default()
            },
            Module::new("github.com/spf13/cobra", "v1.8.0"),
            Module::new("github.com/spf13/pflag", "v1.0.5").indirect(),
            Module::new("golang.org/x/text", "v0.14.0").indirect(),
        ];

        let footprint = ProjectFootprint::from_modules(&modules);
        assert_eq!(footprint.total_modules, 3);
        assert_eq!(footprint.direct, 1);
        assert_eq!(footprint.transitive, 2);
    }

    #[test]
    fn test_empty_project() {
        assert_eq!(ProjectFootprint::from_modules(&[]), ProjectFootprint::default());
    }
}
