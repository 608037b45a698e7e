use std::path::{Component, Path};

/// Extended attribute holding a legacy resource fork
pub const RESOURCE_FORK_ATTR: &str = "com.apple.ResourceFork";

pub const RESOURCE_FORK_REQUIRED: &str = "[WARNING] unreadable without resource fork";
pub const RESOURCE_FORK_OLD: &str = "[WARNING] old files may require resource fork";

/// Static rule tables consulted while classifying entries
///
/// Built once at start-up and shared by reference; nothing mutates it during a walk.
#[derive(Debug)]
pub struct Rules {
    /// OS bookkeeping files and companion files of legacy creative suites
    pub ignored_files: &'static [&'static str],
    /// Directory names whose whole subtree is skipped
    pub ignored_path_components: &'static [&'static str],
    /// Attributes known to carry nothing worth migrating
    pub ignored_attributes: &'static [&'static str],
    /// Names that conventionally have no extension
    pub allowed_without_extension: &'static [&'static str],
    /// Extensions known to depend on a resource fork, with their annotation
    pub resource_fork_risks: &'static [(&'static str, &'static str)],
    pub illegal_chars: &'static [char],
    pub illegal_trailing_chars: &'static [char],
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            ignored_files: &[
                ".DS_Store",
                // GarageBand
                "PkgInfo",
                "projectData",
                // Logic
                "displayState",
                "documentData",
                // Custom folder icon, the name ends in a carriage return
                "Icon\r",
            ],
            ignored_path_components: &[".git", ".svn", ".fseventsd", ".Trashes", ".Spotlight-V100"],
            ignored_attributes: &[
                "com.apple.FinderInfo",
                "com.apple.Preview.UIstate.v1",
                "com.apple.TextEncoding",
                "com.apple.diskimages.recentcksum",
                "com.apple.metadata:_kTimeMachineNewestSnapshot",
                "com.apple.metadata:_kTimeMachineOldestSnapshot",
                "com.apple.metadata:com_apple_backup_excludeItem",
                "com.apple.metadata:kMDItemFinderComment",
                "com.apple.metadata:kMDItemIsScreenCapture",
                "com.apple.metadata:kMDItemScreenCaptureType",
                "com.apple.metadata:kMDItemWhereFroms",
                "com.apple.quarantine",
                "com.dropbox.attributes",
                "com.macromates.bookmarked_lines",
                "com.macromates.caret",
                "com.dropbox.attrs",
            ],
            allowed_without_extension: &[
                "Capfile",
                "Gemfile",
                "Rakefile",
                "Procfile",
                "CHANGELOG",
                "LICENCE",
                "LICENSE",
                "MIT-LICENSE",
                "README",
                "TODO",
                "VERSION",
                "INSTALL",
                "crontab",
                "Desktop DB",
                "Desktop DF",
                // DVD Studio Pro projects
                "ModuleDataB",
                "ObjectDataB",
            ],
            // TODO: confirm whether any .mov or .psd files really need the fork
            resource_fork_risks: &[
                (".disc", RESOURCE_FORK_REQUIRED),
                (".mov", RESOURCE_FORK_OLD),
                (".psd", RESOURCE_FORK_OLD),
                (".sd2", RESOURCE_FORK_REQUIRED),
                (".sd2f", RESOURCE_FORK_REQUIRED),
                (".textclipping", RESOURCE_FORK_REQUIRED),
            ],
            illegal_chars: &[':', '/', '\\'],
            illegal_trailing_chars: &['.', ' '],
        }
    }
}

impl Rules {
    pub fn is_ignored_file(&self, basename: &str) -> bool {
        self.ignored_files.contains(&basename)
    }

    /// Check a single directory name against the ignored components
    pub fn is_ignored_component(&self, name: &str) -> bool {
        self.ignored_path_components.contains(&name)
    }

    /// True if any component of `path` is an ignored directory name
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .is_some_and(|name| self.is_ignored_component(name)),
            _ => false,
        })
    }

    pub fn is_ignored_attribute(&self, name: &str) -> bool {
        self.ignored_attributes.contains(&name)
    }

    pub fn is_allowed_without_extension(&self, basename: &str) -> bool {
        self.allowed_without_extension.contains(&basename)
    }

    /// Annotation for an extension known to depend on its resource fork
    pub fn resource_fork_risk(&self, extension: &str) -> Option<&'static str> {
        self.resource_fork_risks
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, annotation)| *annotation)
    }
}
