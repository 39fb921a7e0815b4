//! Name-keyed partial templates

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::parser::{parse, Template};
use crate::registry::RegistryError;

/// A registered partial: raw source parsed on use, or a pre-parsed tree
#[derive(Debug, Clone, PartialEq)]
pub enum PartialTemplate {
    Source(String),
    Parsed(Arc<Template>),
}

impl From<&str> for PartialTemplate {
    fn from(source: &str) -> Self {
        PartialTemplate::Source(source.to_string())
    }
}

impl From<String> for PartialTemplate {
    fn from(source: String) -> Self {
        PartialTemplate::Source(source)
    }
}

impl From<Template> for PartialTemplate {
    fn from(template: Template) -> Self {
        PartialTemplate::Parsed(Arc::new(template))
    }
}

/// Registry for storing partials by exact name
#[derive(Debug, Clone, Default)]
pub struct PartialRegistry {
    partials: HashMap<String, PartialTemplate>,
    /// Directory partials were last loaded from
    base_path: Option<PathBuf>,
}

impl PartialRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a partial, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, partial: impl Into<PartialTemplate>) {
        self.partials.insert(name.into(), partial.into());
    }

    /// Parse `source` now and register the resulting tree
    pub fn register_parsed(
        &mut self,
        name: impl Into<String>,
        source: &str,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let template = parse(source).map_err(|errors| RegistryError::Syntax {
            name: name.clone(),
            errors,
        })?;
        self.register(name, template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PartialTemplate> {
        self.partials.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.partials.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.partials.remove(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.partials.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    /// Register every file under `dir` ending in `.{extension}`
    ///
    /// A partial is named by its path relative to `dir`, without the
    /// extension and with `/` separators: `dir/shared/header.hbs` becomes
    /// `shared/header`. Returns the number of partials loaded.
    pub fn load_directory(&mut self, dir: &Path, extension: &str) -> Result<usize, RegistryError> {
        if !dir.is_dir() {
            return Err(RegistryError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        collect_files(dir, extension, &mut files)?;
        files.sort();

        for path in &files {
            let source = fs::read_to_string(path).map_err(|source| RegistryError::FileRead {
                path: path.clone(),
                source,
            })?;
            let name = partial_name(dir, path);
            debug!(partial = %name, path = %path.display(), "loaded partial");
            self.register(name, source);
        }

        self.base_path = Some(dir.to_path_buf());
        Ok(files.len())
    }
}

fn collect_files(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<(), RegistryError> {
    let read_error = |source| RegistryError::FileRead {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            collect_files(&path, extension, out)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            out.push(path);
        }
    }
    Ok(())
}

fn partial_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tempo-partials-{}-{}", label, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("Should create temp dir");
        dir
    }

    #[test]
    fn test_register_and_replace() {
        let mut registry = PartialRegistry::new();
        registry.register("a", "one");
        registry.register("a", "two");
        assert_eq!(registry.get("a"), Some(&PartialTemplate::Source("two".to_string())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_parsed_reports_syntax_errors() {
        let mut registry = PartialRegistry::new();
        assert!(registry.register_parsed("ok", "{{x}}").is_ok());
        assert!(matches!(registry.get("ok"), Some(PartialTemplate::Parsed(_))));
        let err = registry.register_parsed("bad", "{{#x}}").unwrap_err();
        assert!(matches!(err, RegistryError::Syntax { .. }));
    }

    #[test]
    fn test_load_directory() {
        let dir = temp_dir("load");
        fs::create_dir_all(dir.join("shared")).expect("Should create subdir");
        fs::write(dir.join("header.hbs"), "<h1>{{title}}</h1>").expect("Should write");
        fs::write(dir.join("shared").join("footer.hbs"), "bye").expect("Should write");
        fs::write(dir.join("notes.txt"), "ignored").expect("Should write");

        let mut registry = PartialRegistry::new();
        let count = registry.load_directory(&dir, "hbs").expect("Should load");

        assert_eq!(count, 2);
        assert_eq!(registry.names(), vec!["header", "shared/footer"]);
        assert_eq!(registry.base_path(), Some(dir.as_path()));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_directory() {
        let mut registry = PartialRegistry::new();
        let err = registry
            .load_directory(Path::new("/definitely/not/here"), "hbs")
            .unwrap_err();
        assert!(matches!(err, RegistryError::DirectoryNotFound { .. }));
    }
}
