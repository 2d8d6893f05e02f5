//! Notification template rendering with built-in fallback.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use minijinja::{Environment, value::Value};
use tracing::{debug, warn};

use crate::RenderError;

/// Built-in default templates, always resolvable.
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("title", include_str!("../templates/title.j2")),
    ("body", include_str!("../templates/body.j2")),
    ("startup", include_str!("../templates/startup.j2")),
];

/// Renders named templates against an episode variable mapping.
///
/// Resolution is two-level: a user template set (an optional directory of
/// `.j2` files) layered over the built-in defaults, and any failure with the
/// resolved template falls back to the default set. A broken user template
/// degrades the output, it never drops the notification.
pub struct TemplateRenderer {
    user: Environment<'static>,
    defaults: Environment<'static>,
}

impl TemplateRenderer {
    /// Build a renderer with only the built-in templates.
    pub fn new() -> Self {
        Self {
            user: default_environment(),
            defaults: default_environment(),
        }
    }

    /// Build a renderer with user templates from `dir` layered over the
    /// defaults. A user file that fails to parse is skipped with a warning,
    /// leaving the default for that name in place.
    pub fn with_user_templates(dir: &Path) -> Result<Self, RenderError> {
        let mut user = default_environment();

        let entries = fs::read_dir(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| RenderError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if path.extension().and_then(|ext| ext.to_str()) != Some("j2") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let name = name.to_string();

            let source = fs::read_to_string(&path).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;

            match user.add_template_owned(name.clone(), source) {
                Ok(()) => debug!(template = %name, path = %path.display(), "loaded user template"),
                Err(e) => warn!(
                    template = %name,
                    error = %e,
                    "user template failed to parse, keeping the default"
                ),
            }
        }

        Ok(Self {
            user,
            defaults: default_environment(),
        })
    }

    /// Render `name` against `vars`, falling back to the built-in template
    /// on any resolution or rendering error.
    pub fn render(
        &self,
        name: &str,
        vars: &BTreeMap<String, Value>,
    ) -> Result<String, RenderError> {
        match render_from(&self.user, name, vars) {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!(
                    template = name,
                    error = %err,
                    "template failed to render, falling back to the default"
                );
                render_from(&self.defaults, name, vars).map_err(|source| RenderError::Template {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_from(
    env: &Environment<'static>,
    name: &str,
    vars: &BTreeMap<String, Value>,
) -> Result<String, minijinja::Error> {
    env.get_template(name)?.render(vars)
}

fn default_environment() -> Environment<'static> {
    let mut env = Environment::new();
    for &(name, source) in DEFAULT_TEMPLATES {
        env.add_template(name, source)
            .expect("built-in template must parse");
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars() -> BTreeMap<String, Value> {
        let mut vars = BTreeMap::new();
        vars.insert("show_name".to_string(), Value::from("Test Show"));
        vars.insert("season_num_00".to_string(), Value::from("01"));
        vars.insert("episode_num_00".to_string(), Value::from("02"));
        vars
    }

    fn write_template(dir: &Path, name: &str, source: &str) {
        fs::write(dir.join(format!("{name}.j2")), source).unwrap();
    }

    #[test]
    fn test_default_title_renders() {
        let renderer = TemplateRenderer::new();
        let title = renderer.render("title", &vars()).unwrap();
        assert_eq!(title, "Test Show S01E02 is about to air");
    }

    #[test]
    fn test_user_template_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "title", "now airing: {{ show_name }}");

        let renderer = TemplateRenderer::with_user_templates(dir.path()).unwrap();
        let title = renderer.render("title", &vars()).unwrap();
        assert_eq!(title, "now airing: Test Show");
    }

    #[test]
    fn test_names_not_overridden_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "title", "now airing: {{ show_name }}");

        let renderer = TemplateRenderer::with_user_templates(dir.path()).unwrap();
        // "body" was not overridden and must still resolve.
        assert!(renderer.render("body", &vars()).is_ok());
    }

    #[test]
    fn test_runtime_error_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        // Parses fine, fails at render time.
        write_template(dir.path(), "title", "{{ 1 / 0 }}");

        let renderer = TemplateRenderer::with_user_templates(dir.path()).unwrap();
        let title = renderer.render("title", &vars()).unwrap();
        assert_eq!(title, "Test Show S01E02 is about to air");
    }

    #[test]
    fn test_syntax_error_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "title", "{% if %} broken");

        let renderer = TemplateRenderer::with_user_templates(dir.path()).unwrap();
        let title = renderer.render("title", &vars()).unwrap();
        assert_eq!(title, "Test Show S01E02 is about to air");
    }

    #[test]
    fn test_unknown_template_name_is_an_error() {
        let renderer = TemplateRenderer::new();
        assert!(matches!(
            renderer.render("no-such-template", &vars()),
            Err(RenderError::Template { .. })
        ));
    }

    #[test]
    fn test_non_template_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "{{ not a template").unwrap();

        let renderer = TemplateRenderer::with_user_templates(dir.path()).unwrap();
        assert!(renderer.render("title", &vars()).is_ok());
    }

    #[test]
    fn test_missing_user_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            TemplateRenderer::with_user_templates(&missing),
            Err(RenderError::Io { .. })
        ));
    }
}
