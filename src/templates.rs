//! Predefined configuration templates for the named standards.

use std::path::{Path, PathBuf};

use crate::models::{ConfigTemplate, Standard};

/// A bundled template.
pub struct Template {
    pub standard: Standard,
    pub display_name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

/// All bundled templates.
pub static TEMPLATES: &[Template] = &[
    Template {
        standard: Standard::Strict,
        display_name: "Strict Mode",
        description: "Highest standards for critical systems (complexity <= 5, coverage >= 85%)",
        content: include_str!("../configs/templates/strict.yaml"),
    },
    Template {
        standard: Standard::Standard,
        display_name: "Standard Mode",
        description: "Balanced standards for general projects (complexity <= 10, coverage >= 70%)",
        content: include_str!("../configs/templates/standard.yaml"),
    },
    Template {
        standard: Standard::Relaxed,
        display_name: "Relaxed Mode",
        description: "Basic standards for prototypes (complexity <= 15, coverage >= 60%)",
        content: include_str!("../configs/templates/relaxed.yaml"),
    },
];

impl Template {
    pub fn name(&self) -> &'static str {
        self.standard.as_str()
    }

    /// File name the template is stored under.
    pub fn file_name(&self) -> String {
        template_file_name(self.standard)
    }

    pub fn describe(&self) -> ConfigTemplate {
        ConfigTemplate {
            name: self.name().to_string(),
            display_name: self.display_name.to_string(),
            description: self.description.to_string(),
            level: self.standard,
        }
    }
}

pub fn template_file_name(standard: Standard) -> String {
    format!("{}.yaml", standard.as_str())
}

/// Find the bundled template for a standard.
pub fn find(standard: Standard) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.standard == standard)
}

/// Describe all bundled templates.
pub fn list() -> Vec<ConfigTemplate> {
    TEMPLATES.iter().map(Template::describe).collect()
}

/// Write a bundled template into `dir`. Refuses to overwrite.
pub fn write(standard: Standard, dir: &Path) -> anyhow::Result<PathBuf> {
    let template = find(standard)
        .ok_or_else(|| anyhow::anyhow!("no bundled template for standard {}", standard))?;

    let path = dir.join(template.file_name());
    if path.exists() {
        anyhow::bail!("file already exists: {}", path.display());
    }

    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, template.content)?;
    Ok(path)
}
