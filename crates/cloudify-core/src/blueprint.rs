use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main document name used when an upload does not name one.
pub const DEFAULT_MAIN_FILE_NAME: &str = "blueprint.yaml";

/// An uploaded blueprint and the location of its root document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintRecord {
    pub id: String,
    /// Directory holding the uploaded blueprint resources.
    pub resources_dir: PathBuf,
    /// File name of the root document inside `resources_dir`.
    pub main_file_name: String,
}

impl BlueprintRecord {
    pub fn new(
        id: impl Into<String>,
        resources_dir: impl Into<PathBuf>,
        main_file_name: impl Into<String>,
    ) -> Result<Self> {
        let record = Self {
            id: id.into(),
            resources_dir: resources_dir.into(),
            main_file_name: main_file_name.into(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Full path of the root document.
    pub fn root_document(&self) -> PathBuf {
        self.resources_dir.join(&self.main_file_name)
    }

    fn validate(&self) -> Result<()> {
        validate_blueprint_id(&self.id)?;
        if self.main_file_name.trim().is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "blueprint '{}' has no main file name",
                self.id
            )));
        }
        let main_file = Path::new(&self.main_file_name);
        if main_file.is_absolute()
            || main_file
                .components()
                .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(Error::InvalidBlueprint(format!(
                "blueprint '{}' main file escapes its resources directory",
                self.id
            )));
        }
        Ok(())
    }
}

/// Blueprint ids name a single directory under the resources root.
pub fn validate_blueprint_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidBlueprint("blueprint id is empty".to_string()));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(Error::InvalidBlueprint(format!(
            "blueprint id '{id}' is not a plain name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_document_joins_main_file() {
        let record =
            BlueprintRecord::new("imported_blueprint", "/uploads/imported_blueprint", "bp.yaml")
                .expect("valid record");
        assert_eq!(
            record.root_document(),
            PathBuf::from("/uploads/imported_blueprint/bp.yaml")
        );
    }

    #[test]
    fn rejects_empty_id_and_escaping_main_file() {
        assert!(BlueprintRecord::new(" ", "/tmp", "bp.yaml").is_err());
        assert!(BlueprintRecord::new("bp", "/tmp", "../secret.yaml").is_err());
    }

    #[test]
    fn rejects_absolute_main_file() {
        let err = BlueprintRecord::new("bp", "/uploads/bp", "/etc/passwd").unwrap_err();
        assert!(err.to_string().contains("escapes its resources directory"));
        assert!(BlueprintRecord::new("bp", "/uploads/bp", "./bp.yaml").is_err());
    }

    #[test]
    fn accepts_nested_main_file() {
        let record = BlueprintRecord::new("bp", "/uploads/bp", "app/bp.yaml").expect("nested");
        assert_eq!(record.root_document(), PathBuf::from("/uploads/bp/app/bp.yaml"));
    }

    #[test]
    fn rejects_id_that_is_not_a_plain_name() {
        for id in ["../etc", "a/b", "a\\b", ".", ".."] {
            assert!(BlueprintRecord::new(id, "/uploads", "bp.yaml").is_err(), "{id}");
        }
    }
}
