use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use batislens_core::mapper::{MapperDefinition, MapperRegistry};

use crate::error::{ProjectError, Result};

/// Loads every mapper document under `path`, which may also be a single
/// file. XML files whose root is not `<mapper>` are skipped.
pub fn load_mappers(path: &Path) -> Result<MapperRegistry> {
    let mut registry = MapperRegistry::new();

    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|_| ProjectError::InvalidPath(path.to_path_buf()))?;
            if entry.path().extension().map_or(false, |ext| ext == "xml") {
                load_mapper_file(&mut registry, entry.path())?;
            }
        }
    } else {
        load_mapper_file(&mut registry, path)?;
    }

    info!(mappers = registry.len(), path = %path.display(), "loaded mappers");
    Ok(registry)
}

fn load_mapper_file(registry: &mut MapperRegistry, path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)?;
    match MapperDefinition::parse(&content) {
        Ok(mapper) => {
            debug!(
                namespace = %mapper.namespace,
                statements = mapper.statements.len(),
                file = %path.display(),
                "loaded mapper"
            );
            registry.insert(mapper);
            Ok(())
        }
        Err(err) if err.is_not_a_mapper() => {
            debug!(file = %path.display(), "not a mapper document, skipping");
            Ok(())
        }
        Err(source) => Err(ProjectError::MapperFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_mappers_and_skips_other_xml() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/BlogMapper.xml"),
            r#"<mapper namespace="blog"><select id="s">SELECT 1</select></mapper>"#,
        )
        .unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "<mapper").unwrap();

        let registry = load_mappers(dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("blog").is_some());
    }

    #[test]
    fn malformed_mappers_name_their_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Broken.xml"), "<mapper namespace=\"x\">").unwrap();

        let err = load_mappers(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::MapperFile { ref path, .. } if path.ends_with("Broken.xml")));
    }
}
