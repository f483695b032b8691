//! A lightweight index over a project's Java sources.
//!
//! Files are scanned with regular expressions rather than parsed: enough to
//! recover mapper interface signatures (with `@Param` names) and the field
//! layout of parameter classes. Class type parameters are not tracked, so a
//! field typed `T` stays unresolved. Nested classes are indexed under their
//! package like top-level ones.

mod parse;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use batislens_core::model::ParameterDeclaration;
use batislens_core::shape::{SignatureSource, StaticSignatures};
use batislens_core::types::{
    ClassDescriptor, ClassKind, FieldDescriptor, StaticTypes, TypeRef, TypeResolver,
};

use crate::error::{ProjectError, Result};
use parse::{parse_source, SourceFile, TypeDecl};

const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "short", "int", "long", "float", "double", "char", "void",
];

const JAVA_LANG: [&str; 14] = [
    "String",
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Character",
    "Boolean",
    "Double",
    "Float",
    "Object",
    "Number",
    "CharSequence",
    "Iterable",
    "Enum",
];

/// Signatures and class layouts recovered from Java sources.
#[derive(Debug, Default)]
pub struct JavaIndex {
    types: StaticTypes,
    signatures: StaticSignatures,
}

impl JavaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every `.java` file under the given roots.
    pub fn scan(roots: &[PathBuf]) -> Result<Self> {
        let mut files = Vec::new();
        for root in roots {
            for entry in WalkDir::new(root) {
                let entry = entry.map_err(|_| ProjectError::InvalidPath(root.clone()))?;
                if entry.path().extension().map_or(false, |ext| ext == "java") {
                    let content = fs::read_to_string(entry.path())?;
                    files.push(parse_source(&content));
                }
            }
        }
        let index = Self::from_files(&files);
        debug!(
            files = files.len(),
            classes = index.types.len(),
            signatures = index.signatures.len(),
            "indexed java sources"
        );
        Ok(index)
    }

    /// Indexes in-memory source texts.
    pub fn from_sources<'s>(sources: impl IntoIterator<Item = &'s str>) -> Self {
        let files: Vec<SourceFile> = sources.into_iter().map(parse_source).collect();
        Self::from_files(&files)
    }

    fn from_files(files: &[SourceFile]) -> Self {
        let known: HashSet<String> = files
            .iter()
            .flat_map(|file| file.types.iter().map(move |ty| qualified(&file.package, &ty.name)))
            .collect();

        let mut index = Self::new();
        for file in files {
            let names = NameScope {
                file,
                known: &known,
            };
            for decl in &file.types {
                index.add_type(&names, decl);
            }
        }
        index
    }

    pub fn class_count(&self) -> usize {
        self.types.len()
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    fn add_type(&mut self, names: &NameScope<'_>, decl: &TypeDecl) {
        let name = qualified(&names.file.package, &decl.name);

        if decl.kind == ClassKind::Interface {
            for method in &decl.methods {
                if self.signatures.contains(&name, &method.name) {
                    debug!(mapper = %name, method = %method.name, "ignoring overload");
                    continue;
                }
                let declarations = method
                    .params
                    .iter()
                    .enumerate()
                    .filter_map(|(position, param)| {
                        let ty = names.resolve(&param.ty)?;
                        Some(ParameterDeclaration::new(param.binding.clone(), ty, position))
                    })
                    .collect();
                self.signatures.insert(name.clone(), method.name.clone(), declarations);
            }
        }

        let fields = decl
            .fields
            .iter()
            .filter_map(|field| {
                let ty = names.resolve(&field.ty)?;
                Some(FieldDescriptor {
                    is_static: field.is_static,
                    ..FieldDescriptor::new(field.name.clone(), ty)
                })
            })
            .collect();

        self.types.insert(ClassDescriptor {
            name,
            kind: decl.kind,
            superclass: decl.superclass.as_deref().and_then(|text| names.resolve(text)),
            fields,
            enum_constants: decl.enum_constants.clone(),
        });
    }
}

impl TypeResolver for JavaIndex {
    fn resolve_type(&self, qualified_name: &str) -> Option<Arc<ClassDescriptor>> {
        self.types.resolve_type(qualified_name)
    }
}

impl SignatureSource for JavaIndex {
    fn find_parameter_declarations(
        &self,
        namespace: &str,
        statement_id: &str,
    ) -> Option<Vec<ParameterDeclaration>> {
        self.signatures.find_parameter_declarations(namespace, statement_id)
    }
}

fn qualified(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

/// Qualifies simple names the way `javac` would for one file: explicit
/// imports, then the file's package, then `java.lang`, then wildcard
/// imports of indexed packages.
struct NameScope<'a> {
    file: &'a SourceFile,
    known: &'a HashSet<String>,
}

impl NameScope<'_> {
    fn resolve(&self, text: &str) -> Option<TypeRef> {
        match TypeRef::parse(text) {
            Some(ty) => Some(self.qualify(ty)),
            None => {
                warn!(type_text = text, "unparseable java type");
                None
            }
        }
    }

    fn qualify(&self, ty: TypeRef) -> TypeRef {
        TypeRef {
            name: self.qualify_name(&ty.name),
            args: ty.args.into_iter().map(|arg| self.qualify(arg)).collect(),
            array_dims: ty.array_dims,
        }
    }

    fn qualify_name(&self, name: &str) -> String {
        if PRIMITIVES.contains(&name) || self.known.contains(name) {
            return name.to_string();
        }

        // `Outer.Inner` qualifies through its first segment.
        let (head, tail) = match name.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (name, None),
        };
        if head.starts_with(|c: char| c.is_lowercase()) {
            return name.to_string();
        }

        let qualified_head = self
            .file
            .imports
            .iter()
            .find(|import| import.rsplit('.').next() == Some(head))
            .cloned()
            .or_else(|| {
                let local = qualified(&self.file.package, head);
                self.known.contains(&local).then_some(local)
            })
            .or_else(|| JAVA_LANG.contains(&head).then(|| format!("java.lang.{}", head)))
            .or_else(|| {
                self.file
                    .imports
                    .iter()
                    .filter_map(|import| import.strip_suffix(".*"))
                    .map(|package| format!("{}.{}", package, head))
                    .find(|candidate| self.known.contains(candidate))
            });

        match (qualified_head, tail) {
            (Some(head), Some(tail)) => format!("{}.{}", head, tail),
            (Some(head), None) => head,
            (None, _) => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOG: &str = r#"
        package com.example.model;

        import java.util.Date;
        import java.util.List;
        import com.example.common.*;

        public class Blog extends Entity {
            private int id;
            private String title;
            private Author author;
            private List<Tag> tags;
            private Status state;
            private Date createdOn;
            private static int counter;
        }
    "#;

    const AUTHOR: &str = r#"
        package com.example.model;
        public class Author {
            private String username;
            private Blog favourite;
        }
    "#;

    const COMMON: &str = r#"
        package com.example.common;
        public abstract class Entity { protected Long version; }
        public class Tag { private String label; }
        public enum Status { DRAFT, PUBLISHED }
    "#;

    const MAPPER: &str = r#"
        package com.example.mappers;

        import com.example.model.Blog;
        import org.apache.ibatis.annotations.Param;
        import java.util.List;

        public interface BlogMapper {
            Blog selectBlog(int id);
            List<Blog> findBlogByAuthorAndTitle(@Param("authorId") Integer authorId, @Param("title") String title);
            int updateBlog(Blog blog);
            List<Blog> selectBlogIn(List<Integer> ids);
            List<Blog> selectBlogIn(Integer[] ids);
        }
    "#;

    fn index() -> JavaIndex {
        JavaIndex::from_sources([BLOG, AUTHOR, COMMON, MAPPER])
    }

    #[test]
    fn qualifies_field_types() {
        let index = index();
        let blog = index.resolve_type("com.example.model.Blog").unwrap();
        let types: Vec<String> = blog.fields.iter().map(|f| f.ty.to_string()).collect();
        assert_eq!(
            types,
            vec![
                "int",
                "java.lang.String",
                "com.example.model.Author",
                "java.util.List<com.example.common.Tag>",
                "com.example.common.Status",
                "java.util.Date",
                "int",
            ]
        );
        assert!(blog.fields[6].is_static);
        assert_eq!(
            blog.superclass.as_ref().map(|s| s.name.as_str()),
            Some("com.example.common.Entity")
        );
    }

    #[test]
    fn indexes_enums() {
        let status = index().resolve_type("com.example.common.Status").unwrap();
        assert!(status.is_enum());
        assert_eq!(status.enum_constants, vec!["DRAFT", "PUBLISHED"]);
    }

    #[test]
    fn records_mapper_signatures() {
        let index = index();
        let find = index
            .find_parameter_declarations("com.example.mappers.BlogMapper", "findBlogByAuthorAndTitle")
            .unwrap();
        assert_eq!(find.len(), 2);
        assert_eq!(find[0].name.as_deref(), Some("authorId"));
        assert_eq!(find[0].ty.name, "java.lang.Integer");
        assert_eq!(find[1].position, 1);

        let select = index
            .find_parameter_declarations("com.example.mappers.BlogMapper", "selectBlog")
            .unwrap();
        assert_eq!(select[0].name, None);
        assert_eq!(select[0].ty.name, "int");

        let update = index
            .find_parameter_declarations("com.example.mappers.BlogMapper", "updateBlog")
            .unwrap();
        assert_eq!(update[0].ty.name, "com.example.model.Blog");
    }

    #[test]
    fn first_overload_wins() {
        let ids = index()
            .find_parameter_declarations("com.example.mappers.BlogMapper", "selectBlogIn")
            .unwrap();
        assert_eq!(ids[0].ty.to_string(), "java.util.List<java.lang.Integer>");
    }

    #[test]
    fn scans_source_roots() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("com/example/model");
        fs::create_dir_all(&model).unwrap();
        fs::write(model.join("Author.java"), AUTHOR).unwrap();
        fs::write(model.join("README.md"), "class Nope {}").unwrap();

        let index = JavaIndex::scan(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(index.class_count(), 1);
        assert_eq!(index.signature_count(), 0);
    }
}
