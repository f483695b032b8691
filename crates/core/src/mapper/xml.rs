use indexmap::IndexMap;
use roxmltree::{Document, ParsingOptions};
use thiserror::Error;
use tracing::debug;

use super::{Element, Fragment, MapperDefinition, Node, Statement, StatementKind, TagKind};

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("malformed mapper XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected a <mapper> root element, found <{root}>")]
    NotAMapper { root: String },

    #[error("<mapper> has no namespace attribute")]
    MissingNamespace,

    #[error("<{tag}> is missing its '{attribute}' attribute")]
    MissingAttribute { tag: String, attribute: String },
}

impl MapperError {
    pub fn is_not_a_mapper(&self) -> bool {
        matches!(self, Self::NotAMapper { .. })
    }
}

pub(super) fn parse_mapper(xml: &str) -> Result<MapperDefinition, MapperError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let document = Document::parse_with_options(xml, options)?;

    let root = document.root_element();
    let root_name = root.tag_name().name();
    if root_name != "mapper" {
        return Err(MapperError::NotAMapper {
            root: root_name.to_string(),
        });
    }
    let namespace = root
        .attribute("namespace")
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .ok_or(MapperError::MissingNamespace)?
        .to_string();

    let mut mapper = MapperDefinition {
        namespace,
        ..MapperDefinition::default()
    };

    for child in root.children().filter(|node| node.is_element()) {
        let tag = child.tag_name().name();
        let required_id = || {
            child
                .attribute("id")
                .map(str::to_string)
                .ok_or_else(|| MapperError::MissingAttribute {
                    tag: tag.to_string(),
                    attribute: "id".to_string(),
                })
        };

        if let Some(kind) = StatementKind::from_tag(tag) {
            let id = required_id()?;
            mapper.statements.insert(
                id.clone(),
                Statement {
                    id,
                    kind,
                    parameter_type: child.attribute("parameterType").map(str::to_string),
                    body: convert_children(child),
                },
            );
        } else if tag == "sql" {
            let id = required_id()?;
            mapper.fragments.insert(
                id.clone(),
                Fragment {
                    id,
                    body: convert_children(child),
                },
            );
        } else {
            debug!(tag, namespace = %mapper.namespace, "skipping non-statement element");
        }
    }

    Ok(mapper)
}

fn convert_children(node: roxmltree::Node<'_, '_>) -> Vec<Node> {
    let mut children: Vec<Node> = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(Node::Element(convert_element(child)));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            match children.last_mut() {
                Some(Node::Text(previous)) => previous.push_str(text),
                _ => children.push(Node::Text(text.to_string())),
            }
        }
    }
    children
}

fn convert_element(node: roxmltree::Node<'_, '_>) -> Element {
    let name = node.tag_name().name().to_string();
    let attributes: IndexMap<String, String> = node
        .attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect();

    Element {
        kind: TagKind::from_name(&name),
        name,
        attributes,
        children: convert_children(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_other_roots() {
        let err = parse_mapper("<configuration/>").unwrap_err();
        assert!(err.is_not_a_mapper());
    }

    #[test]
    fn requires_namespace_and_ids() {
        assert!(matches!(
            parse_mapper("<mapper/>").unwrap_err(),
            MapperError::MissingNamespace
        ));
        assert!(matches!(
            parse_mapper(r#"<mapper namespace="a"><select>SELECT 1</select></mapper>"#).unwrap_err(),
            MapperError::MissingAttribute { ref tag, .. } if tag == "select"
        ));
    }

    #[test]
    fn reports_malformed_xml() {
        assert!(matches!(
            parse_mapper("<mapper namespace=\"a\">").unwrap_err(),
            MapperError::Xml(_)
        ));
    }

    #[test]
    fn keeps_nested_tags_and_attributes_in_order() {
        let mapper = parse_mapper(
            r#"<mapper namespace="a"><select id="s">SELECT * FROM t<where><if test="x != null">AND x = #{x}</if></where></select></mapper>"#,
        )
        .unwrap();
        let body = &mapper.statements["s"].body;
        assert_eq!(body.len(), 2);
        let Node::Element(where_tag) = &body[1] else {
            panic!("expected <where>");
        };
        assert_eq!(where_tag.kind, TagKind::Where);
        let if_tag = where_tag.child_elements().next().unwrap();
        assert_eq!(if_tag.attr("test"), Some("x != null"));
    }
}
