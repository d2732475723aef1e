use std::collections::BTreeMap;

/// One decoded attribute of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    /// Canonical string rendering of the typed value.
    pub value: String,
    /// Pool index of the raw (pre-typed) value string, when the encoder
    /// stored one. This is the slot an in-place rewrite targets.
    pub raw_value_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Attributes keyed by name, in lexicographic order.
    pub fn attribute_map(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .map(|attr| (attr.name.clone(), attr.value.clone()))
            .collect()
    }
}

/// True when the open-element stack spells out exactly `path` from the
/// document root.
pub(crate) fn stack_matches(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(open, want)| open == want)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_map_is_key_sorted() {
        let element = XmlElement {
            name: "manifest".to_owned(),
            attributes: vec![
                XmlAttribute {
                    name: "versionName".to_owned(),
                    value: "1.0".to_owned(),
                    raw_value_index: None,
                },
                XmlAttribute {
                    name: "package".to_owned(),
                    value: "com.example".to_owned(),
                    raw_value_index: None,
                },
            ],
        };

        let map = element.attribute_map();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["package", "versionName"]);
    }

    #[test]
    fn stack_matching_is_exact_and_positional() {
        let stack = vec!["manifest".to_owned(), "application".to_owned()];
        assert!(stack_matches(&stack, &["manifest", "application"]));
        assert!(!stack_matches(&stack, &["application"]));
        assert!(!stack_matches(&stack, &["manifest"]));
        assert!(!stack_matches(&stack, &["manifest", "application", "service"]));
    }
}
