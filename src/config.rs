use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Everything that tunes a download. Built once at the top and handed down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Tag name -> attribute holding the link, in declaration order
    #[serde(with = "ordered_tags")]
    pub asset_tags: Vec<(String, String)>,
    /// Leave assets hosted elsewhere untouched
    pub ignore_other_hosts: bool,
    /// Indent the saved document
    pub prettify: bool,
    pub assets_dir_suffix: String,
    /// `rel` values marking a `<link>` as a document rather than a resource.
    /// Extensionless document links are saved with an `.html` suffix.
    pub document_link_rels: Vec<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        let asset_tags = [
            ("img", "src"),
            ("link", "href"),
            ("script", "src"),
            ("video", "src"),
            ("audio", "src"),
            ("source", "srcset"),
        ]
        .into_iter()
        .map(|(tag, attr)| (tag.to_string(), attr.to_string()))
        .collect();

        Self {
            asset_tags,
            ignore_other_hosts: true,
            prettify: false,
            assets_dir_suffix: "files".to_string(),
            document_link_rels: vec!["canonical".to_string()],
            timeout_secs: 30,
            user_agent: concat!("page-loader/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Attribute carrying the link for `tag`, if the tag is an asset tag.
    pub fn link_attr(&self, tag: &str) -> Option<&str> {
        self.asset_tags
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, attr)| attr.as_str())
    }
}

/// `asset_tags` as a JSON object whose key order is kept. A repeated key
/// keeps its first position and its last value.
mod ordered_tags {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        tags: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(tags.len()))?;
        for (tag, attr) in tags {
            map.serialize_entry(tag, attr)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        deserializer.deserialize_map(TagsVisitor)
    }

    struct TagsVisitor;

    impl<'de> Visitor<'de> for TagsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of tag name to link attribute")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut tags: Vec<(String, String)> = Vec::new();
            while let Some((tag, attr)) = access.next_entry::<String, String>()? {
                match tags.iter_mut().find(|(name, _)| *name == tag) {
                    Some(entry) => entry.1 = attr,
                    None => tags.push((tag, attr)),
                }
            }
            Ok(tags)
        }
    }
}
