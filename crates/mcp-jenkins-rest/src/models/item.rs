//! The Jenkins item hierarchy.
//!
//! Jenkins reports every job-like object with a `_class` discriminator.
//! [`ItemKind::classify`] maps that class onto a small, closed set of
//! variants; anything it does not recognise becomes [`Item::Unknown`], which
//! keeps the raw fields so nothing a plugin adds is lost.

use serde::de::Error as _;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

/// Fields shared by every item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemInfo {
    #[serde(rename = "_class")]
    pub class: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
}

/// A buildable job (pipeline, freestyle, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    #[serde(flatten)]
    pub info: ItemInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A container of other items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    #[serde(flatten)]
    pub info: ItemInfo,
    pub jobs: Vec<Item>,
}

/// An item whose class is not modelled; every other field is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownItem {
    #[serde(flatten)]
    pub info: ItemInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<Item>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Job(Job),
    FreeStyleProject(Job),
    Folder(Folder),
    MultiBranchProject(Folder),
    Unknown(UnknownItem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Job,
    FreeStyleProject,
    Folder,
    MultiBranchProject,
    Unknown,
}

/// Checked in order; the first suffix that matches wins.
const CLASS_SUFFIXES: [(&str, ItemKind); 4] = [
    ("Folder", ItemKind::Folder),
    ("MultiBranchProject", ItemKind::MultiBranchProject),
    ("FreeStyleProject", ItemKind::FreeStyleProject),
    ("Job", ItemKind::Job),
];

impl ItemKind {
    pub fn classify(class: &str) -> Self {
        CLASS_SUFFIXES
            .iter()
            .find(|(suffix, _)| class.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .unwrap_or(ItemKind::Unknown)
    }
}

/// Wire shape of an item before it is classified
#[derive(Deserialize)]
struct RawItem {
    #[serde(rename = "_class")]
    class: String,
    name: String,
    url: String,
    #[serde(rename = "fullName", alias = "fullname", default)]
    fullname: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    jobs: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// The `jobs` field of a raw item, split into typed children and whatever
/// could not be typed.
///
/// Only an array made entirely of objects is typed as a whole. Otherwise
/// the objects inside an array are still typed for containers, and the raw
/// value is handed back so an unknown item can keep it verbatim.
fn split_jobs(jobs: Option<Value>) -> serde_json::Result<(Vec<Item>, Option<Value>)> {
    match jobs {
        None => Ok((Vec::new(), None)),
        Some(Value::Array(elements)) if elements.iter().all(Value::is_object) => {
            let children = elements
                .into_iter()
                .map(serde_json::from_value)
                .collect::<serde_json::Result<_>>()?;
            Ok((children, None))
        }
        Some(Value::Array(elements)) => {
            let children = elements
                .iter()
                .filter(|element| element.is_object())
                .map(|element| serde_json::from_value(element.clone()))
                .collect::<serde_json::Result<_>>()?;
            Ok((children, Some(Value::Array(elements))))
        }
        Some(other) => Ok((Vec::new(), Some(other))),
    }
}

impl TryFrom<RawItem> for Item {
    type Error = serde_json::Error;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let kind = ItemKind::classify(&raw.class);
        let info = ItemInfo {
            class: raw.class,
            name: raw.name,
            url: raw.url,
            fullname: raw.fullname,
        };
        let (jobs, untyped_jobs) = split_jobs(raw.jobs)?;

        let item = match kind {
            ItemKind::Job => Item::Job(Job {
                info,
                color: raw.color,
            }),
            ItemKind::FreeStyleProject => Item::FreeStyleProject(Job {
                info,
                color: raw.color,
            }),
            ItemKind::Folder => Item::Folder(Folder { info, jobs }),
            ItemKind::MultiBranchProject => Item::MultiBranchProject(Folder { info, jobs }),
            ItemKind::Unknown => {
                let mut extra = raw.extra;
                if let Some(color) = raw.color {
                    extra.insert("color".to_string(), Value::String(color));
                }
                match untyped_jobs {
                    Some(value) => {
                        extra.insert("jobs".to_string(), value);
                        Item::Unknown(UnknownItem {
                            info,
                            jobs: Vec::new(),
                            extra,
                        })
                    }
                    None => Item::Unknown(UnknownItem { info, jobs, extra }),
                }
            }
        };

        Ok(item)
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawItem::deserialize(deserializer)?;
        Item::try_from(raw).map_err(D::Error::custom)
    }
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Job(_) => ItemKind::Job,
            Item::FreeStyleProject(_) => ItemKind::FreeStyleProject,
            Item::Folder(_) => ItemKind::Folder,
            Item::MultiBranchProject(_) => ItemKind::MultiBranchProject,
            Item::Unknown(_) => ItemKind::Unknown,
        }
    }

    pub fn info(&self) -> &ItemInfo {
        match self {
            Item::Job(job) | Item::FreeStyleProject(job) => &job.info,
            Item::Folder(folder) | Item::MultiBranchProject(folder) => &folder.info,
            Item::Unknown(item) => &item.info,
        }
    }

    pub fn class(&self) -> &str {
        &self.info().class
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn url(&self) -> &str {
        &self.info().url
    }

    pub fn fullname(&self) -> Option<&str> {
        self.info().fullname.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        match self {
            Item::Job(job) | Item::FreeStyleProject(job) => job.color.as_deref(),
            Item::Unknown(item) => item.extra.get("color").and_then(Value::as_str),
            Item::Folder(_) | Item::MultiBranchProject(_) => None,
        }
    }

    /// Direct children; empty for leaf items
    pub fn children(&self) -> &[Item] {
        match self {
            Item::Folder(folder) | Item::MultiBranchProject(folder) => &folder.jobs,
            Item::Unknown(item) => &item.jobs,
            Item::Job(_) | Item::FreeStyleProject(_) => &[],
        }
    }

    /// This item followed by all of its descendants, depth-first
    pub fn descendants(&self) -> Vec<&Item> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.descendants());
        }
        out
    }

    /// Flattens a forest depth-first, parents before their children.
    /// Containers keep their own `jobs`, so nested items appear twice: once
    /// inside their parent and once on their own.
    pub fn flatten(items: &[Item]) -> Vec<Item> {
        items
            .iter()
            .flat_map(Item::descendants)
            .cloned()
            .collect()
    }
}
