//! Static persona catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Whether a persona is offered in selection lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    /// Reachable only through server-side triggers
    Hidden,
}

/// A selectable assistant personality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Persona {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: description.into(),
            avatar: None,
            visibility: Visibility::Public,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }
}

/// Catalog entry as written in `personas.json`; several spellings are in use
#[derive(Debug, Deserialize)]
struct RawPersona {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "displayName")]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "summary")]
    description: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    hidden: bool,
}

impl RawPersona {
    fn into_persona(self, id: String) -> Persona {
        let display_name = self
            .display_name
            .or(self.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.clone());
        Persona {
            id,
            display_name,
            description: self.description.unwrap_or_default(),
            avatar: self.avatar.filter(|a| !a.is_empty()),
            visibility: if self.hidden {
                Visibility::Hidden
            } else {
                Visibility::Public
            },
        }
    }
}

/// Either a list of records or an object keyed by persona id
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    List(Vec<RawPersona>),
    Map(BTreeMap<String, RawPersona>),
}

impl RawCatalog {
    fn into_personas(self) -> Vec<Persona> {
        match self {
            RawCatalog::List(items) => items
                .into_iter()
                .filter_map(|raw| {
                    let id = raw.id.clone().filter(|id| !id.trim().is_empty())?;
                    Some(raw.into_persona(id))
                })
                .collect(),
            RawCatalog::Map(by_id) => by_id
                .into_iter()
                .map(|(id, raw)| raw.into_persona(id))
                .collect(),
        }
    }
}

/// Ordered, read-only persona catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// Create a catalog; later duplicates of an id are dropped
    pub fn new(personas: Vec<Persona>) -> Self {
        let mut unique: Vec<Persona> = Vec::with_capacity(personas.len());
        for persona in personas {
            if !unique.iter().any(|p| p.id == persona.id) {
                unique.push(persona);
            }
        }
        Self { personas: unique }
    }

    /// The club's stock personas
    pub fn builtin() -> Self {
        Self::new(vec![
            Persona::new("starter_guide", "萌新向導", "新手友善、無雷解說、簡短句子"),
            Persona::new("weekend_curator", "週末策展人", "本週精選與社團活動整理"),
            Persona::new(
                "worldbuilding_researcher",
                "世界觀考據員",
                "設定考據、名詞對照與來源",
            ),
            Persona::new("storyboard_coach", "分鏡教練", "實作步驟、練習與工具參數"),
            Persona::new("parent_guardian", "家長安心顧問", "分級與觀影建議、家長共學提問"),
        ])
    }

    pub fn from_json_str(raw: &str) -> crate::Result<Self> {
        let catalog: RawCatalog = serde_json::from_str(raw)?;
        Ok(Self::new(catalog.into_personas()))
    }

    pub fn from_yaml_str(raw: &str) -> crate::Result<Self> {
        let catalog: RawCatalog = serde_yaml::from_str(raw)?;
        Ok(Self::new(catalog.into_personas()))
    }

    /// Load a catalog file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                crate::Error::NotFound(format!("persona catalog {}", path.display()))
            } else {
                e.into()
            }
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Personas offered in selection lists, in catalog order
    pub fn visible(&self) -> Vec<&Persona> {
        self.personas.iter().filter(|p| !p.is_hidden()).collect()
    }

    /// Display name for `id`, or the id itself when unknown
    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Id a selector should show: the current selection, else the first visible persona
    pub fn selection_id(&self, current: &str) -> String {
        if !current.is_empty() {
            return current.to_string();
        }
        self.visible()
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default()
    }

    /// True when the current selection is a known persona that selectors don't list
    pub fn is_hidden_active(&self, current: &str) -> bool {
        let id = self.selection_id(current);
        !id.is_empty() && self.get(&id).is_some_and(Persona::is_hidden)
    }
}
