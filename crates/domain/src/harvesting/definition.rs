//! Resource node definitions: the templates placed nodes are created from.

use std::time::Duration;

use repository::{Version, Versioned};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::HarvestError;
use super::events::{NodeDefinitionCreated, NodeDefinitionEvent, NodeDefinitionUpdated};

const MAX_TAG_LENGTH: usize = 64;

fn validate_tag(tag: &str) -> Result<(), HarvestError> {
    let well_formed = !tag.is_empty()
        && tag.len() <= MAX_TAG_LENGTH
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(HarvestError::InvalidTag {
            tag: tag.to_owned(),
        })
    }
}

macro_rules! tag_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a tag, validating its format.
            ///
            /// Tags are 1 to 64 characters of lowercase ASCII letters,
            /// digits and underscores.
            pub fn new(tag: impl Into<String>) -> Result<Self, HarvestError> {
                let tag = tag.into();
                validate_tag(&tag)?;
                Ok(Self(tag))
            }

            /// Returns the tag as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = HarvestError;

            fn try_from(tag: String) -> Result<Self, Self::Error> {
                Self::new(tag)
            }
        }

        impl From<$name> for String {
            fn from(tag: $name) -> Self {
                tag.0
            }
        }
    };
}

tag_type!(
    /// Unique identifier of a node definition, e.g. `iron_vein`.
    NodeTag
);

tag_type!(
    /// Identifier of a yielded item, e.g. `iron_ore`.
    ItemTag
);

/// The kind of resource a node provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceType {
    #[default]
    Ore,
    Stone,
    Timber,
    Herb,
    Gem,
    Fish,
}

/// One line of a definition's base yield table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEntry {
    /// Item produced.
    pub item: ItemTag,

    /// Probability in `[0, 1]` that this entry yields anything.
    pub chance: f32,

    /// Smallest quantity produced when the entry yields.
    pub min_quantity: u32,

    /// Largest quantity produced when the entry yields.
    pub max_quantity: u32,
}

impl YieldEntry {
    /// Creates an entry that always yields exactly `quantity` items.
    pub fn guaranteed(item: ItemTag, quantity: u32) -> Self {
        Self {
            item,
            chance: 1.0,
            min_quantity: quantity,
            max_quantity: quantity,
        }
    }

    /// Creates an entry with a chance and a quantity range.
    pub fn new(item: ItemTag, chance: f32, min_quantity: u32, max_quantity: u32) -> Self {
        Self {
            item,
            chance,
            min_quantity,
            max_quantity,
        }
    }

    fn validate(&self) -> Result<(), HarvestError> {
        if !(0.0..=1.0).contains(&self.chance) {
            return Err(HarvestError::InvalidDefinition {
                reason: format!("chance for {} must be within [0, 1]", self.item),
            });
        }
        if self.min_quantity > self.max_quantity {
            return Err(HarvestError::InvalidDefinition {
                reason: format!("quantity range for {} is inverted", self.item),
            });
        }
        Ok(())
    }
}

/// The mutable part of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinitionDetails {
    /// Display name.
    pub name: String,

    /// Appearance (placeable model) identifier.
    pub appearance: u32,

    /// How long one harvest takes.
    pub harvest_time: Duration,

    pub resource_type: ResourceType,

    /// Base yield table.
    pub yields: Vec<YieldEntry>,
}

impl NodeDefinitionDetails {
    /// Creates details with an empty yield table.
    pub fn new(name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            name: name.into(),
            appearance: 0,
            harvest_time: Duration::from_secs(3),
            resource_type,
            yields: Vec::new(),
        }
    }

    /// Sets the appearance.
    pub fn with_appearance(mut self, appearance: u32) -> Self {
        self.appearance = appearance;
        self
    }

    /// Sets the harvest time.
    pub fn with_harvest_time(mut self, harvest_time: Duration) -> Self {
        self.harvest_time = harvest_time;
        self
    }

    /// Adds a yield table entry.
    pub fn with_yield(mut self, entry: YieldEntry) -> Self {
        self.yields.push(entry);
        self
    }

    /// Checks the details are well formed.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.name.trim().is_empty() {
            return Err(HarvestError::InvalidDefinition {
                reason: "name is required".into(),
            });
        }
        self.yields.iter().try_for_each(YieldEntry::validate)
    }
}

/// Resource node definition aggregate root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceNodeDefinition {
    tag: Option<NodeTag>,

    #[serde(default)]
    version: Version,

    details: Option<NodeDefinitionDetails>,
}

impl Versioned for ResourceNodeDefinition {
    type Id = NodeTag;

    fn aggregate_type() -> &'static str {
        "ResourceNodeDefinition"
    }

    fn id(&self) -> Option<NodeTag> {
        self.tag.clone()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Aggregate for ResourceNodeDefinition {
    type Event = NodeDefinitionEvent;
    type Error = HarvestError;

    fn apply(&mut self, event: Self::Event) {
        match event {
            NodeDefinitionEvent::Created(data) => {
                self.tag = Some(data.tag);
                self.details = Some(data.details);
            }
            NodeDefinitionEvent::Updated(data) => {
                self.details = Some(data.details);
            }
        }
    }
}

// Query methods
impl ResourceNodeDefinition {
    /// Returns the definition tag.
    pub fn tag(&self) -> Option<&NodeTag> {
        self.tag.as_ref()
    }

    /// Returns the definition details.
    pub fn details(&self) -> Option<&NodeDefinitionDetails> {
        self.details.as_ref()
    }

    /// Returns the base yield table.
    pub fn yields(&self) -> &[YieldEntry] {
        self.details
            .as_ref()
            .map(|details| details.yields.as_slice())
            .unwrap_or_default()
    }
}

// Command methods (return events)
impl ResourceNodeDefinition {
    /// Creates the definition.
    pub fn create(
        &self,
        tag: NodeTag,
        details: NodeDefinitionDetails,
    ) -> Result<Vec<NodeDefinitionEvent>, HarvestError> {
        if let Some(existing) = &self.tag {
            return Err(HarvestError::DefinitionAlreadyExists {
                tag: existing.clone(),
            });
        }
        details.validate()?;

        Ok(vec![NodeDefinitionEvent::created(tag, details)])
    }

    /// Replaces the definition details. The tag never changes.
    pub fn update(
        &self,
        details: NodeDefinitionDetails,
    ) -> Result<Vec<NodeDefinitionEvent>, HarvestError> {
        let tag = self.tag.clone().ok_or(HarvestError::DefinitionNotCreated)?;
        details.validate()?;

        if self.details.as_ref() == Some(&details) {
            return Ok(vec![]);
        }

        Ok(vec![NodeDefinitionEvent::updated(tag, details)])
    }
}
