//! Fixtures and the registry holding them.
//!
//! A fixture is never destroyed during a session. Excluding one from batch
//! saves is done by clearing its `enabled` flag, and addressing an unknown
//! id provisions it on first use. Registry operations return a new
//! [`FixtureBank`] value; callers swap the whole collection, so readers
//! always see a consistent snapshot.

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// How many fixtures a fresh panel provisions when no explicit list is
/// configured.
pub const DEFAULT_FIXTURE_COUNT: u16 = 22;

/// One addressable lighting unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u16,
    pub label: String,
    /// Participates in batch saves.
    pub enabled: bool,
    /// Logically switched on.
    pub powered: bool,
    pub color: Color,
}

impl Fixture {
    /// The provisioning default: labeled by id, both flags set, dark.
    pub fn new(id: u16) -> Self {
        Fixture {
            id,
            label: format!("Light {id}"),
            enabled: true,
            powered: true,
            color: Color::OFF,
        }
    }
}

/// The fixture collection. Ids are unique; insertion order is preserved for
/// display stability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureBank {
    fixtures: Vec<Fixture>,
}

impl FixtureBank {
    /// Provision fixtures with ids `1..=count`.
    pub fn provision(count: u16) -> Self {
        FixtureBank {
            fixtures: (1..=count).map(Fixture::new).collect(),
        }
    }

    /// Build from an explicit fixture list. Duplicate ids keep the first
    /// occurrence.
    pub fn from_fixtures(fixtures: Vec<Fixture>) -> Self {
        let mut bank = FixtureBank::default();
        for fixture in fixtures {
            if bank.get(fixture.id).is_none() {
                bank.fixtures.push(fixture);
            }
        }
        bank
    }

    pub fn get(&self, id: u16) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter()
    }

    /// The fixtures participating in batch saves.
    pub fn enabled(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(|f| f.enabled)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Fixture> {
        self.fixtures.clone()
    }

    /// Flip whether the fixture joins batch saves. Unknown ids are a no-op.
    pub fn toggle_enabled(&self, id: u16) -> FixtureBank {
        self.map_fixture(id, |f| f.enabled = !f.enabled)
    }

    /// Flip logical power. Unknown ids are a no-op. Power never touches the
    /// stored color.
    pub fn toggle_powered(&self, id: u16) -> FixtureBank {
        self.map_fixture(id, |f| f.powered = !f.powered)
    }

    /// Replace the working color. Partial colors are accepted here; the
    /// completeness gate sits at the encoding boundary.
    pub fn set_color(&self, id: u16, color: Color) -> FixtureBank {
        self.map_fixture(id, |f| f.color = color)
    }

    /// Make sure the id exists, provisioning a default fixture when it does
    /// not.
    pub fn upsert(&self, id: u16) -> FixtureBank {
        if self.get(id).is_some() {
            return self.clone();
        }
        let mut next = self.clone();
        next.fixtures.push(Fixture::new(id));
        next
    }

    fn map_fixture(&self, id: u16, apply: impl FnOnce(&mut Fixture)) -> FixtureBank {
        let mut next = self.clone();
        if let Some(fixture) = next.fixtures.iter_mut().find(|f| f.id == id) {
            apply(fixture);
        }
        next
    }
}

impl FromIterator<Fixture> for FixtureBank {
    fn from_iter<T: IntoIterator<Item = Fixture>>(iter: T) -> Self {
        FixtureBank::from_fixtures(iter.into_iter().collect())
    }
}
