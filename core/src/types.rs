//! Validated request payloads for the cartes.io API.
//!
//! # Design
//! Each payload is built through a builder whose `build` runs every field
//! check, so a payload value that exists is valid and cannot be changed
//! afterwards. Optional fields stay `None` until set; nothing is defaulted
//! to zero or an empty string, because absent fields must be left off the
//! wire entirely.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;
use crate::params::Params;

// ---------------------------------------------------------------------------
// Numeric bounds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Upper {
    Inclusive(f64),
    Exclusive(f64),
    Unbounded,
}

#[derive(Debug, Clone, Copy)]
struct Bound {
    min: Option<f64>,
    max: Upper,
    label: &'static str,
}

const LATITUDE: Bound = Bound {
    min: Some(-90.0),
    max: Upper::Inclusive(90.0),
    label: "[-90, 90]",
};
const LONGITUDE: Bound = Bound {
    min: Some(-180.0),
    max: Upper::Inclusive(180.0),
    label: "[-180, 180]",
};
const ZOOM: Bound = Bound {
    min: Some(0.0),
    max: Upper::Inclusive(20.0),
    label: "[0, 20]",
};
const HEADING: Bound = Bound {
    min: Some(0.0),
    max: Upper::Exclusive(360.0),
    label: "[0, 360)",
};
const PITCH: Bound = Bound {
    min: Some(-90.0),
    max: Upper::Inclusive(90.0),
    label: "[-90, 90]",
};
const ROLL: Bound = Bound {
    min: Some(-180.0),
    max: Upper::Inclusive(180.0),
    label: "[-180, 180]",
};
const SPEED: Bound = Bound {
    min: Some(0.0),
    max: Upper::Unbounded,
    label: "[0, inf)",
};
const UNBOUNDED: Bound = Bound {
    min: None,
    max: Upper::Unbounded,
    label: "(-inf, inf)",
};

impl Bound {
    fn contains(&self, value: f64) -> bool {
        let above_min = self.min.map_or(true, |min| value >= min);
        let below_max = match self.max {
            Upper::Inclusive(max) => value <= max,
            Upper::Exclusive(max) => value < max,
            Upper::Unbounded => true,
        };
        above_min && below_max
    }

    fn check(&self, field: &'static str, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field, value });
        }
        if !self.contains(value) {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                expected: self.label,
            });
        }
        Ok(value)
    }

    fn check_opt(&self, field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
        value.map(|v| self.check(field, v)).transpose()
    }
}

/// Check a latitude against [-90, 90].
pub fn validate_latitude(value: f64) -> Result<f64, ValidationError> {
    LATITUDE.check("lat", value)
}

/// Check a longitude against [-180, 180].
pub fn validate_longitude(value: f64) -> Result<f64, ValidationError> {
    LONGITUDE.check("lng", value)
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Who can see a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    Public,
    Unlisted,
    Private,
}

impl Privacy {
    pub const VALUES: &'static [&'static str] = &["public", "unlisted", "private"];

    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Unlisted => "unlisted",
            Privacy::Private => "private",
        }
    }
}

impl FromStr for Privacy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Privacy::Public),
            "unlisted" => Ok(Privacy::Unlisted),
            "private" => Ok(Privacy::Private),
            other => Err(ValidationError::InvalidChoice {
                field: "privacy",
                value: other.to_string(),
                allowed: Self::VALUES,
            }),
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who can add markers to a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Yes,
    No,
    OnlyLoggedIn,
}

impl Permission {
    pub const VALUES: &'static [&'static str] = &["yes", "no", "only_logged_in"];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Yes => "yes",
            Permission::No => "no",
            Permission::OnlyLoggedIn => "only_logged_in",
        }
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Permission::Yes),
            "no" => Ok(Permission::No),
            "only_logged_in" => Ok(Permission::OnlyLoggedIn),
            other => Err(ValidationError::InvalidChoice {
                field: "users_can_create_markers",
                value: other.to_string(),
                allowed: Self::VALUES,
            }),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Body for creating or editing a map. Every field is optional; the service
/// fills in its own defaults for anything left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapPayload {
    title: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    privacy: Option<Privacy>,
    users_can_create_markers: Option<Permission>,
}

impl MapPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Currently ignored by the service.
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = Some(privacy);
        self
    }

    pub fn users_can_create_markers(mut self, permission: Permission) -> Self {
        self.users_can_create_markers = Some(permission);
        self
    }

    pub(crate) fn apply(&self, params: Params) -> Params {
        params
            .set_opt("title", self.title.as_deref())
            .set_opt("slug", self.slug.as_deref())
            .set_opt("description", self.description.as_deref())
            .set_opt("privacy", self.privacy.map(Privacy::as_str))
            .set_opt(
                "users_can_create_markers",
                self.users_can_create_markers.map(Permission::as_str),
            )
    }
}

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

/// Body for creating a marker. Needs the map's edit token, coordinates, and
/// a category given by id, by name, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPayload {
    map_token: String,
    lat: f64,
    lng: f64,
    category: Option<i64>,
    category_name: Option<String>,
    description: Option<String>,
}

impl MarkerPayload {
    pub fn builder(map_token: impl Into<String>, lat: f64, lng: f64) -> MarkerPayloadBuilder {
        MarkerPayloadBuilder {
            map_token: map_token.into(),
            lat,
            lng,
            category: None,
            category_name: None,
            description: None,
        }
    }

    pub fn map_token(&self) -> &str {
        &self.map_token
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn category(&self) -> Option<i64> {
        self.category
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn apply(&self, params: Params) -> Params {
        params
            .set("map_token", self.map_token.as_str())
            .set_opt("category", self.category)
            .set("lat", self.lat)
            .set("lng", self.lng)
            .set_opt("description", self.description.as_deref())
            .set_opt("category_name", self.category_name.as_deref())
    }
}

/// Unvalidated marker fields; `build` turns them into a `MarkerPayload`.
#[derive(Debug, Clone)]
pub struct MarkerPayloadBuilder {
    map_token: String,
    lat: f64,
    lng: f64,
    category: Option<i64>,
    category_name: Option<String>,
    description: Option<String>,
}

impl MarkerPayloadBuilder {
    pub fn category(mut self, category: i64) -> Self {
        self.category = Some(category);
        self
    }

    pub fn category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<MarkerPayload, ValidationError> {
        let lat = validate_latitude(self.lat)?;
        let lng = validate_longitude(self.lng)?;
        if self.category.is_none() && self.category_name.is_none() {
            return Err(ValidationError::MissingChoice {
                fields: &["category", "category_name"],
            });
        }
        Ok(MarkerPayload {
            map_token: self.map_token,
            lat,
            lng,
            category: self.category,
            category_name: self.category_name,
            description: self.description,
        })
    }
}

// ---------------------------------------------------------------------------
// Marker location
// ---------------------------------------------------------------------------

/// A point in a marker's location history with optional telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerLocationPayload {
    lat: f64,
    lng: f64,
    zoom: Option<f64>,
    elevation: Option<f64>,
    heading: Option<f64>,
    pitch: Option<f64>,
    roll: Option<f64>,
    speed: Option<f64>,
}

impl MarkerLocationPayload {
    pub fn builder(lat: f64, lng: f64) -> MarkerLocationPayloadBuilder {
        MarkerLocationPayloadBuilder {
            fields: MarkerLocationPayload {
                lat,
                lng,
                zoom: None,
                elevation: None,
                heading: None,
                pitch: None,
                roll: None,
                speed: None,
            },
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn pitch(&self) -> Option<f64> {
        self.pitch
    }

    pub fn roll(&self) -> Option<f64> {
        self.roll
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    pub(crate) fn apply(&self, params: Params) -> Params {
        params
            .set("lat", self.lat)
            .set("lng", self.lng)
            .set_opt("zoom", self.zoom)
            .set_opt("elevation", self.elevation)
            .set_opt("heading", self.heading)
            .set_opt("pitch", self.pitch)
            .set_opt("roll", self.roll)
            .set_opt("speed", self.speed)
    }
}

/// Unvalidated location fields; `build` checks every range.
#[derive(Debug, Clone, Copy)]
pub struct MarkerLocationPayloadBuilder {
    fields: MarkerLocationPayload,
}

impl MarkerLocationPayloadBuilder {
    pub fn zoom(mut self, zoom: f64) -> Self {
        self.fields.zoom = Some(zoom);
        self
    }

    /// Metres; any finite value.
    pub fn elevation(mut self, elevation: f64) -> Self {
        self.fields.elevation = Some(elevation);
        self
    }

    pub fn heading(mut self, heading: f64) -> Self {
        self.fields.heading = Some(heading);
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.fields.pitch = Some(pitch);
        self
    }

    pub fn roll(mut self, roll: f64) -> Self {
        self.fields.roll = Some(roll);
        self
    }

    /// Metres per second.
    pub fn speed(mut self, speed: f64) -> Self {
        self.fields.speed = Some(speed);
        self
    }

    pub fn build(self) -> Result<MarkerLocationPayload, ValidationError> {
        let f = self.fields;
        Ok(MarkerLocationPayload {
            lat: validate_latitude(f.lat)?,
            lng: validate_longitude(f.lng)?,
            zoom: ZOOM.check_opt("zoom", f.zoom)?,
            elevation: UNBOUNDED.check_opt("elevation", f.elevation)?,
            heading: HEADING.check_opt("heading", f.heading)?,
            pitch: PITCH.check_opt("pitch", f.pitch)?,
            roll: ROLL.check_opt("roll", f.roll)?,
            speed: SPEED.check_opt("speed", f.speed)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Map listing filters
// ---------------------------------------------------------------------------

/// Filters for `map_list`. Empty lists and unset options are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapListParams {
    pub ids: Vec<String>,
    pub category_ids: Vec<i64>,
    pub with_mine: Option<bool>,
    pub with_relations: Vec<String>,
    pub order_by: Option<String>,
    pub query: Option<String>,
    pub response_format: Option<String>,
}

impl MapListParams {
    pub(crate) fn to_params(&self) -> Params {
        Params::new()
            .set_opt("orderBy", self.order_by.as_deref())
            .set_opt("query", self.query.as_deref())
            .set_opt("format", self.response_format.as_deref())
            .set_opt("withMine", self.with_mine)
            .set_list("ids[]", &self.ids)
            .set_list("category_ids[]", &self.category_ids)
            .set_list("with[]", &self.with_relations)
    }
}
