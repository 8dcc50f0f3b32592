use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Weather {
    Clear,
    Rainy,
    Foggy,
    Cloudy,
}

impl Weather {
    pub const ALL: [Self; 4] = [Self::Clear, Self::Rainy, Self::Foggy, Self::Cloudy];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Rainy => "Rainy",
            Self::Foggy => "Foggy",
            Self::Cloudy => "Cloudy",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Traffic {
    Light,
    Moderate,
    Heavy,
    Gridlock,
}

impl Traffic {
    pub const ALL: [Self; 4] = [Self::Light, Self::Moderate, Self::Heavy, Self::Gridlock];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy",
            Self::Gridlock => "Gridlock",
        }
    }

    pub const fn is_heavy(self) -> bool {
        matches!(self, Self::Heavy | Self::Gridlock)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RoadClass {
    Highway,
    #[serde(rename = "City Street")]
    CityStreet,
    #[serde(rename = "Rural Road")]
    RuralRoad,
    #[serde(rename = "Mountain Pass")]
    MountainPass,
}

impl RoadClass {
    pub const ALL: [Self; 4] = [
        Self::Highway,
        Self::CityStreet,
        Self::RuralRoad,
        Self::MountainPass,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Highway => "Highway",
            Self::CityStreet => "City Street",
            Self::RuralRoad => "Rural Road",
            Self::MountainPass => "Mountain Pass",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RegionType {
    Urban,
    Suburban,
    Rural,
}

impl RegionType {
    pub const ALL: [Self; 3] = [Self::Urban, Self::Suburban, Self::Rural];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Suburban => "Suburban",
            Self::Rural => "Rural",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripContext {
    pub weather: Weather,
    pub traffic: Traffic,
    pub road_class: RoadClass,
    pub region_type: RegionType,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum BurstKind {
    Crash,
    HardBrake,
    HardAcceleration,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum ReadingSource {
    #[default]
    Normal,
    Burst(BurstKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp_ms: u64,
    pub accel: Vec3,
    pub gyro: Vec3,
    pub speed_kmh: f64,
    pub location: Location,
    pub context: TripContext,
    pub source: ReadingSource,
}

impl Reading {
    pub const fn is_burst(&self) -> bool {
        matches!(self.source, ReadingSource::Burst(_))
    }
}

#[cfg(test)]
impl Reading {
    /// Cruising on a light-traffic highway with no motion events.
    pub(crate) fn quiet(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            accel: Vec3::new(0.1, -0.2, 9.8),
            gyro: Vec3::new(0.05, -0.05, 0.1),
            speed_kmh: 48.0,
            location: Location::new(28.6139, 77.2090),
            context: TripContext {
                weather: Weather::Clear,
                traffic: Traffic::Light,
                road_class: RoadClass::Highway,
                region_type: RegionType::Urban,
            },
            source: ReadingSource::Normal,
        }
    }
}
