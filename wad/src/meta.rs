use super::errors::{ErrorKind, Result};
use super::name::{deserialize_name_from_str, WadName};
use super::types::ThingType;
use failchain::ResultExt;
use serde::{de::Error as SerdeDeError, Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::result::Result as StdResult;
use std::str::FromStr;

pub const PLAYER_START_THING: ThingType = 1;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnimationMetadata {
    /// Each entry is `[first, last]`: a contiguous run of flats between two markers.
    #[serde(deserialize_with = "deserialize_name_pairs")]
    pub flats: Vec<(WadName, WadName)>,
}

impl Default for AnimationMetadata {
    fn default() -> Self {
        let pair = |first: &[u8], last: &[u8]| {
            (raw_name(first), raw_name(last))
        };
        AnimationMetadata {
            flats: vec![
                pair(b"NUKAGE1", b"NUKAGE3"),
                pair(b"FWATER1", b"FWATER4"),
                pair(b"SWATER1", b"SWATER4"),
                pair(b"LAVA1", b"LAVA4"),
                pair(b"BLOOD1", b"BLOOD3"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThingMetadata {
    pub thing_type: ThingType,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CameraMetadata {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub run_multiplier: f32,
    pub turn_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for CameraMetadata {
    fn default() -> Self {
        CameraMetadata {
            fov_degrees: 90.0,
            near: 0.1,
            far: 10_000.0,
            speed: 500.0,
            run_multiplier: 1.7,
            turn_speed: 4.0,
            mouse_sensitivity: 0.002,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WadMetadata {
    #[serde(deserialize_with = "deserialize_name_from_str")]
    pub sky_flat: WadName,
    pub animations: AnimationMetadata,
    pub things: Vec<ThingMetadata>,
    pub camera: CameraMetadata,
}

impl Default for WadMetadata {
    fn default() -> Self {
        WadMetadata {
            sky_flat: raw_name(b"F_SKY1"),
            animations: AnimationMetadata::default(),
            things: vec![ThingMetadata {
                thing_type: PLAYER_START_THING,
                height: 56.0,
            }],
            camera: CameraMetadata::default(),
        }
    }
}

impl WadMetadata {
    pub fn from_file<P: AsRef<Path>>(path: &P) -> Result<WadMetadata> {
        let mut contents = String::new();
        let path = path.as_ref();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .chain_err(ErrorKind::on_metadata_read)?;
        WadMetadata::from_text(&contents)
    }

    pub fn from_text(text: &str) -> Result<WadMetadata> {
        toml::from_str(text).chain_err(ErrorKind::on_metadata_parse)
    }

    pub fn is_sky_flat(&self, name: WadName) -> bool {
        name == self.sky_flat
    }

    pub fn find_thing(&self, thing_type: ThingType) -> Option<&ThingMetadata> {
        self.things
            .iter()
            .find(|thing| thing.thing_type == thing_type)
    }
}

fn raw_name(bytes: &[u8]) -> WadName {
    let mut raw = [0u8; 8];
    raw[..bytes.len()].copy_from_slice(bytes);
    WadName::from_raw(raw)
}

fn deserialize_name_pairs<'de, D>(deserializer: D) -> StdResult<Vec<(WadName, WadName)>, D::Error>
where
    D: Deserializer<'de>,
{
    let strings = <Vec<Vec<String>>>::deserialize(deserializer)?;
    strings
        .iter()
        .map(|pair| match &pair[..] {
            [first, last] => Ok((
                WadName::from_str(first).map_err(D::Error::custom)?,
                WadName::from_str(last).map_err(D::Error::custom)?,
            )),
            _ => Err(D::Error::custom(format!(
                "animation must be a [first, last] pair, got {:?}",
                pair
            ))),
        })
        .collect()
}
