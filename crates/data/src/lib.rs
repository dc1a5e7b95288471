//! Level and script loading for Afterhours.
//!
//! A level is a raster image where every pixel is one cell. The fixed color
//! table in [`Thing::from_rgb`] maps each pixel to a solid wall, plain floor,
//! the player start or a seeded item. A JSON [`LevelManifest`] adds attributes
//! the image cannot carry, such as cabinet contents and furniture scripts.

use std::collections::HashMap;

use common::{Coord, GameError, GameResult};
use dialog::Line;
use grid::{Grid, GridBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use strum::IntoStaticStr;

/// What a single level pixel stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Thing {
    Wall,
    Floor,
    Player,
    Keys,
    Flashlight,
    Data,
    Exit,
    Door,
    System,
    FilingCabinet,
    Desk,
    Couch,
    Window,
}

impl Thing {
    /// Looks up the legend color. Returns `None` for colors not in the table.
    pub fn from_rgb(rgb: [u8; 3]) -> Option<Self> {
        use Thing::*;
        let thing = match rgb {
            [0, 0, 0] => Wall,
            [255, 255, 255] => Floor,
            [0, 0, 255] => Player,
            [255, 255, 0] => Keys,
            [255, 128, 0] => Flashlight,
            [0, 255, 255] => Data,
            [255, 0, 0] => Exit,
            [128, 0, 0] => Door,
            [0, 255, 0] => System,
            [128, 64, 0] => FilingCabinet,
            [128, 128, 128] => Desk,
            [64, 64, 192] => Couch,
            [192, 192, 255] => Window,
            _ => return None,
        };
        Some(thing)
    }

    /// Item name seeded for this thing, if it is an item at all.
    pub fn item_name(self) -> Option<&'static str> {
        match self {
            Thing::Wall | Thing::Floor | Thing::Player => None,
            other => Some(other.into()),
        }
    }
}

/// An item the image places in a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seed {
    pub at: Coord,
    pub thing: Thing,
}

/// Attribute assignment from the manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attribute {
    Locked(bool),
    Booted(bool),
    /// Item names placed inside a container, in order.
    Contents(Vec<String>),
    /// Dialog script fired the first time furniture is touched.
    Script(String),
}

impl Attribute {
    /// Manifest key this attribute was read from.
    pub fn field(&self) -> &'static str {
        match self {
            Attribute::Locked(_) => "locked",
            Attribute::Booted(_) => "booted",
            Attribute::Contents(_) => "contents",
            Attribute::Script(_) => "script",
        }
    }
}

/// Attribute overrides for the item seeded at one coordinate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Override {
    pub at: Coord,
    pub attributes: Vec<Attribute>,
}

/// Entity fields level data may never write.
pub const RESERVED_FIELDS: [&str; 7] = ["row", "col", "name", "kind", "location", "inventory", "items"];

#[derive(Debug, Default, Deserialize)]
struct RawOverride {
    at: [i32; 2],
    #[serde(default)]
    set: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    size: Option<[u32; 2]>,
    #[serde(default)]
    enclose: bool,
    intro: Option<String>,
    #[serde(default)]
    overrides: Vec<RawOverride>,
}

/// Level metadata loaded alongside the image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelManifest {
    /// Expected `[width, height]`; the image must match when present.
    pub size: Option<[u32; 2]>,
    /// Adds walls around the grid border.
    pub enclose: bool,
    /// Script shown when the session starts.
    pub intro: Option<String>,
    pub overrides: Vec<Override>,
}

impl LevelManifest {
    /// Parses a manifest from JSON, rejecting writes to reserved fields.
    pub fn from_json(data: &str) -> GameResult<Self> {
        let raw: RawManifest =
            serde_json::from_str(data).map_err(|e| GameError::Parse(e.to_string()))?;
        let mut overrides = Vec::with_capacity(raw.overrides.len());
        for o in raw.overrides {
            let at = Coord::new(o.at[0], o.at[1]);
            let mut attributes = Vec::with_capacity(o.set.len());
            for (field, value) in o.set {
                attributes.push(parse_attribute(at, &field, value)?);
            }
            overrides.push(Override { at, attributes });
        }
        Ok(Self {
            size: raw.size,
            enclose: raw.enclose,
            intro: raw.intro,
            overrides,
        })
    }
}

fn parse_attribute(at: Coord, field: &str, value: Value) -> GameResult<Attribute> {
    if RESERVED_FIELDS.contains(&field) {
        return Err(GameError::InvalidAttributeOverride {
            field: field.to_string(),
            row: at.row,
            col: at.col,
        });
    }
    let mismatch = || GameError::Parse(format!("bad value for `{}` at {:?}", field, at));
    let attr = match field {
        "locked" => Attribute::Locked(value.as_bool().ok_or_else(mismatch)?),
        "booted" => Attribute::Booted(value.as_bool().ok_or_else(mismatch)?),
        "script" => Attribute::Script(value.as_str().ok_or_else(mismatch)?.to_string()),
        "contents" => {
            let names: Vec<String> = serde_json::from_value(value).map_err(|_| mismatch())?;
            Attribute::Contents(names)
        }
        other => return Err(GameError::Parse(format!("unknown attribute `{}`", other))),
    };
    Ok(attr)
}

/// A decoded level ready to be turned into a session.
#[derive(Clone, Debug)]
pub struct Level {
    pub grid: Grid,
    pub player: Coord,
    /// Seeded items in row-major order.
    pub seeds: Vec<Seed>,
    pub manifest: LevelManifest,
}

/// Builds a [`Level`] from an RGBA pixel buffer (4 bytes per pixel).
pub fn load_level(
    pixels: &[u8],
    width: u32,
    height: u32,
    manifest: LevelManifest,
) -> GameResult<Level> {
    if let Some([w, h]) = manifest.size {
        if (w, h) != (width, height) {
            return Err(GameError::MalformedLevel(format!(
                "image is {}x{} but the manifest expects {}x{}",
                width, height, w, h
            )));
        }
    }
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(GameError::MalformedLevel(format!(
            "pixel buffer holds {} bytes, expected {}",
            pixels.len(),
            expected
        )));
    }
    let mut builder = GridBuilder::new(width, height)?;
    let mut player = None;
    let mut seeds = Vec::new();
    for (i, px) in pixels.chunks_exact(4).enumerate() {
        let at = Coord::new((i / width as usize) as i32, (i % width as usize) as i32);
        let thing = if px[3] == 0 {
            Thing::Floor
        } else {
            let rgb = [px[0], px[1], px[2]];
            Thing::from_rgb(rgb).ok_or(GameError::UnknownColor {
                rgb,
                row: at.row,
                col: at.col,
            })?
        };
        match thing {
            Thing::Wall => {
                builder.solid(at)?;
            }
            Thing::Floor => {}
            Thing::Player => {
                if player.replace(at).is_some() {
                    return Err(GameError::MalformedLevel(
                        "more than one player start".to_string(),
                    ));
                }
            }
            thing => seeds.push(Seed { at, thing }),
        }
    }
    let player =
        player.ok_or_else(|| GameError::MalformedLevel("no player start".to_string()))?;
    if manifest.enclose {
        builder.enclose();
    }
    tracing::debug!(
        "decoded {}x{} level with {} seeded items",
        width,
        height,
        seeds.len()
    );
    Ok(Level {
        grid: builder.build(),
        player,
        seeds,
        manifest,
    })
}

/// Decodes PNG bytes into `(rgba, width, height)`.
pub fn decode_png(bytes: &[u8]) -> GameResult<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| GameError::Parse(e.to_string()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok((img.into_raw(), w, h))
}

/// Dialog scripts keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DialogScripts(HashMap<String, Vec<Line>>);

impl DialogScripts {
    pub fn from_json(data: &str) -> GameResult<Self> {
        serde_json::from_str(data).map_err(|e| GameError::Parse(e.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&[Line]> {
        self.0.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Loads the level bundled with the game (image, manifest and scripts).
pub fn load_embedded() -> GameResult<(Level, DialogScripts)> {
    let (pixels, w, h) = decode_png(include_bytes!("../../../assets/level.png"))?;
    let manifest = LevelManifest::from_json(include_str!("../../../assets/level.json"))?;
    let scripts = DialogScripts::from_json(include_str!("../../../assets/dialogs.json"))?;
    Ok((load_level(&pixels, w, h, manifest)?, scripts))
}

/// Loads a level from files on disk.
pub fn load_files(
    image: &str,
    manifest: &str,
    scripts: &str,
) -> GameResult<(Level, DialogScripts)> {
    let (pixels, w, h) = decode_png(&std::fs::read(image)?)?;
    let manifest = LevelManifest::from_json(&std::fs::read_to_string(manifest)?)?;
    let scripts = DialogScripts::from_json(&std::fs::read_to_string(scripts)?)?;
    Ok((load_level(&pixels, w, h, manifest)?, scripts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Direction;

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const YELLOW: [u8; 4] = [255, 255, 0, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    fn buffer(pixels: &[[u8; 4]]) -> Vec<u8> {
        pixels.iter().flatten().copied().collect()
    }

    #[test]
    fn decodes_walls_player_and_seeds() {
        let px = buffer(&[
            BLACK, WHITE, RED, //
            BLUE, YELLOW, WHITE,
        ]);
        let level = load_level(&px, 3, 2, LevelManifest::default()).expect("level");
        assert_eq!(level.player, Coord::new(1, 0));
        assert_eq!(
            level.seeds,
            vec![
                Seed {
                    at: Coord::new(0, 2),
                    thing: Thing::Exit
                },
                Seed {
                    at: Coord::new(1, 1),
                    thing: Thing::Keys
                },
            ]
        );
        let walls = level.grid.walls(Coord::new(1, 0)).unwrap();
        assert!(walls.blocks(Direction::Up));
        assert!(!walls.blocks(Direction::Right));
    }

    #[test]
    fn buffer_size_must_match_dimensions() {
        let px = buffer(&[BLUE, WHITE]);
        assert!(matches!(
            load_level(&px, 3, 1, LevelManifest::default()),
            Err(GameError::MalformedLevel(_))
        ));
    }

    #[test]
    fn manifest_size_must_match_image() {
        let px = buffer(&[BLUE, WHITE]);
        let manifest = LevelManifest {
            size: Some([4, 4]),
            ..LevelManifest::default()
        };
        assert!(matches!(
            load_level(&px, 2, 1, manifest),
            Err(GameError::MalformedLevel(_))
        ));
    }

    #[test]
    fn unknown_color_reports_position() {
        let px = buffer(&[BLUE, [1, 2, 3, 255]]);
        assert!(matches!(
            load_level(&px, 2, 1, LevelManifest::default()),
            Err(GameError::UnknownColor { rgb: [1, 2, 3], row: 0, col: 1 })
        ));
    }

    #[test]
    fn transparent_pixels_are_floor() {
        let px = buffer(&[BLUE, [9, 9, 9, 0]]);
        let level = load_level(&px, 2, 1, LevelManifest::default()).expect("level");
        assert!(level.seeds.is_empty());
    }

    #[test]
    fn player_start_is_required_and_unique() {
        let none = buffer(&[WHITE, WHITE]);
        assert!(load_level(&none, 2, 1, LevelManifest::default()).is_err());
        let two = buffer(&[BLUE, BLUE]);
        assert!(load_level(&two, 2, 1, LevelManifest::default()).is_err());
    }

    #[test]
    fn item_names_follow_legend() {
        assert_eq!(Thing::FilingCabinet.item_name(), Some("filing-cabinet"));
        assert_eq!(Thing::Keys.item_name(), Some("keys"));
        assert_eq!(Thing::Wall.item_name(), None);
        assert_eq!(Thing::from_rgb([128, 64, 0]), Some(Thing::FilingCabinet));
    }

    #[test]
    fn manifest_parses_attributes() {
        let json = r#"{
            "enclose": true,
            "intro": "intro",
            "overrides": [
                { "at": [2, 3], "set": { "contents": ["keys", "data"] } },
                { "at": [0, 0], "set": { "locked": false } }
            ]
        }"#;
        let m = LevelManifest::from_json(json).expect("manifest");
        assert!(m.enclose);
        assert_eq!(m.intro.as_deref(), Some("intro"));
        assert_eq!(
            m.overrides[0].attributes,
            vec![Attribute::Contents(vec!["keys".into(), "data".into()])]
        );
        assert_eq!(m.overrides[1].attributes, vec![Attribute::Locked(false)]);
    }

    #[test]
    fn reserved_field_override_is_rejected() {
        let json = r#"{ "overrides": [ { "at": [1, 2], "set": { "row": 5 } } ] }"#;
        match LevelManifest::from_json(json) {
            Err(GameError::InvalidAttributeOverride { field, row, col }) => {
                assert_eq!(field, "row");
                assert_eq!((row, col), (1, 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_value_type_is_parse_error() {
        let json = r#"{ "overrides": [ { "at": [0, 0], "set": { "locked": "yes" } } ] }"#;
        assert!(matches!(
            LevelManifest::from_json(json),
            Err(GameError::Parse(_))
        ));
    }

    #[test]
    fn scripts_parse_lines() {
        let json = r#"{ "desk": [ { "side": "right", "speaker": "you", "text": "A desk." } ] }"#;
        let scripts = DialogScripts::from_json(json).expect("scripts");
        let desk = scripts.get("desk").expect("desk");
        assert_eq!(desk[0].side, common::Side::Right);
        assert!(scripts.get("couch").is_none());
    }

    #[test]
    fn embedded_level_loads() {
        let (level, scripts) = load_embedded().expect("embedded");
        assert_eq!((level.grid.width(), level.grid.height()), (12, 10));
        assert!(level.seeds.iter().any(|s| s.thing == Thing::System));
        let intro = level.manifest.intro.as_deref().expect("intro");
        assert!(scripts.get(intro).is_some());
    }
}
