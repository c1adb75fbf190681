use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ParkError;
use crate::park::ParkSim;

const SAVE_VERSION: u32 = 1;

/// Serde adapters for macroquad's `Vec2`, stored as `[x, y]`.
pub mod serde_vec2 {
    use macroquad::prelude::{vec2, Vec2};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec2, D::Error> {
        let [x, y] = <[f32; 2]>::deserialize(d)?;
        Ok(vec2(x, y))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(v: &Option<Vec2>, s: S) -> Result<S::Ok, S::Error> {
            v.map(|v| [v.x, v.y]).serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec2>, D::Error> {
            Ok(Option::<[f32; 2]>::deserialize(d)?.map(|[x, y]| vec2(x, y)))
        }
    }

    pub mod vec {
        use super::*;

        pub fn serialize<S: Serializer>(v: &[Vec2], s: S) -> Result<S::Ok, S::Error> {
            let raw: Vec<[f32; 2]> = v.iter().map(|p| [p.x, p.y]).collect();
            raw.serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec2>, D::Error> {
            let raw = Vec::<[f32; 2]>::deserialize(d)?;
            Ok(raw.into_iter().map(|[x, y]| vec2(x, y)).collect())
        }
    }
}

#[derive(Serialize)]
struct SaveFileRef<'a> {
    version: u32,
    park: &'a ParkSim,
}

#[derive(Deserialize)]
struct SaveFile {
    version: u32,
    park: ParkSim,
}

/// Write the whole park, RNG included, to `path`.
pub fn save_to_file(park: &ParkSim, path: impl AsRef<Path>) -> Result<(), ParkError> {
    let state = SaveFileRef {
        version: SAVE_VERSION,
        park,
    };
    let bytes = bincode::serialize(&state).map_err(|e| ParkError::Save(format!("serialize: {e}")))?;
    std::fs::write(path.as_ref(), bytes)
        .map_err(|e| ParkError::Save(format!("{}: {e}", path.as_ref().display())))?;
    Ok(())
}

/// Read a park written by `save_to_file`. Tile occupancy is rebuilt.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ParkSim, ParkError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| ParkError::Load(format!("{}: {e}", path.as_ref().display())))?;
    let file: SaveFile =
        bincode::deserialize(&bytes).map_err(|e| ParkError::Load(format!("deserialize: {e}")))?;
    if file.version != SAVE_VERSION {
        return Err(ParkError::Load(format!(
            "unsupported save version {} (expected {SAVE_VERSION})",
            file.version
        )));
    }
    let mut park = file.park;
    park.board.refresh_occupancy();
    Ok(park)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParkSettings;
    use crate::events::NullSink;
    use crate::grid::TilePos;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("/tmp/wildpark_{name}_{nanos}.bin")
    }

    #[test]
    fn roundtrip_resumes_identically() {
        let mut park = ParkSim::new(&ParkSettings::default()).unwrap();
        for _ in 0..120 {
            park.tick(0.1, &mut NullSink);
        }
        let path = temp_file("roundtrip");
        save_to_file(&park, &path).unwrap();
        let mut loaded = load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.board.width(), park.board.width());
        assert_eq!(loaded.board.animals.len(), park.board.animals.len());
        assert_eq!(loaded.board.roads.len(), park.board.roads.len());
        assert_eq!(loaded.capital.balance, park.capital.balance);
        assert_eq!(loaded.tick_count, park.tick_count);

        let occupied = |p: &ParkSim| {
            p.board
                .grid
                .tiles()
                .map(|t| t.occupants.len())
                .sum::<usize>()
        };
        assert_eq!(occupied(&loaded), occupied(&park));

        park.tick(0.1, &mut NullSink);
        loaded.tick(0.1, &mut NullSink);
        let positions = |p: &ParkSim| {
            p.board
                .jeeps
                .iter()
                .map(|(_, j)| (j.pos.x, j.pos.y))
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(&loaded), positions(&park));
        assert!(loaded.board.roads.contains(TilePos::new(0, loaded.board.entrance.y)));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let park = ParkSim::new(&ParkSettings::default()).unwrap();
        let path = temp_file("version");
        let bytes = bincode::serialize(&SaveFileRef {
            version: SAVE_VERSION + 1,
            park: &park,
        })
        .unwrap();
        std::fs::write(&path, bytes).unwrap();
        let err = load_from_file(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ParkError::Load(_)));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_from_file("/tmp/wildpark_definitely_missing.bin").unwrap_err();
        assert!(matches!(err, ParkError::Load(_)));
    }
}
