use {
    chrono::Local,
    hero_components::ClassPoints,
    serde::{Deserialize, Serialize},
    shared_components::GameSwitches,
    std::{
        fs,
        io::Write,
        path::{Path, PathBuf},
    },
    tech_tree_assets::{AbilityId, ClassId},
    tech_tree_components::TechTreeProgress,
    thiserror::Error,
    wallet::Wallet,
};

pub const SAVE_PREFIX: &str = "techtrees_";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode the save: {0}")]
    Encode(#[from] ron::Error),
    #[error("could not decode the save: {0}")]
    Decode(#[from] ron::error::SpannedError),
}

/// One hero's progression, keyed by the stable `HeroId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedHero {
    pub hero_id: u32,
    pub class: ClassId,
    pub level: u32,
    pub abilities: Vec<AbilityId>,
    pub stats: [i32; 8],
    pub points: ClassPoints,
    pub progress: TechTreeProgress,
}

/// Everything the tech trees touch, plus the hash of the catalog the
/// progress was made against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechTreeSave {
    pub catalog_hash: u32,
    pub heroes: Vec<SavedHero>,
    #[serde(default)]
    pub switches: GameSwitches,
    #[serde(default)]
    pub wallet: Wallet,
}

impl TechTreeSave {
    pub fn hero(&self, hero_id: u32) -> Option<&SavedHero> {
        self.heroes.iter().find(|hero| hero.hero_id == hero_id)
    }
}

/// Writes `save` into `dir` under a timestamped name and returns the path.
pub fn write_save(dir: &Path, save: &TechTreeSave) -> Result<PathBuf, SaveError> {
    fs::create_dir_all(dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let path = dir.join(format!("{SAVE_PREFIX}{timestamp}.ron"));
    let serialized = ron::ser::to_string_pretty(save, ron::ser::PrettyConfig::default())?;

    let mut file = fs::File::options()
        .write(true)
        .truncate(true)
        .create(true)
        .open(&path)?;
    file.write_all(serialized.as_bytes())?;
    Ok(path)
}

pub fn read_save(path: &Path) -> Result<TechTreeSave, SaveError> {
    let contents = fs::read_to_string(path)?;
    Ok(ron::from_str(&contents)?)
}

/// Finds the most recent save file in `dir`.
pub fn find_latest_save(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "ron")
        })
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(SAVE_PREFIX))
        })
        .max_by_key(|e| e.metadata().and_then(|m| m.modified()).ok())
        .map(|e| e.path())
}
