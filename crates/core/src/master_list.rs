//! The fixed catalog of selectable creatures.
//!
//! Ids are assigned sequentially (`"1"`, `"2"`, ...) in catalog order and are
//! stable across processes, since stored collection documents reference them.

use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

const CREATURE_NAMES: &[&str] = &[
    "Achatina",
    "Allosaurus",
    "Amargasaurus",
    "Andrewsarchus",
    "Anglerfish",
    "Ankylosaurus",
    "Archaeopteryx",
    "Argentavis",
    "Arthropluera",
    "Astrocetus",
    "Astrodelphis",
    "Baryonyx",
    "Basilosaurus",
    "Beelzebufo",
    "Bloodstalker",
    "Brontosaurus",
    "Carnotaurus",
    "Carbonemys",
    "Castoroides",
    "Carcharodontosaurus",
    "Ceratosaurus",
    "Chadlicotherium",
    "Cnidaria",
    "Compy",
    "Cosmo",
    "Daeodon",
    "Deinosuchus",
    "Deinonychus",
    "Desmodus",
    "Dimetrodon",
    "Dimorphodon",
    "Dinopithecus",
    "Dilophosaur",
    "Diplodocus",
    "Dire Bear",
    "Direwolf",
    "Dodo",
    "Doedicurus",
    "Dunkleosteus",
    "Electrophorus",
    "Equus",
    "Fasolasuchus",
    "Featherlight",
    "Fenrir",
    "Ferox",
    "Fjordhawk",
    "Gacha",
    "Gasbags",
    "Gigantopithecus",
    "Gigantoraptor",
    "Giganotosaurus",
    "Glowtail",
    "Griffin",
    "Hesperornis",
    "Ichthyornis",
    "Ichthyosaurus",
    "Iguanodon",
    "Kairuku",
    "Kaprosuchus",
    "Karkinos",
    "Kentrosaurus",
    "Leedsichthys",
    "Liopleurodon",
    "Lymantria",
    "Lystrosaurus",
    "Maewing",
    "Magmasaur",
    "Mammoth",
    "Managarmr",
    "Mantis",
    "Megachelon",
    "Megalosaurus",
    "Megalania",
    "Megaloceros",
    "Megalodon",
    "Meganeura",
    "Megatherium",
    "Mesopithecus",
    "Microraptor",
    "Morellatops",
    "Moschops",
    "Mosasaurus",
    "Oasisaur",
    "Onyc",
    "Oviraptor",
    "Ovis",
    "Pachy",
    "Pachyrhinosaurus",
    "Paraceratherium",
    "Parasaur",
    "Pegomastax",
    "Pelagornis",
    "Phiomia",
    "Phoenix",
    "Piranha",
    "Plesiosaurus",
    "Procoptodon",
    "Pteranodon",
    "Pulmonoscorpius",
    "Purlovia",
    "Pyromane",
    "Quetzal",
    "Raptor",
    "Ravager",
    "Reaper King",
    "Rex",
    "Rhyniognatha",
    "Rock Drake",
    "Roll Rat",
    "Sabertooth",
    "Sabertooth Salmon",
    "Sarco",
    "Shadowmane",
    "Shastasaurus",
    "Shinehorn",
    "Sinomacrops",
    "Snow Owl",
    "Spino",
    "Stegosaurus",
    "Tapejara",
    "Therizinosaur",
    "Thorny Dragon",
    "Thylacoleo",
    "Titanoboa",
    "Titanosaur",
    "Troodon",
    "Tropeognathus",
    "Tusoteuthis",
    "Velonasaur",
    "Voidwyrm",
    "Woolly Rhino",
    "Wyvern",
    "Xiphactinus",
    "YiLing",
    "Yeti",
    "Yutyrannus",
];

/// One selectable creature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterEntry {
    pub id: String,
    pub name: String,
}

static MASTER_LIST: LazyLock<Vec<MasterEntry>> = LazyLock::new(|| {
    CREATURE_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| MasterEntry {
            id: (index + 1).to_string(),
            name: (*name).to_string(),
        })
        .collect()
});

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// The full catalog, built once per process.
pub fn master_list() -> &'static [MasterEntry] {
    &MASTER_LIST
}

pub fn find_master_entry(id: &str) -> Option<&'static MasterEntry> {
    MASTER_LIST.iter().find(|e| e.id == id)
}

/// Entries whose name contains `query`, ignoring case.
pub fn search_master_list(query: &str) -> Vec<&'static MasterEntry> {
    let needle = query.trim().to_lowercase();
    MASTER_LIST
        .iter()
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .collect()
}
