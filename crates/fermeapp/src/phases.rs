//! # Crop Phase Table
//!
//! Static phenological calendars, one per crop name. Each phase covers an inclusive
//! range of days since sowing. Phases are listed in order and are contiguous from day 0.
//!
//! Lookup rules:
//! - Unknown crop names use the [`STANDARD`] three-phase progression.
//! - A day count past the last phase yields [`END_OF_CYCLE`].
//! - A negative day count (sowing date in the future) yields the first phase. This is
//!   the defined behavior; no validation happens here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub name: &'static str,
    /// First day of the phase, inclusive.
    pub start: i64,
    /// Last day of the phase, inclusive.
    pub end: i64,
    /// Crucial phases raise the task priority.
    pub crucial: bool,
    pub task: &'static str,
    pub icon: &'static str,
    pub personnel: bool,
}

const fn phase(
    name: &'static str,
    start: i64,
    end: i64,
    crucial: bool,
    task: &'static str,
    icon: &'static str,
    personnel: bool,
) -> Phase {
    Phase {
        name,
        start,
        end,
        crucial,
        task,
        icon,
        personnel,
    }
}

pub const END_OF_CYCLE: Phase = phase(
    "Fin de cycle",
    i64::MAX,
    i64::MAX,
    false,
    "Préparer la rotation des cultures",
    "🔄",
    false,
);

pub const STANDARD: &[Phase] = &[
    phase("Établissement", 0, 15, false, "Surveiller la levée", "🌱", false),
    phase("Développement", 16, 60, false, "Contrôler les adventices", "🌿", true),
    phase("Maturation", 61, 100, true, "Préparer la récolte", "🌾", true),
];

const MAIS: &[Phase] = &[
    phase("Levée", 0, 10, true, "Vérifier la levée et ressemer les manques", "🌱", false),
    phase("Croissance végétative", 11, 45, false, "Apport d'azote et sarclage", "🌿", true),
    phase("Floraison", 46, 70, true, "Irrigation régulière, stress hydrique critique", "🌼", true),
    phase("Remplissage des grains", 71, 100, false, "Surveiller les foreurs de tiges", "🌽", false),
    phase("Maturité", 101, 120, true, "Planifier la récolte", "🚜", true),
];

const BLE: &[Phase] = &[
    phase("Levée", 0, 15, false, "Contrôler la densité de levée", "🌱", false),
    phase("Tallage", 16, 50, true, "Premier apport d'azote", "🌿", true),
    phase("Montaison", 51, 80, false, "Désherbage et fongicide préventif", "🌾", true),
    phase("Épiaison", 81, 100, true, "Surveiller la rouille et les pucerons", "🔍", false),
    phase("Maturation", 101, 130, true, "Préparer la moissonneuse", "🚜", true),
];

const TOMATE: &[Phase] = &[
    phase("Reprise", 0, 14, true, "Arrosage quotidien après repiquage", "💧", true),
    phase("Croissance", 15, 40, false, "Tuteurage et ébourgeonnage", "🪴", true),
    phase("Floraison", 41, 60, true, "Apport de potasse, surveiller le mildiou", "🌼", false),
    phase("Fructification", 61, 90, false, "Récoltes échelonnées", "🍅", true),
];

const RIZ: &[Phase] = &[
    phase("Pépinière", 0, 20, false, "Maintenir la lame d'eau", "🌱", false),
    phase("Tallage", 21, 55, true, "Désherbage et fertilisation azotée", "🌿", true),
    phase("Initiation paniculaire", 56, 85, true, "Contrôler le niveau d'eau", "💧", false),
    phase("Maturation", 86, 120, false, "Assécher la rizière avant récolte", "🌾", true),
];

const POMME_DE_TERRE: &[Phase] = &[
    phase("Levée", 0, 20, false, "Surveiller la levée", "🌱", false),
    phase("Buttage", 21, 45, true, "Butter les rangs", "⛏️", true),
    phase("Tubérisation", 46, 80, true, "Traitement préventif contre le mildiou", "🥔", true),
    phase("Défanage", 81, 110, false, "Défaner avant l'arrachage", "🍂", true),
];

const ARACHIDE: &[Phase] = &[
    phase("Levée", 0, 12, false, "Contrôler la levée", "🌱", false),
    phase("Croissance", 13, 35, false, "Premier sarclage", "🌿", true),
    phase("Floraison et gynophores", 36, 70, true, "Ne pas perturber le sol, irriguer si sec", "🌼", false),
    phase("Remplissage des gousses", 71, 110, false, "Surveiller les termites", "🥜", false),
    phase("Maturité", 111, 130, true, "Arrachage et séchage", "🚜", true),
];

/// Returns the phase calendar for a crop name, falling back to [`STANDARD`].
pub fn phases_for(crop_name: &str) -> &'static [Phase] {
    match crop_name {
        "Maïs" => MAIS,
        "Blé" => BLE,
        "Tomate" => TOMATE,
        "Riz" => RIZ,
        "Pomme de terre" => POMME_DE_TERRE,
        "Arachide" => ARACHIDE,
        _ => STANDARD,
    }
}

/// Returns the phase active `days_since_planting` days after sowing.
///
/// Phases are scanned in order and the first one whose range has not yet ended is
/// returned. With contiguous calendars starting at day 0 this is the phase whose range
/// contains the day count, and a negative count lands on the first phase.
pub fn current_phase(crop_name: &str, days_since_planting: i64) -> &'static Phase {
    phases_for(crop_name)
        .iter()
        .find(|p| days_since_planting <= p.end)
        .unwrap_or(&END_OF_CYCLE)
}
