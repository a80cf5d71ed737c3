//! Code catalog
//!
//! Human-readable names for the integer codes that appear in PTRAC event
//! lines: bank sub-reasons, termination causes, photon collision types, ENDF
//! reaction numbers (MT) and the PTRAC variable ids declared in the preamble.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Why a particle was banked (event codes 2001..=2026)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankReason {
    DxtranTrack,
    EnergySplit,
    WeightWindowSurfaceSplit,
    WeightWindowCollisionSplit,
    ForcedCollisionUncollided,
    ImportanceSplit,
    NeutronFromNeutron,
    PhotonFromNeutron,
    PhotonFromDoubleFluorescence,
    PhotonFromAnnihilation,
    ElectronFromPhotoelectric,
    ElectronFromCompton,
    ElectronFromPairProduction,
    AugerElectron,
    PositronFromPairProduction,
    BremsstrahlungFromElectron,
    KnockOnElectron,
    XRaysFromElectron,
    PhotonFromNeutronMultigroup,
    NeutronFissionMultigroup,
    NeutronNxnMultigroup,
    PhotonFromPhotonMultigroup,
    AdjointWeightSplitMultigroup,
    WeightWindowTimeSplit,
    NeutronFromPhotonuclear,
    DxtranAnnihilationPhoton,
}

impl BankReason {
    /// Every documented reason, in code order
    pub const ALL: [BankReason; 26] = [
        BankReason::DxtranTrack,
        BankReason::EnergySplit,
        BankReason::WeightWindowSurfaceSplit,
        BankReason::WeightWindowCollisionSplit,
        BankReason::ForcedCollisionUncollided,
        BankReason::ImportanceSplit,
        BankReason::NeutronFromNeutron,
        BankReason::PhotonFromNeutron,
        BankReason::PhotonFromDoubleFluorescence,
        BankReason::PhotonFromAnnihilation,
        BankReason::ElectronFromPhotoelectric,
        BankReason::ElectronFromCompton,
        BankReason::ElectronFromPairProduction,
        BankReason::AugerElectron,
        BankReason::PositronFromPairProduction,
        BankReason::BremsstrahlungFromElectron,
        BankReason::KnockOnElectron,
        BankReason::XRaysFromElectron,
        BankReason::PhotonFromNeutronMultigroup,
        BankReason::NeutronFissionMultigroup,
        BankReason::NeutronNxnMultigroup,
        BankReason::PhotonFromPhotonMultigroup,
        BankReason::AdjointWeightSplitMultigroup,
        BankReason::WeightWindowTimeSplit,
        BankReason::NeutronFromPhotonuclear,
        BankReason::DxtranAnnihilationPhoton,
    ];

    /// Look up a bank event code; the sign is ignored
    pub fn from_code(code: i64) -> Option<Self> {
        let index = code.saturating_abs().checked_sub(2001)?;
        Self::ALL.get(usize::try_from(index).ok()?).copied()
    }

    /// Raw event code (2001..=2026)
    pub fn code(&self) -> i64 {
        2001 + *self as i64
    }

    pub fn description(&self) -> &'static str {
        match self {
            BankReason::DxtranTrack => "DXTRAN track",
            BankReason::EnergySplit => "Energy split",
            BankReason::WeightWindowSurfaceSplit => "Weight window surface split",
            BankReason::WeightWindowCollisionSplit => "Weight window collision split",
            BankReason::ForcedCollisionUncollided => "Forced collision, uncollided part",
            BankReason::ImportanceSplit => "Importance split",
            BankReason::NeutronFromNeutron => "Neutron from neutron (n,xn) (n,f)",
            BankReason::PhotonFromNeutron => "Photon from neutron",
            BankReason::PhotonFromDoubleFluorescence => "Photon from double fluorescence",
            BankReason::PhotonFromAnnihilation => "Photon from annihilation",
            BankReason::ElectronFromPhotoelectric => "Electron from photoelectric",
            BankReason::ElectronFromCompton => "Electron from Compton",
            BankReason::ElectronFromPairProduction => "Electron from pair production",
            BankReason::AugerElectron => "Auger electron from photon/X-ray",
            BankReason::PositronFromPairProduction => "Positron from pair production",
            BankReason::BremsstrahlungFromElectron => "Bremsstrahlung from electron",
            BankReason::KnockOnElectron => "Knock-on electron",
            BankReason::XRaysFromElectron => "X-rays from electron",
            BankReason::PhotonFromNeutronMultigroup => "Photon from neutron, multigroup",
            BankReason::NeutronFissionMultigroup => "Neutron (n,f), multigroup",
            BankReason::NeutronNxnMultigroup => "Neutron (n,xn), multigroup",
            BankReason::PhotonFromPhotonMultigroup => "Photon from photon, multigroup",
            BankReason::AdjointWeightSplitMultigroup => "Adjoint weight split, multigroup",
            BankReason::WeightWindowTimeSplit => "Weight window time split",
            BankReason::NeutronFromPhotonuclear => "Neutron from photonuclear",
            BankReason::DxtranAnnihilationPhoton => {
                "DXTRAN annihilation photon from pulse height tally variance reduction"
            }
        }
    }
}

impl fmt::Display for BankReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Particle family, for codes whose meaning depends on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleFamily {
    Neutron,
    Photon,
    Electron,
}

const COMMON_TERMINATIONS: [&str; 10] = [
    "Escape",
    "Energy cut-off",
    "Time cut-off",
    "Weight window",
    "Cell importance",
    "Weight cut-off",
    "Energy importance",
    "DXTRAN",
    "Forced collision",
    "Exponential transform",
];

/// Termination cause (NTER) for a particle family
pub fn termination_description(nter: i64, family: ParticleFamily) -> Option<&'static str> {
    match nter {
        1..=10 => Some(COMMON_TERMINATIONS[(nter - 1) as usize]),
        _ => match (family, nter) {
            (ParticleFamily::Neutron, 11) => Some("Downscattering"),
            (ParticleFamily::Neutron, 12) => Some("Capture"),
            (ParticleFamily::Neutron, 13) => Some("Loss to (n,xn)"),
            (ParticleFamily::Neutron, 14) => Some("Loss to fission"),
            (ParticleFamily::Photon, 11) => Some("Compton scatter"),
            (ParticleFamily::Photon, 12) => Some("Capture"),
            (ParticleFamily::Photon, 13) => Some("Pair production"),
            (ParticleFamily::Electron, 11) => Some("Scattering"),
            (ParticleFamily::Electron, 12) => Some("Bremsstrahlung"),
            _ => None,
        },
    }
}

/// Photon collision type (NTYN on photon collision lines, usually negative)
pub fn photon_reaction_description(ntyn: i64) -> Option<&'static str> {
    match ntyn.saturating_abs() {
        1 => Some("Incoherent scatter"),
        2 => Some("Coherent scatter"),
        3 => Some("Fluorescence"),
        4 => Some("Double fluorescence"),
        5 => Some("Pair production"),
        _ => None,
    }
}

const NAMED_REACTIONS: &[(i64, &str)] = &[
    (1, "n_total"),
    (2, "z_elastic"),
    (3, "z_nonelastic"),
    (4, "z_n"),
    (5, "z_anything"),
    (10, "z_continuum"),
    (11, "z_2nd"),
    (16, "z_2n"),
    (17, "z_3n"),
    (18, "z_fission"),
    (19, "z_f"),
    (20, "z_nf"),
    (21, "z_2nf"),
    (22, "z_na"),
    (23, "z_n3a"),
    (24, "z_2na"),
    (25, "z_3na"),
    (27, "z_abs"),
    (28, "z_np"),
    (29, "z_n2a"),
    (30, "z_2n2a"),
    (32, "z_nd"),
    (33, "z_nt"),
    (34, "z_n3He"),
    (35, "z_nd2a"),
    (36, "z_nt2a"),
    (37, "z_4n"),
    (38, "z_3nf"),
    (41, "z_2np"),
    (42, "z_3np"),
    (44, "z_n2p"),
    (45, "z_npa"),
    (91, "z_nc"),
    (101, "z_disap"),
    (102, "z_gamma"),
    (103, "z_p"),
    (104, "z_d"),
    (105, "z_t"),
    (106, "z_3He"),
    (107, "z_a"),
    (108, "z_2a"),
    (109, "z_3a"),
    (111, "z_2p"),
    (112, "z_pa"),
    (113, "z_t2a"),
    (114, "z_d2a"),
    (115, "z_pd"),
    (116, "z_pt"),
    (117, "z_da"),
    (151, "resonance_params"),
    (451, "description"),
    (452, "fission_n"),
    (455, "fission_n_delayed"),
    (456, "fission_n_prompt"),
    (458, "fission_n_energy"),
    (460, "g_delayed"),
];

/// ENDF reaction name for an MT number.
///
/// Level-resolved outgoing channels (MT 50..=90 and 600..=849) are
/// generated from their level index.
pub fn reaction_name(mt: i64) -> Option<Cow<'static, str>> {
    if let Ok(i) = NAMED_REACTIONS.binary_search_by_key(&mt, |&(code, _)| code) {
        return Some(Cow::Borrowed(NAMED_REACTIONS[i].1));
    }
    let (base, prefix) = match mt {
        50..=90 => return Some(Cow::Owned(format!("z_n{}", mt - 50))),
        600..=649 => (600, "z_p"),
        650..=699 => (650, "z_d"),
        700..=749 => (700, "z_t"),
        750..=799 => (750, "z_3He"),
        800..=849 => (800, "z_a"),
        _ => return None,
    };
    let level = mt - base;
    if level == 49 {
        Some(Cow::Owned(format!("{}c", prefix)))
    } else {
        Some(Cow::Owned(format!("{}{}", prefix, level)))
    }
}

const VARIABLES: [(&str, &str); 28] = [
    ("NPS", "History number"),
    ("S_EVENT", "Type of first history event"),
    ("NCL", "Cell number"),
    ("NSF", "Nearest surface headed towards"),
    ("JPTAL", "Tally specifier"),
    ("TAL", "TFC specifier"),
    ("NXT_EVENT", "Next event type"),
    ("NODE", "Number of nodes in track from source to this point"),
    ("NSR", "Source number"),
    ("NXS", "ZZAAA for interaction"),
    ("NYTN", "Reaction type (MT)"),
    ("NSF", "Surface number"),
    ("ANG", "Angle with surface normal (degrees)"),
    ("NTER", "Termination type"),
    ("BRANCH", "Branch number"),
    ("IPT", "Particle type"),
    ("NCL", "Cell number"),
    ("MAT", "Material number"),
    ("NCP", "Number of collisions in history"),
    ("XXX", "x-coordinate of event (cm)"),
    ("YYY", "y-coordinate of event (cm)"),
    ("ZZZ", "z-coordinate of event (cm)"),
    ("UUU", "x-component of exit direction vector"),
    ("VVV", "y-component of exit direction vector"),
    ("WWW", "z-component of exit direction vector"),
    ("ERG", "Energy of particle after event"),
    ("WGT", "Weight of particle after event"),
    ("TME", "Time of event"),
];

/// Mnemonic of a PTRAC variable id (1-based)
pub fn variable_name(id: i64) -> Option<&'static str> {
    variable(id).map(|(name, _)| name)
}

/// Description of a PTRAC variable id (1-based)
pub fn variable_description(id: i64) -> Option<&'static str> {
    variable(id).map(|(_, description)| description)
}

fn variable(id: i64) -> Option<(&'static str, &'static str)> {
    let index = usize::try_from(id.checked_sub(1)?).ok()?;
    VARIABLES.get(index).copied()
}
