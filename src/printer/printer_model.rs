extern crate serde;

use once_cell::sync::Lazy;
use serde::{Serialize, Deserialize};
use crate::{Error, command::Command, pattern};
use super::{PrinterProfile, PaperCodes, Pattern};

/// Canon's usb vendor id
const CANON_VID: u16 = 0x04a9;
/// Kodak's usb vendor id
const KODAK_VID: u16 = 0x040a;

/// SELPHY readbacks are this long
pub const SELPHY_READBACK_LEN: usize = 12;
/// Kodak readbacks are this long, only the first 51 bytes are populated
pub const KODAK_READBACK_LEN: usize = 58;
/// Header preceding every SELPHY plane
pub const SELPHY_PLANE_HEADER_LEN: usize = 12;
/// Kodak job header, sent as the init block
pub const KODAK_HEADER_LEN: usize = 17;
/// Kodak raster is followed by this many `0xff` bytes
pub const KODAK_PADDING_LEN: usize = 17;

/// Printers known to this library
///
/// Some families cover several models sharing the same protocol.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum PrinterModel {
    /// SELPHY ES1
    SelphyES1,
    /// SELPHY ES2 and ES20
    SelphyES2,
    /// SELPHY ES3 and ES30
    SelphyES3,
    /// SELPHY ES40 and CP790
    SelphyES40,
    /// SELPHY CP series, except CP-10, CP790 and CP900
    SelphyCP,
    /// SELPHY CP-10
    SelphyCP10,
    /// SELPHY CP900, same job header as the CP series but with a footer
    SelphyCP900,
    /// Kodak 6800
    Kodak6800
}

impl PrinterModel {
    /// Every known model, in registry order
    pub const ALL: [PrinterModel; 8] = [
        PrinterModel::SelphyES1,
        PrinterModel::SelphyES2,
        PrinterModel::SelphyES3,
        PrinterModel::SelphyES40,
        PrinterModel::SelphyCP,
        PrinterModel::SelphyCP10,
        PrinterModel::SelphyCP900,
        PrinterModel::Kodak6800
    ];

    fn index(&self) -> usize {
        *self as usize
    }

    /// Short name, as accepted by [from_str](std::str::FromStr::from_str)
    pub fn short_name(&self) -> &'static str {
        match self {
            PrinterModel::SelphyES1 => "es1",
            PrinterModel::SelphyES2 => "es2",
            PrinterModel::SelphyES3 => "es3",
            PrinterModel::SelphyES40 => "es40",
            PrinterModel::SelphyCP => "cp",
            PrinterModel::SelphyCP10 => "cp10",
            PrinterModel::SelphyCP900 => "cp900",
            PrinterModel::Kodak6800 => "kodak6800"
        }
    }

    /// Vendor and product ids of every printer speaking this protocol
    pub fn vp_ids(&self) -> &'static [(u16, u16)] {
        match self {
            PrinterModel::SelphyES1 => &[(CANON_VID, 0x3141)],
            PrinterModel::SelphyES2 => &[(CANON_VID, 0x3185), (CANON_VID, 0x3186)],
            PrinterModel::SelphyES3 => &[(CANON_VID, 0x31af), (CANON_VID, 0x31b0)],
            PrinterModel::SelphyES40 => &[(CANON_VID, 0x31ee), (CANON_VID, 0x31e7)],
            PrinterModel::SelphyCP => &[
                (CANON_VID, 0x3063), // CP100
                (CANON_VID, 0x307c), // CP200
                (CANON_VID, 0x30bd), // CP220
                (CANON_VID, 0x307d), // CP300
                (CANON_VID, 0x30be), // CP330
                (CANON_VID, 0x30f6), // CP400
                (CANON_VID, 0x30f5), // CP500
                (CANON_VID, 0x3128), // CP510
                (CANON_VID, 0x3172), // CP520
                (CANON_VID, 0x31b1), // CP530
                (CANON_VID, 0x310b), // CP600
                (CANON_VID, 0x3127), // CP710
                (CANON_VID, 0x3143), // CP720
                (CANON_VID, 0x3142), // CP730
                (CANON_VID, 0x3171), // CP740
                (CANON_VID, 0x3170), // CP750
                (CANON_VID, 0x31ab), // CP760
                (CANON_VID, 0x31aa), // CP770
                (CANON_VID, 0x31dd), // CP780
                (CANON_VID, 0x3214), // CP800
                (CANON_VID, 0x3256)  // CP810
            ],
            PrinterModel::SelphyCP10 => &[(CANON_VID, 0x304a)],
            PrinterModel::SelphyCP900 => &[(CANON_VID, 0x3255)],
            PrinterModel::Kodak6800 => &[(KODAK_VID, 0x4021)]
        }
    }

    /// The model that cannot be told apart from this one by looking at the job header alone
    ///
    /// ```rust
    /// use dyesub_rs::PrinterModel;
    /// assert_eq!(PrinterModel::SelphyCP.header_twin(), Some(PrinterModel::SelphyCP900));
    /// assert_eq!(PrinterModel::SelphyES1.header_twin(), None);
    /// ```
    pub fn header_twin(&self) -> Option<PrinterModel> {
        match self {
            PrinterModel::SelphyCP => Some(PrinterModel::SelphyCP900),
            PrinterModel::SelphyCP900 => Some(PrinterModel::SelphyCP),
            _ => None
        }
    }

    /// Obtain the protocol details of the model
    ///
    /// Profiles are built once, on first use, and never change afterwards.
    /// ```rust
    /// use dyesub_rs::PrinterModel;
    /// let profile = PrinterModel::SelphyES1.profile();
    /// assert_eq!(profile.init_length(), 12);
    /// assert_eq!(profile.readback_length(), 12);
    /// ```
    pub fn profile(&self) -> &'static PrinterProfile {
        &REGISTRY[self.index()]
    }
}

impl std::fmt::Display for PrinterModel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let name = match self {
            PrinterModel::SelphyES1 => "SELPHY ES1",
            PrinterModel::SelphyES2 => "SELPHY ES2/ES20",
            PrinterModel::SelphyES3 => "SELPHY ES3/ES30",
            PrinterModel::SelphyES40 => "SELPHY ES40/CP790",
            PrinterModel::SelphyCP => "SELPHY CP series",
            PrinterModel::SelphyCP10 => "SELPHY CP-10",
            PrinterModel::SelphyCP900 => "SELPHY CP900",
            PrinterModel::Kodak6800 => "Kodak 6800"
        };
        write!(formatter, "{}", name)
    }
}

impl std::str::FromStr for PrinterModel {
    type Err = Error;

    fn from_str(name: &str) -> Result<PrinterModel, Error> {
        let lowered = name.to_ascii_lowercase();
        PrinterModel::ALL.iter()
            .find(|model| model.short_name() == lowered)
            .copied()
            .ok_or_else(|| Error::InvalidModel(name.to_string()))
    }
}

static REGISTRY: Lazy<Vec<PrinterProfile>> = Lazy::new(build_profiles);

/// Builds the profile of every known model, indexed like [PrinterModel::ALL](PrinterModel::ALL)
///
/// Pure, so calling it again gives the same profiles. The registry calls it exactly once.
pub fn build_profiles() -> Vec<PrinterProfile> {
    PrinterModel::ALL.iter().map(|model| build_profile(*model)).collect()
}

/// CP series paper codes, shared with the CP900
fn cp_paper_codes() -> PaperCodes {
    PaperCodes::ignore_all()
        .with(0x01, 0x11)
        .with(0x02, 0x22)
        .with(0x03, 0x33)
        .with(0x04, 0x44)
}

/// CP series readbacks, shared with the CP900
fn cp_builder(model: PrinterModel, name: &str) -> super::PrinterProfileBuilder {
    PrinterProfile::builder(model, name, SELPHY_READBACK_LEN)
        .with_init_length(12)
        .with_plane_header_length(SELPHY_PLANE_HEADER_LEN)
        .with_init_pattern(pattern![0x01, 0x00, 0x00, 0x00, _, 0x00, _, 0x00, 0x00, 0x00, 0x00, _])
        .with_ready_pattern(pattern![0x02, 0x00, 0x00, 0x00, 0x70, 0x00, _, 0x00, 0x00, 0x00, 0x00, _])
        .with_ready_pattern(pattern![0x04, 0x00, 0x00, 0x00, 0x70, 0x00, _, 0x00, 0x00, 0x00, 0x00, _])
        .with_ready_pattern(pattern![0x08, 0x00, 0x00, 0x00, 0x70, 0x00, _, 0x00, 0x00, 0x00, 0x00, _])
        .with_done_pattern(pattern![0x20, 0x00, 0x00, 0x00, 0x70, 0x00, _, 0x00, 0x00, 0x00, 0x00, _])
        .with_paper_verification(Some(3), Some(6), cp_paper_codes())
}

fn build_profile(model: PrinterModel) -> PrinterProfile {
    let name = model.to_string();
    match model {
        PrinterModel::SelphyES1 => PrinterProfile::builder(model, name, SELPHY_READBACK_LEN)
            .with_init_length(12)
            .with_plane_header_length(SELPHY_PLANE_HEADER_LEN)
            .with_init_pattern(pattern![0x02, 0x00, 0x00, 0x00, 0x02, 0x01, _, 0x01, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x04, 0x00, 0x01, 0x00, 0x02, 0x01, _, 0x01, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x04, 0x00, 0x03, 0x00, 0x02, 0x01, _, 0x01, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x04, 0x00, 0x07, 0x00, 0x02, 0x01, _, 0x01, 0x00, 0x00, 0x00, 0x00])
            .with_done_pattern(pattern![0x04, 0x00, 0x00, 0x00, 0x02, 0x01, _, 0x01, 0x00, 0x00, 0x00, 0x00])
            .with_paper_verification(Some(3), Some(6), PaperCodes::ignore_all()
                .with(0x11, 0x01)
                .with(0x12, 0x02)
                .with(0x13, 0x03))
            .build(),
        PrinterModel::SelphyES2 => PrinterProfile::builder(model, name, SELPHY_READBACK_LEN)
            .with_init_length(16)
            .with_plane_header_length(SELPHY_PLANE_HEADER_LEN)
            .with_init_pattern(pattern![0x02, 0x00, 0x00, 0x00, _, 0x00, _, _, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x03, 0x00, 0x01, 0x00, _, 0x00, _, _, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x06, 0x00, 0x03, 0x00, _, 0x00, _, _, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x09, 0x00, 0x07, 0x00, _, 0x00, _, _, 0x00, 0x00, 0x00, 0x00])
            .with_done_pattern(pattern![0x09, 0x00, 0x00, 0x00, _, 0x00, _, _, 0x00, 0x00, 0x00, 0x00])
            .with_paper_verification(Some(2), Some(4), PaperCodes::ignore_all()
                .with(0x01, 0x01)
                .with(0x02, 0x02)
                .with(0x03, 0x03))
            .build(),
        // Does not report the loaded paper
        PrinterModel::SelphyES3 => PrinterProfile::builder(model, name, SELPHY_READBACK_LEN)
            .with_init_length(16)
            .with_footer_length(12)
            .with_plane_header_length(SELPHY_PLANE_HEADER_LEN)
            .with_init_pattern(pattern![0x00, 0xff, _, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_ready_pattern(pattern![0x01, 0xff, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_ready_pattern(pattern![0x03, 0xff, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_ready_pattern(pattern![0x05, 0xff, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_done_pattern(pattern![0x00, 0xff, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_paper_verification(Some(2), None, PaperCodes::ignore_all())
            .build(),
        PrinterModel::SelphyES40 => PrinterProfile::builder(model, name, SELPHY_READBACK_LEN)
            .with_init_length(16)
            .with_footer_length(12)
            .with_plane_header_length(SELPHY_PLANE_HEADER_LEN)
            .with_init_pattern(pattern![0x00, 0x00, _, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_ready_pattern(pattern![0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_ready_pattern(pattern![0x00, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_ready_pattern(pattern![0x00, 0x05, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_done_pattern(pattern![0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, _, _])
            .with_paper_verification(Some(2), Some(11), PaperCodes::ignore_all()
                .with(0x00, 0x11)
                .with(0x01, 0x22)
                .with(0x02, 0x33)
                .with(0x03, 0x44))
            .build(),
        PrinterModel::SelphyCP => cp_builder(model, &name).build(),
        // Only one paper type exists
        PrinterModel::SelphyCP10 => PrinterProfile::builder(model, name, SELPHY_READBACK_LEN)
            .with_init_length(12)
            .with_plane_header_length(SELPHY_PLANE_HEADER_LEN)
            .with_init_pattern(pattern![0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x02, 0x00, 0x00, 0x00, 0x70, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x04, 0x00, 0x00, 0x00, 0x70, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
            .with_ready_pattern(pattern![0x08, 0x00, 0x00, 0x00, 0x70, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
            .with_done_pattern(pattern![0x20, 0x00, 0x00, 0x00, 0x70, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
            .build(),
        PrinterModel::SelphyCP900 => cp_builder(model, &name)
            .with_footer_length(4)
            .build(),
        // The whole interleaved raster travels as a single plane
        PrinterModel::Kodak6800 => PrinterProfile::builder(model, name, KODAK_READBACK_LEN)
            .with_init_length(KODAK_HEADER_LEN)
            .with_footer_length(KODAK_PADDING_LEN)
            .with_init_pattern(Pattern::ignore_all(KODAK_READBACK_LEN).with(0, 0x01))
            .with_ready_pattern(Pattern::ignore_all(KODAK_READBACK_LEN)
                .with(0, 0x01)
                .with(1, 0x03)
                .with(2, 0x00))
            .with_done_pattern(Pattern::ignore_all(KODAK_READBACK_LEN))
            .with_status_query(Command::KodakStatusQuery)
            .with_preamble(Command::KodakAttention)
            .build()
    }
}
