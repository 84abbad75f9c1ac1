//! Resource vocabulary shared by inventory, orders and bookings.
//!
//! # Responsibility
//! - Name every consumable the game tracks (TA shifts, animals, articles).
//! - Map each resource to its inventory column.
//!
//! # Invariants
//! - `Article::as_str()` is also the inventory column that stores its count.
//! - `TechAssistant::ALL` is the greedy shift-draw order.

text_enum! {
    /// Technical assistant whose shifts can be booked.
    pub enum TechAssistant {
        Saltos => "saltos",
        Nitro => "nitro",
        Helene => "helene",
        Carnival => "carnival",
    }
}

impl TechAssistant {
    /// Inventory column holding this assistant's remaining shifts.
    pub fn shift_column(self) -> &'static str {
        match self {
            Self::Saltos => "ta_saltos_shifts",
            Self::Nitro => "ta_nitro_shifts",
            Self::Helene => "ta_helene_shifts",
            Self::Carnival => "ta_carnival_shifts",
        }
    }

    /// Accepts either the short name (`saltos`) or the column (`ta_saltos_shifts`).
    pub fn from_name_or_column(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::parse(trimmed).or_else(|| {
            Self::ALL
                .iter()
                .copied()
                .find(|ta| ta.shift_column() == trimmed)
        })
    }
}

text_enum! {
    /// Subject species kept in the animal facility.
    pub enum AnimalSpecies {
        U51 => "animals_51u6",
        U51M => "animals_51u6_m",
        C248S => "animals_c248_s",
        C248L => "animals_c248_l",
    }
}

impl AnimalSpecies {
    /// Inventory column with the facility capacity (`-1` when locked).
    pub fn max_column(self) -> &'static str {
        match self {
            Self::U51 => "animals_51u6_max",
            Self::U51M => "animals_51u6_m_max",
            Self::C248S => "animals_c248_s_max",
            Self::C248L => "animals_c248_l_max",
        }
    }

    /// Inventory column with the animals currently on hand.
    pub fn available_column(self) -> &'static str {
        match self {
            Self::U51 => "animals_51u6_available",
            Self::U51M => "animals_51u6_m_available",
            Self::C248S => "animals_c248_s_available",
            Self::C248L => "animals_c248_l_available",
        }
    }
}

text_enum! {
    /// Orderable article. The text value doubles as the inventory column.
    pub enum Article {
        XattyCartridge => "xatty_cartridge",
        ZeropointCartridge => "zeropoint_cartridge",
        NcPk1Cartridge => "nc_pk1_cartridge",
        SmartFilamentSCartridge => "smart_filament_s_cartridge",
        SmartFilamentMCartridge => "smart_filament_m_cartridge",
        SmartFilamentLCartridge => "smart_filament_l_cartridge",
        MamrReelCartridge => "mamr_reel_cartridge",
        DupontCartridge => "dupont_cartridge",
        /// TA shift booster.
        Juice => "juice",
    }
}

impl Article {
    /// Human-facing label used by the seeded catalog.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::XattyCartridge => "XATTY Cartridge",
            Self::ZeropointCartridge => "Zeropoint Cartridge",
            Self::NcPk1Cartridge => "NC-PK1 Cartridge",
            Self::SmartFilamentSCartridge => "Smart Filament Cartridge (S)",
            Self::SmartFilamentMCartridge => "Smart Filament Cartridge (M)",
            Self::SmartFilamentLCartridge => "Smart Filament Cartridge (L)",
            Self::MamrReelCartridge => "MAMR Reel Cartridge",
            Self::DupontCartridge => "DuPont Cartridge",
            Self::Juice => "Juice",
        }
    }

    pub fn is_cartridge(self) -> bool {
        !matches!(self, Self::Juice)
    }

    /// Inventory column storing the on-hand count.
    pub fn inventory_column(self) -> &'static str {
        self.as_str()
    }
}

text_enum! {
    /// Order priority; trades delivery time against price.
    pub enum AcquisitionType {
        Quick => "quick",
        Standard => "standard",
        Smart => "smart",
    }
}

impl AcquisitionType {
    /// Weeks added on top of the catalog wait time.
    pub fn cooldown_weeks(self) -> u32 {
        match self {
            Self::Quick => 1,
            Self::Standard => 2,
            Self::Smart => 3,
        }
    }

    /// Multiplier applied to the catalog price.
    pub fn price_factor(self) -> f64 {
        match self {
            Self::Quick => 2.00,
            Self::Standard => 1.00,
            Self::Smart => 0.80,
        }
    }
}
