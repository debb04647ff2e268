//! Subject-code lookup tables and filter categories.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CodePrefix, FilterOptions};

/// A named group of first-table prefixes, shown together in the filter menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeCategory {
    pub name: String,
    pub codes: Vec<String>,
}

impl CodeCategory {
    /// Prefixes of this category as filter values.
    pub fn prefixes(&self) -> Result<Vec<CodePrefix>> {
        self.codes.iter().map(|c| CodePrefix::new(c.as_str())).collect()
    }
}

/// The two 2-letter lookup tables used to describe a subject code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taxonomy {
    /// Subject (letters 2 and 3 of the code)
    pub first: BTreeMap<String, String>,

    /// Condition (letters 4 and 5 of the code)
    pub second: BTreeMap<String, String>,

    /// Filter menu grouping; derived from `first` when absent
    #[serde(default)]
    pub categories: Vec<CodeCategory>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        let first: BTreeMap<String, String> = defaults::FIRST
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let second = defaults::SECOND
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let categories = derive_categories(&first);
        Self {
            first,
            second,
            categories,
        }
    }
}

impl Taxonomy {
    /// Load tables from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut taxonomy: Self = toml::from_str(&content)?;
        if taxonomy.categories.is_empty() {
            taxonomy.categories = derive_categories(&taxonomy.first);
        }
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load from `path` if given, otherwise the built-in tables.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        Self::load(path).unwrap_or_else(|e| {
            log::warn!(
                "Taxonomy load failed from {:?}: {}. Using built-in tables.",
                path,
                e
            );
            Self::default()
        })
    }

    /// Every key must be exactly two uppercase letters.
    pub fn validate(&self) -> Result<()> {
        for key in self.first.keys().chain(self.second.keys()) {
            if key.len() != 2 || !key.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(AppError::validation(format!(
                    "taxonomy key '{key}' must be two uppercase letters"
                )));
            }
        }
        for category in &self.categories {
            category.prefixes()?;
        }
        Ok(())
    }

    pub fn subject(&self, segment: &str) -> Option<&str> {
        self.first.get(segment).map(String::as_str)
    }

    pub fn condition(&self, segment: &str) -> Option<&str> {
        self.second.get(segment).map(String::as_str)
    }

    /// Default filter options: every flag on, every subject prefix enabled.
    pub fn default_filter_options(&self) -> Result<FilterOptions> {
        FilterOptions::with_codes(self.first.keys().cloned())
    }
}

fn derive_categories(first: &BTreeMap<String, String>) -> Vec<CodeCategory> {
    let mut by_letter: BTreeMap<char, Vec<String>> = BTreeMap::new();
    for key in first.keys() {
        if let Some(letter) = key.chars().next() {
            by_letter.entry(letter).or_default().push(key.clone());
        }
    }

    by_letter
        .into_iter()
        .map(|(letter, codes)| CodeCategory {
            name: defaults::category_name(letter)
                .map(str::to_string)
                .unwrap_or_else(|| letter.to_string()),
            codes,
        })
        .collect()
}

mod defaults {
    pub fn category_name(letter: char) -> Option<&'static str> {
        let name = match letter {
            'A' => "ATM Airspace organization",
            'C' => "CNS Communications and surveillance facilities",
            'F' => "AGA Facilities and services",
            'G' => "CNS GNSS services",
            'I' => "CNS Instrument and microwave landing systems",
            'L' => "AGA Lighting facilities",
            'M' => "AGA Movement and landing area",
            'N' => "CNS Terminal and en-route navigation facilities",
            'O' => "Other information",
            'P' => "ATM Air traffic procedures",
            'R' => "Navigation warnings: Airspace restrictions",
            'S' => "ATM Air traffic and VOLMET services",
            'W' => "Navigation warnings: Warnings",
            _ => return None,
        };
        Some(name)
    }

    pub const FIRST: &[(&str, &str)] = &[
        ("AA", "Minimum altitude"),
        ("AC", "Class B, C, D, or E surface area"),
        ("AD", "Air defense identification zone"),
        ("AE", "Control area"),
        ("AF", "Flight information region"),
        ("AH", "Upper control area"),
        ("AL", "Minimum usable flight level"),
        ("AN", "Area navigation route"),
        ("AO", "Oceanic control area"),
        ("AP", "Reporting point"),
        ("AR", "ATS route"),
        ("AT", "Terminal control area"),
        ("AU", "Upper flight information region"),
        ("AV", "Upper advisory area"),
        ("AX", "Significant point"),
        ("AZ", "Aerodrome traffic zone"),
        ("CA", "Air/ground facility"),
        ("CB", "Automatic dependent surveillance - broadcast"),
        ("CC", "Automatic dependent surveillance - contract"),
        ("CD", "Controller-pilot data link communications"),
        ("CE", "En route surveillance radar"),
        ("CG", "Ground controlled approach system"),
        ("CL", "Selective calling system"),
        ("CM", "Surface movement radar"),
        ("CP", "Precision approach radar"),
        ("CR", "Surveillance radar element of precision approach radar system"),
        ("CS", "Secondary surveillance radar"),
        ("CT", "Terminal area surveillance radar"),
        ("FA", "Aerodrome"),
        ("FB", "Friction measuring device"),
        ("FC", "Ceiling measurement equipment"),
        ("FD", "Docking system"),
        ("FE", "Oxygen"),
        ("FF", "Fire fighting and rescue"),
        ("FG", "Ground movement control"),
        ("FH", "Helicopter alighting area/platform"),
        ("FI", "Aircraft de-icing"),
        ("FJ", "Oils"),
        ("FL", "Landing direction indicator"),
        ("FM", "Meteorological service"),
        ("FO", "Fog dispersal system"),
        ("FP", "Heliport"),
        ("FS", "Snow removal equipment"),
        ("FT", "Transmissometer"),
        ("FU", "Fuel availability"),
        ("FW", "Wind direction indicator"),
        ("FZ", "Customs/immigration"),
        ("GA", "GNSS airfield-specific operations"),
        ("GW", "GNSS area-wide operations"),
        ("IC", "Instrument landing system"),
        ("ID", "DME associated with ILS"),
        ("IG", "Glide path"),
        ("II", "Inner marker"),
        ("IL", "Localizer"),
        ("IM", "Middle marker"),
        ("IN", "Localizer not associated with ILS"),
        ("IO", "Outer marker"),
        ("IS", "ILS category I"),
        ("IT", "ILS category II"),
        ("IU", "ILS category III"),
        ("IW", "Microwave landing system"),
        ("IX", "Locator, outer"),
        ("IY", "Locator, middle"),
        ("LA", "Approach lighting system"),
        ("LB", "Aerodrome beacon"),
        ("LC", "Runway centre line lights"),
        ("LD", "Landing direction indicator lights"),
        ("LE", "Runway edge lights"),
        ("LF", "Sequenced flashing lights"),
        ("LG", "Pilot-controlled lighting"),
        ("LH", "High intensity runway lights"),
        ("LI", "Runway end identifier lights"),
        ("LJ", "Runway alignment indicator lights"),
        ("LK", "Category II components of approach lighting system"),
        ("LL", "Low intensity runway lights"),
        ("LM", "Medium intensity runway lights"),
        ("LP", "Precision approach path indicator"),
        ("LR", "All landing area lighting facilities"),
        ("LS", "Stopway lights"),
        ("LT", "Threshold lights"),
        ("LU", "Helicopter approach path indicator"),
        ("LV", "Visual approach slope indicator system"),
        ("LW", "Heliport lighting"),
        ("LX", "Taxiway centre line lights"),
        ("LY", "Taxiway edge lights"),
        ("LZ", "Runway touchdown zone lights"),
        ("MA", "Movement area"),
        ("MB", "Bearing strength"),
        ("MC", "Clearway"),
        ("MD", "Declared distances"),
        ("MG", "Taxiing guidance system"),
        ("MH", "Runway arresting gear"),
        ("MK", "Parking area"),
        ("MM", "Daylight markings"),
        ("MN", "Apron"),
        ("MO", "Stopbar"),
        ("MP", "Aircraft stands"),
        ("MR", "Runway"),
        ("MS", "Stopway"),
        ("MT", "Threshold"),
        ("MU", "Runway turning bay"),
        ("MW", "Strip/shoulder"),
        ("MX", "Taxiway"),
        ("MY", "Rapid exit taxiway"),
        ("NA", "All radio navigation facilities"),
        ("NB", "Nondirectional radio beacon"),
        ("ND", "Distance measuring equipment"),
        ("NF", "Fan marker"),
        ("NL", "Locator"),
        ("NM", "VOR/DME"),
        ("NN", "TACAN"),
        ("NT", "VORTAC"),
        ("NV", "VOR"),
        ("NX", "Direction finding station"),
        ("OA", "Aeronautical information service"),
        ("OB", "Obstacle"),
        ("OE", "Aircraft entry requirements"),
        ("OL", "Obstacle lights on"),
        ("OR", "Rescue coordination centre"),
        ("PA", "Standard instrument arrival"),
        ("PB", "Standard VFR arrival"),
        ("PC", "Contingency procedures"),
        ("PD", "Standard instrument departure"),
        ("PE", "Standard VFR departure"),
        ("PF", "Flow control procedure"),
        ("PH", "Holding procedure"),
        ("PI", "Instrument approach procedure"),
        ("PK", "VFR approach procedure"),
        ("PL", "Flight plan processing"),
        ("PM", "Aerodrome operating minima"),
        ("PN", "Noise operating restriction"),
        ("PO", "Obstacle clearance altitude and height"),
        ("PR", "Radio failure procedures"),
        ("PT", "Transition altitude or transition level"),
        ("PU", "Missed approach procedure"),
        ("PX", "Minimum holding altitude"),
        ("PZ", "ADIZ procedure"),
        ("RA", "Airspace reservation"),
        ("RD", "Danger area"),
        ("RM", "Military operating area"),
        ("RO", "Overflying of"),
        ("RP", "Prohibited area"),
        ("RR", "Restricted area"),
        ("RT", "Temporary restricted area"),
        ("SA", "Automatic terminal information service"),
        ("SB", "ATS reporting office"),
        ("SC", "Area control centre"),
        ("SE", "Flight information service"),
        ("SF", "Aerodrome flight information service"),
        ("SL", "Flow control centre"),
        ("SO", "Oceanic area control centre"),
        ("SP", "Approach control service"),
        ("SS", "Flight service station"),
        ("ST", "Aerodrome control tower"),
        ("SU", "Upper area control centre"),
        ("SV", "VOLMET broadcast"),
        ("SY", "Upper advisory service"),
        ("WA", "Air display"),
        ("WB", "Aerobatics"),
        ("WC", "Captive balloon or kite"),
        ("WD", "Demolition of explosives"),
        ("WE", "Exercises"),
        ("WF", "Air refueling"),
        ("WG", "Glider flying"),
        ("WH", "Blasting"),
        ("WJ", "Banner/target towing"),
        ("WL", "Ascent of free balloon"),
        ("WM", "Missile, gun or rocket firing"),
        ("WP", "Parachute jumping exercise"),
        ("WR", "Radioactive materials or toxic chemicals"),
        ("WS", "Burning or blowing gas"),
        ("WT", "Mass movement of aircraft"),
        ("WU", "Unmanned aircraft"),
        ("WV", "Formation flight"),
        ("WW", "Significant volcanic activity"),
        ("WY", "Aerial survey"),
        ("WZ", "Model flying"),
    ];

    pub const SECOND: &[(&str, &str)] = &[
        ("AC", "Withdrawn for maintenance"),
        ("AD", "Available for daylight operation"),
        ("AF", "Flight checked and found reliable"),
        ("AG", "Operating but ground checked only, awaiting flight check"),
        ("AH", "Hours of service are now"),
        ("AK", "Resumed normal operation"),
        ("AL", "Operative subject to previously published limitations/conditions"),
        ("AM", "Military operations only"),
        ("AN", "Available for night operation"),
        ("AO", "Operational"),
        ("AP", "Available, prior permission required"),
        ("AR", "Available on request"),
        ("AS", "Unserviceable"),
        ("AU", "Not available"),
        ("AW", "Completely withdrawn"),
        ("AX", "Previously promulgated shutdown has been cancelled"),
        ("CA", "Activated"),
        ("CC", "Completed"),
        ("CD", "Deactivated"),
        ("CE", "Erected"),
        ("CF", "Operating frequency changed to"),
        ("CG", "Downgraded to"),
        ("CH", "Changed"),
        ("CI", "Identification or radio call sign changed to"),
        ("CL", "Realigned"),
        ("CM", "Displaced"),
        ("CN", "Cancelled"),
        ("CO", "Operating"),
        ("CP", "Operating on reduced power"),
        ("CR", "Temporarily replaced by"),
        ("CS", "Installed"),
        ("CT", "On test, do not use"),
        ("HA", "Braking action is"),
        ("HB", "Friction coefficient is"),
        ("HC", "Covered by compacted snow to depth of"),
        ("HD", "Covered by dry snow to a depth of"),
        ("HE", "Covered by water to a depth of"),
        ("HF", "Totally free of snow and ice"),
        ("HG", "Grass cutting in progress"),
        ("HH", "Hazard due to"),
        ("HI", "Covered by ice"),
        ("HJ", "Launch planned"),
        ("HK", "Bird migration in progress"),
        ("HL", "Snow clearance completed"),
        ("HM", "Marked by"),
        ("HN", "Covered by wet snow or slush to a depth of"),
        ("HO", "Obscured by snow"),
        ("HP", "Snow clearance in progress"),
        ("HQ", "Operation cancelled"),
        ("HR", "Standing water"),
        ("HS", "Sanding in progress"),
        ("HT", "Approach according to signal area only"),
        ("HU", "Launch in progress"),
        ("HV", "Work completed"),
        ("HW", "Work in progress"),
        ("HX", "Concentration of birds"),
        ("HY", "Snow banks exist"),
        ("HZ", "Covered by frozen ruts and ridges"),
        ("LA", "Operating on auxiliary power supply"),
        ("LB", "Reserved for aircraft based therein"),
        ("LC", "Closed"),
        ("LD", "Unsafe"),
        ("LE", "Operating without auxiliary power supply"),
        ("LF", "Interference from"),
        ("LG", "Operating without identification"),
        ("LH", "Unserviceable for aircraft heavier than"),
        ("LI", "Closed to IFR operations"),
        ("LK", "Operating as a fixed light"),
        ("LL", "Usable for length and width of"),
        ("LN", "Closed to all night operations"),
        ("LP", "Prohibited to"),
        ("LR", "Aircraft restricted to runways and taxiways"),
        ("LS", "Subject to interruption"),
        ("LT", "Limited to"),
        ("LV", "Closed to VFR operations"),
        ("LW", "Will take place"),
        ("LX", "Operating but caution advised due to"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tables_are_valid() {
        let taxonomy = Taxonomy::default();
        assert!(taxonomy.validate().is_ok());
        assert_eq!(taxonomy.subject("OB"), Some("Obstacle"));
        assert_eq!(taxonomy.condition("CE"), Some("Erected"));
    }

    #[test]
    fn test_categories_cover_first_table() {
        let taxonomy = Taxonomy::default();
        let total: usize = taxonomy.categories.iter().map(|c| c.codes.len()).sum();
        assert_eq!(total, taxonomy.first.len());

        let warnings = taxonomy
            .categories
            .iter()
            .find(|c| c.name == "Navigation warnings: Warnings")
            .unwrap();
        assert!(warnings.codes.contains(&"WU".to_string()));
    }

    #[test]
    fn test_default_filter_options_enable_every_subject() {
        let taxonomy = Taxonomy::default();
        let options = taxonomy.default_filter_options().unwrap();
        assert_eq!(options.qcodes.len(), taxonomy.first.len());
        assert!(options.code_enabled("RD"));
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[first]
OB = "Obstacle"

[second]
CE = "Erected"
"#
        )
        .unwrap();

        let taxonomy = Taxonomy::load(file.path()).unwrap();
        assert_eq!(taxonomy.first.len(), 1);
        assert_eq!(taxonomy.categories.len(), 1);
        assert_eq!(taxonomy.categories[0].name, "Other information");
    }

    #[test]
    fn test_load_rejects_bad_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[first]\nobs = \"Obstacle\"\n[second]\n").unwrap();
        assert!(Taxonomy::load(file.path()).is_err());
    }
}
