//! Country name to ISO 3166-1 alpha-3 lookup for the European sources.

/// Names (and source-specific aliases) accepted in the input files
pub const NAME_TO_ISO: &[(&str, &str)] = &[
    ("Albania", "ALB"),
    ("Armenia", "ARM"),
    ("Austria", "AUT"),
    ("Belgium", "BEL"),
    ("Bulgaria", "BGR"),
    ("Croatia", "HRV"),
    ("Cyprus", "CYP"),
    ("Czech Republic", "CZE"),
    ("Czechia", "CZE"),
    ("Denmark", "DNK"),
    ("Estonia", "EST"),
    ("Finland", "FIN"),
    ("France", "FRA"),
    ("Germany", "DEU"),
    ("Greece", "GRC"),
    ("EL", "GRC"),
    ("Hungary", "HUN"),
    ("Ireland", "IRL"),
    ("Italy", "ITA"),
    ("Latvia", "LVA"),
    ("Lithuania", "LTU"),
    ("Luxembourg", "LUX"),
    ("Malta", "MLT"),
    ("Netherlands", "NLD"),
    ("Poland", "POL"),
    ("Portugal", "PRT"),
    ("Romania", "ROU"),
    ("Slovakia", "SVK"),
    ("Slovenia", "SVN"),
    ("Spain", "ESP"),
    ("Sweden", "SWE"),
    ("UK", "GBR"),
    ("United Kingdom", "GBR"),
];

/// Countries kept from the epidemic report feed
pub const EPIDEMIC_COUNTRIES: &[&str] = &[
    "Austria",
    "Belgium",
    "Bulgaria",
    "Croatia",
    "Cyprus",
    "Czech Republic",
    "Denmark",
    "Estonia",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Ireland",
    "Italy",
    "Latvia",
    "Lithuania",
    "Luxembourg",
    "Malta",
    "Netherlands",
    "Poland",
    "Portugal",
    "Romania",
    "Slovakia",
    "Slovenia",
    "Spain",
    "Sweden",
    "United Kingdom",
    "Norway",
    "Switzerland",
];

pub fn name_to_iso(name: &str) -> Option<&'static str> {
    NAME_TO_ISO
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, iso)| *iso)
}

/// Display name for an ISO code; unknown codes are returned unchanged
pub fn iso_to_name(iso: &str) -> &str {
    let name = match iso {
        "CZE" => "Czechia",
        "GRC" => "Greece",
        "GBR" => "United Kingdom",
        _ => NAME_TO_ISO
            .iter()
            .find(|(_, i)| *i == iso)
            .map(|(n, _)| *n)
            .unwrap_or(""),
    };
    if name.is_empty() {
        iso
    } else {
        name
    }
}
