// Display formatting for make, model and version strings coming from the listing feed

use once_cell::sync::Lazy;
use regex::Regex;

// Acronym brands shown fully upper-case
const UPPERCASE_BRANDS: [&str; 7] = ["bmw", "vw", "gmc", "mg", "amg", "amc", "byd"];

const SPECIAL_CASE_BRANDS: [(&str, &str); 8] = [
    ("alfa romeo", "Alfa Romeo"),
    ("aston martin", "Aston Martin"),
    ("de tomaso", "De Tomaso"),
    ("land rover", "Land Rover"),
    ("mercedes benz", "Mercedes-Benz"),
    ("mercedes-benz", "Mercedes-Benz"),
    ("rolls royce", "Rolls-Royce"),
    ("rolls-royce", "Rolls-Royce"),
];

static LETTERS_THEN_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d.*)$").expect("static regex"));

// "2.0 tdi", "m sport"
static VERSION_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"^(\d+\.\d+)\s+(.+)$").expect("static regex"),
        Regex::new(r"^([A-Za-z])\s+(.+)$").expect("static regex"),
    ]
});

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn capitalize_lower_rest(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

pub fn format_car_brand(brand: &str) -> String {
    let lower = brand.trim().to_lowercase();

    if let Some((_, formatted)) = SPECIAL_CASE_BRANDS.iter().find(|(key, _)| *key == lower) {
        return (*formatted).to_string();
    }
    if UPPERCASE_BRANDS.contains(&lower.as_str()) {
        return lower.to_uppercase();
    }

    lower.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

pub fn format_car_model(model: &str) -> String {
    if model.starts_with(|c: char| c.is_ascii_digit()) {
        return model.to_uppercase();
    }
    if let Some(caps) = LETTERS_THEN_DIGIT.captures(model) {
        return format!("{}{}", caps[1].to_uppercase(), &caps[2]);
    }
    if model.contains('-') {
        return model.split('-').map(format_car_model).collect::<Vec<_>>().join("-");
    }

    model
        .split(' ')
        .map(capitalize_lower_rest)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_car_version(version: &str) -> String {
    for pattern in VERSION_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(version) {
            return format!("{} {}", &caps[1], caps[2].to_uppercase());
        }
    }
    // Short codes are measured in UTF-16 units, as the web front-end does
    if version.encode_utf16().count() <= 3 {
        return version.to_uppercase();
    }

    version
        .split(' ')
        .map(capitalize_lower_rest)
        .collect::<Vec<_>>()
        .join(" ")
}
