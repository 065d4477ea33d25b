//! Product code table
//!
//! The table is authoritative: when a document disagrees with it, the table
//! wins. It is rendered into every prompt for that reason.

/// Name used for codes that are not in the table
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// SKU to product name, in catalogue order
pub const SKU_MAPPING: [(&str, &str); 10] = [
    ("SKU-1", "AquaFlow Pro"),
    ("SKU-2", "PureStream Deluxe"),
    ("SKU-3", "HydroMax Ultra"),
    ("SKU-4", "EcoPure Bottle"),
    ("SKU-5", "StreamLine Valve"),
    ("SKU-6", "ClearWave Filter"),
    ("SKU-7", "AquaGuard Sensor"),
    ("SKU-8", "RainSaver Barrel"),
    ("SKU-9", "ThermoFlow Heater"),
    ("SKU-10", "PureWell Faucet"),
];

/// Look up the product name for a SKU (case-insensitive)
pub fn product_name(sku: &str) -> &'static str {
    SKU_MAPPING
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(sku.trim()))
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_PRODUCT)
}

/// Render the table as `SKU-n: Name` lines
pub fn reference_table() -> String {
    SKU_MAPPING
        .iter()
        .map(|(code, name)| format!("{}: {}", code, name))
        .collect::<Vec<_>>()
        .join("\n")
}
