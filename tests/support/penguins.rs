use std::path::{Path, PathBuf};

pub const HEADER: &str =
    "species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex";

/// Per-species centre: bill length, bill depth, flipper length, body mass.
const CENTRES: [(&str, &str, [f64; 4]); 3] = [
    ("Adelie", "Torgersen", [38.8, 18.3, 190.0, 3700.0]),
    ("Chinstrap", "Dream", [48.8, 18.4, 196.0, 3730.0]),
    ("Gentoo", "Biscoe", [47.5, 15.0, 217.0, 5080.0]),
];

/// Measurements typical of `species`.
pub fn centre(species: &str) -> [f64; 4] {
    CENTRES
        .iter()
        .find(|(name, _, _)| *name == species)
        .map(|(_, _, values)| *values)
        .unwrap()
}

/// Write a Palmer-shaped CSV with `per_class` rows per species plus one row
/// that is missing every measurement.
pub fn write_penguins_csv(dir: &Path, per_class: usize) -> PathBuf {
    let mut text = String::from(HEADER);
    for (species, island, [bill, depth, flipper, mass]) in CENTRES {
        for i in 0..per_class {
            // Small deterministic spread around the centre.
            let wobble = (i % 5) as f64 - 2.0;
            let sex = if i % 2 == 0 { "male" } else { "female" };
            text.push_str(&format!(
                "\n{species},{island},{:.1},{:.1},{:.0},{:.0},{sex}",
                bill + wobble * 0.4,
                depth + wobble * 0.2,
                flipper + wobble * 1.5,
                mass + wobble * 40.0,
            ));
        }
    }
    text.push_str("\nAdelie,Torgersen,NA,NA,NA,NA,NA");
    let path = dir.join("palmer.csv");
    std::fs::write(&path, text).unwrap();
    path
}
