use nalgebra::DMatrix;
/// Module to calculate molecular weights of species and the element composition matrix of a phase
///
use std::collections::BTreeMap;

// Define a struct to hold element data
pub struct Element {
    name: &'static str,
    atomic_mass: f64,
}

const fn el(name: &'static str, atomic_mass: f64) -> Element {
    Element { name, atomic_mass }
}

// Define a list of elements and their atomic masses, kg/kmol
const ELEMENTS: &[Element] = &[
    el("E", 5.485799e-4),
    el("H", 1.008),
    el("D", 2.014),
    el("He", 4.0026),
    el("Li", 6.94),
    el("Be", 9.0122),
    el("B", 10.81),
    el("C", 12.011),
    el("N", 14.007),
    el("O", 15.999),
    el("F", 18.998),
    el("Ne", 20.18),
    el("Na", 22.99),
    el("Mg", 24.305),
    el("Al", 26.98),
    el("Si", 28.085),
    el("P", 30.974),
    el("S", 32.065),
    el("Cl", 35.45),
    el("Ar", 39.948),
    el("K", 39.102),
    el("Ca", 40.08),
    el("Sc", 44.9559),
    el("Ti", 47.867),
    el("V", 50.9415),
    el("Cr", 51.9961),
    el("Mn", 54.938),
    el("Fe", 55.845),
    el("Co", 58.9332),
    el("Ni", 58.6934),
    el("Cu", 63.546),
    el("Zn", 65.38),
    el("Ga", 69.723),
    el("Ge", 72.63),
    el("As", 74.9216),
    el("Se", 78.971),
    el("Br", 79.904),
    el("Kr", 83.798),
    el("Ag", 107.8682),
    el("Sn", 118.71),
    el("I", 126.90447),
    el("Xe", 131.293),
    el("W", 183.84),
    el("Pt", 195.084),
    el("Au", 196.96657),
    el("Hg", 200.592),
    el("Pb", 207.2),
    el("U", 238.02891),
];

/// atomic weight of an element, kg/kmol. Mechanism files often write argon as "AR",
/// so symbols are matched case-insensitively
pub fn atomic_weight(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|e| e.name == symbol)
        .or_else(|| ELEMENTS.iter().find(|e| e.name.eq_ignore_ascii_case(symbol)))
        .map(|e| e.atomic_mass)
}

// Function to calculate the molar mass of a species given its element composition
pub fn molar_mass_of_composition(composition: &BTreeMap<String, f64>) -> Result<f64, String> {
    let mut molar_mass = 0.0;
    for (element, count) in composition {
        let weight =
            atomic_weight(element).ok_or_else(|| format!("unknown element '{}'", element))?;
        molar_mass += weight * count;
    }
    Ok(molar_mass)
}

/// element composition matrix: rows are elements (in the given order), columns are species
pub fn create_elem_composition_matrix(
    compositions: &[&BTreeMap<String, f64>],
    elements: &[String],
) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(elements.len(), compositions.len());
    for (substance_i, composition) in compositions.iter().enumerate() {
        for (j, element_j) in elements.iter().enumerate() {
            if let Some(count) = composition.get(element_j) {
                matrix[(j, substance_i)] += *count;
            }
        }
    }
    matrix
}
