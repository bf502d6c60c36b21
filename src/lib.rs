use pyo3::pymodule;

pub mod messages;
pub mod surface;

/// The Python module implemented in Rust.
#[pymodule]
mod speaker_deck {
    #[pymodule_export]
    use super::surface::ControlSurface;

    #[pymodule_export]
    use super::surface::MessageOutlet;
}
