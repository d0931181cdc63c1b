//! Per-cell bookkeeping of the lines and continuum edges placed on the mesh.

use photo_types::error::PhotoResult;

use crate::mesh::EnergyMesh;

/// Line counts and first labels for every cell of a mesh.
#[derive(Debug, Clone)]
pub struct CellRegistry {
    line_count: Vec<u32>,
    line_label: Vec<Option<String>>,
    continuum_label: Vec<Option<String>>,
}

impl CellRegistry {
    pub fn new(mesh: &EnergyMesh) -> Self {
        let n = mesh.cell_count() + 1;
        CellRegistry {
            line_count: vec![0; n],
            line_label: vec![None; n],
            continuum_label: vec![None; n],
        }
    }

    /// Place a line on the mesh, below `ionization_edge` when given, and
    /// count it in its cell. The first label registered in a cell is kept.
    pub fn register_line(
        &mut self,
        mesh: &EnergyMesh,
        energy: f64,
        label: &str,
        ionization_edge: Option<usize>,
    ) -> PhotoResult<usize> {
        let k = mesh.line_cell(energy, ionization_edge)?;
        self.line_count[k] += 1;
        if self.line_label[k].is_none() {
            self.line_label[k] = Some(label.to_string());
        }
        Ok(k)
    }

    /// Place a continuum edge on the mesh. The first label in a cell is kept.
    pub fn register_continuum(
        &mut self,
        mesh: &EnergyMesh,
        energy: f64,
        label: &str,
    ) -> PhotoResult<usize> {
        let k = mesh.cell_index(energy)?;
        if self.continuum_label[k].is_none() {
            self.continuum_label[k] = Some(label.to_string());
        }
        Ok(k)
    }

    pub fn lines_in_cell(&self, k: usize) -> u32 {
        self.line_count.get(k).copied().unwrap_or(0)
    }

    pub fn line_label(&self, k: usize) -> Option<&str> {
        self.line_label.get(k).and_then(|l| l.as_deref())
    }

    pub fn continuum_label(&self, k: usize) -> Option<&str> {
        self.continuum_label.get(k).and_then(|l| l.as_deref())
    }

    /// Total number of registered lines.
    pub fn line_total(&self) -> u64 {
        self.line_count.iter().map(|&c| c as u64).sum()
    }

    pub fn clear(&mut self) {
        self.line_count.iter_mut().for_each(|c| *c = 0);
        self.line_label.iter_mut().for_each(|l| *l = None);
        self.continuum_label.iter_mut().for_each(|l| *l = None);
    }
}
