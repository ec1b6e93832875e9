//! Embedding matrix - positionally aligned vector rows with raw binary
//! persistence
//!
//! One fixed-width f32 row per chunk, in chunk order. Every chunk
//! insertion or deletion must be mirrored here so the matrix, the chunk
//! list, and the lexical model always describe the same sequence.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

#[derive(Debug, Default, Clone)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    dimensions: usize,
}

impl EmbeddingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.dimensions = 0;
    }

    /// Append one row. The first row fixes the matrix width.
    pub fn push_row(&mut self, row: &[f32]) -> anyhow::Result<()> {
        if self.data.is_empty() {
            self.dimensions = row.len();
        } else if row.len() != self.dimensions {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                row.len()
            );
        }
        if row.is_empty() {
            anyhow::bail!("Embedding rows must not be empty");
        }

        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        if idx >= self.len() {
            return None;
        }
        let start = idx * self.dimensions;
        Some(&self.data[start..start + self.dimensions])
    }

    /// Keep only rows whose flag is true, preserving order. `keep` must
    /// have one flag per row.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.len());

        let dims = self.dimensions;
        let mut retained = Vec::with_capacity(self.data.len());
        for (idx, flag) in keep.iter().enumerate() {
            if *flag {
                retained.extend_from_slice(&self.data[idx * dims..(idx + 1) * dims]);
            }
        }

        self.data = retained;
        if self.data.is_empty() {
            self.dimensions = 0;
        }
    }

    /// Cosine similarity of a query vector against every row. Rows (or a
    /// query) with zero norm score 0 rather than dividing by zero.
    pub fn cosine_scores(&self, query: &[f32]) -> Vec<f32> {
        let q_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();

        (0..self.len())
            .map(|idx| {
                let row = &self.data[idx * self.dimensions..(idx + 1) * self.dimensions];
                let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt() * q_norm;
                if norm == 0.0 {
                    return 0.0;
                }
                let dot: f32 = row.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                dot / norm
            })
            .collect()
    }

    /// Write rows as raw f32 bytes, one row after another.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let bytes = unsafe {
            std::slice::from_raw_parts(
                self.data.as_ptr() as *const u8,
                self.data.len() * std::mem::size_of::<f32>(),
            )
        };
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a matrix back given the expected row count; the row width is
    /// inferred from the file size.
    pub fn load(path: &Path, rows: usize) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let float_size = std::mem::size_of::<f32>();
        if mmap.len() % float_size != 0 {
            anyhow::bail!("Embedding file {} is not a whole number of f32s", path.display());
        }
        let total_floats = mmap.len() / float_size;

        if rows == 0 {
            if total_floats != 0 {
                anyhow::bail!(
                    "Embedding file {} has data but the chunk list is empty",
                    path.display()
                );
            }
            return Ok(Self::new());
        }
        if total_floats % rows != 0 {
            anyhow::bail!(
                "Embedding file {} does not divide into {} rows",
                path.display(),
                rows
            );
        }

        let dimensions = total_floats / rows;
        let mut data = vec![0.0f32; total_floats];
        // Safety: reading back f32 values written as f32 by `save`.
        let floats =
            unsafe { std::slice::from_raw_parts(mmap.as_ptr() as *const f32, total_floats) };
        data.copy_from_slice(floats);

        Ok(Self { data, dimensions })
    }
}
